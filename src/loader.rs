use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::{EvopaintError, Result};
use crate::raster::Raster;

/// 目标图片: 原图 + 缩放到工作分辨率后的画布
pub struct Target {
    pub original: RgbaImage,
    pub raster: Raster,
}
impl Target {
    /// 原图尺寸
    pub fn dimensions(&self) -> (u32, u32) {
        self.original.dimensions()
    }
}

/// 读取目标图片, 缩放到 work_width × work_height
pub fn load_target(path: &Path, work_width: u32, work_height: u32) -> Result<Target> {
    let original = image::open(path)
        .map_err(|source| EvopaintError::TargetLoad { path: path.to_path_buf(), source })?
        .to_rgba8();
    log::info!(
        "读取目标图片 {}: {}x{}, 工作分辨率 {}x{}",
        path.display(),
        original.width(),
        original.height(),
        work_width,
        work_height
    );
    Ok(Target::from_image(original, work_width, work_height))
}

impl Target {
    pub fn from_image(original: RgbaImage, work_width: u32, work_height: u32) -> Target {
        let scaled = if original.dimensions() == (work_width, work_height) {
            original.clone()
        } else {
            imageops::resize(&original, work_width, work_height, FilterType::Triangle)
        };
        Target {
            raster: Raster::from_image(&scaled),
            original,
        }
    }
}
