//! 把基因组画到画布上.
//!
//! 两个后端画出的东西相同: 先清成不透明黑色, 再按基因组顺序把每个多边形
//! 以 source-over 方式叠上去; 顶点坐标乘以画布尺寸后截断为整数.

mod scanline;
mod skia;

use std::fmt;

use crate::error::Result;
use crate::genome::Genome;
use crate::raster::Raster;

pub use scanline::ScanlineRenderer;
pub use skia::SkiaRenderer;

/// 渲染器. 同一个基因组总是得到同一张图
pub trait Renderer: Send + Sync {
    fn name(&self) -> &'static str;

    /// 把 genome 画到 out 上, 尺寸取 out 的尺寸
    fn render(&self, genome: &Genome, out: &mut Raster);
}

impl<T: Renderer + ?Sized> Renderer for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn render(&self, genome: &Genome, out: &mut Raster) {
        (**self).render(genome, out)
    }
}


/// 可选的渲染后端
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    /// 纯 CPU 扫描线填充
    #[value(alias = "awt")]
    Cpu,
    /// tiny-skia 光栅化
    #[value(alias = "opengl")]
    Skia,
}
impl Backend {
    pub fn create(self, width: u32, height: u32) -> Result<Box<dyn Renderer>> {
        match self {
            Backend::Cpu => Ok(Box::new(ScanlineRenderer)),
            Backend::Skia => Ok(Box::new(SkiaRenderer::new(width, height)?)),
        }
    }
}
impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Cpu => write!(f, "cpu"),
            Backend::Skia => write!(f, "skia"),
        }
    }
}

/// [0, 1] 的颜色分量转为字节
#[inline]
pub(crate) fn to_byte(v: f32) -> u8 {
    (v * 255.0 + 0.5) as u8
}
