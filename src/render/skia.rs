use std::cell::RefCell;

use tiny_skia as sk;

use super::{to_byte, Renderer};
use crate::error::{EvopaintError, Result};
use crate::genome::{Genome, ShapeGene};
use crate::raster::{self, Raster};

// 每个线程一块可复用的 pixmap, 尺寸变了才重新分配
thread_local! {
    static SCRATCH_PIX: RefCell<Option<sk::Pixmap>> = RefCell::new(None);
}

/// 基于 tiny-skia 的光栅化后端. 关闭抗锯齿, 坐标先截断为整数
pub struct SkiaRenderer;

impl SkiaRenderer {
    /// 先试着分配一次画布, 不行就报初始化失败
    pub fn new(width: u32, height: u32) -> Result<SkiaRenderer> {
        let pixmap = sk::Pixmap::new(width, height).ok_or_else(|| {
            EvopaintError::Renderer(format!("tiny-skia 无法创建 {}x{} 的画布", width, height))
        })?;
        SCRATCH_PIX.with(|cell| *cell.borrow_mut() = Some(pixmap));
        Ok(SkiaRenderer)
    }
}

impl Renderer for SkiaRenderer {
    fn name(&self) -> &'static str {
        "skia"
    }

    fn render(&self, genome: &Genome, out: &mut Raster) {
        let (w, h) = (out.width(), out.height());
        SCRATCH_PIX.with(|cell| {
            let mut slot = cell.borrow_mut();
            let need_new = match slot.as_ref() {
                Some(pm) => pm.width() != w || pm.height() != h,
                None => true,
            };
            if need_new {
                *slot = sk::Pixmap::new(w, h);
            }
            let pix = match slot.as_mut() {
                Some(pix) => pix,
                // 零尺寸画布: 没有像素可画
                None => return,
            };

            pix.fill(sk::Color::BLACK);
            for shape in genome.shapes() {
                draw_polygon(pix, &shape);
            }

            // 背景不透明, 叠加后 alpha 恒为 255, 预乘与否结果一样
            for (dst, src) in out.pixels_mut().iter_mut().zip(pix.pixels()) {
                let c = src.demultiply();
                *dst = raster::pack(c.alpha(), c.red(), c.green(), c.blue());
            }
        });
    }
}

fn draw_polygon(pix: &mut sk::Pixmap, shape: &ShapeGene<'_>) {
    let [r, g, b, a] = shape.color();
    let alpha = to_byte(a);
    if alpha == 0 {
        return;
    }
    let points = shape.pixel_vertices(pix.width(), pix.height());
    if points.is_empty() {
        return;
    }

    let mut pb = sk::PathBuilder::new();
    pb.move_to(points[0].0 as f32, points[0].1 as f32);
    for &(x, y) in &points[1..] {
        pb.line_to(x as f32, y as f32);
    }
    pb.close();
    // 建不出路径的多边形本来也覆盖不到任何像素
    let path = match pb.finish() {
        Some(path) => path,
        None => return,
    };

    let mut paint = sk::Paint::default();
    paint.anti_alias = false;
    paint.set_color_rgba8(to_byte(r), to_byte(g), to_byte(b), alpha);

    pix.fill_path(&path, &paint, sk::FillRule::EvenOdd, sk::Transform::identity(), None);
}
