use super::{to_byte, Renderer};
use crate::genome::{Genome, ShapeGene};
use crate::raster::{self, Raster, OPAQUE_BLACK};

/// 纯 CPU 的扫描线多边形填充.
/// 像素中心落在多边形内 (奇偶规则) 即被覆盖.
pub struct ScanlineRenderer;

impl Renderer for ScanlineRenderer {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn render(&self, genome: &Genome, out: &mut Raster) {
        out.clear(OPAQUE_BLACK);
        let mut crossings = Vec::with_capacity(genome.layout().vertex_count);
        for shape in genome.shapes() {
            fill_polygon(out, &shape, &mut crossings);
        }
    }
}


/// 预乘好的源颜色, 方便逐像素叠加
#[derive(Copy, Clone)]
struct Paint {
    r: u32,
    g: u32,
    b: u32,
    a: u32,
}
impl Paint {
    fn new(color: [f32; 4]) -> Paint {
        let a = to_byte(color[3]) as u32;
        Paint {
            r: to_byte(color[0]) as u32 * a,
            g: to_byte(color[1]) as u32 * a,
            b: to_byte(color[2]) as u32 * a,
            a,
        }
    }

    /// source-over: out = src·a + dst·(1 - a)
    #[inline]
    fn over(&self, dst: u32) -> u32 {
        let inv = 255 - self.a;
        let mix = |src: u32, d: u8| ((src + d as u32 * inv + 127) / 255) as u8;
        let a = self.a + (raster::alpha(dst) as u32 * inv + 127) / 255;
        raster::pack(
            a as u8,
            mix(self.r, raster::red(dst)),
            mix(self.g, raster::green(dst)),
            mix(self.b, raster::blue(dst)),
        )
    }
}


/// 按行填充一个多边形
fn fill_polygon(canvas: &mut Raster, shape: &ShapeGene<'_>, crossings: &mut Vec<f32>) {
    let paint = Paint::new(shape.color());
    if paint.a == 0 {
        return;
    }
    let (width, height) = (canvas.width(), canvas.height());
    let points = shape.pixel_vertices(width, height);

    let y_min = points.iter().map(|p| p.1).min().unwrap_or(0).max(0);
    let y_max = points.iter().map(|p| p.1).max().unwrap_or(0).min(height as i32);

    for y in y_min..y_max {
        // 采样点取像素中心
        let yc = y as f32 + 0.5;
        crossings.clear();
        for (i, &(x0, y0)) in points.iter().enumerate() {
            let (x1, y1) = points[(i + 1) % points.len()];
            if y0 == y1 {
                continue;
            }
            let (lo, hi) = if y0 < y1 { (y0, y1) } else { (y1, y0) };
            if yc < lo as f32 || yc >= hi as f32 {
                continue;
            }
            let t = (yc - y0 as f32) / (y1 - y0) as f32;
            crossings.push(x0 as f32 + t * (x1 - x0) as f32);
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for span in crossings.chunks_exact(2) {
            // 覆盖像素中心在 [左, 右) 之间的像素
            let j_left = ((span[0] - 0.5).ceil().max(0.0)) as u32;
            let j_right = ((span[1] - 0.5).ceil().min(width as f32)) as u32;
            draw_horizontal_line(canvas, y as u32, j_left, j_right, paint);
        }
    }
}

fn draw_horizontal_line(canvas: &mut Raster, y: u32, j_left: u32, j_right: u32, paint: Paint) {
    let row = y as usize * canvas.width() as usize;
    let pixels = canvas.pixels_mut();
    for j in j_left..j_right {
        let idx = row + j as usize;
        pixels[idx] = paint.over(pixels[idx]);
    }
}
