use image::{Rgba, RgbaImage};

/// 不透明黑色 (ARGB)
pub const OPAQUE_BLACK: u32 = 0xff00_0000;

/// 打包像素的通道提取: 24–31 位 alpha, 16–23 红, 8–15 绿, 0–7 蓝
#[inline]
pub fn alpha(p: u32) -> u8 {
    (p >> 24) as u8
}
#[inline]
pub fn red(p: u32) -> u8 {
    (p >> 16) as u8
}
#[inline]
pub fn green(p: u32) -> u8 {
    (p >> 8) as u8
}
#[inline]
pub fn blue(p: u32) -> u8 {
    p as u8
}

#[inline]
pub fn pack(a: u8, r: u8, g: u8, b: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// 两个像素 4 个通道差值的平方和
#[inline]
pub fn color_distance(p1: u32, p2: u32) -> i64 {
    let da = alpha(p1) as i64 - alpha(p2) as i64;
    let dr = red(p1) as i64 - red(p2) as i64;
    let dg = green(p1) as i64 - green(p2) as i64;
    let db = blue(p1) as i64 - blue(p2) as i64;
    da * da + dr * dr + dg * dg + db * db
}


/// 画布: width × height 个打包的 ARGB 像素, 行优先
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}
impl Raster {
    /// 新建一个纯黑不透明的画布
    pub fn new(width: u32, height: u32) -> Raster {
        Raster::filled(width, height, OPAQUE_BLACK)
    }

    pub fn filled(width: u32, height: u32, pixel: u32) -> Raster {
        Raster {
            width,
            height,
            pixels: vec![pixel; width as usize * height as usize],
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u32>) -> Raster {
        assert_eq!(pixels.len(), width as usize * height as usize, "像素数与尺寸不符!");
        Raster { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    #[inline]
    fn idx_of(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height, "越界的 (x, y) 坐标!");
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.pixels[self.idx_of(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, pixel: u32) {
        let idx = self.idx_of(x, y);
        self.pixels[idx] = pixel;
    }

    pub fn clear(&mut self, pixel: u32) {
        self.pixels.iter_mut().for_each(|p| *p = pixel);
    }

    /// 逐像素的平方差之和. 只有尺寸相同的两个画布才能比较
    pub fn diff(&self, other: &Raster) -> u64 {
        assert!(
            self.width == other.width && self.height == other.height,
            "只有尺寸相同的两个画布才能计算差异!"
        );
        let sum: i64 = self
            .pixels
            .iter()
            .zip(&other.pixels)
            .map(|(&p1, &p2)| color_distance(p1, p2))
            .sum();
        sum as u64
    }

    pub fn from_image(img: &RgbaImage) -> Raster {
        let pixels = img
            .pixels()
            .map(|Rgba([r, g, b, a])| pack(*a, *r, *g, *b))
            .collect();
        Raster::from_pixels(img.width(), img.height(), pixels)
    }

    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let p = self.get(x, y);
            Rgba([red(p), green(p), blue(p), alpha(p)])
        })
    }
}


/// 两个画布之间的适应度原料
pub fn diff(a: &Raster, b: &Raster) -> u64 {
    a.diff(b)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32, seed: u32) -> Raster {
        let pixels = (0..width * height)
            .map(|i| i.wrapping_mul(2_654_435_761).wrapping_add(seed))
            .collect();
        Raster::from_pixels(width, height, pixels)
    }

    #[test]
    fn channel_layout() {
        let p = 0x80_40_20_10;
        assert_eq!((alpha(p), red(p), green(p), blue(p)), (0x80, 0x40, 0x20, 0x10));
        assert_eq!(pack(0x80, 0x40, 0x20, 0x10), p);
    }

    #[test]
    fn diff_is_reflexive_and_symmetric() {
        let a = checker(5, 3, 1);
        let b = checker(5, 3, 99);
        assert_eq!(diff(&a, &a), 0);
        assert_eq!(diff(&a, &b), diff(&b, &a));
        assert!(diff(&a, &b) > 0);
    }

    #[test]
    fn diff_of_black_and_white_pixel() {
        let black = Raster::new(1, 1);
        let white = Raster::filled(1, 1, 0xffff_ffff);
        assert_eq!(diff(&black, &white), 3 * 255 * 255);
        let transparent = Raster::filled(1, 1, 0);
        assert_eq!(diff(&black, &transparent), 255 * 255);
    }

    #[test]
    fn worst_case_fits_in_64_bits() {
        let a = Raster::filled(64, 64, 0);
        let b = Raster::filled(64, 64, 0xffff_ffff);
        assert_eq!(diff(&a, &b), 64 * 64 * 4 * 255 * 255);
    }

    #[test]
    #[should_panic]
    fn diff_rejects_mismatched_sizes() {
        diff(&Raster::new(2, 2), &Raster::new(2, 3));
    }

    #[test]
    fn image_conversion_keeps_channels() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([1, 2, 3, 4]));
        img.put_pixel(1, 0, Rgba([250, 0, 128, 255]));
        let raster = Raster::from_image(&img);
        assert_eq!(raster.get(0, 0), pack(4, 1, 2, 3));
        assert_eq!(raster.to_image(), img);
    }
}
