pub mod random {
    use rand::Rng;

    /// 生成 U(0, 1) 随机浮点数
    pub fn unit<R: Rng + ?Sized>(rng: &mut R) -> f32 {
        rng.gen::<f32>()
    }

    /// 生成 U(low, high) 随机浮点数
    pub fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f32, high: f32) -> f32 {
        rng.gen_range(low, high)
    }

    /// 公平硬币
    pub fn coin<R: Rng + ?Sized>(rng: &mut R) -> bool {
        rng.gen_bool(0.5)
    }

    /// 以概率 p 返回 true
    pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
        rng.gen::<f64>() < p
    }

    /// 生成 [0, bound) 中不等于 except 的随机整数 (不断重抽直到不同)
    pub fn index_except<R: Rng + ?Sized>(rng: &mut R, bound: usize, except: usize) -> usize {
        debug_assert!(bound >= 2 || except >= bound, "只有一个候选且被排除, 永远抽不到!");
        loop {
            let r = rng.gen_range(0, bound);
            if r != except {
                return r;
            }
        }
    }
}


/// 取值范围为 [0, 1] 的基因值
pub trait UnitFloat {
    fn clamp01(self) -> Self;
    fn nudged(self, delta: Self) -> Self;
}
impl UnitFloat for f32 {
    fn clamp01(self) -> f32 {
        self.clamp(0.0, 1.0)
    }

    /// 加上扰动后截断回 [0, 1]
    fn nudged(self, delta: f32) -> f32 {
        (self + delta).clamp01()
    }
}
