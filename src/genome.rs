use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::util::{random, UnitFloat};

/// 颜色占 4 个基因: R, G, B, A
pub const COLOR_GENES: usize = 4;
/// 随机生成时 alpha 的下限
pub const MIN_ALPHA: f32 = 0.2;


/// 基因组的形状: 多少个多边形, 每个多边形多少个顶点
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct GenomeLayout {
    pub shape_count: usize,
    pub vertex_count: usize,
}
impl GenomeLayout {
    pub fn new(shape_count: usize, vertex_count: usize) -> GenomeLayout {
        GenomeLayout { shape_count, vertex_count }
    }

    /// 单个多边形基因块的长度 = 4 + 2·vertexCount
    pub fn block_len(&self) -> usize {
        COLOR_GENES + 2 * self.vertex_count
    }

    pub fn genome_len(&self) -> usize {
        self.shape_count * self.block_len()
    }
}


/// 一个多边形基因块的只读视图
#[derive(Copy, Clone, Debug)]
pub struct ShapeGene<'a> {
    genes: &'a [f32],
}
impl<'a> ShapeGene<'a> {
    /// (R, G, B, A), 均在 [0, 1]
    pub fn color(&self) -> [f32; 4] {
        [self.genes[0], self.genes[1], self.genes[2], self.genes[3]]
    }

    pub fn alpha(&self) -> f32 {
        self.genes[3]
    }

    /// 归一化的顶点坐标 (x, y)
    pub fn vertices(&self) -> impl Iterator<Item = (f32, f32)> + 'a {
        let genes: &'a [f32] = self.genes;
        genes[COLOR_GENES..].chunks_exact(2).map(|p| (p[0], p[1]))
    }

    /// 顶点坐标乘以画布尺寸后截断为整数像素坐标
    pub fn pixel_vertices(&self, width: u32, height: u32) -> Vec<(i32, i32)> {
        self.vertices()
            .map(|(x, y)| ((x * width as f32) as i32, (y * height as f32) as i32))
            .collect()
    }
}


/// 基因组: 定长的 [0, 1] 浮点序列, 按多边形切成等长的块.
/// 越靠后的多边形渲染在越上层.
#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "RawGenome")]
pub struct Genome {
    layout: GenomeLayout,
    genes: Vec<f32>,
}

/// 反序列化的中间形态, 检查过不变量才能变成 `Genome`
#[derive(Deserialize)]
struct RawGenome {
    layout: GenomeLayout,
    genes: Vec<f32>,
}
impl TryFrom<RawGenome> for Genome {
    type Error = String;

    fn try_from(raw: RawGenome) -> Result<Genome, String> {
        if raw.genes.len() != raw.layout.genome_len() {
            return Err(format!(
                "基因组长度 {} 与布局 {:?} 不符, 应为 {}",
                raw.genes.len(),
                raw.layout,
                raw.layout.genome_len()
            ));
        }
        if let Some(v) = raw.genes.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(format!("基因值 {} 超出 [0, 1]", v));
        }
        Ok(Genome { layout: raw.layout, genes: raw.genes })
    }
}

impl Genome {
    /// 用现成的基因值构造. 长度或取值越界属于程序缺陷, 直接 panic
    pub fn from_genes(layout: GenomeLayout, genes: Vec<f32>) -> Genome {
        assert_eq!(genes.len(), layout.genome_len(), "基因组长度与布局不符!");
        assert!(genes.iter().all(|v| (0.0..=1.0).contains(v)), "基因值超出 [0, 1]!");
        Genome { layout, genes }
    }

    /// 繁殖路径用的构造, 只在 debug 下检查不变量
    pub(crate) fn from_raw(layout: GenomeLayout, genes: Vec<f32>) -> Genome {
        debug_assert!(Genome::is_well_formed(&layout, &genes), "繁殖产生了非法基因组!");
        Genome { layout, genes }
    }

    /// 随机初始化
    ///  - 颜色 R, G, B 均匀分布; A = max(0.2, u1·u2), 偏向透明但保证可见
    ///  - 顶点围绕一个随机中心 ±0.5 散布, 得到比较紧凑的多边形
    pub fn random<R: Rng + ?Sized>(layout: GenomeLayout, rng: &mut R) -> Genome {
        let mut genes = Vec::with_capacity(layout.genome_len());
        for _ in 0..layout.shape_count {
            genes.push(random::unit(rng));
            genes.push(random::unit(rng));
            genes.push(random::unit(rng));
            genes.push(MIN_ALPHA.max(random::unit(rng) * random::unit(rng)));
            let cx = random::unit(rng);
            let cy = random::unit(rng);
            for _ in 0..layout.vertex_count {
                genes.push((cx + random::uniform(rng, -0.5, 0.5)).clamp01());
                genes.push((cy + random::uniform(rng, -0.5, 0.5)).clamp01());
            }
        }
        debug_assert!(Genome::is_well_formed(&layout, &genes));
        Genome { layout, genes }
    }

    /// 长度正确且所有值都在 [0, 1]
    pub fn is_well_formed(layout: &GenomeLayout, genes: &[f32]) -> bool {
        genes.len() == layout.genome_len() && genes.iter().all(|v| (0.0..=1.0).contains(v))
    }

    pub fn is_valid(&self) -> bool {
        Genome::is_well_formed(&self.layout, &self.genes)
    }

    pub fn layout(&self) -> GenomeLayout {
        self.layout
    }

    pub fn genes(&self) -> &[f32] {
        &self.genes
    }

    /// 第 which 个多边形的基因块
    pub fn block(&self, which: usize) -> &[f32] {
        let len = self.layout.block_len();
        &self.genes[which * len..(which + 1) * len]
    }

    pub fn shape(&self, which: usize) -> ShapeGene<'_> {
        ShapeGene { genes: self.block(which) }
    }

    /// 按渲染顺序 (从底到顶) 遍历所有多边形
    pub fn shapes(&self) -> impl Iterator<Item = ShapeGene<'_>> + '_ {
        self.genes
            .chunks_exact(self.layout.block_len())
            .map(|genes| ShapeGene { genes })
    }

    pub fn from_json(json: &str) -> serde_json::Result<Genome> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
