use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EvopaintError, Result};
use crate::genome::GenomeLayout;

/// 遗传算法的全部超参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaConfig {
    /// 种群大小
    pub population_size: usize,
    /// 每代排名前多少比例的个体作为父母
    pub selection_cutoff: f64,
    /// 每个基因值发生变异的概率
    pub mutation_chance: f64,
    /// 变异扰动的最大幅度
    pub mutation_amount: f32,
    /// 每个基因组包含的多边形数目
    pub shape_count: usize,
    /// 每个多边形的顶点数
    pub vertex_count: usize,
    /// 计算适应度时使用的画布尺寸
    pub work_width: u32,
    pub work_height: u32,
    /// 用 rayon 并行计算适应度
    pub parallel: bool,
    /// 固定随机种子, 使运行可复现
    pub seed: Option<u64>,
}

impl Default for GaConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            selection_cutoff: 0.15,
            mutation_chance: 0.01,
            mutation_amount: 0.1,
            shape_count: 125,
            vertex_count: 3,
            work_width: 100,
            work_height: 100,
            parallel: false,
            seed: None,
        }
    }
}

impl GaConfig {
    /// 从 TOML 文件读取, 缺失的字段取默认值
    pub fn from_toml_file(path: &Path) -> Result<GaConfig> {
        let text = fs::read_to_string(path)?;
        let config: GaConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn layout(&self) -> GenomeLayout {
        GenomeLayout::new(self.shape_count, self.vertex_count)
    }

    /// 精英个数 = floor(populationSize · selectionCutoff)
    pub fn elite_count(&self) -> usize {
        (self.population_size as f64 * self.selection_cutoff).floor() as usize
    }

    /// 每个精英产仔数 = ceil(1 / selectionCutoff)
    pub fn children_per_parent(&self) -> usize {
        (1.0 / self.selection_cutoff).ceil() as usize
    }

    pub fn offspring_count(&self) -> usize {
        self.elite_count() * self.children_per_parent()
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(EvopaintError::Config(msg.to_string()));
        if self.population_size < 2 {
            return fail("population_size 至少为 2");
        }
        if !(self.selection_cutoff > 0.0 && self.selection_cutoff <= 1.0) {
            return fail("selection_cutoff 必须在 (0, 1] 之间");
        }
        if self.elite_count() < 2 {
            return fail("population_size · selection_cutoff 至少要选出 2 个精英");
        }
        if !(0.0..=1.0).contains(&self.mutation_chance) {
            return fail("mutation_chance 必须在 [0, 1] 之间");
        }
        if !self.mutation_amount.is_finite() || self.mutation_amount < 0.0 {
            return fail("mutation_amount 必须是非负有限数");
        }
        if self.shape_count == 0 {
            return fail("shape_count 至少为 1");
        }
        if self.vertex_count < 3 {
            return fail("vertex_count 至少为 3");
        }
        if self.work_width == 0 || self.work_height == 0 {
            return fail("工作分辨率不能为 0");
        }
        Ok(())
    }
}
