use serde::{Deserialize, Serialize};

use crate::fitness::Fitness;
use crate::genome::Genome;

/// 个体: 基因组 + 已算好的适应度
#[derive(Clone, Debug, PartialEq)]
#[derive(Serialize, Deserialize)]
pub struct Individual {
    pub genome: Genome,
    pub fitness: Fitness,
}
impl Individual {
    pub fn new(genome: Genome, fitness: Fitness) -> Individual {
        Individual { genome, fitness }
    }
}


/// 按适应度升序排好的种群, 第 0 个永远是当前最优
#[derive(Clone, Debug)]
pub struct Population {
    individuals: Vec<Individual>,
}
impl Population {
    /// 排序后构造. 排序是稳定的, 同分时保持原有先后
    pub fn sorted(mut individuals: Vec<Individual>) -> Population {
        assert!(!individuals.is_empty(), "种群不能为空!");
        individuals.sort_by_key(|ind| ind.fitness);
        Population { individuals }
    }

    pub fn best(&self) -> &Individual {
        &self.individuals[0]
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn iter(&self) -> impl Iterator<Item = &Individual> {
        self.individuals.iter()
    }

    pub fn is_sorted(&self) -> bool {
        self.individuals.windows(2).all(|w| w[0].fitness <= w[1].fitness)
    }
}
