//! 由排好序的上一代产生下一代:
//! 选精英, 两两配对按多边形块交叉, 逐基因变异, 不足的名额由上一代前几名补齐, 最后排序.

use rand::Rng;
use rand_distr::{Distribution, Uniform};

use crate::config::GaConfig;
use crate::fitness::FitnessEvaluator;
use crate::genome::{Genome, GenomeLayout};
use crate::population::{Individual, Population};
use crate::render::Renderer;
use crate::util::{random, UnitFloat};

/// 繁殖参数, 由配置一次性算好
#[derive(Clone, Debug)]
pub struct Reproduction {
    layout: GenomeLayout,
    population_size: usize,
    elite_count: usize,
    children_per_parent: usize,
    mutation_chance: f64,
    perturbation: Uniform<f32>,
}

impl Reproduction {
    /// 超参数非法时直接 panic: 精英不足两个时找不到配偶, 配对会死循环
    pub fn new(config: &GaConfig) -> Reproduction {
        if let Err(e) = config.validate() {
            panic!("非法的超参数: {}", e);
        }
        Reproduction {
            layout: config.layout(),
            population_size: config.population_size,
            elite_count: config.elite_count(),
            children_per_parent: config.children_per_parent(),
            mutation_chance: config.mutation_chance,
            perturbation: Uniform::new_inclusive(-config.mutation_amount, config.mutation_amount),
        }
    }

    pub fn elite_count(&self) -> usize {
        self.elite_count
    }

    /// 配对表: 按产仔顺序给出 (精英 i, 随机的另一个精英).
    /// 产仔数超过种群大小时只保留最先产出的那些.
    pub fn mating_plan<G: Rng + ?Sized>(&self, rng: &mut G) -> Vec<(usize, usize)> {
        let mut plan = Vec::with_capacity(self.elite_count * self.children_per_parent);
        for i in 0..self.elite_count {
            for _ in 0..self.children_per_parent {
                plan.push((i, random::index_except(rng, self.elite_count, i)));
            }
        }
        plan.truncate(self.population_size);
        plan
    }

    /// 按多边形块均匀交叉: 每块整块来自父亲或母亲
    pub fn crossover<G: Rng + ?Sized>(&self, father: &Genome, mother: &Genome, rng: &mut G) -> Vec<f32> {
        debug_assert!(father.layout() == self.layout && mother.layout() == self.layout);
        let mut genes = Vec::with_capacity(self.layout.genome_len());
        for which in 0..self.layout.shape_count {
            let ancestor = if random::coin(rng) { father } else { mother };
            genes.extend_from_slice(ancestor.block(which));
        }
        genes
    }

    /// 每个基因以 mutationChance 的概率加上 U(-amount, amount) 的扰动, 再截断到 [0, 1]
    pub fn mutate<G: Rng + ?Sized>(&self, genes: &mut [f32], rng: &mut G) {
        for gene in genes.iter_mut() {
            if random::chance(rng, self.mutation_chance) {
                *gene = gene.nudged(self.perturbation.sample(rng));
            }
        }
    }

    /// 一个新的子代基因组
    pub fn breed<G: Rng + ?Sized>(&self, father: &Genome, mother: &Genome, rng: &mut G) -> Genome {
        let mut genes = self.crossover(father, mother, rng);
        self.mutate(&mut genes, rng);
        Genome::from_raw(self.layout, genes)
    }

    /// 按配对表产出全部子代基因组, 顺序与配对表一致
    pub fn offspring<G: Rng + ?Sized>(&self, population: &Population, rng: &mut G) -> Vec<Genome> {
        let elites = &population.individuals()[..self.elite_count];
        self.mating_plan(rng)
            .into_iter()
            .map(|(i, j)| self.breed(&elites[i].genome, &elites[j].genome, &mut *rng))
            .collect()
    }

    /// 完整的一代: 产仔 → 评估 → 用上一代前几名补齐 → 排序
    pub fn next_generation<R: Renderer, G: Rng + ?Sized>(
        &self,
        population: &Population,
        evaluator: &mut FitnessEvaluator<R>,
        rng: &mut G,
    ) -> Population {
        debug_assert!(population.is_sorted(), "上一代必须已经排好序!");
        debug_assert!(population.len() >= self.elite_count);

        let genomes = self.offspring(population, rng);
        let scores = evaluator.evaluate_all(&genomes);

        let mut next: Vec<Individual> = Vec::with_capacity(self.population_size);
        next.extend(genomes.into_iter().zip(scores).map(|(g, f)| Individual::new(g, f)));

        // 保底: 上一代从第 0 名开始按顺序复制, 已有适应度不必重算
        let missing = self.population_size - next.len();
        next.extend(population.iter().take(missing).cloned());

        let next = Population::sorted(next);
        debug_assert_eq!(next.len(), self.population_size);
        next
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Raster;
    use crate::render::ScanlineRenderer;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn small_config() -> GaConfig {
        GaConfig {
            shape_count: 6,
            vertex_count: 3,
            work_width: 8,
            work_height: 8,
            ..GaConfig::default()
        }
    }

    fn seeded_population(config: &GaConfig, evaluator: &mut FitnessEvaluator<ScanlineRenderer>, rng: &mut StdRng) -> Population {
        let individuals = (0..config.population_size)
            .map(|_| {
                let genome = Genome::random(config.layout(), &mut *rng);
                let fitness = evaluator.evaluate(&genome);
                Individual::new(genome, fitness)
            })
            .collect();
        Population::sorted(individuals)
    }

    fn evaluator() -> FitnessEvaluator<ScanlineRenderer> {
        FitnessEvaluator::new(ScanlineRenderer, Raster::filled(8, 8, 0xff80_4020))
    }

    #[test]
    fn default_plan_has_seven_children_per_elite() {
        let reproduction = Reproduction::new(&GaConfig::default());
        let mut rng = StdRng::seed_from_u64(1);
        let plan = reproduction.mating_plan(&mut rng);
        assert_eq!(reproduction.elite_count(), 7);
        assert_eq!(plan.len(), 49);
        for (k, &(i, j)) in plan.iter().enumerate() {
            assert_eq!(i, k / 7);
            assert_ne!(i, j);
            assert!(j < 7);
        }
    }

    #[test]
    fn overflowing_plan_keeps_first_produced() {
        // 10 · 0.3 = 3 个精英, 每个 ceil(1 / 0.3) = 4 个孩子, 共 12 > 10
        let config = GaConfig { population_size: 10, selection_cutoff: 0.3, ..small_config() };
        assert_eq!(config.offspring_count(), 12);
        let reproduction = Reproduction::new(&config);
        let mut rng = StdRng::seed_from_u64(4);
        let firsts: Vec<usize> = reproduction.mating_plan(&mut rng).iter().map(|p| p.0).collect();
        assert_eq!(firsts, vec![0, 0, 0, 0, 1, 1, 1, 1, 2, 2]);
    }

    #[test]
    fn crossover_without_mutation_copies_whole_blocks() {
        let config = GaConfig { mutation_chance: 0.0, shape_count: 40, ..small_config() };
        let reproduction = Reproduction::new(&config);
        let mut rng = StdRng::seed_from_u64(6);
        let father = Genome::random(config.layout(), &mut rng);
        let mother = Genome::random(config.layout(), &mut rng);
        let (mut from_father, mut from_mother) = (0, 0);
        for _ in 0..20 {
            let child = reproduction.breed(&father, &mother, &mut rng);
            for which in 0..config.shape_count {
                let block = child.block(which);
                let f = block == father.block(which);
                let m = block == mother.block(which);
                assert!(f ^ m, "block {} 必须恰好来自一方", which);
                if f { from_father += 1 } else { from_mother += 1 }
            }
        }
        assert!(from_father > 300 && from_mother > 300, "{} / {}", from_father, from_mother);
    }

    #[test]
    fn mutation_is_bounded_and_clamped() {
        let config = GaConfig { mutation_chance: 1.0, mutation_amount: 0.1, ..small_config() };
        let reproduction = Reproduction::new(&config);
        let mut rng = StdRng::seed_from_u64(12);
        let mut genes = vec![0.0, 1.0, 0.5, 0.95, 0.05];
        let before = genes.clone();
        reproduction.mutate(&mut genes, &mut rng);
        for (new, old) in genes.iter().zip(&before) {
            assert!((0.0..=1.0).contains(new));
            assert!((new - old).abs() <= 0.1 + 1e-6);
        }
    }

    #[test]
    fn zero_mutation_chance_changes_nothing() {
        let config = GaConfig { mutation_chance: 0.0, ..small_config() };
        let reproduction = Reproduction::new(&config);
        let mut rng = StdRng::seed_from_u64(13);
        let mut genes = vec![0.3; 20];
        reproduction.mutate(&mut genes, &mut rng);
        assert!(genes.iter().all(|&g| g == 0.3));
    }

    #[test]
    fn children_stay_well_formed() {
        let config = GaConfig { mutation_chance: 0.5, mutation_amount: 0.8, ..small_config() };
        let reproduction = Reproduction::new(&config);
        let mut rng = StdRng::seed_from_u64(14);
        let a = Genome::random(config.layout(), &mut rng);
        let b = Genome::random(config.layout(), &mut rng);
        for _ in 0..200 {
            let child = reproduction.breed(&a, &b, &mut rng);
            assert_eq!(child.genes().len(), config.layout().genome_len());
            assert!(child.is_valid());
        }
    }

    #[test]
    fn next_generation_is_full_and_sorted() {
        let config = small_config();
        let reproduction = Reproduction::new(&config);
        let mut evaluator = evaluator();
        let mut rng = StdRng::seed_from_u64(15);
        let mut population = seeded_population(&config, &mut evaluator, &mut rng);
        for _ in 0..5 {
            let previous_best = population.best().clone();
            population = reproduction.next_generation(&population, &mut evaluator, &mut rng);
            assert_eq!(population.len(), config.population_size);
            assert!(population.is_sorted());
            // 49 个孩子 + 1 个保底, 上一代的第 0 名一定还在
            assert!(population.iter().any(|ind| *ind == previous_best));
            assert!(population.best().fitness <= previous_best.fitness);
        }
    }

    #[test]
    fn scores_match_fresh_evaluation() {
        let config = small_config();
        let reproduction = Reproduction::new(&config);
        let mut evaluator = evaluator();
        let mut rng = StdRng::seed_from_u64(16);
        let population = seeded_population(&config, &mut evaluator, &mut rng);
        let next = reproduction.next_generation(&population, &mut evaluator, &mut rng);
        for ind in next.iter() {
            assert_eq!(evaluator.evaluate(&ind.genome), ind.fitness);
        }
    }

    #[test]
    fn overflow_generation_is_truncated_to_population_size() {
        let config = GaConfig { population_size: 10, selection_cutoff: 0.3, ..small_config() };
        let reproduction = Reproduction::new(&config);
        let mut evaluator = evaluator();
        let mut rng = StdRng::seed_from_u64(17);
        let population = seeded_population(&config, &mut evaluator, &mut rng);
        let next = reproduction.next_generation(&population, &mut evaluator, &mut rng);
        assert_eq!(next.len(), 10);
        assert!(next.is_sorted());
    }

    #[test]
    #[should_panic(expected = "非法的超参数")]
    fn single_elite_config_is_refused() {
        // floor(10 · 0.1) = 1 个精英, 没有可以配对的另一方
        Reproduction::new(&GaConfig { population_size: 10, selection_cutoff: 0.1, ..small_config() });
    }

    /// 数一数 render 被调用了几次
    struct CountingRenderer {
        calls: AtomicUsize,
    }
    impl Renderer for CountingRenderer {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn render(&self, genome: &Genome, out: &mut Raster) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            ScanlineRenderer.render(genome, out);
        }
    }

    #[test]
    fn padded_survivors_are_not_rescored() {
        let config = small_config();
        let reproduction = Reproduction::new(&config);
        let renderer = CountingRenderer { calls: AtomicUsize::new(0) };
        let mut evaluator = FitnessEvaluator::new(renderer, Raster::filled(8, 8, 0xff80_4020));
        let mut rng = StdRng::seed_from_u64(18);

        let genomes: Vec<Genome> = (0..config.population_size)
            .map(|_| Genome::random(config.layout(), &mut rng))
            .collect();
        let scores = evaluator.evaluate_all(&genomes);
        let mut population = Population::sorted(
            genomes.into_iter().zip(scores).map(|(g, f)| Individual::new(g, f)).collect(),
        );
        assert_eq!(evaluator.renderer().calls.load(Ordering::SeqCst), 50);

        for round in 1..=3 {
            population = reproduction.next_generation(&population, &mut evaluator, &mut rng);
            // 只有 49 个孩子需要渲染, 补进来的第 0 名沿用旧分数
            assert_eq!(evaluator.renderer().calls.load(Ordering::SeqCst), 50 + 49 * round);
        }
    }
}
