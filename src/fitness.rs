use rayon::prelude::*;

use crate::genome::Genome;
use crate::raster::Raster;
use crate::render::Renderer;

/// 适应度: 渲染结果与目标图的逐通道平方差之和, 越小越好
pub type Fitness = u64;

/// 把基因组画到工作分辨率的画布上, 再与目标图比较
pub struct FitnessEvaluator<R: Renderer> {
    renderer: R,
    target: Raster,
    scratch: Raster,
    parallel: bool,
}

impl<R: Renderer> FitnessEvaluator<R> {
    pub fn new(renderer: R, target: Raster) -> FitnessEvaluator<R> {
        let scratch = Raster::new(target.width(), target.height());
        FitnessEvaluator {
            renderer,
            target,
            scratch,
            parallel: false,
        }
    }

    /// 批量评估时用 rayon 并行, 每个工作线程有自己的画布
    pub fn with_parallel(mut self, parallel: bool) -> FitnessEvaluator<R> {
        self.parallel = parallel;
        self
    }

    pub fn target(&self) -> &Raster {
        &self.target
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// 单个基因组的适应度, 复用同一块画布
    pub fn evaluate(&mut self, genome: &Genome) -> Fitness {
        self.renderer.render(genome, &mut self.scratch);
        self.scratch.diff(&self.target)
    }

    /// 按输入顺序返回每个基因组的适应度
    pub fn evaluate_all(&mut self, genomes: &[Genome]) -> Vec<Fitness> {
        if !self.parallel {
            return genomes.iter().map(|g| self.evaluate(g)).collect();
        }
        let renderer = &self.renderer;
        let target = &self.target;
        let (w, h) = (target.width(), target.height());
        genomes
            .par_iter()
            .map_init(
                || Raster::new(w, h),
                |scratch, genome| {
                    renderer.render(genome, scratch);
                    scratch.diff(target)
                },
            )
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::GenomeLayout;
    use crate::raster::OPAQUE_BLACK;
    use crate::render::{Backend, ScanlineRenderer};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gray_target() -> Raster {
        Raster::filled(12, 9, 0xff40_4040)
    }

    #[test]
    fn evaluate_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(2);
        let genome = Genome::random(GenomeLayout::new(20, 3), &mut rng);
        let mut evaluator = FitnessEvaluator::new(ScanlineRenderer, gray_target());
        let first = evaluator.evaluate(&genome);
        let other = Genome::random(GenomeLayout::new(20, 3), &mut rng);
        evaluator.evaluate(&other);
        assert_eq!(evaluator.evaluate(&genome), first);
    }

    #[test]
    fn invisible_genome_scores_black_canvas() {
        let genome = Genome::from_genes(GenomeLayout::new(1, 3), vec![0.0; 10]);
        let target = gray_target();
        let expected = Raster::new(12, 9).diff(&target);
        let mut evaluator = FitnessEvaluator::new(ScanlineRenderer, target);
        assert_eq!(evaluator.evaluate(&genome), expected);
        assert_eq!(expected, 12 * 9 * 3 * 0x40 * 0x40);
    }

    #[test]
    fn matching_render_scores_zero() {
        let genome = Genome::from_genes(GenomeLayout::new(1, 3), vec![0.0; 10]);
        let mut evaluator = FitnessEvaluator::new(ScanlineRenderer, Raster::filled(3, 3, OPAQUE_BLACK));
        assert_eq!(evaluator.evaluate(&genome), 0);
    }

    #[test]
    fn parallel_batch_matches_sequential() {
        let mut rng = StdRng::seed_from_u64(8);
        let genomes: Vec<Genome> = (0..16)
            .map(|_| Genome::random(GenomeLayout::new(10, 4), &mut rng))
            .collect();
        let renderer = Backend::Cpu.create(12, 9).unwrap();
        let mut sequential = FitnessEvaluator::new(renderer, gray_target());
        let expected: Vec<Fitness> = genomes.iter().map(|g| sequential.evaluate(g)).collect();

        let renderer = Backend::Skia.create(12, 9).unwrap();
        let mut skia_seq = FitnessEvaluator::new(renderer, gray_target());
        let skia_expected = skia_seq.evaluate_all(&genomes);
        let renderer = Backend::Skia.create(12, 9).unwrap();
        let mut skia_par = FitnessEvaluator::new(renderer, gray_target()).with_parallel(true);
        assert_eq!(skia_par.evaluate_all(&genomes), skia_expected);

        let mut parallel = FitnessEvaluator::new(ScanlineRenderer, gray_target()).with_parallel(true);
        assert_eq!(parallel.evaluate_all(&genomes), expected);
    }
}
