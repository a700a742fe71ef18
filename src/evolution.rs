//! 主循环: 随机种群 → 一代接一代地繁殖 → 记录历史最优并通知显示端.
//! 循环本身不会停, 只在代与代之间检查取消信号.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Local};
use rand::Rng;

use crate::config::GaConfig;
use crate::fitness::FitnessEvaluator;
use crate::genome::Genome;
use crate::population::{Individual, Population};
use crate::render::Renderer;
use crate::reproduction::Reproduction;

/// 协作式取消. 克隆出的副本共享同一个标志
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}
impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}


/// 运行统计
#[derive(Clone, Debug)]
pub struct Stats {
    /// 已完成的代数 (不含初始种群)
    pub generation: u64,
    /// 历史最优被刷新的次数
    pub improvements: u64,
    pub started_at: DateTime<Local>,
    /// 计时器上次重置的时刻, 以及此后完成的代数
    pub timer_started_at: DateTime<Local>,
    pub timer_generations: u64,
}
impl Stats {
    pub fn new() -> Stats {
        let now = Local::now();
        Stats {
            generation: 0,
            improvements: 0,
            started_at: now,
            timer_started_at: now,
            timer_generations: 0,
        }
    }

    pub fn elapsed(&self) -> Duration {
        Local::now() - self.started_at
    }

    /// 计时器重置以来平均每代耗时
    pub fn ms_per_generation(&self) -> f64 {
        let ms = (Local::now() - self.timer_started_at).num_milliseconds() as f64;
        ms / self.timer_generations.max(1) as f64
    }

    pub fn reset_timer(&mut self) {
        self.timer_started_at = Local::now();
        self.timer_generations = 0;
    }

    fn record_generation(&mut self) {
        self.generation += 1;
        self.timer_generations += 1;
    }
}
impl Default for Stats {
    fn default() -> Self {
        Stats::new()
    }
}


/// 显示端发回给主循环的请求
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Request {
    /// 停止运行
    Quit,
    /// 把当前最优交给 `Observer::on_dump`
    DumpFrame,
    /// 重置每代耗时的计时器
    ResetTimer,
}

/// 显示端. 主循环只保证在历史最优刷新时调用 `on_new_best`
pub trait Observer {
    fn on_new_best(&mut self, best: &Individual, stats: &Stats);

    /// 每代结束时询问一次有没有请求
    fn poll(&mut self, _stats: &Stats) -> Option<Request> {
        None
    }

    fn on_dump(&mut self, _best: &Individual, _stats: &Stats) {}
}

/// 什么都不显示
pub struct Silent;
impl Observer for Silent {
    fn on_new_best(&mut self, _best: &Individual, _stats: &Stats) {}
}


#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Init,
    Running,
    Terminal,
}


pub struct Evolution<R: Renderer, G: Rng> {
    config: GaConfig,
    reproduction: Reproduction,
    evaluator: FitnessEvaluator<R>,
    rng: G,
    population: Option<Population>,
    best: Option<Individual>,
    stats: Stats,
    phase: Phase,
}

impl<R: Renderer, G: Rng> Evolution<R, G> {
    /// config 需事先 validate 过, 否则 panic
    pub fn new(config: GaConfig, evaluator: FitnessEvaluator<R>, rng: G) -> Evolution<R, G> {
        let reproduction = Reproduction::new(&config);
        Evolution {
            config,
            reproduction,
            evaluator,
            rng,
            population: None,
            best: None,
            stats: Stats::new(),
            phase: Phase::Init,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn config(&self) -> &GaConfig {
        &self.config
    }

    /// 历史最优 (初始化之前为 None)
    pub fn best(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    pub fn population(&self) -> Option<&Population> {
        self.population.as_ref()
    }

    /// 生成随机种群并评估, 记下初始最优
    pub fn seed(&mut self) -> &Individual {
        let layout = self.config.layout();
        let genomes: Vec<Genome> = (0..self.config.population_size)
            .map(|_| Genome::random(layout, &mut self.rng))
            .collect();
        let scores = self.evaluator.evaluate_all(&genomes);
        let population = Population::sorted(
            genomes.into_iter().zip(scores).map(|(g, f)| Individual::new(g, f)).collect(),
        );
        let best = population.best().clone();
        log::info!("初始种群就绪: {} 个个体, 最优适应度 = {}", population.len(), best.fitness);

        self.population = Some(population);
        self.stats = Stats::new();
        self.phase = Phase::Running;
        self.best.insert(best)
    }

    /// 跑一代. 历史最优被严格刷新时返回 true
    pub fn step(&mut self) -> bool {
        if self.population.is_none() {
            self.seed();
        }
        let current = match self.population.take() {
            Some(population) => population,
            None => unreachable!("seed 之后种群一定存在"),
        };
        let next = self.reproduction.next_generation(&current, &mut self.evaluator, &mut self.rng);
        self.stats.record_generation();

        let improved = match &self.best {
            Some(best) => next.best().fitness < best.fitness,
            None => true,
        };
        if improved {
            self.stats.improvements += 1;
            self.best = Some(next.best().clone());
            log::debug!(
                "第 {} 代刷新最优: 适应度 = {}",
                self.stats.generation,
                next.best().fitness
            );
        }
        self.population = Some(next);
        improved
    }

    /// 一直跑到 token 被取消. 返回时处于 Terminal 状态
    pub fn run<O: Observer + ?Sized>(&mut self, observer: &mut O, token: &CancellationToken) -> Stats {
        if self.phase == Phase::Init {
            self.seed();
        }
        if let Some(best) = &self.best {
            observer.on_new_best(best, &self.stats);
        }

        while !token.is_cancelled() {
            if self.step() {
                if let Some(best) = &self.best {
                    observer.on_new_best(best, &self.stats);
                }
            }
            if let Some(request) = observer.poll(&self.stats) {
                self.handle(request, observer, token);
            }
        }

        self.phase = Phase::Terminal;
        log::info!(
            "运行结束: {} 代, {} 次刷新, 耗时 {} 秒",
            self.stats.generation,
            self.stats.improvements,
            self.stats.elapsed().num_seconds()
        );
        self.stats.clone()
    }

    fn handle<O: Observer + ?Sized>(&mut self, request: Request, observer: &mut O, token: &CancellationToken) {
        match request {
            Request::Quit => token.cancel(),
            Request::DumpFrame => {
                if let Some(best) = &self.best {
                    observer.on_dump(best, &self.stats);
                }
            }
            Request::ResetTimer => {
                log::info!("重置计时器: 此前平均 {:.2} ms/代", self.stats.ms_per_generation());
                self.stats.reset_timer();
            }
        }
    }
}
