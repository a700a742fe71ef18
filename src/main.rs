use std::path::PathBuf;

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;

use evopaint::display::{spawn_stdin_commands, ConsoleDisplay};
use evopaint::loader;
use evopaint::{Backend, CancellationToken, Evolution, FitnessEvaluator, GaConfig};

const SAMPLE_IMAGE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/sample.png");

/// 用一群半透明多边形逼近一张图片
#[derive(Parser, Debug)]
#[command(name = "evopaint", version)]
struct Cli {
    /// 渲染后端
    backend: Option<Backend>,

    /// 目标图片, 缺省时使用自带的示例图
    image: Option<PathBuf>,

    /// TOML 格式的超参数文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 随机种子
    #[arg(long)]
    seed: Option<u64>,

    /// 跑满多少代后停止 (缺省一直跑)
    #[arg(long)]
    max_generations: Option<u64>,

    /// 快照输出目录
    #[arg(long, default_value = "result")]
    out_dir: PathBuf,

    /// 每刷新多少次最优保存一次快照, 0 表示不保存
    #[arg(long, default_value_t = 50)]
    snapshot_every: u64,

    /// 每多少代打印一次进度, 0 表示不打印
    #[arg(long, default_value_t = 200)]
    report_every: u64,

    /// 并行计算适应度
    #[arg(long)]
    parallel: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let backend = match cli.backend {
        Some(backend) => backend,
        None => {
            println!("请指定渲染后端作为第一个参数: \"cpu\" 或 \"skia\"");
            return Ok(());
        }
    };

    // 设定种群超参数
    let mut config = match &cli.config {
        Some(path) => GaConfig::from_toml_file(path)
            .with_context(|| format!("无法读取配置文件 {}", path.display()))?,
        None => GaConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.parallel |= cli.parallel;
    config.validate()?;

    // 读取目标图片
    let image = cli.image.unwrap_or_else(|| PathBuf::from(SAMPLE_IMAGE));
    let target = loader::load_target(&image, config.work_width, config.work_height)?;

    let renderer = backend.create(config.work_width, config.work_height)?;
    let evaluator = FitnessEvaluator::new(renderer, target.raster.clone()).with_parallel(config.parallel);
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    log::info!("后端 {}, 超参数 {:?}", backend, config);

    let (w, h) = target.dimensions();
    let run_dir = cli.out_dir.join(Local::now().format("%Y%m%d-%H%M%S").to_string());
    let mut display = ConsoleDisplay::new(backend.create(w, h)?, (w, h))
        .with_snapshots(run_dir.clone(), cli.snapshot_every)
        .with_report_every(cli.report_every)
        .with_max_generations(cli.max_generations)
        .with_commands(spawn_stdin_commands());

    // 第一次 Ctrl-C 在代与代之间停下, 第二次直接退出
    let token = CancellationToken::new();
    let interrupt = token.clone();
    ctrlc::set_handler(move || {
        if interrupt.is_cancelled() {
            std::process::exit(130);
        }
        log::info!("收到中断信号, 本代结束后停止");
        interrupt.cancel();
    })
    .context("无法安装 Ctrl-C 处理函数")?;
    log::info!("输入 q 回车退出, r 保存当前帧, i 重置计时器");

    let mut evolution = Evolution::new(config, evaluator, rng);
    evolution.run(&mut display, &token);

    if let Some(best) = evolution.best() {
        let path = display
            .write_snapshot(&run_dir, "final", best)
            .context("无法保存最终结果")?;
        log::info!("最终适应度 = {}, 结果已保存到 {}", best.fitness, path.display());
    }
    Ok(())
}
