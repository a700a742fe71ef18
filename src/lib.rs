//! 用一群半透明多边形逼近一张目标图片: 代际遗传算法,
//! 适应度为渲染结果与目标图的逐像素平方差.

pub mod config;
pub mod display;
pub mod error;
pub mod evolution;
pub mod fitness;
pub mod genome;
pub mod loader;
pub mod population;
pub mod raster;
pub mod render;
pub mod reproduction;
pub mod util;

pub use config::GaConfig;
pub use error::{EvopaintError, Result};
pub use evolution::{CancellationToken, Evolution, Observer, Phase, Request, Stats};
pub use fitness::{Fitness, FitnessEvaluator};
pub use genome::{Genome, GenomeLayout};
pub use population::{Individual, Population};
pub use raster::Raster;
pub use render::{Backend, Renderer};
pub use reproduction::Reproduction;
