use std::fs::{self, File};
use std::io::{self, BufRead, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::error::Result;
use crate::evolution::{Observer, Request, Stats};
use crate::population::Individual;
use crate::raster::Raster;
use crate::render::Renderer;

/// 命令行下的"显示端": 定期打印进度, 把最优个体按原图尺寸画成 PNG 并存一份 JSON
pub struct ConsoleDisplay<R: Renderer> {
    renderer: R,
    /// 快照的像素尺寸 (通常是原图尺寸)
    frame_size: (u32, u32),
    out_dir: Option<PathBuf>,
    /// 每刷新多少次最优存一次快照, 0 表示不存
    snapshot_every: u64,
    /// 每多少代打印一次进度, 0 表示不打印
    report_every: u64,
    max_generations: Option<u64>,
    /// 键盘命令, 每代取一条
    commands: Option<Receiver<Request>>,
}

/// 一行键盘输入对应的请求: q 退出, r 导出当前帧, i 重置计时器
pub fn parse_command(line: &str) -> Option<Request> {
    match line.trim().to_ascii_lowercase().as_str() {
        "q" | "quit" | "esc" => Some(Request::Quit),
        "r" => Some(Request::DumpFrame),
        "i" => Some(Request::ResetTimer),
        _ => None,
    }
}

/// 后台线程逐行读 stdin, 认得的命令送进通道. stdin 关闭后线程自行结束
pub fn spawn_stdin_commands() -> Receiver<Request> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            match parse_command(&line) {
                Some(request) => {
                    if tx.send(request).is_err() {
                        break;
                    }
                }
                None => log::warn!("未知命令 {:?}: q 退出, r 保存当前帧, i 重置计时器", line.trim()),
            }
        }
    });
    rx
}

impl<R: Renderer> ConsoleDisplay<R> {
    pub fn new(renderer: R, frame_size: (u32, u32)) -> ConsoleDisplay<R> {
        ConsoleDisplay {
            renderer,
            frame_size,
            out_dir: None,
            snapshot_every: 0,
            report_every: 0,
            max_generations: None,
            commands: None,
        }
    }

    pub fn with_snapshots(mut self, out_dir: PathBuf, every: u64) -> ConsoleDisplay<R> {
        self.out_dir = Some(out_dir);
        self.snapshot_every = every;
        self
    }

    pub fn with_report_every(mut self, every: u64) -> ConsoleDisplay<R> {
        self.report_every = every;
        self
    }

    pub fn with_max_generations(mut self, limit: Option<u64>) -> ConsoleDisplay<R> {
        self.max_generations = limit;
        self
    }

    pub fn with_commands(mut self, commands: Receiver<Request>) -> ConsoleDisplay<R> {
        self.commands = Some(commands);
        self
    }

    /// 把个体画到原图尺寸的画布上
    pub fn frame(&self, best: &Individual) -> Raster {
        let (w, h) = self.frame_size;
        let mut raster = Raster::new(w, h);
        self.renderer.render(&best.genome, &mut raster);
        raster
    }

    /// 写出 `<name>.png` 和 `<name>.json`, 返回 PNG 路径
    pub fn write_snapshot(&self, dir: &Path, name: &str, best: &Individual) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let png = dir.join(format!("{}.png", name));
        self.frame(best).to_image().save(&png)?;
        let json = File::create(dir.join(format!("{}.json", name)))?;
        serde_json::to_writer_pretty(BufWriter::new(json), best)?;
        Ok(png)
    }

    fn snapshot(&self, name: &str, best: &Individual) {
        if let Some(dir) = &self.out_dir {
            match self.write_snapshot(dir, name, best) {
                Ok(path) => log::info!("快照已保存: {}", path.display()),
                Err(e) => log::warn!("快照保存失败: {}", e),
            }
        }
    }
}

impl<R: Renderer> Observer for ConsoleDisplay<R> {
    fn on_new_best(&mut self, best: &Individual, stats: &Stats) {
        log::debug!("best: {} fitness: {}", stats.improvements, best.fitness);
        if self.snapshot_every > 0 && stats.improvements % self.snapshot_every == 0 {
            self.snapshot(&format!("best_{:06}", stats.improvements), best);
        }
    }

    fn poll(&mut self, stats: &Stats) -> Option<Request> {
        if self.report_every > 0 && stats.generation % self.report_every == 0 {
            log::info!(
                "best: {} total: {} speed: {:.1} ms/gen elapsed: {}",
                stats.improvements,
                stats.generation,
                stats.ms_per_generation(),
                stats.elapsed().num_seconds()
            );
        }
        if let Some(limit) = self.max_generations {
            if stats.generation >= limit {
                return Some(Request::Quit);
            }
        }
        let commands = self.commands.as_ref()?;
        match commands.try_recv() {
            Ok(request) => Some(request),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.commands = None;
                None
            }
        }
    }

    fn on_dump(&mut self, best: &Individual, stats: &Stats) {
        self.snapshot(&format!("dump_{:08}", stats.generation), best);
    }
}
