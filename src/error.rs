use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvopaintError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("无法读取目标图片 {}: {source}", path.display())]
    TargetLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("渲染器初始化失败: {0}")]
    Renderer(String),

    #[error("图片错误: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML 错误: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, EvopaintError>;
