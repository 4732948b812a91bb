use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};

use crate::cli::*;

/// 嵌入缓存的默认目录
pub const DEFAULT_CACHE_DIR: &str = "/var/lib/sam-model/embeddings";

#[derive(Parser, Debug, Clone)]
pub struct ModelOptions {
    /// 图像编码器 ONNX 模型文件路径
    #[arg(short, long, value_name = "FILE", default_value = "encoder.onnx")]
    pub model: PathBuf,
    /// 模型输入尺寸，图像最长边会被缩放到该尺寸
    #[arg(long, value_name = "N", default_value_t = 1024)]
    pub input_size: u32,
    /// 推理线程数
    #[arg(long, value_name = "N", default_value_t = 4)]
    pub threads: usize,
    /// 不尝试 CUDA，直接使用 CPU 推理
    #[arg(long)]
    pub no_cuda: bool,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "imembed", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// 嵌入缓存目录
    #[arg(short, long, default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: CacheDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 启动 HTTP 嵌入服务
    Server(ServerCommand),
    /// 计算单张图片的特征嵌入
    Embed(EmbedCommand),
    /// 清空嵌入缓存
    Clean(CleanCommand),
}

/// 缓存目录路径，实现 `FromStr` 以便作为 clap 参数使用
#[derive(Debug, Clone)]
pub struct CacheDir {
    path: PathBuf,
}

impl CacheDir {
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }
}

impl FromStr for CacheDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}
