use std::fs;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use clap::Parser;
use log::info;
use tokio::task::block_in_place;

use crate::cache::{EmbeddingCache, Lookup};
use crate::cli::SubCommandExtend;
use crate::config::ModelOptions;
use crate::model::{ModelHandler, OnnxEncoder};
use crate::{Opts, phash, utils};

#[derive(Parser, Debug, Clone)]
pub struct EmbedCommand {
    /// 图片路径
    pub image: PathBuf,
    #[command(flatten)]
    pub model: ModelOptions,
    /// 把原始特征字节写入该文件，不填则输出 base64 到标准输出
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// 跳过缓存查找，强制推理
    #[arg(long)]
    pub no_cache: bool,
    /// 把推理结果写回缓存
    #[arg(long)]
    pub store: bool,
}

impl SubCommandExtend for EmbedCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let image = utils::imread(&self.image)?;
        let cache = EmbeddingCache::new(opts.cache_dir.path());

        let blob = block_in_place(|| -> anyhow::Result<_> {
            let hash = phash::p_hash(&image);
            if !self.no_cache {
                if let Lookup::Hit(blob) = cache.lookup(hash)? {
                    return Ok(blob);
                }
            }

            // 查缓存之前不加载模型，命中时可以完全跳过模型初始化
            let model = OnnxEncoder::new(&self.model)?;
            let blob = model.handle(&image)?;
            if self.store {
                let path = cache.store(hash, &blob)?;
                info!("已写入缓存 {}", path.display());
            }
            Ok(blob)
        })?;

        match &self.output {
            Some(path) => fs::write(path, &blob)?,
            None => println!("{}", BASE64.encode(&blob)),
        }
        Ok(())
    }
}
