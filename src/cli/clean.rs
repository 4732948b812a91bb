use clap::Parser;

use crate::Opts;
use crate::cache::EmbeddingCache;
use crate::cli::SubCommandExtend;

#[derive(Parser, Debug, Clone)]
pub struct CleanCommand {}

impl SubCommandExtend for CleanCommand {
    async fn run(&self, opts: &Opts) -> anyhow::Result<()> {
        let cache = EmbeddingCache::new(opts.cache_dir.path());
        let removed = cache.clear()?;
        println!("已删除 {removed} 条缓存");
        Ok(())
    }
}
