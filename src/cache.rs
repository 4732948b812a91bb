use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use log::info;

use crate::phash::{self, PHash};

/// 缓存查找的三种结果
///
/// 感知哈希允许冲突：同一个哈希前缀匹配到多个文件时不做区分，
/// 当作未命中处理，由调用方重新推理。
#[derive(Debug)]
pub enum Lookup {
    Hit(Vec<u8>),
    Miss,
    Collision,
}

/// 以感知哈希为键的文件系统嵌入缓存
///
/// 文件名格式为 `<16位十六进制哈希>_<后缀>`，后缀仅用于区分同哈希的
/// 不同产物。没有淘汰策略，除写入时的原子重命名外也没有并发控制。
pub struct EmbeddingCache {
    dir: PathBuf,
}

impl EmbeddingCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 查找哈希对应的嵌入
    ///
    /// 缓存目录不存在时视为未命中，不报错。
    pub fn lookup(&self, hash: PHash) -> Result<Lookup> {
        let prefix = format!("{}_", phash::to_hex(hash));

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => {
                info!("缓存未命中 {}", phash::to_hex(hash));
                return Ok(Lookup::Miss);
            }
        };

        let mut hits = vec![];
        for entry in entries {
            let entry = entry?;
            if entry.file_name().to_string_lossy().starts_with(&prefix) {
                hits.push(entry.path());
            }
        }

        match hits.as_slice() {
            [path] => {
                info!("缓存命中 {}", path.display());
                Ok(Lookup::Hit(fs::read(path)?))
            }
            [] => {
                info!("缓存未命中 {}", phash::to_hex(hash));
                Ok(Lookup::Miss)
            }
            _ => {
                info!("缓存哈希冲突 {}", phash::to_hex(hash));
                Ok(Lookup::Collision)
            }
        }
    }

    /// 写入一条嵌入，返回最终路径
    ///
    /// 后缀取自 blob 的 blake3 哈希，同一内容重复写入是幂等的。
    /// 先写临时文件再重命名，保证读取方不会看到半个文件。
    pub fn store(&self, hash: PHash, blob: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let suffix = blake3::hash(blob).to_hex();
        let name = format!("{}_{}", phash::to_hex(hash), &suffix[..8]);
        let path = self.dir.join(&name);
        // 临时文件以 . 开头，避免被当作另一个候选造成假冲突
        let tmp = self.dir.join(format!(".{name}.tmp"));
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// 清空缓存，返回删除的文件数量
    pub fn clear(&self) -> Result<usize> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(0),
        };

        let mut removed = 0;
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
