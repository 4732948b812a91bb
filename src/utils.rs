use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;

/// 解码内存中的图像，格式根据内容自动识别
pub fn imdecode(data: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(data).context("图像解码失败")
}

/// 从文件读取并解码图像
pub fn imread(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    let data = std::fs::read(path).with_context(|| format!("读取文件失败: {}", path.display()))?;
    imdecode(&data)
}
