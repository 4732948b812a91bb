mod onnx;

use anyhow::Result;
use image::DynamicImage;

pub use self::onnx::{OnnxEncoder, preprocess};

/// 嵌入模型的抽象接口
///
/// 模型本身是外部协作方，这里只约定调用方式：输入一张解码后的图像，
/// 输出小端 f32 特征张量的原始字节。
pub trait ModelHandler: Send + Sync {
    fn handle(&self, image: &DynamicImage) -> Result<Vec<u8>>;
}
