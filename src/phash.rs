use std::f64::consts::PI;

use image::DynamicImage;
use image::imageops::FilterType;

pub type PHash = u64;

/// DCT 缩减后的图像边长
const IMG_SIZE: usize = 32;
/// 哈希对应的低频区块边长
const HASH_SIZE: usize = 8;

/// 计算图像的 64 位感知哈希
///
/// 算法与经典的 `imagehash.phash` 保持一致：灰度化并缩放到 32x32，
/// 做二维 DCT-II，取左上 8x8 低频区块，以中位数为阈值生成比特。
/// 比特按行优先、高位在前打包，因此 `{:016x}` 的十六进制串与
/// imagehash 的字符串表示相同。
pub fn p_hash(image: &DynamicImage) -> PHash {
    let gray = image::imageops::resize(
        &image.to_luma8(),
        IMG_SIZE as u32,
        IMG_SIZE as u32,
        FilterType::Lanczos3,
    );

    let mut pixels = [0f64; IMG_SIZE * IMG_SIZE];
    for (i, p) in gray.pixels().enumerate() {
        pixels[i] = p.0[0] as f64;
    }

    let freq = dct_low_freq(&pixels);

    let mut sorted = freq;
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let median = (sorted[HASH_SIZE * HASH_SIZE / 2 - 1] + sorted[HASH_SIZE * HASH_SIZE / 2]) / 2.0;

    let mut hash = 0u64;
    for v in freq {
        hash <<= 1;
        hash |= (v > median) as u64;
    }
    hash
}

/// 哈希的十六进制形式，用作缓存文件名前缀
pub fn to_hex(hash: PHash) -> String {
    format!("{hash:016x}")
}

/// 按定义计算二维 DCT-II 的左上 8x8 低频区块
///
/// 只需要 64 个系数，输入也只有 32x32，直接展开计算即可，
/// 不值得引入 FFT。缩放系数对中位数阈值没有影响，全部省略。
fn dct_low_freq(pixels: &[f64; IMG_SIZE * IMG_SIZE]) -> [f64; HASH_SIZE * HASH_SIZE] {
    let n = IMG_SIZE as f64;
    let mut out = [0f64; HASH_SIZE * HASH_SIZE];
    for u in 0..HASH_SIZE {
        for v in 0..HASH_SIZE {
            let mut sum = 0f64;
            for y in 0..IMG_SIZE {
                let cy = (PI * (2 * y + 1) as f64 * u as f64 / (2.0 * n)).cos();
                for x in 0..IMG_SIZE {
                    let cx = (PI * (2 * x + 1) as f64 * v as f64 / (2.0 * n)).cos();
                    sum += pixels[y * IMG_SIZE + x] * cy * cx;
                }
            }
            out[u * HASH_SIZE + v] = sum;
        }
    }
    out
}
