use std::sync::Mutex;

use anyhow::{Context, Result};
use image::DynamicImage;
use image::imageops::FilterType;
use log::{info, warn};
use ndarray::Array4;
use ort::execution_providers::{CPUExecutionProvider, CUDAExecutionProvider};
use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Value;

use super::ModelHandler;
use crate::config::ModelOptions;

/// SAM 图像编码器的像素归一化均值（RGB 顺序）
const PIXEL_MEAN: [f32; 3] = [123.675, 116.28, 103.53];
/// SAM 图像编码器的像素归一化标准差（RGB 顺序）
const PIXEL_STD: [f32; 3] = [58.395, 57.12, 57.375];

/// 基于 ONNX Runtime 的 SAM 图像编码器
pub struct OnnxEncoder {
    session: Mutex<Session>,
    input_name: String,
    input_size: u32,
}

impl OnnxEncoder {
    /// 加载 ONNX 模型，优先尝试 CUDA，失败则回退到 CPU
    pub fn new(opts: &ModelOptions) -> Result<Self> {
        anyhow::ensure!(opts.model.exists(), "模型文件不存在: {}", opts.model.display());

        let session = if opts.no_cuda {
            Self::build_session(opts, CPUExecutionProvider::default().build())?
        } else {
            match Self::build_session(opts, CUDAExecutionProvider::default().build()) {
                Ok(session) => session,
                Err(e) => {
                    warn!("CUDA 初始化失败，回退到 CPU: {e}");
                    Self::build_session(opts, CPUExecutionProvider::default().build())?
                }
            }
        };

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .context("模型没有输入节点")?;

        info!("模型加载完成: {}", opts.model.display());

        Ok(Self { session: Mutex::new(session), input_name, input_size: opts.input_size })
    }

    fn build_session(
        opts: &ModelOptions,
        provider: ort::execution_providers::ExecutionProviderDispatch,
    ) -> Result<Session> {
        let session = Session::builder()?
            .with_execution_providers([provider])?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(opts.threads)?
            .commit_from_file(&opts.model)?;
        Ok(session)
    }
}

impl ModelHandler for OnnxEncoder {
    fn handle(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        let tensor = preprocess(image, self.input_size);

        let mut session = self.session.lock().expect("failed to acquire session lock");
        let input = Value::from_array(tensor)?;
        let outputs = session.run(ort::inputs![&self.input_name => input])?;

        let features = outputs[0].try_extract_array::<f32>().context("提取输出张量失败")?;
        let features = features.as_standard_layout();
        let slice = features.as_slice().context("输出张量不连续")?;
        Ok(bytemuck::cast_slice(slice).to_vec())
    }
}

/// 预处理：转 RGB，最长边等比缩放到 input_size，SAM 归一化，
/// 右下零填充成方形 NCHW 张量
pub fn preprocess(image: &DynamicImage, input_size: u32) -> Array4<f32> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let scale = input_size as f32 / width.max(height) as f32;
    let new_width = ((width as f32 * scale).round() as u32).clamp(1, input_size);
    let new_height = ((height as f32 * scale).round() as u32).clamp(1, input_size);
    let resized = image::imageops::resize(&rgb, new_width, new_height, FilterType::Triangle);

    let size = input_size as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] =
                (pixel.0[c] as f32 - PIXEL_MEAN[c]) / PIXEL_STD[c];
        }
    }
    tensor
}
