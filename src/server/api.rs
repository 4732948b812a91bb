use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use log::{info, warn};
use serde_json::{Value, json};
use tokio::task::block_in_place;

use super::error::{AppError, Result};
use super::state::AppState;
use super::types::*;
use crate::cache::Lookup;
use crate::{metrics, phash, utils};

/// 计算一张图片的特征嵌入
///
/// 先按感知哈希查缓存，命中则直接返回缓存内容，未命中或哈希冲突时
/// 调用模型推理。
#[utoipa::path(
    post,
    path = "/embed",
    request_body = EmbedRequest,
    responses(
        (status = 200, body = EmbedResponse),
        (status = 400, description = "base64 或图像解码失败"),
    )
)]
pub async fn embed_handler(
    State(state): State<Arc<AppState>>,
    Json(data): Json<EmbedRequest>,
) -> Result<Json<Value>> {
    let start = Instant::now();

    let bytes = BASE64.decode(&data.image).map_err(AppError::bad_request)?;
    let image = utils::imdecode(&bytes).map_err(AppError::bad_request)?;
    let size = (image.width(), image.height());

    info!("处理嵌入请求，图像尺寸 {}x{}", size.0, size.1);

    let (blob, source) = block_in_place(|| -> anyhow::Result<_> {
        let hash = phash::p_hash(&image);
        match state.cache.lookup(hash)? {
            Lookup::Hit(blob) => {
                metrics::inc_cache_outcome("hit");
                Ok((blob, "cache"))
            }
            outcome => {
                match outcome {
                    Lookup::Miss => metrics::inc_cache_outcome("miss"),
                    _ => metrics::inc_cache_outcome("collision"),
                }
                let blob = state.model.handle(&image)?;
                if state.cache_write {
                    // 写回失败不影响响应
                    if let Err(e) = state.cache.store(hash, &blob) {
                        warn!("缓存写回失败: {e}");
                    }
                }
                Ok((blob, "model"))
            }
        }
    })?;

    metrics::observe_embed_duration(size, source, start.elapsed().as_secs_f32());

    Ok(Json(json!({ "blob": BASE64.encode(&blob) })))
}
