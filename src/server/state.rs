use std::sync::Arc;

use crate::cache::EmbeddingCache;
use crate::model::ModelHandler;

/// 应用状态
pub struct AppState {
    /// 嵌入模型
    pub model: Arc<dyn ModelHandler>,
    /// 嵌入缓存
    pub cache: EmbeddingCache,
    /// 未命中时是否把模型输出写回缓存
    pub cache_write: bool,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(model: Arc<dyn ModelHandler>, cache: EmbeddingCache, cache_write: bool) -> Arc<Self> {
        Arc::new(AppState { model, cache, cache_write })
    }
}
