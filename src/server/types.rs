use serde::Deserialize;
use utoipa::ToSchema;

/// 嵌入请求
#[derive(Debug, Deserialize, ToSchema)]
pub struct EmbedRequest {
    /// base64 编码的图像
    pub image: String,
}

/// 嵌入响应（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct EmbedResponse {
    /// base64 编码的特征嵌入
    pub blob: String,
}
