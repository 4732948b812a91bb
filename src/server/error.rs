use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub type Result<T, E = AppError> = std::result::Result<T, E>;

/// API错误类型
pub struct AppError {
    status: StatusCode,
    source: anyhow::Error,
}

impl AppError {
    /// 客户端输入错误，返回 400
    pub fn bad_request(err: impl Into<anyhow::Error>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, source: err.into() }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, format!("Something went wrong: {}", self.source)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, source: err.into() }
    }
}
