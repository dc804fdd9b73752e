use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;

/// API错误类型
pub struct AppError(pub anyhow::Error);

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // 后端故障返回 500，与空结果可区分；具体原因只进日志
        error!("请求处理失败: {:#}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, format!("Something went wrong: {}", self.0))
            .into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
