//! 错误处理模块

use std::fmt;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Todo服务错误类型
#[derive(Error, Debug)]
pub enum TodoError {
    /// 记录不存在
    #[error("item not Found")]
    NotFound,

    /// 缺少标题
    #[error("title mandatory")]
    TitleMandatory,

    /// 请求体不是合法的JSON对象
    #[error("invalid JSON body: {0}")]
    InvalidBody(String),

    /// 存储文件内容无法解析
    #[error("存储文件损坏 {path}: {source}")]
    CorruptStore {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// id已用尽，无法再分配
    #[error("id已用尽: 现有最大id为 {0}")]
    IdExhausted(u64),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl TodoError {
    /// 创建请求体错误
    pub fn invalid_body<T: fmt::Display>(msg: T) -> Self {
        Self::InvalidBody(msg.to_string())
    }

    /// 获取错误代码
    pub fn error_code(&self) -> &'static str {
        match self {
            TodoError::NotFound => "NOT_FOUND",
            TodoError::TitleMandatory => "TITLE_MANDATORY",
            TodoError::InvalidBody(_) => "INVALID_BODY",
            TodoError::CorruptStore { .. } => "CORRUPT_STORE",
            TodoError::IdExhausted(_) => "ID_EXHAUSTED",
            TodoError::Serialization(_) => "SERIALIZATION_ERROR",
            TodoError::Io(_) => "IO_ERROR",
        }
    }

    /// 对应的HTTP状态码
    ///
    /// 缺少标题沿用404而不是400，客户端依赖这个状态码。
    pub fn status_code(&self) -> StatusCode {
        match self {
            TodoError::NotFound | TodoError::TitleMandatory => StatusCode::NOT_FOUND,
            TodoError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            TodoError::CorruptStore { .. }
            | TodoError::IdExhausted(_)
            | TodoError::Serialization(_)
            | TodoError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 是否为存储层故障
    pub fn is_storage_fault(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Todo 结果类型别名
pub type TodoResult<T> = Result<T, TodoError>;

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if self.is_storage_fault() {
            error!(code = self.error_code(), "存储操作失败: {}", self);
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
