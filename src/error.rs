use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::service::{BindingError, DomainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    BadRequest,
    NotFound,
    Internal,

    // 钱包 / 签名
    UserRejected,
    WalletNotFound,
    ConnectFailed,
    NetworkError,
    SignatureFailed,
    InvalidSignature,
    InvalidAddress,
    ChainNotSupported,

    // 域名 / 绑定
    DomainNotFound,
    DomainAlreadyRegistered,
    NotDomainOwner,
    BindingNotFound,
    UniqueConstraintConflict,
    RegistryUnavailable,
    Unknown,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Internal => "internal",

            AppErrorCode::UserRejected => "user_rejected",
            AppErrorCode::WalletNotFound => "wallet_not_found",
            AppErrorCode::ConnectFailed => "connect_failed",
            AppErrorCode::NetworkError => "network_error",
            AppErrorCode::SignatureFailed => "signature_failed",
            AppErrorCode::InvalidSignature => "invalid_signature",
            AppErrorCode::InvalidAddress => "invalid_address",
            AppErrorCode::ChainNotSupported => "chain_not_supported",

            AppErrorCode::DomainNotFound => "domain_not_found",
            AppErrorCode::DomainAlreadyRegistered => "domain_already_registered",
            AppErrorCode::NotDomainOwner => "not_domain_owner",
            AppErrorCode::BindingNotFound => "binding_not_found",
            AppErrorCode::UniqueConstraintConflict => "unique_constraint_conflict",
            AppErrorCode::RegistryUnavailable => "registry_unavailable",
            AppErrorCode::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub trace_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    trace_id: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            trace_id: self.trace_id.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn new(code: AppErrorCode, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status,
            trace_id: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::BadRequest, StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::NotFound, StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Internal, StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidAddress, StatusCode::BAD_REQUEST, msg)
    }

    pub fn chain_not_supported(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::ChainNotSupported, StatusCode::BAD_REQUEST, msg)
    }

    /// 设置追踪ID
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }
}

impl From<BindingError> for AppError {
    fn from(err: BindingError) -> Self {
        let message = err.to_string();
        let (code, status) = match &err {
            BindingError::UserRejected { .. } => {
                (AppErrorCode::UserRejected, StatusCode::BAD_REQUEST)
            }
            BindingError::InvalidSignature { .. } => {
                (AppErrorCode::InvalidSignature, StatusCode::BAD_REQUEST)
            }
            BindingError::InvalidRequest(_) => (AppErrorCode::BadRequest, StatusCode::BAD_REQUEST),
            BindingError::DomainNotFound { .. } => {
                (AppErrorCode::DomainNotFound, StatusCode::NOT_FOUND)
            }
            BindingError::BindingNotFound { .. } => {
                (AppErrorCode::BindingNotFound, StatusCode::NOT_FOUND)
            }
            BindingError::UniqueConstraintConflict { .. } => {
                (AppErrorCode::UniqueConstraintConflict, StatusCode::CONFLICT)
            }
            BindingError::WalletNotFound { .. } => {
                (AppErrorCode::WalletNotFound, StatusCode::BAD_GATEWAY)
            }
            BindingError::ConnectFailed { .. } => {
                (AppErrorCode::ConnectFailed, StatusCode::BAD_GATEWAY)
            }
            BindingError::NetworkError { .. } => {
                (AppErrorCode::NetworkError, StatusCode::BAD_GATEWAY)
            }
            BindingError::SignatureFailed { .. } => {
                (AppErrorCode::SignatureFailed, StatusCode::BAD_GATEWAY)
            }
            BindingError::Unknown { .. } => {
                (AppErrorCode::Unknown, StatusCode::INTERNAL_SERVER_ERROR)
            }
        };
        Self::new(code, status, message)
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::AlreadyRegistered { .. } => Self::new(
                AppErrorCode::DomainAlreadyRegistered,
                StatusCode::CONFLICT,
                err.to_string(),
            ),
            DomainError::NotFound { .. } => Self::new(
                AppErrorCode::DomainNotFound,
                StatusCode::NOT_FOUND,
                err.to_string(),
            ),
            DomainError::NotOwner { message } => {
                Self::new(AppErrorCode::NotDomainOwner, StatusCode::FORBIDDEN, message)
            }
            DomainError::RegistryUnavailable { message } => Self::new(
                AppErrorCode::RegistryUnavailable,
                StatusCode::BAD_GATEWAY,
                message,
            ),
            DomainError::InvalidRequest(message) => Self::bad_request(message),
            DomainError::Store(e) => {
                tracing::error!(error = %e, "Domain store failure");
                Self::internal("Internal storage error")
            }
        }
    }
}

// 从 UUID 错误转换
impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        Self::bad_request(format!("Invalid UUID: {}", err))
    }
}

// 从 anyhow 错误转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{}", err))
    }
}
