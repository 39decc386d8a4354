//! 钱包错误归类
//!
//! 不同钱包（Leather/Xverse、MetaMask、Phantom ...）抛出的错误形态各不相同：
//! Error 对象、纯字符串、JSON-RPC 错误对象、嵌套的 error/data/info 字段。
//! 这里把它们统一归入封闭的错误类型集合。
//!
//! 规则表自上而下匹配，用户拒绝规则永远最先判断；用户拒绝属于正常结果，
//! 调用方应静默回到操作前状态，不展示错误提示。

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// 钱包错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletErrorKind {
    UserRejected,
    WalletNotFound,
    ConnectFailed,
    SignatureFailed,
    NetworkError,
    Unknown,
}

impl WalletErrorKind {
    /// 面向用户的默认提示
    pub fn default_message(&self) -> &'static str {
        match self {
            WalletErrorKind::UserRejected => "You cancelled the wallet operation",
            WalletErrorKind::WalletNotFound => {
                "Wallet extension not detected. Please install the required wallet extension."
            }
            WalletErrorKind::ConnectFailed => "Failed to connect to your wallet. Please try again.",
            WalletErrorKind::SignatureFailed => "Failed to sign message with your wallet.",
            WalletErrorKind::NetworkError => {
                "Network error while connecting to wallet. Please check your connection."
            }
            WalletErrorKind::Unknown => "An unknown error occurred with the wallet operation",
        }
    }
}

/// 钱包返回的原始失败信息
#[derive(Debug, Clone, PartialEq)]
pub enum WalletFailure {
    /// 钱包抛出的异常（带 message）
    Error { message: String },
    /// 纯字符串
    Text(String),
    /// JSON-RPC / 钱包自定义错误对象
    Payload(Value),
    /// 钱包返回了空结果（无签名、无公钥）
    Empty,
}

impl WalletFailure {
    pub fn error(message: impl Into<String>) -> Self {
        WalletFailure::Error {
            message: message.into(),
        }
    }

    /// 原始描述，用于日志
    pub fn describe(&self) -> String {
        match self {
            WalletFailure::Error { message } => message.clone(),
            WalletFailure::Text(text) => text.clone(),
            WalletFailure::Payload(value) => value.to_string(),
            WalletFailure::Empty => "wallet returned no signature".to_string(),
        }
    }
}

/// 归类结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ClassifiedWalletError {
    pub kind: WalletErrorKind,
    /// 面向用户的提示
    pub message: String,
    /// 原始错误（日志用）
    #[serde(skip)]
    pub cause: String,
}

impl ClassifiedWalletError {
    pub fn is_user_rejection(&self) -> bool {
        self.kind == WalletErrorKind::UserRejected
    }
}

/// 单条归类规则：命中任一错误码或任一短语即归入 `kind`
pub struct ClassificationRule {
    pub kind: WalletErrorKind,
    pub codes: &'static [i64],
    pub patterns: &'static [&'static str],
}

/// 规则表（顺序即优先级）
pub static CLASSIFICATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        kind: WalletErrorKind::UserRejected,
        // EIP-1193 用户拒绝
        codes: &[4001],
        patterns: &[
            "user denied",
            "user rejected",
            "user canceled",
            "user cancelled",
            "user decline",
            "rejected by user",
            "canceled by user",
            "cancelled by user",
            "user refused",
            "declined by user",
            "rejected the request",
            "canceled the request",
            "cancelled the request",
            "denied the request",
            "user did not approve",
            "request was rejected",
            "action_rejected",
            "code 4001",
            "user aborted",
            "signature was denied",
        ],
    },
    ClassificationRule {
        kind: WalletErrorKind::WalletNotFound,
        codes: &[],
        patterns: &["not detected", "not installed", "no provider", "not found"],
    },
    ClassificationRule {
        kind: WalletErrorKind::ConnectFailed,
        codes: &[],
        patterns: &[
            "failed to connect",
            "cannot connect",
            "connection failed",
            "connect failed",
        ],
    },
    ClassificationRule {
        kind: WalletErrorKind::SignatureFailed,
        codes: &[],
        patterns: &[
            "signature failed",
            "failed to sign",
            "signing failed",
            "invalid signature",
        ],
    },
    ClassificationRule {
        kind: WalletErrorKind::NetworkError,
        codes: &[],
        patterns: &["network error", "timeout", "request failed"],
    },
];

/// 从失败信息中提取的可匹配内容
#[derive(Debug, Default)]
struct FailureView {
    codes: Vec<i64>,
    /// 小写拼接后的所有消息
    text: String,
    /// 原始（未转小写）的主消息
    primary_message: Option<String>,
}

fn nested_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    current.as_str()
}

impl FailureView {
    fn from_failure(failure: &WalletFailure) -> Self {
        match failure {
            WalletFailure::Error { message } | WalletFailure::Text(message) => Self {
                codes: Vec::new(),
                text: message.to_lowercase(),
                primary_message: Some(message.clone()).filter(|m| !m.is_empty()),
            },
            WalletFailure::Payload(value) => Self::from_payload(value),
            WalletFailure::Empty => Self::default(),
        }
    }

    fn from_payload(value: &Value) -> Self {
        let mut codes = Vec::new();
        let mut fragments: Vec<String> = Vec::new();

        for code in [value.get("code"), value.get("error").and_then(|e| e.get("code"))]
            .into_iter()
            .flatten()
        {
            match code {
                Value::Number(n) => codes.extend(n.as_i64()),
                // ethers v6: code = "ACTION_REJECTED"
                Value::String(s) => {
                    if let Ok(n) = s.parse::<i64>() {
                        codes.push(n);
                    }
                    fragments.push(s.to_lowercase());
                }
                _ => {}
            }
        }

        let messages: Vec<&str> = [
            nested_str(value, &["message"]),
            nested_str(value, &["error", "message"]),
            nested_str(value, &["data", "message"]),
            nested_str(value, &["info", "error", "message"]),
        ]
        .into_iter()
        .flatten()
        .filter(|m| !m.is_empty())
        .collect();

        let primary_message = messages.first().map(|m| m.to_string());
        fragments.extend(messages.iter().map(|m| m.to_lowercase()));

        // 字符串形式的错误对象
        if let Value::String(s) = value {
            fragments.push(s.to_lowercase());
        }

        Self {
            codes,
            text: fragments.join(" "),
            primary_message: primary_message.or_else(|| value.as_str().map(str::to_string)),
        }
    }

    fn matches(&self, rule: &ClassificationRule) -> bool {
        rule.codes.iter().any(|c| self.codes.contains(c))
            || rule.patterns.iter().any(|p| self.text.contains(p))
    }
}

/// 是否为用户主动取消
pub fn is_user_rejection(failure: &WalletFailure) -> bool {
    classify(failure).is_user_rejection()
}

/// 归类钱包错误（不会失败）
pub fn classify(failure: &WalletFailure) -> ClassifiedWalletError {
    let view = FailureView::from_failure(failure);
    let cause = failure.describe();

    if let WalletFailure::Empty = failure {
        return ClassifiedWalletError {
            kind: WalletErrorKind::SignatureFailed,
            message: "Failed to get a valid signature from your wallet".to_string(),
            cause,
        };
    }

    let matched = CLASSIFICATION_RULES
        .iter()
        .find(|rule| view.matches(rule))
        .map(|rule| rule.kind);

    match matched {
        Some(kind) => ClassifiedWalletError {
            kind,
            message: kind.default_message().to_string(),
            cause,
        },
        None => {
            tracing::error!(cause = %cause, "Unclassified wallet error");
            ClassifiedWalletError {
                kind: WalletErrorKind::Unknown,
                message: view
                    .primary_message
                    .unwrap_or_else(|| WalletErrorKind::Unknown.default_message().to_string()),
                cause,
            }
        }
    }
}

/// 执行钱包操作并归类错误，返回 `Ok(结果)` 或已归类的错误
pub async fn run_wallet_operation<T, F>(operation: F) -> Result<T, ClassifiedWalletError>
where
    F: Future<Output = Result<T, WalletFailure>>,
{
    match operation.await {
        Ok(value) => Ok(value),
        Err(failure) => {
            let classified = classify(&failure);
            if classified.is_user_rejection() {
                tracing::info!("Wallet operation cancelled by user");
            } else {
                tracing::warn!(
                    kind = ?classified.kind,
                    cause = %classified.cause,
                    "Wallet operation failed"
                );
            }
            Err(classified)
        }
    }
}
