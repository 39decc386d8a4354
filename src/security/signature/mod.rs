//! 链上地址签名验证
//!
//! 三种方案对应三种钱包：
//! - Stacks：secp256k1 RSV 签名，结构化消息哈希（Stacks 签名前缀）
//! - Ethereum：EIP-191 personal_sign，可恢复签名，比对恢复出的地址
//! - Solana：ed25519 对原始 UTF-8 消息的分离签名
//!
//! 所有方案对畸形输入只返回 `false`，不会向调用方抛出错误。

pub mod ethereum;
pub mod solana;
pub mod stacks;

use serde::Serialize;
use thiserror::Error;

use crate::domain::{Chain, VerificationMethod};

/// 验签失败原因（仅用于日志，授权判断只看 `verified`）
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyFailure {
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
    #[error("malformed identity: {0}")]
    MalformedIdentity(String),
    #[error("signature does not match identity")]
    Mismatch,
}

/// 验签结论
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationVerdict {
    pub verified: bool,
    pub reason: Option<VerifyFailure>,
}

impl VerificationVerdict {
    fn from_result(result: Result<(), VerifyFailure>) -> Self {
        match result {
            Ok(()) => Self {
                verified: true,
                reason: None,
            },
            Err(reason) => Self {
                verified: false,
                reason: Some(reason),
            },
        }
    }
}

/// 签名验证器（封闭集合，新增链需要在此处显式扩展）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureVerifier {
    Stacks,
    Ethereum,
    Solana,
}

impl SignatureVerifier {
    /// 根据链和验签方式选择验证器
    pub fn select(method: VerificationMethod, chain: Chain) -> Self {
        match (method.effective_for(chain), chain) {
            (VerificationMethod::Stacks, _) | (VerificationMethod::Native, Chain::Btc) => {
                SignatureVerifier::Stacks
            }
            (VerificationMethod::Native, Chain::Eth) => SignatureVerifier::Ethereum,
            (VerificationMethod::Native, Chain::Sol) => SignatureVerifier::Solana,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignatureVerifier::Stacks => "stacks",
            SignatureVerifier::Ethereum => "ethereum",
            SignatureVerifier::Solana => "solana",
        }
    }

    /// 验签并给出原因
    ///
    /// `identity`：Stacks 为十六进制公钥，Ethereum 为 0x 地址，Solana 为 base58 公钥
    pub fn verdict(&self, message: &str, signature: &str, identity: &str) -> VerificationVerdict {
        let result = match self {
            SignatureVerifier::Stacks => stacks::verify_message(message, signature, identity),
            SignatureVerifier::Ethereum => ethereum::verify_message(message, signature, identity),
            SignatureVerifier::Solana => solana::verify_message(message, signature, identity),
        };

        if let Err(ref reason) = result {
            tracing::debug!(verifier = self.name(), %reason, "Signature verification failed");
        }

        VerificationVerdict::from_result(result)
    }

    pub fn verify(&self, message: &str, signature: &str, identity: &str) -> bool {
        self.verdict(message, signature, identity).verified
    }
}

/// 去掉可选的 0x 前缀
pub(crate) fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}
