//! 钱包签名接口
//!
//! 后端不持有任何私钥：签名由用户钱包完成。服务端入口使用 `PresignedProof`，
//! 把客户端提交的签名作为“已完成的钱包调用”交给绑定流程。

use async_trait::async_trait;

use crate::domain::{AuthorizationMessage, SignatureProof};

use super::wallet_error_classifier::WalletFailure;

/// 对授权消息签名的钱包
#[async_trait]
pub trait WalletSigner: Send + Sync {
    async fn sign(&self, message: &AuthorizationMessage) -> Result<SignatureProof, WalletFailure>;
}

/// 客户端预先签好的证明
#[derive(Debug, Clone)]
pub struct PresignedProof(pub SignatureProof);

impl PresignedProof {
    pub fn new(signature: impl Into<String>, identity: impl Into<String>) -> Self {
        Self(SignatureProof {
            signature: signature.into(),
            identity: identity.into(),
        })
    }
}

#[async_trait]
impl WalletSigner for PresignedProof {
    async fn sign(&self, _message: &AuthorizationMessage) -> Result<SignatureProof, WalletFailure> {
        let proof = &self.0;
        if proof.signature.trim().is_empty() || proof.identity.trim().is_empty() {
            return Err(WalletFailure::Empty);
        }
        Ok(proof.clone())
    }
}
