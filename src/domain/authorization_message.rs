//! 授权消息构造
//!
//! 签名前端与验签后端必须生成逐字节相同的字符串，任何空格、大小写、措辞的差异
//! 都会让所有合法签名失效。后端永远自行重建消息，不接受客户端提交的消息文本。

use std::fmt;

use anyhow::{bail, Result};
use serde::Serialize;
use utoipa::ToSchema;

use super::chain::{BindingOperation, Chain, VerificationMethod};

/// 待签名的授权消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AuthorizationMessage {
    pub text: String,
}

impl AuthorizationMessage {
    /// 按链的默认验签方式构造消息
    pub fn build(
        chain: Chain,
        operation: BindingOperation,
        address: &str,
        domain_name: &str,
    ) -> Result<Self> {
        Self::build_for(
            chain.default_verification(),
            chain,
            operation,
            address,
            domain_name,
        )
    }

    /// 按指定验签方式构造消息
    ///
    /// Stacks 方式使用委托授权模板，Native 方式使用地址自证模板
    pub fn build_for(
        method: VerificationMethod,
        chain: Chain,
        operation: BindingOperation,
        address: &str,
        domain_name: &str,
    ) -> Result<Self> {
        if address.is_empty() {
            bail!("address must not be empty");
        }
        if domain_name.is_empty() {
            bail!("domain name must not be empty");
        }

        let text = match method.effective_for(chain) {
            VerificationMethod::Stacks => {
                let (verb, preposition) = match operation {
                    BindingOperation::Add => ("adding", "to"),
                    BindingOperation::Remove => ("removing", "from"),
                };
                format!(
                    "I authorize {} {} address {} {} domain {}",
                    verb, chain, address, preposition, domain_name
                )
            }
            VerificationMethod::Native => {
                let action = match operation {
                    BindingOperation::Add => "addition to",
                    BindingOperation::Remove => "removal from",
                };
                format!(
                    "I am the owner of this {} address: {} and I authorize its {} domain {}",
                    chain, address, action, domain_name
                )
            }
        };

        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

impl fmt::Display for AuthorizationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
