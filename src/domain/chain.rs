//! 链与操作类型
//!
//! 只支持三条链：BTC（经 Stacks 委托签名）、ETH、SOL。
//! 新增链必须在所有 `match` 中显式处理，编译期即可发现遗漏。

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 支持绑定的链
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Chain {
    #[serde(rename = "BTC")]
    Btc,
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "SOL")]
    Sol,
}

impl Chain {
    pub const ALL: [Chain; 3] = [Chain::Btc, Chain::Eth, Chain::Sol];

    /// 数据库与签名消息中使用的符号
    pub fn symbol(&self) -> &'static str {
        match self {
            Chain::Btc => "BTC",
            Chain::Eth => "ETH",
            Chain::Sol => "SOL",
        }
    }

    /// 该链默认的验签方式
    ///
    /// BTC 地址没有浏览器签名钱包，由域名所有者的 Stacks 密钥代为授权
    pub fn default_verification(&self) -> VerificationMethod {
        match self {
            Chain::Btc => VerificationMethod::Stacks,
            Chain::Eth | Chain::Sol => VerificationMethod::Native,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Chain {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BTC" | "BITCOIN" => Ok(Chain::Btc),
            "ETH" | "ETHEREUM" => Ok(Chain::Eth),
            "SOL" | "SOLANA" => Ok(Chain::Sol),
            other => Err(anyhow::anyhow!("Unsupported chain: {}", other)),
        }
    }
}

/// 绑定操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BindingOperation {
    Add,
    Remove,
}

impl fmt::Display for BindingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingOperation::Add => f.write_str("add"),
            BindingOperation::Remove => f.write_str("remove"),
        }
    }
}

impl FromStr for BindingOperation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" => Ok(BindingOperation::Add),
            "remove" => Ok(BindingOperation::Remove),
            other => Err(anyhow::anyhow!("Unsupported operation: {}", other)),
        }
    }
}

/// 验签方式
///
/// - `Stacks`：域名所有者的 Stacks 密钥对 BTC 风格消息签名（任意链可用）
/// - `Native`：地址自身的私钥签名（ETH/SOL），BTC 仍回落到 Stacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    #[default]
    Stacks,
    Native,
}

impl VerificationMethod {
    /// 对给定链实际生效的方式
    pub fn effective_for(self, chain: Chain) -> VerificationMethod {
        match (self, chain) {
            (VerificationMethod::Native, Chain::Btc) => VerificationMethod::Stacks,
            (method, _) => method,
        }
    }
}
