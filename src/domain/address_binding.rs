//! 域名与地址绑定领域模型
//! 只包含公开信息：域名、所有者 Stacks 地址、链上地址

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::chain::Chain;

/// 已登记的域名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Domain {
    pub id: Uuid,
    /// 小写域名，例如 example.btc
    pub name: String,
    /// 域名所有者的 Stacks 地址（SP.../ST...）
    pub owner_stacks_address: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 链上地址与域名的绑定
///
/// (address, chain) 全局唯一：一个链上地址最多绑定一个域名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AddressBinding {
    pub id: Uuid,
    pub domain_id: Uuid,
    pub chain: Chain,
    pub address: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// 带父域名的绑定（解绑时需要域名来重建消息）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BindingWithDomain {
    pub binding: AddressBinding,
    pub domain: Domain,
}

/// 域名及其全部绑定
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DomainWithBindings {
    #[serde(flatten)]
    pub domain: Domain,
    pub addresses: Vec<AddressBinding>,
}

/// 签名证明：由外部钱包产生，只被验签消费一次
///
/// `signature` 与 `identity` 保持各链钱包返回的原始编码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SignatureProof {
    pub signature: String,
    /// Stacks：十六进制公钥；ETH：0x 地址；SOL：base58 公钥
    pub identity: String,
}

/// 解绑结果
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RemovedBinding {
    pub message: String,
    pub removed: AddressBinding,
}
