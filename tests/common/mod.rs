//! 测试辅助模块
//! 内存仓库、测试密钥与脚本化钱包

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use ironlink::{
    app_state::AppState,
    config::Config,
    domain::{AddressBinding, AuthorizationMessage, BindingWithDomain, Chain, Domain, SignatureProof},
    repository::{
        AddressBindingRepository, CreateBindingParams, CreateDomainParams, DomainRepository,
        StoreError,
    },
    security::signature::{ethereum, stacks},
    service::{
        ownership_oracle::OwnershipOutcome, AddressBindingService, DomainService, OwnershipCheck,
        OwnershipOracle, WalletFailure, WalletSigner,
    },
};
use uuid::Uuid;

pub const BTC_ADDRESS: &str = "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq";

// ============ 内存仓库 ============

/// 同时实现两个仓库接口的内存存储，(address, chain) 唯一约束与数据库一致
#[derive(Default)]
pub struct MemoryStore {
    domains: Mutex<Vec<Domain>>,
    bindings: Mutex<Vec<AddressBinding>>,
    mutations: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// 写操作次数（create + 成功的 delete）
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.lock().unwrap().len()
    }

    /// 直接插入域名（绕过注册表检查）
    pub fn seed_domain(&self, name: &str, owner: &str) -> Domain {
        let domain = Domain {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner_stacks_address: owner.to_string(),
            created_at: chrono::Utc::now(),
        };
        self.domains.lock().unwrap().push(domain.clone());
        domain
    }

    pub fn seed_binding(&self, domain_id: Uuid, chain: Chain, address: &str) -> AddressBinding {
        let binding = AddressBinding {
            id: Uuid::new_v4(),
            domain_id,
            chain,
            address: address.to_string(),
            created_at: chrono::Utc::now(),
        };
        self.bindings.lock().unwrap().push(binding.clone());
        binding
    }
}

#[async_trait]
impl DomainRepository for MemoryStore {
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Domain>> {
        Ok(self
            .domains
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.name == name)
            .cloned())
    }

    async fn find_by_id(&self, domain_id: Uuid) -> anyhow::Result<Option<Domain>> {
        Ok(self
            .domains
            .lock()
            .unwrap()
            .iter()
            .find(|d| d.id == domain_id)
            .cloned())
    }

    async fn create(&self, params: CreateDomainParams) -> Result<Domain, StoreError> {
        let mut domains = self.domains.lock().unwrap();
        if domains.iter().any(|d| d.name == params.name) {
            return Err(StoreError::unique(&["name"]));
        }
        let domain = Domain {
            id: Uuid::new_v4(),
            name: params.name,
            owner_stacks_address: params.owner_stacks_address,
            created_at: chrono::Utc::now(),
        };
        domains.push(domain.clone());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(domain)
    }

    async fn list_by_owner(&self, owner_stacks_address: &str) -> anyhow::Result<Vec<Domain>> {
        Ok(self
            .domains
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.owner_stacks_address == owner_stacks_address)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AddressBindingRepository for MemoryStore {
    async fn find(
        &self,
        domain_id: Option<Uuid>,
        address: &str,
        chain: Chain,
    ) -> anyhow::Result<Option<AddressBinding>> {
        Ok(self
            .bindings
            .lock()
            .unwrap()
            .iter()
            .find(|b| {
                b.address == address
                    && b.chain == chain
                    && domain_id.map_or(true, |id| b.domain_id == id)
            })
            .cloned())
    }

    async fn find_by_id_with_domain(
        &self,
        binding_id: Uuid,
    ) -> anyhow::Result<Option<BindingWithDomain>> {
        let binding = self
            .bindings
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == binding_id)
            .cloned();
        let Some(binding) = binding else {
            return Ok(None);
        };
        let domain = DomainRepository::find_by_id(self, binding.domain_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("orphan binding"))?;
        Ok(Some(BindingWithDomain { binding, domain }))
    }

    async fn create(&self, params: CreateBindingParams) -> Result<AddressBinding, StoreError> {
        let mut bindings = self.bindings.lock().unwrap();
        if bindings
            .iter()
            .any(|b| b.address == params.address && b.chain == params.chain)
        {
            return Err(StoreError::unique(&["address", "chain"]));
        }
        let binding = AddressBinding {
            id: Uuid::new_v4(),
            domain_id: params.domain_id,
            chain: params.chain,
            address: params.address,
            created_at: chrono::Utc::now(),
        };
        bindings.push(binding.clone());
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(binding)
    }

    async fn delete(&self, binding_id: Uuid) -> anyhow::Result<bool> {
        let mut bindings = self.bindings.lock().unwrap();
        let before = bindings.len();
        bindings.retain(|b| b.id != binding_id);
        let deleted = bindings.len() != before;
        if deleted {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(deleted)
    }

    async fn list_by_domain(
        &self,
        domain_id: Uuid,
        chain: Option<Chain>,
    ) -> anyhow::Result<Vec<AddressBinding>> {
        Ok(self
            .bindings
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.domain_id == domain_id && chain.map_or(true, |c| b.chain == c))
            .cloned()
            .collect())
    }
}

// ============ 测试密钥 ============

pub fn stacks_key() -> k256::ecdsa::SigningKey {
    k256::ecdsa::SigningKey::from_slice(&[0x11u8; 32]).unwrap()
}

pub fn other_stacks_key() -> k256::ecdsa::SigningKey {
    k256::ecdsa::SigningKey::from_slice(&[0x22u8; 32]).unwrap()
}

pub fn stacks_public_key(key: &k256::ecdsa::SigningKey) -> String {
    hex::encode(key.verifying_key().to_encoded_point(true).as_bytes())
}

/// 测试密钥对应的主网 Stacks 地址（域名所有者）
pub fn stacks_owner_address() -> String {
    stacks::address_from_public_key(&stacks_public_key(&stacks_key()), stacks::MAINNET_SINGLE_SIG)
        .unwrap()
}

pub fn eth_key() -> k256::ecdsa::SigningKey {
    k256::ecdsa::SigningKey::from_slice(&[0x33u8; 32]).unwrap()
}

pub fn eth_address() -> String {
    ethereum::public_key_to_address(eth_key().verifying_key())
}

pub fn sol_key() -> ed25519_dalek::SigningKey {
    ed25519_dalek::SigningKey::from_bytes(&[0x44u8; 32])
}

pub fn sol_address() -> String {
    bs58::encode(sol_key().verifying_key().to_bytes()).into_string()
}

pub fn sign_stacks(key: &k256::ecdsa::SigningKey, message: &str) -> String {
    let digest = stacks::hash_message(message, stacks::STACKS_MESSAGE_PREFIX);
    let (signature, recovery_id) = key.sign_prehash_recoverable(&digest).unwrap();
    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte());
    hex::encode(bytes)
}

pub fn sign_eth(key: &k256::ecdsa::SigningKey, message: &str) -> String {
    let digest = ethereum::hash_message(message.as_bytes());
    let (signature, recovery_id) = key.sign_prehash_recoverable(&digest).unwrap();
    let mut bytes = signature.to_bytes().to_vec();
    bytes.push(recovery_id.to_byte() + 27);
    format!("0x{}", hex::encode(bytes))
}

pub fn sign_sol(key: &ed25519_dalek::SigningKey, message: &str) -> String {
    use ed25519_dalek::Signer;
    bs58::encode(key.sign(message.as_bytes()).to_bytes()).into_string()
}

// ============ 脚本化钱包 ============

/// Stacks 钱包：对消息签名并返回公钥
pub struct StacksWallet(pub k256::ecdsa::SigningKey);

#[async_trait]
impl WalletSigner for StacksWallet {
    async fn sign(&self, message: &AuthorizationMessage) -> Result<SignatureProof, WalletFailure> {
        Ok(SignatureProof {
            signature: sign_stacks(&self.0, message.as_str()),
            identity: stacks_public_key(&self.0),
        })
    }
}

/// MetaMask 风格钱包
pub struct EthWallet(pub k256::ecdsa::SigningKey);

#[async_trait]
impl WalletSigner for EthWallet {
    async fn sign(&self, message: &AuthorizationMessage) -> Result<SignatureProof, WalletFailure> {
        Ok(SignatureProof {
            signature: sign_eth(&self.0, message.as_str()),
            identity: ethereum::public_key_to_address(self.0.verifying_key()),
        })
    }
}

/// Phantom 风格钱包
pub struct SolWallet(pub ed25519_dalek::SigningKey);

#[async_trait]
impl WalletSigner for SolWallet {
    async fn sign(&self, message: &AuthorizationMessage) -> Result<SignatureProof, WalletFailure> {
        Ok(SignatureProof {
            signature: sign_sol(&self.0, message.as_str()),
            identity: bs58::encode(self.0.verifying_key().to_bytes()).into_string(),
        })
    }
}

/// 用户在钱包弹窗中点击取消
pub struct RejectingWallet;

#[async_trait]
impl WalletSigner for RejectingWallet {
    async fn sign(&self, _message: &AuthorizationMessage) -> Result<SignatureProof, WalletFailure> {
        Err(WalletFailure::Payload(serde_json::json!({
            "code": 4001,
            "message": "MetaMask Tx Signature: User denied message signature."
        })))
    }
}

/// 返回固定失败的钱包
pub struct FailingWallet(pub WalletFailure);

#[async_trait]
impl WalletSigner for FailingWallet {
    async fn sign(&self, _message: &AuthorizationMessage) -> Result<SignatureProof, WalletFailure> {
        Err(self.0.clone())
    }
}

/// 记录调用次数与最后一条消息
pub struct CountingSigner<S> {
    pub inner: S,
    calls: AtomicUsize,
    last_message: Mutex<Option<String>>,
}

impl<S: WalletSigner> CountingSigner<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            last_message: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_message(&self) -> Option<String> {
        self.last_message.lock().unwrap().clone()
    }
}

#[async_trait]
impl<S: WalletSigner> WalletSigner for CountingSigner<S> {
    async fn sign(&self, message: &AuthorizationMessage) -> Result<SignatureProof, WalletFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_message.lock().unwrap() = Some(message.as_str().to_string());
        self.inner.sign(message).await
    }
}

// ============ 所有权来源 ============

/// 固定的注册表应答：`owner` 为 None 时表示域名不存在
pub struct StaticOracle {
    pub owner: Option<String>,
}

#[async_trait]
impl OwnershipOracle for StaticOracle {
    async fn verify_domain_ownership(&self, domain_name: &str, candidate: &str) -> OwnershipCheck {
        match &self.owner {
            Some(owner) if owner == candidate => OwnershipCheck {
                is_owner: true,
                owner_address: Some(owner.clone()),
                error: None,
                outcome: OwnershipOutcome::Owner,
            },
            Some(owner) => OwnershipCheck {
                is_owner: false,
                owner_address: Some(owner.clone()),
                error: Some(format!("You are not the owner of {}", domain_name)),
                outcome: OwnershipOutcome::NotOwner,
            },
            None => OwnershipCheck {
                is_owner: false,
                owner_address: None,
                error: Some(format!(
                    "Domain {} not found. Make sure it exists in the BNS system.",
                    domain_name
                )),
                outcome: OwnershipOutcome::NotFound,
            },
        }
    }
}

// ============ 组装 ============

pub fn binding_service(store: &Arc<MemoryStore>) -> AddressBindingService {
    AddressBindingService::new(store.clone(), store.clone())
}

pub fn domain_service(store: &Arc<MemoryStore>, oracle: StaticOracle) -> DomainService {
    DomainService::new(store.clone(), store.clone(), Arc::new(oracle))
}

/// 基于内存仓库的应用状态
pub fn test_app_state(store: &Arc<MemoryStore>, oracle: StaticOracle) -> Arc<AppState> {
    let config = Arc::new(Config::from_env().expect("default config"));
    Arc::new(AppState::with_components(
        store.clone(),
        store.clone(),
        Arc::new(oracle),
        config,
    ))
}
