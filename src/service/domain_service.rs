//! 域名服务
//! 域名登记（以 BNS 注册表为准）与只读查询

use std::sync::Arc;

use thiserror::Error;

use super::ownership_oracle::{OwnershipCheck, OwnershipOracle, OwnershipOutcome};
use crate::{
    domain::{AddressBinding, BindingWithDomain, Chain, Domain, DomainWithBindings},
    repository::{AddressBindingRepository, CreateDomainParams, DomainRepository, StoreError},
    utils::AddressValidator,
};

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Domain {name} is already registered")]
    AlreadyRegistered { name: String },

    #[error("domain {name} not found")]
    NotFound { name: String },

    /// 注册表明确给出“非所有者 / 未激活 / 不存在”
    #[error("{message}")]
    NotOwner { message: String },

    /// 注册表不可达或返回异常
    #[error("{message}")]
    RegistryUnavailable { message: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl DomainError {
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::AlreadyRegistered { .. } => "domain_already_registered",
            DomainError::NotFound { .. } => "domain_not_found",
            DomainError::NotOwner { .. } => "not_domain_owner",
            DomainError::RegistryUnavailable { .. } => "registry_unavailable",
            DomainError::InvalidRequest(_) => "invalid_request",
            DomainError::Store(_) => "unknown",
        }
    }
}

/// 规范化域名：去空白、小写
pub fn normalize_domain_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim().to_lowercase();
    let valid = match name.split_once('.') {
        Some((label, namespace)) => {
            !label.is_empty() && !namespace.is_empty() && !namespace.contains('.')
        }
        None => false,
    };
    if !valid || name.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidRequest(format!(
            "invalid domain name: {}",
            name
        )));
    }
    Ok(name)
}

/// 域名服务
pub struct DomainService {
    domains: Arc<dyn DomainRepository>,
    bindings: Arc<dyn AddressBindingRepository>,
    oracle: Arc<dyn OwnershipOracle>,
}

impl DomainService {
    pub fn new(
        domains: Arc<dyn DomainRepository>,
        bindings: Arc<dyn AddressBindingRepository>,
        oracle: Arc<dyn OwnershipOracle>,
    ) -> Self {
        Self {
            domains,
            bindings,
            oracle,
        }
    }

    /// 登记域名：注册表确认所有权后才写库
    pub async fn register(
        &self,
        name: &str,
        owner_stacks_address: &str,
    ) -> Result<Domain, DomainError> {
        let name = normalize_domain_name(name)?;
        let owner = owner_stacks_address.trim();
        if !AddressValidator::validate_stacks_address(owner) {
            return Err(DomainError::InvalidRequest(format!(
                "invalid Stacks address: {}",
                owner
            )));
        }

        if self.domains.find_by_name(&name).await?.is_some() {
            return Err(DomainError::AlreadyRegistered { name });
        }

        let check = self.oracle.verify_domain_ownership(&name, owner).await;
        if !check.is_owner {
            let message = check
                .error
                .unwrap_or_else(|| format!("You are not the owner of {}", name));
            return Err(match check.outcome {
                OwnershipOutcome::RegistryError | OwnershipOutcome::TransportError => {
                    DomainError::RegistryUnavailable { message }
                }
                _ => DomainError::NotOwner { message },
            });
        }

        let params = CreateDomainParams {
            name: name.clone(),
            owner_stacks_address: owner.to_string(),
        };
        match self.domains.create(params).await {
            Ok(domain) => {
                tracing::info!(domain = %domain.name, owner = %domain.owner_stacks_address, "✅ Domain registered");
                Ok(domain)
            }
            Err(StoreError::UniqueViolation { .. }) => Err(DomainError::AlreadyRegistered { name }),
            Err(StoreError::Other(e)) => Err(DomainError::Store(e)),
        }
    }

    /// 查询注册表中的所有权（不写库）
    pub async fn check_ownership(
        &self,
        name: &str,
        stacks_address: &str,
    ) -> Result<OwnershipCheck, DomainError> {
        let name = normalize_domain_name(name)?;
        Ok(self
            .oracle
            .verify_domain_ownership(&name, stacks_address.trim())
            .await)
    }

    /// 域名及其全部绑定
    pub async fn get_domain(&self, name: &str) -> Result<DomainWithBindings, DomainError> {
        let domain = self.require_domain(name).await?;
        let addresses = self.bindings.list_by_domain(domain.id, None).await?;
        Ok(DomainWithBindings { domain, addresses })
    }

    /// 域名下的绑定，可按链过滤
    pub async fn list_bindings(
        &self,
        name: &str,
        chain: Option<Chain>,
    ) -> Result<Vec<AddressBinding>, DomainError> {
        let domain = self.require_domain(name).await?;
        Ok(self.bindings.list_by_domain(domain.id, chain).await?)
    }

    /// 反查：(address, chain) 绑定在哪个域名
    pub async fn lookup(
        &self,
        address: &str,
        chain: Chain,
    ) -> Result<Option<BindingWithDomain>, DomainError> {
        let address = AddressValidator::canonicalize(chain, address);
        let Some(binding) = self.bindings.find(None, &address, chain).await? else {
            return Ok(None);
        };
        let domain = self
            .domains
            .find_by_id(binding.domain_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("binding {} has no parent domain", binding.id))?;
        Ok(Some(BindingWithDomain { binding, domain }))
    }

    /// 某个 Stacks 地址名下已登记的域名
    pub async fn domains_by_owner(&self, owner_stacks_address: &str) -> Result<Vec<Domain>, DomainError> {
        Ok(self
            .domains
            .list_by_owner(owner_stacks_address.trim())
            .await?)
    }

    async fn require_domain(&self, name: &str) -> Result<Domain, DomainError> {
        let name = normalize_domain_name(name)?;
        self.domains
            .find_by_name(&name)
            .await?
            .ok_or(DomainError::NotFound { name })
    }
}
