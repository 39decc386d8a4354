use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::db::PgPool,
    repository::{
        AddressBindingRepository, DomainRepository, PgAddressBindingRepository,
        PgDomainRepository,
    },
    service::{AddressBindingService, BnsOwnershipClient, DomainService, OwnershipOracle},
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    /// 测试环境可以为空（内存仓库）
    pub pool: Option<PgPool>,
    pub config: Arc<Config>,
    pub binding_service: Arc<AddressBindingService>,
    pub domain_service: Arc<DomainService>,
}

impl AppState {
    /// 基于 Postgres 与 BNS 注册表创建应用状态
    pub fn new(pool: PgPool, config: Arc<Config>) -> anyhow::Result<Self> {
        let domains: Arc<dyn DomainRepository> = Arc::new(PgDomainRepository::new(pool.clone()));
        let bindings: Arc<dyn AddressBindingRepository> =
            Arc::new(PgAddressBindingRepository::new(pool.clone()));
        let oracle: Arc<dyn OwnershipOracle> =
            Arc::new(BnsOwnershipClient::from_config(&config.registry)?);

        let mut state = Self::with_components(domains, bindings, oracle, config);
        state.pool = Some(pool);
        Ok(state)
    }

    /// 由任意仓库与所有权来源组装（测试使用内存实现）
    pub fn with_components(
        domains: Arc<dyn DomainRepository>,
        bindings: Arc<dyn AddressBindingRepository>,
        oracle: Arc<dyn OwnershipOracle>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            pool: None,
            config,
            binding_service: Arc::new(AddressBindingService::new(
                domains.clone(),
                bindings.clone(),
            )),
            domain_service: Arc::new(DomainService::new(domains, bindings, oracle)),
        }
    }
}
