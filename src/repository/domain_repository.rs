// 域名数据访问 Repository

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::StoreError;
use crate::domain::Domain;

/// 新建域名参数
#[derive(Debug, Clone)]
pub struct CreateDomainParams {
    pub name: String,
    pub owner_stacks_address: String,
}

// ============ Repository Trait ============

#[async_trait]
pub trait DomainRepository: Send + Sync {
    /// 按名称查询（名称已规范化为小写）
    async fn find_by_name(&self, name: &str) -> Result<Option<Domain>>;

    async fn find_by_id(&self, domain_id: Uuid) -> Result<Option<Domain>>;

    /// 创建域名，名称重复时返回 `StoreError::UniqueViolation`
    async fn create(&self, params: CreateDomainParams) -> Result<Domain, StoreError>;

    /// 列出某个 Stacks 地址名下的域名
    async fn list_by_owner(&self, owner_stacks_address: &str) -> Result<Vec<Domain>>;
}

// ============ PostgreSQL 实现 ============

type DomainRow = (Uuid, String, String, DateTime<Utc>);

fn row_to_domain(row: DomainRow) -> Domain {
    Domain {
        id: row.0,
        name: row.1,
        owner_stacks_address: row.2,
        created_at: row.3,
    }
}

pub struct PgDomainRepository {
    pool: PgPool,
}

impl PgDomainRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DomainRepository for PgDomainRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Domain>> {
        let row = sqlx::query_as::<_, DomainRow>(
            "SELECT id, name, owner_stacks_address, created_at FROM domains WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_domain))
    }

    async fn find_by_id(&self, domain_id: Uuid) -> Result<Option<Domain>> {
        let row = sqlx::query_as::<_, DomainRow>(
            "SELECT id, name, owner_stacks_address, created_at FROM domains WHERE id = $1",
        )
        .bind(domain_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_domain))
    }

    async fn create(&self, params: CreateDomainParams) -> Result<Domain, StoreError> {
        let row = sqlx::query_as::<_, DomainRow>(
            "INSERT INTO domains (id, name, owner_stacks_address, created_at)
             VALUES ($1, $2, $3, CURRENT_TIMESTAMP)
             RETURNING id, name, owner_stacks_address, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&params.name)
        .bind(&params.owner_stacks_address)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_domain(row))
    }

    async fn list_by_owner(&self, owner_stacks_address: &str) -> Result<Vec<Domain>> {
        let rows = sqlx::query_as::<_, DomainRow>(
            "SELECT id, name, owner_stacks_address, created_at
             FROM domains
             WHERE owner_stacks_address = $1
             ORDER BY created_at ASC",
        )
        .bind(owner_stacks_address)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(row_to_domain).collect())
    }
}
