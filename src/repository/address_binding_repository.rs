// 地址绑定数据访问 Repository
//
// (address, chain) 的全局唯一性由数据库约束保证，并发写入的失败方收到
// `StoreError::UniqueViolation`。

use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::StoreError;
use crate::domain::{AddressBinding, BindingWithDomain, Chain, Domain};

/// 新建绑定参数
#[derive(Debug, Clone)]
pub struct CreateBindingParams {
    pub domain_id: Uuid,
    pub chain: Chain,
    pub address: String,
}

// ============ Repository Trait ============

#[async_trait]
pub trait AddressBindingRepository: Send + Sync {
    /// 按 (address, chain) 查询；`domain_id` 为 Some 时额外限定所属域名
    async fn find(
        &self,
        domain_id: Option<Uuid>,
        address: &str,
        chain: Chain,
    ) -> Result<Option<AddressBinding>>;

    /// 按 ID 查询绑定及其所属域名
    async fn find_by_id_with_domain(&self, binding_id: Uuid) -> Result<Option<BindingWithDomain>>;

    /// 创建绑定，(address, chain) 冲突时返回 `StoreError::UniqueViolation`
    async fn create(&self, params: CreateBindingParams) -> Result<AddressBinding, StoreError>;

    /// 删除绑定，返回是否确实删除了一行
    async fn delete(&self, binding_id: Uuid) -> Result<bool>;

    /// 列出域名下的绑定，可按链过滤
    async fn list_by_domain(&self, domain_id: Uuid, chain: Option<Chain>)
        -> Result<Vec<AddressBinding>>;
}

// ============ PostgreSQL 实现 ============

type BindingRow = (Uuid, Uuid, String, String, DateTime<Utc>);

fn row_to_binding(row: BindingRow) -> Result<AddressBinding> {
    Ok(AddressBinding {
        id: row.0,
        domain_id: row.1,
        chain: Chain::from_str(&row.2)?,
        address: row.3,
        created_at: row.4,
    })
}

pub struct PgAddressBindingRepository {
    pool: PgPool,
}

impl PgAddressBindingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressBindingRepository for PgAddressBindingRepository {
    async fn find(
        &self,
        domain_id: Option<Uuid>,
        address: &str,
        chain: Chain,
    ) -> Result<Option<AddressBinding>> {
        let row = sqlx::query_as::<_, BindingRow>(
            "SELECT id, domain_id, chain, address, created_at
             FROM addresses
             WHERE address = $1 AND chain = $2
               AND ($3::uuid IS NULL OR domain_id = $3)",
        )
        .bind(address)
        .bind(chain.symbol())
        .bind(domain_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_binding).transpose()
    }

    async fn find_by_id_with_domain(&self, binding_id: Uuid) -> Result<Option<BindingWithDomain>> {
        let row = sqlx::query_as::<
            _,
            (
                Uuid,
                Uuid,
                String,
                String,
                DateTime<Utc>,
                String,
                String,
                DateTime<Utc>,
            ),
        >(
            "SELECT a.id, a.domain_id, a.chain, a.address, a.created_at,
                    d.name, d.owner_stacks_address, d.created_at
             FROM addresses a
             JOIN domains d ON d.id = a.domain_id
             WHERE a.id = $1",
        )
        .bind(binding_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let binding = row_to_binding((row.0, row.1, row.2, row.3, row.4))?;
        let domain = Domain {
            id: row.1,
            name: row.5,
            owner_stacks_address: row.6,
            created_at: row.7,
        };
        Ok(Some(BindingWithDomain { binding, domain }))
    }

    async fn create(&self, params: CreateBindingParams) -> Result<AddressBinding, StoreError> {
        let row = sqlx::query_as::<_, BindingRow>(
            "INSERT INTO addresses (id, domain_id, chain, address, created_at)
             VALUES ($1, $2, $3, $4, CURRENT_TIMESTAMP)
             RETURNING id, domain_id, chain, address, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(params.domain_id)
        .bind(params.chain.symbol())
        .bind(&params.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_binding(row)?)
    }

    async fn delete(&self, binding_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1")
            .bind(binding_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_domain(
        &self,
        domain_id: Uuid,
        chain: Option<Chain>,
    ) -> Result<Vec<AddressBinding>> {
        let rows = sqlx::query_as::<_, BindingRow>(
            "SELECT id, domain_id, chain, address, created_at
             FROM addresses
             WHERE domain_id = $1 AND ($2::text IS NULL OR chain = $2)
             ORDER BY created_at ASC",
        )
        .bind(domain_id)
        .bind(chain.map(|c| c.symbol()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_binding).collect()
    }
}
