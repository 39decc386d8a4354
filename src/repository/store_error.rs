// 存储层错误

use thiserror::Error;

/// Postgres unique_violation
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    /// 唯一约束冲突，`fields` 为冲突的列
    #[error("unique constraint violated on ({})", fields.join(", "))]
    UniqueViolation { fields: Vec<String> },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StoreError {
    pub fn unique(fields: &[&str]) -> Self {
        StoreError::UniqueViolation {
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// 约束名 -> 列名
fn constraint_fields(constraint: Option<&str>) -> Vec<String> {
    let fields: &[&str] = match constraint {
        Some("addresses_address_chain_key") => &["address", "chain"],
        Some("domains_name_key") => &["name"],
        Some(other) => return vec![other.to_string()],
        None => &[],
    };
    fields.iter().map(|f| f.to_string()).collect()
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return StoreError::UniqueViolation {
                    fields: constraint_fields(db_err.constraint()),
                };
            }
        }
        StoreError::Other(err.into())
    }
}
