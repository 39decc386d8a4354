//! 域名所有权查询（BNS 注册表）
//!
//! GET {base}/names/{name}/owner -> { "owner": "...", "status": "active" }
//! 单次请求：不重试、不缓存、不设超时（由外层决定）。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::RegistryConfig;

/// 查询结果分类（日志与上层区分用，不参与序列化）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipOutcome {
    Owner,
    NotOwner,
    Inactive,
    NotFound,
    /// 注册表返回了非 2xx 或无法解析的响应
    RegistryError,
    /// 网络/传输失败，不等同于“不是所有者”
    TransportError,
}

/// 所有权检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipCheck {
    pub is_owner: bool,
    pub owner_address: Option<String>,
    pub error: Option<String>,
    #[serde(skip)]
    pub outcome: OwnershipOutcome,
}

impl OwnershipCheck {
    fn failed(outcome: OwnershipOutcome, error: String) -> Self {
        Self {
            is_owner: false,
            owner_address: None,
            error: Some(error),
            outcome,
        }
    }
}

/// 域名所有权来源
#[async_trait]
pub trait OwnershipOracle: Send + Sync {
    /// `candidate` 当前是否控制 `domain_name`
    async fn verify_domain_ownership(&self, domain_name: &str, candidate: &str) -> OwnershipCheck;
}

#[derive(Debug, Deserialize)]
struct RegistryOwnerResponse {
    owner: Option<String>,
    status: Option<String>,
    error: Option<String>,
}

/// 解析注册表响应
pub fn interpret_registry_response(
    status: u16,
    body: &str,
    domain_name: &str,
    candidate: &str,
) -> OwnershipCheck {
    let parsed = serde_json::from_str::<RegistryOwnerResponse>(body).ok();

    if !(200..300).contains(&status) {
        let registry_error = parsed.as_ref().and_then(|p| p.error.clone());
        if status == 404 || registry_error.as_deref() == Some("Name not found") {
            return OwnershipCheck::failed(
                OwnershipOutcome::NotFound,
                format!(
                    "Domain {} not found. Make sure it exists in the BNS system.",
                    domain_name
                ),
            );
        }
        return OwnershipCheck::failed(
            OwnershipOutcome::RegistryError,
            format!(
                "Failed to verify domain ownership: {}",
                registry_error.unwrap_or_else(|| format!("HTTP {}", status))
            ),
        );
    }

    let Some(parsed) = parsed else {
        return OwnershipCheck::failed(
            OwnershipOutcome::RegistryError,
            "Failed to verify domain ownership: invalid registry response".to_string(),
        );
    };

    if parsed.status.as_deref() != Some("active") {
        return OwnershipCheck::failed(
            OwnershipOutcome::Inactive,
            format!("Domain {} is not active", domain_name),
        );
    }

    let Some(owner) = parsed.owner.filter(|o| !o.is_empty()) else {
        return OwnershipCheck::failed(
            OwnershipOutcome::RegistryError,
            "Failed to verify domain ownership: registry response has no owner".to_string(),
        );
    };

    let is_owner = owner == candidate.trim();
    OwnershipCheck {
        is_owner,
        error: (!is_owner).then(|| format!("You are not the owner of {}", domain_name)),
        owner_address: Some(owner),
        outcome: if is_owner {
            OwnershipOutcome::Owner
        } else {
            OwnershipOutcome::NotOwner
        },
    }
}

/// BNS HTTP 客户端
#[derive(Clone)]
pub struct BnsOwnershipClient {
    base_url: String,
    client: reqwest::Client,
}

impl BnsOwnershipClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("ironlink/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn from_config(config: &RegistryConfig) -> anyhow::Result<Self> {
        Self::new(config.base_url.clone())
    }

    /// 域名作为单个路径段编码
    fn owner_url(&self, domain_name: &str) -> Result<reqwest::Url, String> {
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|e| e.to_string())?;
        url.path_segments_mut()
            .map_err(|_| format!("registry URL cannot take a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(["names", domain_name, "owner"]);
        Ok(url)
    }
}

#[async_trait]
impl OwnershipOracle for BnsOwnershipClient {
    async fn verify_domain_ownership(&self, domain_name: &str, candidate: &str) -> OwnershipCheck {
        // 注册表大小写不敏感
        let name = domain_name.trim().to_lowercase();
        let url = match self.owner_url(&name) {
            Ok(url) => url,
            Err(e) => {
                tracing::error!(domain = %name, error = %e, "Invalid BNS registry URL");
                return OwnershipCheck::failed(
                    OwnershipOutcome::RegistryError,
                    format!("Failed to verify domain ownership: {}", e),
                );
            }
        };

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(domain = %name, error = %e, "BNS registry unreachable");
                return OwnershipCheck::failed(
                    OwnershipOutcome::TransportError,
                    format!("Failed to verify domain ownership: {}", e),
                );
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(domain = %name, error = %e, "Failed to read BNS registry response");
                return OwnershipCheck::failed(
                    OwnershipOutcome::TransportError,
                    format!("Failed to verify domain ownership: {}", e),
                );
            }
        };

        let check = interpret_registry_response(status, &body, &name, candidate);
        match check.outcome {
            OwnershipOutcome::Owner => {
                tracing::debug!(domain = %name, "Domain ownership confirmed")
            }
            OwnershipOutcome::RegistryError => {
                tracing::error!(domain = %name, status, error = ?check.error, "BNS registry error")
            }
            outcome => {
                tracing::info!(domain = %name, ?outcome, owner = ?check.owner_address, "Candidate is not the domain owner")
            }
        }
        check
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";
    const OTHER: &str = "SP3FBR2AGK5H9QBDH3EEN6DF8EK8JY7RX8QJ5SVTE";

    #[test]
    fn test_owner_match() {
        let body = format!(r#"{{"owner":"{}","status":"active"}}"#, OWNER);
        let check = interpret_registry_response(200, &body, "example.btc", OWNER);
        assert!(check.is_owner);
        assert_eq!(check.owner_address.as_deref(), Some(OWNER));
        assert!(check.error.is_none());
        assert_eq!(check.outcome, OwnershipOutcome::Owner);
    }

    #[test]
    fn test_owner_mismatch_reports_owner() {
        let body = format!(r#"{{"owner":"{}","status":"active"}}"#, OWNER);
        let check = interpret_registry_response(200, &body, "example.btc", OTHER);
        assert!(!check.is_owner);
        assert_eq!(check.owner_address.as_deref(), Some(OWNER));
        assert_eq!(check.outcome, OwnershipOutcome::NotOwner);
    }

    #[test]
    fn test_inactive_name() {
        let body = format!(r#"{{"owner":"{}","status":"expired"}}"#, OWNER);
        let check = interpret_registry_response(200, &body, "example.btc", OWNER);
        assert!(!check.is_owner);
        assert_eq!(check.outcome, OwnershipOutcome::Inactive);
        assert_eq!(check.error.as_deref(), Some("Domain example.btc is not active"));
    }

    #[test]
    fn test_not_found_by_status_or_body() {
        let check = interpret_registry_response(404, "", "nope.btc", OWNER);
        assert_eq!(check.outcome, OwnershipOutcome::NotFound);

        let check =
            interpret_registry_response(400, r#"{"error":"Name not found"}"#, "nope.btc", OWNER);
        assert_eq!(check.outcome, OwnershipOutcome::NotFound);
        assert!(check.error.unwrap().contains("not found"));
    }

    #[test]
    fn test_owner_url_encodes_name_as_one_segment() {
        let client = BnsOwnershipClient::new("http://registry.local/v1/").unwrap();
        let url = client.owner_url("example.btc").unwrap();
        assert_eq!(url.as_str(), "http://registry.local/v1/names/example.btc/owner");

        let url = client.owner_url("a/b?.btc").unwrap();
        assert_eq!(url.path(), "/v1/names/a%2Fb%3F.btc/owner");
        assert!(url.query().is_none());

        let root = BnsOwnershipClient::new("http://registry.local").unwrap();
        assert_eq!(
            root.owner_url("example.btc").unwrap().path(),
            "/names/example.btc/owner"
        );
    }

    #[test]
    fn test_other_registry_errors() {
        let check = interpret_registry_response(500, r#"{"error":"boom"}"#, "a.btc", OWNER);
        assert_eq!(check.outcome, OwnershipOutcome::RegistryError);
        assert_eq!(
            check.error.as_deref(),
            Some("Failed to verify domain ownership: boom")
        );

        let check = interpret_registry_response(200, "not json", "a.btc", OWNER);
        assert_eq!(check.outcome, OwnershipOutcome::RegistryError);
        assert!(!check.is_owner);
    }
}
