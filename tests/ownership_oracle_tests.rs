//! BNS 注册表客户端集成测试（本地 axum 桩服务）

use std::sync::{Arc, Mutex};

use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
use ironlink::service::{
    ownership_oracle::OwnershipOutcome, BnsOwnershipClient, OwnershipOracle,
};
use serde_json::{json, Value};

const OWNER: &str = "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7";

/// 启动桩注册表，返回 base_url 与收到的域名记录
async fn spawn_registry() -> (String, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorder = seen.clone();

    let app = Router::new().route(
        "/names/:name/owner",
        get(move |Path(name): Path<String>| {
            let recorder = recorder.clone();
            async move {
                recorder.lock().unwrap().push(name.clone());
                let (status, body): (StatusCode, Value) = match name.as_str() {
                    "example.btc" => (StatusCode::OK, json!({ "owner": OWNER, "status": "active" })),
                    "expired.btc" => (
                        StatusCode::OK,
                        json!({ "owner": OWNER, "status": "expired" }),
                    ),
                    "broken.btc" => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({ "error": "database unavailable" }),
                    ),
                    _ => (StatusCode::NOT_FOUND, json!({ "error": "Name not found" })),
                };
                (status, Json(body))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), seen)
}

#[tokio::test]
async fn test_owner_confirmed() {
    let (base_url, _) = spawn_registry().await;
    let client = BnsOwnershipClient::new(base_url).unwrap();

    let check = client.verify_domain_ownership("example.btc", OWNER).await;

    assert!(check.is_owner);
    assert_eq!(check.owner_address.as_deref(), Some(OWNER));
    assert_eq!(check.error, None);
    assert_eq!(check.outcome, OwnershipOutcome::Owner);
}

#[tokio::test]
async fn test_other_address_is_not_owner() {
    let (base_url, _) = spawn_registry().await;
    let client = BnsOwnershipClient::new(base_url).unwrap();

    let check = client
        .verify_domain_ownership("example.btc", "SP000000000000000000002Q6VF78")
        .await;

    assert!(!check.is_owner);
    assert_eq!(check.owner_address.as_deref(), Some(OWNER));
    assert_eq!(
        check.error.as_deref(),
        Some("You are not the owner of example.btc")
    );
}

#[tokio::test]
async fn test_unknown_domain() {
    let (base_url, _) = spawn_registry().await;
    let client = BnsOwnershipClient::new(base_url).unwrap();

    let check = client.verify_domain_ownership("ghost.btc", OWNER).await;

    assert!(!check.is_owner);
    assert_eq!(check.outcome, OwnershipOutcome::NotFound);
    assert_eq!(
        check.error.as_deref(),
        Some("Domain ghost.btc not found. Make sure it exists in the BNS system.")
    );
}

#[tokio::test]
async fn test_inactive_domain() {
    let (base_url, _) = spawn_registry().await;
    let client = BnsOwnershipClient::new(base_url).unwrap();

    let check = client.verify_domain_ownership("expired.btc", OWNER).await;

    assert!(!check.is_owner);
    assert_eq!(check.outcome, OwnershipOutcome::Inactive);
    assert_eq!(check.error.as_deref(), Some("Domain expired.btc is not active"));
}

#[tokio::test]
async fn test_registry_failure_is_not_a_verdict() {
    let (base_url, _) = spawn_registry().await;
    let client = BnsOwnershipClient::new(base_url).unwrap();

    let check = client.verify_domain_ownership("broken.btc", OWNER).await;

    assert!(!check.is_owner);
    assert_eq!(check.outcome, OwnershipOutcome::RegistryError);
    assert_eq!(
        check.error.as_deref(),
        Some("Failed to verify domain ownership: database unavailable")
    );
}

#[tokio::test]
async fn test_domain_name_is_lowercased() {
    let (base_url, seen) = spawn_registry().await;
    let client = BnsOwnershipClient::new(format!("{}/", base_url)).unwrap();

    let check = client.verify_domain_ownership("Example.BTC", OWNER).await;

    assert!(check.is_owner);
    assert_eq!(seen.lock().unwrap().as_slice(), ["example.btc".to_string()]);
}

#[tokio::test]
async fn test_unreachable_registry() {
    // 绑定后立即释放端口，连接会被拒绝
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = BnsOwnershipClient::new(format!("http://{}", addr)).unwrap();
    let check = client.verify_domain_ownership("example.btc", OWNER).await;

    assert!(!check.is_owner);
    assert_eq!(check.outcome, OwnershipOutcome::TransportError);
    assert!(check
        .error
        .unwrap()
        .starts_with("Failed to verify domain ownership:"));
}

#[tokio::test]
async fn test_name_with_path_characters_stays_one_segment() {
    let (base_url, seen) = spawn_registry().await;
    let client = BnsOwnershipClient::new(base_url).unwrap();

    let check = client.verify_domain_ownership("a/../b.btc", OWNER).await;

    assert_eq!(check.outcome, OwnershipOutcome::NotFound);
    assert_eq!(seen.lock().unwrap().as_slice(), ["a/../b.btc".to_string()]);
}
