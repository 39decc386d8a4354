use std::sync::Arc;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{
    api::{
        handlers::healthz,
        middleware::{trace_id_middleware, TraceId},
    },
    app_state::AppState,
    error::AppError,
};

pub mod binding_api;
pub mod domain_api;
pub mod handlers;
pub mod middleware;
pub mod response; // 统一响应格式

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::healthz,
        domain_api::register_domain,
        domain_api::get_domain,
        domain_api::list_domain_addresses,
        domain_api::list_owner_domains,
        domain_api::lookup_address,
        domain_api::check_ownership,
        binding_api::add_address,
        binding_api::remove_address,
        binding_api::authorization_message,
    ),
    components(schemas(
        crate::domain::Chain,
        crate::domain::VerificationMethod,
        crate::domain::BindingOperation,
        crate::domain::Domain,
        crate::domain::AddressBinding,
        crate::domain::BindingWithDomain,
        crate::domain::DomainWithBindings,
        crate::domain::AuthorizationMessage,
        crate::domain::RemovedBinding,
        crate::domain::SignatureProof,
        crate::service::BindOutcome,
        domain_api::RegisterDomainRequest,
        domain_api::CheckOwnershipRequest,
        domain_api::CheckOwnershipResponse,
        binding_api::AddAddressBody,
        binding_api::RemoveAddressBody,
        handlers::Healthz,
    )),
    tags(
        (name = "ironlink", description = "BNS domain to multi-chain address bindings")
    )
)]
pub struct ApiDoc;

/// 服务层错误转 AppError 并附带 trace_id
pub(crate) fn with_trace<E: Into<AppError>>(
    trace_id: &TraceId,
) -> impl FnOnce(E) -> AppError + '_ {
    move |e| e.into().with_trace_id(trace_id.as_str())
}

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .merge(utoipa_swagger_ui::SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        // 域名
        .route("/api/domains", post(domain_api::register_domain))
        .route("/api/domains/:domain", get(domain_api::get_domain))
        // GET 以域名定位，POST 以域名 id 定位
        .route(
            "/api/domains/:domain/addresses",
            get(domain_api::list_domain_addresses).post(binding_api::add_address),
        )
        .route(
            "/api/owners/:stacks_address/domains",
            get(domain_api::list_owner_domains),
        )
        .route("/api/check-ownership", post(domain_api::check_ownership))
        .route("/api/lookup", get(domain_api::lookup_address))
        // 绑定
        .route(
            "/api/addresses/:id/remove",
            post(binding_api::remove_address),
        )
        .route("/api/messages", get(binding_api::authorization_message))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(from_fn(trace_id_middleware)),
        )
        .with_state(state)
}
