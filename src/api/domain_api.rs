//! 域名 API：登记、查询、所有权检查、反查

use std::{str::FromStr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::{
    middleware::TraceId,
    response::{success_response, success_response_with_message, ApiResult},
    with_trace,
};
use crate::{
    app_state::AppState,
    domain::{AddressBinding, BindingWithDomain, Chain, Domain, DomainWithBindings},
    error::AppError,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDomainRequest {
    /// 例如 example.btc
    pub name: String,
    pub owner_stacks_address: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckOwnershipRequest {
    pub domain_name: String,
    pub stacks_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckOwnershipResponse {
    pub is_owner: bool,
    pub domain_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_address: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ChainFilter {
    /// BTC / ETH / SOL（可省略）
    pub chain: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupQuery {
    pub address: String,
    pub chain: String,
}

/// 解析查询参数中的链（大小写不敏感）
pub(crate) fn parse_chain(raw: &str) -> Result<Chain, AppError> {
    Chain::from_str(raw).map_err(|e| AppError::chain_not_supported(e.to_string()))
}

#[utoipa::path(
    post,
    path = "/api/domains",
    request_body = RegisterDomainRequest,
    responses(
        (status = 200, description = "Domain registered", body = Domain),
        (status = 403, description = "Not the owner in the BNS registry"),
        (status = 409, description = "Domain already registered")
    )
)]
pub async fn register_domain(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Json(req): Json<RegisterDomainRequest>,
) -> ApiResult<Domain> {
    let domain = st
        .domain_service
        .register(&req.name, &req.owner_stacks_address)
        .await
        .map_err(with_trace(&trace_id))?;

    success_response_with_message(domain, "Domain registered successfully")
}

#[utoipa::path(
    get,
    path = "/api/domains/{domain}",
    params(("domain" = String, Path, description = "Domain name, e.g. example.btc")),
    responses(
        (status = 200, description = "Domain with its bound addresses", body = DomainWithBindings),
        (status = 404, description = "Domain not found")
    )
)]
pub async fn get_domain(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(name): Path<String>,
) -> ApiResult<DomainWithBindings> {
    let domain = st
        .domain_service
        .get_domain(&name)
        .await
        .map_err(with_trace(&trace_id))?;

    success_response(domain)
}

#[utoipa::path(
    get,
    path = "/api/domains/{domain}/addresses",
    params(("domain" = String, Path, description = "Domain name"), ChainFilter),
    responses(
        (status = 200, description = "Bound addresses", body = [AddressBinding]),
        (status = 404, description = "Domain not found")
    )
)]
pub async fn list_domain_addresses(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(name): Path<String>,
    Query(filter): Query<ChainFilter>,
) -> ApiResult<Vec<AddressBinding>> {
    let chain = filter
        .chain
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(parse_chain)
        .transpose()
        .map_err(|e| e.with_trace_id(trace_id.as_str()))?;

    let bindings = st
        .domain_service
        .list_bindings(&name, chain)
        .await
        .map_err(with_trace(&trace_id))?;

    success_response(bindings)
}

#[utoipa::path(
    get,
    path = "/api/owners/{stacks_address}/domains",
    params(("stacks_address" = String, Path, description = "Owner Stacks address")),
    responses((status = 200, description = "Registered domains", body = [Domain]))
)]
pub async fn list_owner_domains(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(stacks_address): Path<String>,
) -> ApiResult<Vec<Domain>> {
    let domains = st
        .domain_service
        .domains_by_owner(&stacks_address)
        .await
        .map_err(with_trace(&trace_id))?;

    success_response(domains)
}

#[utoipa::path(
    get,
    path = "/api/lookup",
    params(LookupQuery),
    responses(
        (status = 200, description = "Domain bound to the address", body = BindingWithDomain),
        (status = 404, description = "Address is not bound")
    )
)]
pub async fn lookup_address(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<BindingWithDomain> {
    let chain = parse_chain(&query.chain).map_err(|e| e.with_trace_id(trace_id.as_str()))?;

    let found = st
        .domain_service
        .lookup(&query.address, chain)
        .await
        .map_err(with_trace(&trace_id))?;

    match found {
        Some(binding) => success_response(binding),
        None => Err(AppError::not_found(format!(
            "No domain bound to {} address {}",
            chain,
            query.address.trim()
        ))
        .with_trace_id(trace_id.as_str())),
    }
}

#[utoipa::path(
    post,
    path = "/api/check-ownership",
    request_body = CheckOwnershipRequest,
    responses(
        (status = 200, description = "Registry ownership check", body = CheckOwnershipResponse),
        (status = 400, description = "Invalid domain name")
    )
)]
pub async fn check_ownership(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Json(req): Json<CheckOwnershipRequest>,
) -> ApiResult<CheckOwnershipResponse> {
    if req.domain_name.trim().is_empty() || req.stacks_address.trim().is_empty() {
        return Err(
            AppError::bad_request("domainName and stacksAddress are required")
                .with_trace_id(trace_id.as_str()),
        );
    }

    let domain_name = req.domain_name.trim().to_lowercase();
    let check = st
        .domain_service
        .check_ownership(&domain_name, &req.stacks_address)
        .await
        .map_err(with_trace(&trace_id))?;

    let message = if check.is_owner {
        format!("You are the owner of {}", domain_name)
    } else {
        check
            .error
            .clone()
            .unwrap_or_else(|| format!("You are not the owner of {}", domain_name))
    };

    success_response(CheckOwnershipResponse {
        is_owner: check.is_owner,
        domain_name,
        owner_address: check.owner_address,
        message,
    })
}
