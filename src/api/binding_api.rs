//! 地址绑定 API
//!
//! 客户端只提交签名与身份，待签名消息一律由服务端重建

use std::{str::FromStr, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{
    domain_api::parse_chain,
    middleware::TraceId,
    response::{success_response, success_response_with_message, ApiResult},
    with_trace,
};
use crate::{
    app_state::AppState,
    domain::{AuthorizationMessage, BindingOperation, Chain, RemovedBinding, VerificationMethod},
    error::AppError,
    service::{AddAddressRequest, BindOutcome, DomainRef, PresignedProof},
    utils::AddressValidator,
};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddAddressBody {
    pub chain: Chain,
    pub address: String,
    /// 省略时使用链的默认方式（BTC=stacks，ETH/SOL=native）
    pub method: Option<VerificationMethod>,
    pub signature: String,
    /// Stacks：十六进制公钥；ETH：0x 地址；SOL：base58 公钥
    #[serde(alias = "publicKey")]
    pub identity: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAddressBody {
    pub method: Option<VerificationMethod>,
    pub signature: String,
    #[serde(alias = "publicKey")]
    pub identity: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MessageQuery {
    pub chain: String,
    /// add / remove
    pub operation: String,
    pub address: String,
    pub domain: String,
    /// stacks / native（可省略）
    pub method: Option<VerificationMethod>,
}

#[utoipa::path(
    post,
    path = "/api/domains/{domain}/addresses",
    params(("domain" = Uuid, Path, description = "Domain id")),
    request_body = AddAddressBody,
    responses(
        (status = 200, description = "Binding created or already present", body = BindOutcome),
        (status = 400, description = "Invalid signature or request"),
        (status = 404, description = "Domain not found"),
        (status = 409, description = "Address already bound to another domain")
    )
)]
pub async fn add_address(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(domain_id): Path<Uuid>,
    Json(body): Json<AddAddressBody>,
) -> ApiResult<BindOutcome> {
    let method = body
        .method
        .unwrap_or_else(|| body.chain.default_verification());
    let signer = PresignedProof::new(body.signature, body.identity);
    let request = AddAddressRequest {
        domain: DomainRef::Id(domain_id),
        chain: body.chain,
        address: body.address,
        method,
    };

    let outcome = st
        .binding_service
        .add_address(request, &signer)
        .await
        .map_err(with_trace(&trace_id))?;

    let message = if outcome.created {
        "Address added successfully"
    } else {
        "Address is already bound to this domain"
    };
    success_response_with_message(outcome, message)
}

#[utoipa::path(
    post,
    path = "/api/addresses/{id}/remove",
    params(("id" = Uuid, Path, description = "Binding id")),
    request_body = RemoveAddressBody,
    responses(
        (status = 200, description = "Binding removed", body = RemovedBinding),
        (status = 400, description = "Invalid signature"),
        (status = 404, description = "Binding not found")
    )
)]
pub async fn remove_address(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(binding_id): Path<Uuid>,
    Json(body): Json<RemoveAddressBody>,
) -> ApiResult<RemovedBinding> {
    let signer = PresignedProof::new(body.signature, body.identity);

    // 方式未指定时，按绑定所在链的默认方式在服务内确定
    let removed = match body.method {
        Some(method) => {
            st.binding_service
                .remove_address(binding_id, method, &signer)
                .await
        }
        None => {
            st.binding_service
                .remove_address_with_default(binding_id, &signer)
                .await
        }
    }
    .map_err(with_trace(&trace_id))?;

    success_response(RemovedBinding {
        message: "Address removed successfully".to_string(),
        removed,
    })
}

#[utoipa::path(
    get,
    path = "/api/messages",
    params(MessageQuery),
    responses((status = 200, description = "Canonical message to sign", body = AuthorizationMessage))
)]
pub async fn authorization_message(
    Extension(trace_id): Extension<TraceId>,
    Query(query): Query<MessageQuery>,
) -> ApiResult<AuthorizationMessage> {
    let chain = parse_chain(&query.chain).map_err(|e| e.with_trace_id(trace_id.as_str()))?;
    let operation = BindingOperation::from_str(&query.operation)
        .map_err(|e| AppError::bad_request(e.to_string()).with_trace_id(trace_id.as_str()))?;
    let method = query
        .method
        .unwrap_or_else(|| chain.default_verification());

    let message = AuthorizationMessage::build_for(
        method,
        chain,
        operation,
        &AddressValidator::canonicalize(chain, &query.address),
        &query.domain.trim().to_lowercase(),
    )
    .map_err(|e| AppError::bad_request(e.to_string()).with_trace_id(trace_id.as_str()))?;

    success_response(message)
}
