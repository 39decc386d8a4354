//! 地址绑定服务
//!
//! 一次绑定/解绑尝试的状态流转：
//! Idle → MessageBuilt → AwaitingSignature → Verifying → Authorized | Rejected | Failed
//!      → Persisted | Unchanged
//!
//! 只有在签名验证通过之后才会写库；验签之前的任何失败（包括用户取消）都不产生副作用。
//! 地址以每条链的规范形式写库，(address, chain) 的全局唯一性交给数据库唯一约束，本服务不加锁。

use std::{fmt, sync::Arc};

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    wallet_error_classifier::{run_wallet_operation, ClassifiedWalletError, WalletErrorKind},
    wallet_signer::WalletSigner,
};
use crate::{
    domain::{
        AddressBinding, AuthorizationMessage, BindingOperation, Chain, Domain, SignatureProof,
        VerificationMethod,
    },
    repository::{AddressBindingRepository, CreateBindingParams, DomainRepository, StoreError},
    security::signature::{stacks, SignatureVerifier},
    utils::AddressValidator,
};

/// 单次尝试所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStage {
    Idle,
    MessageBuilt,
    AwaitingSignature,
    Verifying,
    Authorized,
    Rejected,
    Failed,
    Persisted,
    Unchanged,
}

/// 错误上下文：出错时涉及的链、地址与域名
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttemptContext {
    pub chain: Option<Chain>,
    pub address: Option<String>,
    pub domain: Option<String>,
}

impl fmt::Display for AttemptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain = self.chain.map(|c| c.symbol()).unwrap_or("-");
        write!(
            f,
            "chain={} address={} domain={}",
            chain,
            self.address.as_deref().unwrap_or("-"),
            self.domain.as_deref().unwrap_or("-")
        )
    }
}

fn chain_label(context: &AttemptContext) -> &'static str {
    context.chain.map(|c| c.symbol()).unwrap_or("blockchain")
}

fn join_fields(fields: &[String]) -> String {
    fields.join(", ")
}

/// 绑定流程错误（封闭集合）
#[derive(Debug, Error)]
pub enum BindingError {
    /// 用户在钱包中取消，调用方应静默回到操作前状态
    #[error("wallet operation cancelled by user ({context})")]
    UserRejected { context: AttemptContext },

    #[error("{message} ({context})")]
    WalletNotFound {
        message: String,
        context: AttemptContext,
    },

    #[error("{message} ({context})")]
    ConnectFailed {
        message: String,
        context: AttemptContext,
    },

    #[error("{message} ({context})")]
    NetworkError {
        message: String,
        context: AttemptContext,
    },

    #[error("{message} ({context})")]
    SignatureFailed {
        message: String,
        context: AttemptContext,
    },

    #[error("signature does not prove ownership ({context})")]
    InvalidSignature { context: AttemptContext },

    #[error("domain {name} not found")]
    DomainNotFound { name: String },

    #[error("address binding {id} not found")]
    BindingNotFound { id: Uuid },

    #[error(
        "This {} address is already registered in the system. Each address can only be registered once per blockchain. (conflicting fields: {})",
        chain_label(.context),
        join_fields(.fields)
    )]
    UniqueConstraintConflict {
        fields: Vec<String>,
        context: AttemptContext,
    },

    #[error("{message} ({context})")]
    Unknown {
        message: String,
        context: AttemptContext,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BindingError {
    /// 稳定的错误码
    pub fn code(&self) -> &'static str {
        match self {
            BindingError::UserRejected { .. } => "user_rejected",
            BindingError::WalletNotFound { .. } => "wallet_not_found",
            BindingError::ConnectFailed { .. } => "connect_failed",
            BindingError::NetworkError { .. } => "network_error",
            BindingError::SignatureFailed { .. } => "signature_failed",
            BindingError::InvalidSignature { .. } => "invalid_signature",
            BindingError::DomainNotFound { .. } => "domain_not_found",
            BindingError::BindingNotFound { .. } => "binding_not_found",
            BindingError::UniqueConstraintConflict { .. } => "unique_constraint_conflict",
            BindingError::Unknown { .. } => "unknown",
            BindingError::InvalidRequest(_) => "invalid_request",
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, BindingError::UserRejected { .. })
    }

    fn from_wallet(error: ClassifiedWalletError, context: AttemptContext) -> Self {
        let message = error.message;
        match error.kind {
            WalletErrorKind::UserRejected => BindingError::UserRejected { context },
            WalletErrorKind::WalletNotFound => BindingError::WalletNotFound { message, context },
            WalletErrorKind::ConnectFailed => BindingError::ConnectFailed { message, context },
            WalletErrorKind::NetworkError => BindingError::NetworkError { message, context },
            WalletErrorKind::SignatureFailed => BindingError::SignatureFailed { message, context },
            WalletErrorKind::Unknown => BindingError::Unknown { message, context },
        }
    }
}

/// 目标域名
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainRef {
    Name(String),
    Id(Uuid),
}

/// 绑定请求
#[derive(Debug, Clone)]
pub struct AddAddressRequest {
    pub domain: DomainRef,
    pub chain: Chain,
    pub address: String,
    pub method: VerificationMethod,
}

/// 绑定结果：`created == false` 表示该域名下已有相同绑定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BindOutcome {
    pub binding: AddressBinding,
    pub created: bool,
}

/// 单次尝试的状态跟踪（仅用于日志）
struct Attempt {
    operation: BindingOperation,
    stage: AttemptStage,
    context: AttemptContext,
}

impl Attempt {
    fn new(operation: BindingOperation) -> Self {
        Self {
            operation,
            stage: AttemptStage::Idle,
            context: AttemptContext::default(),
        }
    }

    fn advance(&mut self, stage: AttemptStage) {
        tracing::debug!(
            operation = %self.operation,
            from = ?self.stage,
            to = ?stage,
            chain = ?self.context.chain,
            address = ?self.context.address,
            domain = ?self.context.domain,
            "Binding attempt stage"
        );
        self.stage = stage;
    }

    fn store_failure(&mut self, err: impl fmt::Display) -> BindingError {
        self.advance(AttemptStage::Failed);
        tracing::error!(
            operation = %self.operation,
            context = %self.context,
            error = %err,
            "Address binding store failure"
        );
        BindingError::Unknown {
            message: format!("storage error: {}", err),
            context: self.context.clone(),
        }
    }
}

/// 地址绑定服务
pub struct AddressBindingService {
    domains: Arc<dyn DomainRepository>,
    bindings: Arc<dyn AddressBindingRepository>,
}

impl AddressBindingService {
    pub fn new(
        domains: Arc<dyn DomainRepository>,
        bindings: Arc<dyn AddressBindingRepository>,
    ) -> Self {
        Self { domains, bindings }
    }

    /// 绑定地址到域名
    pub async fn add_address(
        &self,
        request: AddAddressRequest,
        signer: &dyn WalletSigner,
    ) -> Result<BindOutcome, BindingError> {
        let mut attempt = Attempt::new(BindingOperation::Add);
        let chain = request.chain;
        let address = request.address.trim().to_string();
        attempt.context.chain = Some(chain);
        attempt.context.address = Some(address.clone());

        if address.is_empty() {
            return Err(BindingError::InvalidRequest(
                "address must not be empty".to_string(),
            ));
        }

        let domain = self.resolve_domain(&mut attempt, &request.domain).await?;
        attempt.context.domain = Some(domain.name.clone());

        if !AddressValidator::validate(chain, &address) {
            return Err(BindingError::InvalidRequest(format!(
                "invalid {} address: {}",
                chain, address
            )));
        }
        // 大小写不同的同一地址必须命中同一条唯一约束
        let address = AddressValidator::canonicalize(chain, &address);
        attempt.context.address = Some(address.clone());

        let message = AuthorizationMessage::build_for(
            request.method,
            chain,
            BindingOperation::Add,
            &address,
            &domain.name,
        )
        .map_err(|e| BindingError::InvalidRequest(e.to_string()))?;
        attempt.advance(AttemptStage::MessageBuilt);

        let proof = Self::obtain_proof(&mut attempt, &message, signer).await?;
        Self::authorize(
            &mut attempt,
            request.method,
            (chain, &address),
            &message,
            &proof,
            &domain,
        )?;

        // 同一域名下已存在相同绑定：幂等返回
        let existing = self
            .bindings
            .find(Some(domain.id), &address, chain)
            .await
            .map_err(|e| attempt.store_failure(e))?;
        if let Some(binding) = existing {
            attempt.advance(AttemptStage::Unchanged);
            tracing::info!(binding_id = %binding.id, context = %attempt.context, "Address already bound to domain");
            return Ok(BindOutcome {
                binding,
                created: false,
            });
        }

        let params = CreateBindingParams {
            domain_id: domain.id,
            chain,
            address: address.clone(),
        };
        match self.bindings.create(params).await {
            Ok(binding) => {
                attempt.advance(AttemptStage::Persisted);
                tracing::info!(binding_id = %binding.id, context = %attempt.context, "✅ Address bound to domain");
                Ok(BindOutcome {
                    binding,
                    created: true,
                })
            }
            Err(StoreError::UniqueViolation { fields }) => {
                // 并发的同域名请求先写入时仍按幂等处理
                let winner = self
                    .bindings
                    .find(Some(domain.id), &address, chain)
                    .await
                    .map_err(|e| attempt.store_failure(e))?;
                if let Some(binding) = winner {
                    attempt.advance(AttemptStage::Unchanged);
                    return Ok(BindOutcome {
                        binding,
                        created: false,
                    });
                }

                attempt.advance(AttemptStage::Unchanged);
                tracing::warn!(context = %attempt.context, ?fields, "Address already bound to another domain");
                Err(BindingError::UniqueConstraintConflict {
                    fields,
                    context: attempt.context,
                })
            }
            Err(StoreError::Other(e)) => Err(attempt.store_failure(e)),
        }
    }

    /// 解绑地址
    ///
    /// 绑定不存在时直接返回 `BindingNotFound`，不会请求签名
    pub async fn remove_address(
        &self,
        binding_id: Uuid,
        method: VerificationMethod,
        signer: &dyn WalletSigner,
    ) -> Result<AddressBinding, BindingError> {
        self.remove(binding_id, Some(method), signer).await
    }

    /// 解绑地址，验证方式取绑定所在链的默认方式
    pub async fn remove_address_with_default(
        &self,
        binding_id: Uuid,
        signer: &dyn WalletSigner,
    ) -> Result<AddressBinding, BindingError> {
        self.remove(binding_id, None, signer).await
    }

    async fn remove(
        &self,
        binding_id: Uuid,
        method: Option<VerificationMethod>,
        signer: &dyn WalletSigner,
    ) -> Result<AddressBinding, BindingError> {
        let mut attempt = Attempt::new(BindingOperation::Remove);

        let found = self
            .bindings
            .find_by_id_with_domain(binding_id)
            .await
            .map_err(|e| attempt.store_failure(e))?
            .ok_or(BindingError::BindingNotFound { id: binding_id })?;
        let (binding, domain) = (found.binding, found.domain);
        attempt.context = AttemptContext {
            chain: Some(binding.chain),
            address: Some(binding.address.clone()),
            domain: Some(domain.name.clone()),
        };
        let method = method.unwrap_or_else(|| binding.chain.default_verification());

        let message = AuthorizationMessage::build_for(
            method,
            binding.chain,
            BindingOperation::Remove,
            &binding.address,
            &domain.name,
        )
        .map_err(|e| BindingError::InvalidRequest(e.to_string()))?;
        attempt.advance(AttemptStage::MessageBuilt);

        let proof = Self::obtain_proof(&mut attempt, &message, signer).await?;
        Self::authorize(
            &mut attempt,
            method,
            (binding.chain, &binding.address),
            &message,
            &proof,
            &domain,
        )?;

        let deleted = self
            .bindings
            .delete(binding.id)
            .await
            .map_err(|e| attempt.store_failure(e))?;
        if !deleted {
            // 验签期间被其他请求删除
            attempt.advance(AttemptStage::Unchanged);
            return Err(BindingError::BindingNotFound { id: binding_id });
        }

        attempt.advance(AttemptStage::Persisted);
        tracing::info!(binding_id = %binding.id, context = %attempt.context, "✅ Address unbound from domain");
        Ok(binding)
    }

    async fn resolve_domain(
        &self,
        attempt: &mut Attempt,
        domain: &DomainRef,
    ) -> Result<Domain, BindingError> {
        match domain {
            DomainRef::Name(name) => {
                let name = name.trim().to_lowercase();
                if name.is_empty() {
                    return Err(BindingError::InvalidRequest(
                        "domain name must not be empty".to_string(),
                    ));
                }
                self.domains
                    .find_by_name(&name)
                    .await
                    .map_err(|e| attempt.store_failure(e))?
                    .ok_or(BindingError::DomainNotFound { name })
            }
            DomainRef::Id(id) => self
                .domains
                .find_by_id(*id)
                .await
                .map_err(|e| attempt.store_failure(e))?
                .ok_or_else(|| BindingError::DomainNotFound {
                    name: id.to_string(),
                }),
        }
    }

    async fn obtain_proof(
        attempt: &mut Attempt,
        message: &AuthorizationMessage,
        signer: &dyn WalletSigner,
    ) -> Result<SignatureProof, BindingError> {
        attempt.advance(AttemptStage::AwaitingSignature);
        match run_wallet_operation(signer.sign(message)).await {
            Ok(proof) => Ok(proof),
            Err(error) if error.is_user_rejection() => {
                // 回到操作前状态，不视为故障
                attempt.advance(AttemptStage::Idle);
                Err(BindingError::UserRejected {
                    context: attempt.context.clone(),
                })
            }
            Err(error) => {
                attempt.advance(AttemptStage::Failed);
                Err(BindingError::from_wallet(error, attempt.context.clone()))
            }
        }
    }

    /// 验签 + 身份归属检查
    ///
    /// Stacks：签名公钥推导出的 Stacks 地址必须等于域名所有者地址；
    /// Native：以声明的链上地址本身作为验签身份
    fn authorize(
        attempt: &mut Attempt,
        method: VerificationMethod,
        (chain, address): (Chain, &str),
        message: &AuthorizationMessage,
        proof: &SignatureProof,
        domain: &Domain,
    ) -> Result<(), BindingError> {
        attempt.advance(AttemptStage::Verifying);

        let verifier = SignatureVerifier::select(method, chain);
        let identity = match verifier {
            SignatureVerifier::Stacks => proof.identity.as_str(),
            SignatureVerifier::Ethereum | SignatureVerifier::Solana => address,
        };

        let verdict = verifier.verdict(message.as_str(), &proof.signature, identity);
        let owner_matches = match verifier {
            SignatureVerifier::Stacks => {
                stacks::public_key_matches_address(identity, &domain.owner_stacks_address)
            }
            SignatureVerifier::Ethereum | SignatureVerifier::Solana => true,
        };

        if verdict.verified && owner_matches {
            attempt.advance(AttemptStage::Authorized);
            return Ok(());
        }

        attempt.advance(AttemptStage::Rejected);
        tracing::warn!(
            verifier = verifier.name(),
            context = %attempt.context,
            reason = ?verdict.reason,
            owner_matches,
            "Ownership proof rejected"
        );
        Err(BindingError::InvalidSignature {
            context: attempt.context.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        let context = AttemptContext::default();
        assert_eq!(
            BindingError::UserRejected {
                context: context.clone()
            }
            .code(),
            "user_rejected"
        );
        assert_eq!(
            BindingError::BindingNotFound { id: Uuid::nil() }.code(),
            "binding_not_found"
        );
        assert_eq!(
            BindingError::InvalidRequest("x".into()).code(),
            "invalid_request"
        );
    }

    #[test]
    fn test_conflict_message_names_chain_and_fields() {
        let err = BindingError::UniqueConstraintConflict {
            fields: vec!["address".into(), "chain".into()],
            context: AttemptContext {
                chain: Some(Chain::Eth),
                address: Some("0xabc".into()),
                domain: Some("example.btc".into()),
            },
        };
        let text = err.to_string();
        assert!(text.starts_with("This ETH address is already registered in the system."));
        assert!(text.ends_with("(conflicting fields: address, chain)"));
    }

    #[test]
    fn test_wallet_kinds_map_to_binding_errors() {
        let context = AttemptContext::default();
        let classified = ClassifiedWalletError {
            kind: WalletErrorKind::NetworkError,
            message: "offline".into(),
            cause: "offline".into(),
        };
        let err = BindingError::from_wallet(classified, context.clone());
        assert_eq!(err.code(), "network_error");

        let classified = ClassifiedWalletError {
            kind: WalletErrorKind::UserRejected,
            message: "cancelled".into(),
            cause: "cancelled".into(),
        };
        assert!(BindingError::from_wallet(classified, context).is_user_rejection());
    }

    #[test]
    fn test_context_display() {
        let context = AttemptContext {
            chain: Some(Chain::Sol),
            address: None,
            domain: Some("a.btc".into()),
        };
        assert_eq!(context.to_string(), "chain=SOL address=- domain=a.btc");
    }
}
