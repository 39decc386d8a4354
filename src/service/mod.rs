pub mod address_binding_service; // ✅ 绑定/解绑编排
pub mod domain_service;
pub mod ownership_oracle; // BNS 所有权查询
pub mod wallet_error_classifier; // ✅ 钱包错误归类
pub mod wallet_signer;

pub use address_binding_service::{
    AddAddressRequest, AddressBindingService, AttemptContext, AttemptStage, BindOutcome,
    BindingError, DomainRef,
};
pub use domain_service::{DomainError, DomainService};
pub use ownership_oracle::{BnsOwnershipClient, OwnershipCheck, OwnershipOracle};
pub use wallet_error_classifier::{classify, ClassifiedWalletError, WalletErrorKind, WalletFailure};
pub use wallet_signer::{PresignedProof, WalletSigner};
