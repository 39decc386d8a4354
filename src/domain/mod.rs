//! Domain 模块
//!
//! 包含核心业务逻辑和领域模型

pub mod address_binding;
pub mod authorization_message;
pub mod chain;

// Re-exports
pub use address_binding::{
    AddressBinding, BindingWithDomain, Domain, DomainWithBindings, RemovedBinding, SignatureProof,
};
pub use authorization_message::AuthorizationMessage;
pub use chain::{BindingOperation, Chain, VerificationMethod};
