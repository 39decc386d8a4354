// Repository 抽象层
pub mod address_binding_repository;
pub mod domain_repository;
pub mod store_error;

pub use address_binding_repository::{
    AddressBindingRepository, CreateBindingParams, PgAddressBindingRepository,
};
pub use domain_repository::{CreateDomainParams, DomainRepository, PgDomainRepository};
pub use store_error::StoreError;
