pub mod address_validator;

pub use address_validator::AddressValidator;
