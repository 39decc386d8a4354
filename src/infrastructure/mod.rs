pub mod db;
pub mod logging;

pub use db::PgPool;
