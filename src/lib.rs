//! IronLink - BNS 域名多链地址绑定服务
//!
//! 域名所有者把 BTC / ETH / SOL 地址绑定到自己的域名下，
//! 每次绑定与解绑都必须先通过链上签名验证。后端不保存任何私钥。

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod repository;
pub mod security;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};
