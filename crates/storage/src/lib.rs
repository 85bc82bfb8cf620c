#![forbid(unsafe_code)]

mod pool;
mod store;

pub use pool::{DEFAULT_MAX_IDLE, DEFAULT_MAX_LIFETIME, DEFAULT_MAX_OPEN, PoolConfig, StorePool};
pub use store::*;
