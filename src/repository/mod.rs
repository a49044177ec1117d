//! Persistence layer: the bearer token kept between runs

pub mod tokens;

pub use tokens::{FileTokenStore, MemoryTokenStore, TokenStore};
