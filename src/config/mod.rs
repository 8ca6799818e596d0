//! Configuration management.

mod settings;

pub use settings::{
    AuthSettings, CacheSettings, DatabaseSettings, RedisSettings, ServerSettings, Settings,
    MIN_TOKEN_SECRET_LENGTH,
};
