use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{}", .0)]
    Custom(String),

    #[error("Config: {0}")]
    Config(#[from] tokenguard_core::ConfigError),

    #[error("Token: {0}")]
    Token(#[from] tokenguard_core::TokenError),

    #[error("Database: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}
