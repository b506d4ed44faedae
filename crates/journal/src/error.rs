use remote_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JournalError>;

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Trade not found: {0}")]
    TradeNotFound(String),

    #[error("Invalid trade: {0}")]
    InvalidForm(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
