pub mod auth;
pub mod error;
pub mod filter;
pub mod form;
pub mod service;

// Re-export commonly used items
pub use crate::auth::AuthGate;
pub use crate::error::{JournalError, Result};
pub use crate::filter::{Selector, TradeFilter};
pub use crate::form::TradeForm;
pub use crate::service::{TradeImages, TradeJournal};
