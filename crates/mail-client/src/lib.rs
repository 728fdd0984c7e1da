//! Transactional email client used to deliver sign-in links.

mod client;
mod error;
mod types;

pub use client::MailClient;
pub use error::MailError;
pub use types::*;
