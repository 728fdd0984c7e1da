//! Voice Gateway - access tokens, call routing and sign-in for browser calling.
//!
//! The gateway:
//! - Issues short-lived voice access tokens bound to a fresh identity
//! - Answers the telephony platform's call webhook with call-control XML
//! - Signs users in with emailed links, gated by email and domain allow-lists

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod inbound;
pub mod token;

pub use access::{AccessGate, UnrestrictedPolicy};
pub use auth::{SignIn, SignInOutcome};
pub use config::Config;
pub use error::GatewayError;
pub use inbound::{route, RoutingInstruction};
pub use token::{Credential, CredentialIssuer};
