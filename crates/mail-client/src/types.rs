//! Email API types.

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

/// Outgoing email request.
#[derive(Debug, Clone, Serialize)]
pub struct SendEmailRequest {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Send email response.
#[derive(Debug, Clone, Deserialize)]
pub struct SendEmailResponse {
    pub id: Option<String>,
}

/// Sign-in link message contents.
#[derive(Debug, Clone)]
pub struct SignInLink {
    /// Host the link points at, shown in the message
    pub host: String,
    pub url: String,
}

impl SignInLink {
    pub fn subject(&self) -> String {
        format!("Sign in to {}", self.host)
    }

    pub fn text(&self) -> String {
        format!("Sign in to {}\n{}\n\n", self.host, self.url)
    }

    pub fn html(&self) -> String {
        let host = escape(&self.host);
        let url = escape(&self.url);
        format!(
            "<body><p>Sign in to <strong>{host}</strong></p>\
             <p><a href=\"{url}\" target=\"_blank\">Sign in</a></p>\
             <p>If you did not request this email you can safely ignore it.</p></body>"
        )
    }
}
