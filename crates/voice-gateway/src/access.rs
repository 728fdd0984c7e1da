//! Email and domain allow-lists gating session establishment.
//!
//! The gate runs after the user has proven control of the address, never
//! before, so sign-in links are always sent and only the final session is
//! withheld.

use crate::config::AccessConfig;
use serde::Deserialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Decision applied when both allow-lists are empty.
///
/// Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum UnrestrictedPolicy {
    /// Anyone who verifies an address may sign in
    #[default]
    #[serde(rename = "allow", alias = "allow_all")]
    AllowAll,
    /// Nobody may sign in until an allow-list is configured
    #[serde(rename = "deny", alias = "deny_all")]
    DenyAll,
}

/// Decide whether `email` may sign in.
///
/// List entries must already be lowercase; the email is normalized here.
pub fn decide(
    email: &str,
    allowed_emails: &HashSet<String>,
    allowed_domains: &HashSet<String>,
    unrestricted: UnrestrictedPolicy,
) -> bool {
    if allowed_emails.is_empty() && allowed_domains.is_empty() {
        return unrestricted == UnrestrictedPolicy::AllowAll;
    }

    let email = email.trim().to_lowercase();
    if allowed_emails.contains(&email) {
        return true;
    }

    match email.rsplit_once('@') {
        Some((_, domain)) => allowed_domains.contains(domain),
        None => false,
    }
}

/// Parse a comma-separated allow-list into normalized entries.
pub fn parse_list(list: &str) -> HashSet<String> {
    list.split(',')
        .map(|entry| entry.trim().to_lowercase())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Configured access gate.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    allowed_emails: HashSet<String>,
    allowed_domains: HashSet<String>,
    unrestricted: UnrestrictedPolicy,
}

impl AccessGate {
    pub fn new<E, D>(emails: E, domains: D, unrestricted: UnrestrictedPolicy) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let normalize = |s: &str| s.trim().to_lowercase();
        Self {
            allowed_emails: emails
                .into_iter()
                .map(|e| normalize(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
            allowed_domains: domains
                .into_iter()
                .map(|d| normalize(d.as_ref()))
                .filter(|d| !d.is_empty())
                .collect(),
            unrestricted,
        }
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        Self {
            allowed_emails: parse_list(&config.allowed_emails),
            allowed_domains: parse_list(&config.allowed_domains),
            unrestricted: config.when_unrestricted,
        }
    }

    /// Whether no allow-list is configured.
    pub fn is_unrestricted(&self) -> bool {
        self.allowed_emails.is_empty() && self.allowed_domains.is_empty()
    }

    /// Decide for `email`, logging denials.
    pub fn allows(&self, email: &str) -> bool {
        let allowed = decide(
            email,
            &self.allowed_emails,
            &self.allowed_domains,
            self.unrestricted,
        );

        if self.is_unrestricted() {
            debug!(policy = ?self.unrestricted, "No email restrictions configured");
        }
        if !allowed {
            warn!(email = %email, "Access denied");
        }
        allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_lists_follow_default_policy() {
        let empty = HashSet::new();
        for email in ["a@x.com", "anyone@anywhere.org", "no-at-sign"] {
            assert!(decide(email, &empty, &empty, UnrestrictedPolicy::default()));
            assert!(!decide(email, &empty, &empty, UnrestrictedPolicy::DenyAll));
        }
    }

    #[test]
    fn test_email_match_is_case_insensitive() {
        let emails = set(&["a@x.com"]);
        assert!(decide("A@X.com", &emails, &HashSet::new(), UnrestrictedPolicy::DenyAll));
        assert!(!decide("b@x.com", &emails, &HashSet::new(), UnrestrictedPolicy::AllowAll));
    }

    #[test]
    fn test_domain_match() {
        let domains = set(&["x.com"]);
        assert!(decide("b@x.com", &HashSet::new(), &domains, UnrestrictedPolicy::DenyAll));
        assert!(!decide("b@y.com", &HashSet::new(), &domains, UnrestrictedPolicy::AllowAll));
    }

    #[test]
    fn test_domain_is_after_last_at() {
        let domains = set(&["x.com"]);
        assert!(decide("weird@name@x.com", &HashSet::new(), &domains, UnrestrictedPolicy::DenyAll));
        assert!(!decide("b@x.com@evil.com", &HashSet::new(), &domains, UnrestrictedPolicy::DenyAll));
    }

    #[test]
    fn test_either_list_grants() {
        let emails = set(&["boss@partner.org"]);
        let domains = set(&["x.com"]);
        assert!(decide("boss@partner.org", &emails, &domains, UnrestrictedPolicy::DenyAll));
        assert!(decide("dev@x.com", &emails, &domains, UnrestrictedPolicy::DenyAll));
        assert!(!decide("intern@partner.org", &emails, &domains, UnrestrictedPolicy::AllowAll));
    }

    #[test]
    fn test_missing_at_sign_only_matches_email_list() {
        let domains = set(&["x.com"]);
        assert!(!decide("x.com", &HashSet::new(), &domains, UnrestrictedPolicy::AllowAll));
    }

    #[test]
    fn test_parse_list() {
        let list = parse_list(" A@X.com, ,b@y.com,, ");
        assert_eq!(list, set(&["a@x.com", "b@y.com"]));
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_gate_from_config() {
        let gate = AccessGate::from_config(&AccessConfig {
            allowed_emails: String::new(),
            allowed_domains: "Example.com".into(),
            when_unrestricted: UnrestrictedPolicy::AllowAll,
        });

        assert!(!gate.is_unrestricted());
        assert!(gate.allows("someone@EXAMPLE.com"));
        assert!(!gate.allows("someone@other.com"));
    }

    #[test]
    fn test_gate_new_normalizes_entries() {
        let gate = AccessGate::new(["  Alice@X.com "], Vec::<String>::new(), UnrestrictedPolicy::DenyAll);
        assert!(gate.allows("alice@x.com"));
    }

    #[test]
    fn test_policy_deserialization() {
        let allow: UnrestrictedPolicy = serde_json::from_str("\"allow\"").unwrap();
        let deny: UnrestrictedPolicy = serde_json::from_str("\"deny\"").unwrap();
        assert_eq!(allow, UnrestrictedPolicy::AllowAll);
        assert_eq!(deny, UnrestrictedPolicy::DenyAll);
    }
}
