//! Inbound call routing.

mod twiml;

pub use twiml::{render, CONTENT_TYPE};

/// Destination prefix addressing another registered client.
pub const CLIENT_PREFIX: &str = "client:";

/// Spoken when an inbound call has no destination.
pub const GOODBYE_MESSAGE: &str = "Thank you for calling. Goodbye.";

/// How an inbound call leg should be handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingInstruction {
    /// Bridge to another registered client identity
    BridgeToClient { identity: String },
    /// Bridge to a public phone number, optionally overriding the caller id
    BridgeToNumber {
        number: String,
        caller_id: Option<String>,
    },
    /// Speak a message and hang up
    AnnounceAndEnd { message: String },
}

/// Decide how to handle a call addressed to `destination`.
pub fn route(destination: Option<&str>, caller_id: &str) -> RoutingInstruction {
    match destination {
        Some(to) if !to.is_empty() => match to.strip_prefix(CLIENT_PREFIX) {
            Some(identity) => RoutingInstruction::BridgeToClient {
                identity: identity.to_string(),
            },
            None => RoutingInstruction::BridgeToNumber {
                number: to.to_string(),
                caller_id: (!caller_id.is_empty()).then(|| caller_id.to_string()),
            },
        },
        _ => RoutingInstruction::AnnounceAndEnd {
            message: GOODBYE_MESSAGE.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_to_client() {
        assert_eq!(
            route(Some("client:abc"), "+1999"),
            RoutingInstruction::BridgeToClient {
                identity: "abc".into()
            }
        );
    }

    #[test]
    fn test_route_to_number() {
        assert_eq!(
            route(Some("+15551234567"), "+1999"),
            RoutingInstruction::BridgeToNumber {
                number: "+15551234567".into(),
                caller_id: Some("+1999".into()),
            }
        );
    }

    #[test]
    fn test_route_to_number_without_caller_id() {
        assert_eq!(
            route(Some("+15551234567"), ""),
            RoutingInstruction::BridgeToNumber {
                number: "+15551234567".into(),
                caller_id: None,
            }
        );
    }

    #[test]
    fn test_route_without_destination() {
        let expected = RoutingInstruction::AnnounceAndEnd {
            message: GOODBYE_MESSAGE.into(),
        };
        assert_eq!(route(None, "+1999"), expected);
        assert_eq!(route(Some(""), "+1999"), expected);
    }

    #[test]
    fn test_client_prefix_is_only_stripped_at_start() {
        assert_eq!(
            route(Some("sip:client:abc"), ""),
            RoutingInstruction::BridgeToNumber {
                number: "sip:client:abc".into(),
                caller_id: None,
            }
        );
    }
}
