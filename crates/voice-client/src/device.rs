//! Telephony device abstraction.
//!
//! Signaling and media live in the provider SDK. The call client only sees a
//! [`Device`] handle it owns and a stream of [`DeviceEvent`]s.

use async_trait::async_trait;
use std::fmt;
use tokio::sync::mpsc;
use voice_types::{Edge, Region};

/// Shown when the provider reports an error without a message.
pub const DEVICE_ERROR: &str = "Device error";

/// Error reported by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderError {
    pub code: Option<u32>,
    pub message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Message for display, never empty.
    pub fn message(&self) -> &str {
        if self.message.trim().is_empty() {
            DEVICE_ERROR
        } else {
            &self.message
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ProviderError {}

/// Events delivered by a device, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Registered,
    Error(ProviderError),
    Incoming { from: String },
    /// The current call was answered, by either side
    Accepted,
    Disconnected,
    Rejected,
    Cancelled,
}

pub type EventSender = mpsc::UnboundedSender<DeviceEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Opus,
    Pcmu,
}

/// Options a device is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOptions {
    pub codec_preferences: Vec<Codec>,
    /// Edge locations to try in order; provider default when `None`
    pub edge: Option<[Edge; 2]>,
}

impl DeviceOptions {
    pub fn for_region(region: Region) -> Self {
        Self {
            codec_preferences: vec![Codec::Opus, Codec::Pcmu],
            edge: region.edge_preference(),
        }
    }
}

/// A registered endpoint able to hold one call at a time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Device: Send {
    /// Register with the platform. `Registered` follows on the event stream.
    async fn register(&mut self) -> Result<(), ProviderError>;

    /// Start a call to `to`. Returns once the request is issued; progress
    /// arrives on the event stream.
    fn connect(&mut self, to: &str) -> Result<(), ProviderError>;

    /// Answer the ringing call.
    fn accept(&mut self);

    /// Decline the ringing call.
    fn reject(&mut self);

    /// End the current call.
    fn disconnect(&mut self);

    /// Release the device. No events follow.
    fn destroy(&mut self);
}

/// Creates devices from access tokens.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceProvider: Send + Sync {
    fn create(
        &self,
        token: &str,
        options: DeviceOptions,
        events: EventSender,
    ) -> Result<Box<dyn Device>, ProviderError>;
}
