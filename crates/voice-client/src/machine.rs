//! Client call state machine.
//!
//! [`Phone`] owns at most one device and at most one call attempt. Every
//! transition emits a [`StatusUpdate`]. Errors never escape: they become
//! status messages and, where needed, a phase change.

use crate::device::{Device, DeviceEvent, DeviceOptions, DeviceProvider, ProviderError};
use crate::error::{ActionError, ClientError};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use voice_types::{Region, TokenResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    FetchingCredential,
    Registering,
    Ready,
    Connecting,
    Ringing,
    Active,
    /// Reported when a call ends; the phone settles in `Ready`
    Ended,
    /// Terminal until reinitialized
    RegistrationFailed,
    /// Reported when a call fails; the phone settles in `Ready`
    CallFailed,
}

impl Phase {
    /// Whether a call attempt exists in this phase.
    pub fn in_call(&self) -> bool {
        matches!(self, Phase::Connecting | Phase::Ringing | Phase::Active)
    }

    fn registering(&self) -> bool {
        matches!(self, Phase::FetchingCredential | Phase::Registering)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// The one call the phone is handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallAttempt {
    /// Destination for outgoing calls, caller for incoming ones
    pub remote: String,
    pub direction: Direction,
}

/// A UI-observable transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub phase: Phase,
    pub message: String,
}

impl fmt::Display for StatusUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub mod status {
    pub const FETCHING: &str = "Fetching access token...";
    pub const SETTING_UP: &str = "Setting up device...";
    pub const READY: &str = "Ready to make calls";
    pub const CONNECTING: &str = "Connecting...";
    pub const CONNECTED: &str = "Call connected";
    pub const IN_PROGRESS: &str = "Call in progress";
    pub const ENDED: &str = "Call ended";
    pub const CANCELLED: &str = "Call cancelled";
    pub const REJECTED: &str = "Call rejected";
    pub const NOT_READY: &str = "Device not ready";
    pub const ENTER_NUMBER: &str = "Please enter a phone number";
}

/// Call state machine for one browser session.
pub struct Phone {
    provider: Arc<dyn DeviceProvider>,
    status_tx: mpsc::UnboundedSender<StatusUpdate>,
    phase: Phase,
    device: Option<Box<dyn Device>>,
    events: Option<mpsc::UnboundedReceiver<DeviceEvent>>,
    attempt: Option<CallAttempt>,
    identity: Option<String>,
    region: Option<Region>,
    last_status: Option<StatusUpdate>,
    mounted: bool,
    released: bool,
    /// `Registered` arrived before `register()` handed the device back
    registration_confirmed: bool,
    /// Identifies the credential fetch the phone is waiting for
    generation: u64,
}

/// A created device whose `register()` still has to run.
///
/// The runtime drives registration outside its loop and hands the device
/// back through [`Phone::registered`]. Whoever holds it when the phone goes
/// away must call [`Device::destroy`].
pub struct Registration {
    pub generation: u64,
    pub device: Box<dyn Device>,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl Phone {
    pub fn new(
        provider: Arc<dyn DeviceProvider>,
        status_tx: mpsc::UnboundedSender<StatusUpdate>,
    ) -> Self {
        Self {
            provider,
            status_tx,
            phase: Phase::Idle,
            device: None,
            events: None,
            attempt: None,
            identity: None,
            region: None,
            last_status: None,
            mounted: false,
            released: false,
            registration_confirmed: false,
            generation: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn attempt(&self) -> Option<&CallAttempt> {
        self.attempt.as_ref()
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn last_status(&self) -> Option<&StatusUpdate> {
        self.last_status.as_ref()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn emit(&mut self, phase: Phase, message: impl Into<String>) {
        let update = StatusUpdate {
            phase,
            message: message.into(),
        };
        debug!(phase = ?update.phase, status = %update.message, "Status");
        // The UI may have gone away; the machine keeps its state regardless.
        let _ = self.status_tx.send(update.clone());
        self.last_status = Some(update);
    }

    fn transition(&mut self, phase: Phase, message: impl Into<String>) {
        self.phase = phase;
        self.emit(phase, message);
    }

    /// Begin initialization. Returns the fetch generation to start, or
    /// `None` if already mounted or shut down.
    pub fn mount(&mut self) -> Option<u64> {
        if self.mounted || self.released {
            debug!("Mount ignored");
            return None;
        }

        self.mounted = true;
        self.generation += 1;
        self.transition(Phase::FetchingCredential, status::FETCHING);
        Some(self.generation)
    }

    /// Apply the result of credential fetch `generation`.
    ///
    /// On success the device is created and returned for registration.
    #[instrument(skip(self, result))]
    pub fn credential_ready(
        &mut self,
        generation: u64,
        result: Result<TokenResponse, ClientError>,
    ) -> Option<Registration> {
        if self.released || generation != self.generation || self.phase != Phase::FetchingCredential
        {
            debug!("Stale credential dropped");
            return None;
        }

        let credential = match result {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "Credential fetch failed");
                let reason = e.status_message().to_string();
                self.fail_registration(&reason);
                return None;
            }
        };

        info!(identity = %credential.identity, region = %credential.region, "Credential received");
        self.identity = Some(credential.identity.clone());
        self.region = Some(credential.region);
        self.registration_confirmed = false;
        self.transition(Phase::Registering, status::SETTING_UP);

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let options = DeviceOptions::for_region(credential.region);
        match self.provider.create(&credential.token, options, events_tx) {
            Ok(device) => {
                self.events = Some(events_rx);
                Some(Registration { generation, device })
            }
            Err(e) => {
                self.fail_registration(e.message());
                None
            }
        }
    }

    /// Take back a device once its `register()` resolved.
    ///
    /// A device from an older generation, or one arriving after teardown,
    /// is destroyed on the spot.
    #[instrument(skip_all, fields(generation = registration.generation))]
    pub fn registered(&mut self, registration: Registration, result: Result<(), ProviderError>) {
        let Registration {
            generation,
            mut device,
        } = registration;

        if self.released || generation != self.generation || self.device.is_some() {
            debug!("Stale registration dropped");
            device.destroy();
            return;
        }

        self.device = Some(device);
        match result {
            Ok(()) if self.phase == Phase::Registering && self.registration_confirmed => {
                self.transition(Phase::Ready, status::READY);
            }
            Ok(()) => debug!("Registration accepted, waiting for confirmation"),
            Err(e) if self.phase == Phase::Registering => self.fail_registration(e.message()),
            Err(e) => debug!(error = %e, phase = ?self.phase, "Registration error ignored"),
        }
    }

    fn fail_registration(&mut self, reason: &str) {
        warn!(reason = %reason, "Initialization failed");
        self.transition(
            Phase::RegistrationFailed,
            format!("Failed to initialize: {}", reason),
        );
    }

    /// Next provider event. Pending while no device has been created.
    pub async fn next_event(&mut self) -> Option<DeviceEvent> {
        let Some(events) = self.events.as_mut() else {
            return std::future::pending().await;
        };

        let event = events.recv().await;
        if event.is_none() {
            self.events = None;
        }
        event
    }

    /// Apply a provider event.
    #[instrument(skip(self))]
    pub async fn on_event(&mut self, event: DeviceEvent) {
        if self.released {
            return;
        }

        match event {
            DeviceEvent::Registered => {
                if self.phase == Phase::Registering && self.device.is_some() {
                    self.transition(Phase::Ready, status::READY);
                } else if self.phase == Phase::Registering {
                    self.registration_confirmed = true;
                } else {
                    debug!(phase = ?self.phase, "Registration event ignored");
                }
            }
            DeviceEvent::Error(e) => self.on_provider_error(e),
            DeviceEvent::Incoming { from } => {
                if self.phase != Phase::Ready {
                    debug!(from = %from, phase = ?self.phase, "Incoming call ignored");
                    return;
                }
                self.attempt = Some(CallAttempt {
                    remote: from.clone(),
                    direction: Direction::Incoming,
                });
                self.transition(Phase::Ringing, format!("Incoming call from {}", from));
            }
            DeviceEvent::Accepted => match self.phase {
                Phase::Connecting => self.transition(Phase::Active, status::CONNECTED),
                Phase::Ringing => self.transition(Phase::Active, status::IN_PROGRESS),
                _ => debug!(phase = ?self.phase, "Accept event ignored"),
            },
            DeviceEvent::Disconnected => self.end_call(status::ENDED),
            DeviceEvent::Cancelled => self.end_call(status::CANCELLED),
            DeviceEvent::Rejected => self.end_call(status::REJECTED),
        }
    }

    fn on_provider_error(&mut self, error: ProviderError) {
        let message = format!("Error: {}", error.message());
        warn!(code = ?error.code, "{}", message);

        match self.phase {
            phase if phase.registering() => {
                self.transition(Phase::RegistrationFailed, message);
            }
            phase if phase.in_call() => {
                self.attempt = None;
                self.phase = Phase::Ready;
                self.emit(Phase::CallFailed, message);
            }
            Phase::Ready => self.emit(Phase::Ready, message),
            _ => debug!(phase = ?self.phase, "Provider error ignored"),
        }
    }

    /// Clear the attempt and settle in `Ready`.
    fn end_call(&mut self, message: &str) {
        if !self.phase.in_call() {
            debug!(phase = ?self.phase, "No call to end");
            return;
        }
        self.attempt = None;
        self.phase = Phase::Ready;
        self.emit(Phase::Ended, message);
    }

    /// Place an outgoing call.
    #[instrument(skip(self))]
    pub fn dial(&mut self, to: &str) -> Result<(), ActionError> {
        if self.released {
            return Err(ActionError::Stopped);
        }
        if self.device.is_none() || !(self.phase == Phase::Ready || self.phase.in_call()) {
            self.emit(self.phase, status::NOT_READY);
            return Err(ActionError::NotReady);
        }
        if self.phase.in_call() {
            debug!(phase = ?self.phase, "Dial rejected, call in progress");
            return Err(ActionError::Busy);
        }

        let to = to.trim();
        if to.is_empty() {
            self.emit(Phase::Ready, status::ENTER_NUMBER);
            return Err(ActionError::MissingDestination);
        }

        self.attempt = Some(CallAttempt {
            remote: to.to_string(),
            direction: Direction::Outgoing,
        });
        self.transition(Phase::Connecting, status::CONNECTING);

        let result = match self.device.as_mut() {
            Some(device) => device.connect(to),
            None => Err(ProviderError::default()),
        };

        if let Err(e) = result {
            self.attempt = None;
            self.phase = Phase::Ready;
            self.emit(
                Phase::CallFailed,
                format!("Failed to make call: {}", e.message()),
            );
            return Err(ActionError::CallFailed(e.message().to_string()));
        }
        Ok(())
    }

    /// Answer the ringing call.
    pub fn answer(&mut self) -> Result<(), ActionError> {
        if self.released {
            return Err(ActionError::Stopped);
        }
        if self.phase != Phase::Ringing {
            return Err(ActionError::NoPendingCall);
        }

        if let Some(device) = self.device.as_mut() {
            device.accept();
        }
        self.transition(Phase::Active, status::IN_PROGRESS);
        Ok(())
    }

    /// Decline the ringing call.
    pub fn reject(&mut self) -> Result<(), ActionError> {
        if self.released {
            return Err(ActionError::Stopped);
        }
        if self.phase != Phase::Ringing {
            return Err(ActionError::NoPendingCall);
        }

        if let Some(device) = self.device.as_mut() {
            device.reject();
        }
        self.end_call(status::REJECTED);
        Ok(())
    }

    /// End a connecting or active call. A ringing call is answered or
    /// rejected instead.
    pub fn hang_up(&mut self) -> Result<(), ActionError> {
        if self.released {
            return Err(ActionError::Stopped);
        }
        if !matches!(self.phase, Phase::Connecting | Phase::Active) {
            return Err(ActionError::NoActiveCall);
        }

        if let Some(device) = self.device.as_mut() {
            device.disconnect();
        }
        self.end_call(status::ENDED);
        Ok(())
    }

    fn release_device(&mut self) {
        self.events = None;
        if let Some(mut device) = self.device.take() {
            device.destroy();
            info!("Device released");
        }
    }

    /// Release the device and stop. Safe to call repeatedly.
    pub fn unmount(&mut self) {
        self.release_device();
        self.attempt = None;
        self.mounted = false;
        self.released = true;
    }

    /// Release the device and start over from a fresh credential.
    pub fn reinitialize(&mut self) -> Option<u64> {
        if self.released {
            return None;
        }

        self.release_device();
        self.attempt = None;
        self.registration_confirmed = false;
        self.identity = None;
        self.region = None;
        self.phase = Phase::Idle;
        self.mounted = false;
        self.mount()
    }
}
