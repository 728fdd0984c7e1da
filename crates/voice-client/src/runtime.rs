//! Phone runtime: one task, one loop.
//!
//! User commands, device events, credential fetches and device registrations
//! are all applied by a single `select!` loop, so the [`Phone`] is never
//! touched concurrently. Nothing the provider does can hold the loop up:
//! fetches and registrations run in their own tasks and post back.

use crate::device::{DeviceProvider, ProviderError};
use crate::error::{ActionError, ClientError};
use crate::machine::{Phone, Registration, StatusUpdate};
use crate::token::CredentialSource;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use voice_types::TokenResponse;

type FetchResult = (u64, Result<TokenResponse, ClientError>);
type RegisterResult = (Registration, Result<(), ProviderError>);
type Reply = oneshot::Sender<Result<(), ActionError>>;

/// Commands accepted by the phone loop.
#[derive(Debug)]
pub enum Command {
    Mount,
    Dial { to: String, reply: Reply },
    Answer { reply: Reply },
    Reject { reply: Reply },
    HangUp { reply: Reply },
    Reinitialize,
    Unmount,
}

/// Cloneable handle to a running phone.
#[derive(Clone)]
pub struct PhoneHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl PhoneHandle {
    fn send(&self, command: Command) -> Result<(), ActionError> {
        self.commands
            .send(command)
            .map_err(|_| ActionError::Stopped)
    }

    async fn request(
        &self,
        command: impl FnOnce(Reply) -> Command,
    ) -> Result<(), ActionError> {
        let (reply, response) = oneshot::channel();
        self.send(command(reply))?;
        response.await.unwrap_or(Err(ActionError::Stopped))
    }

    /// Start fetching a credential and registering.
    pub fn mount(&self) -> Result<(), ActionError> {
        self.send(Command::Mount)
    }

    pub async fn dial(&self, to: impl Into<String>) -> Result<(), ActionError> {
        let to = to.into();
        self.request(|reply| Command::Dial { to, reply }).await
    }

    pub async fn answer(&self) -> Result<(), ActionError> {
        self.request(|reply| Command::Answer { reply }).await
    }

    pub async fn reject(&self) -> Result<(), ActionError> {
        self.request(|reply| Command::Reject { reply }).await
    }

    pub async fn hang_up(&self) -> Result<(), ActionError> {
        self.request(|reply| Command::HangUp { reply }).await
    }

    pub fn reinitialize(&self) -> Result<(), ActionError> {
        self.send(Command::Reinitialize)
    }

    /// Release the device and stop the loop. Later commands fail with
    /// [`ActionError::Stopped`].
    pub fn unmount(&self) -> Result<(), ActionError> {
        self.send(Command::Unmount)
    }
}

/// Spawn a phone loop. Status updates arrive on the returned receiver.
pub fn spawn(
    source: Arc<dyn CredentialSource>,
    provider: Arc<dyn DeviceProvider>,
) -> (
    PhoneHandle,
    mpsc::UnboundedReceiver<StatusUpdate>,
    JoinHandle<()>,
) {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = mpsc::unbounded_channel();

    let phone = Phone::new(provider, status_tx);
    let task = tokio::spawn(run(phone, source, command_rx));

    (
        PhoneHandle {
            commands: command_tx,
        },
        status_rx,
        task,
    )
}

fn start_fetch(
    source: &Arc<dyn CredentialSource>,
    generation: u64,
    completions: &mpsc::UnboundedSender<FetchResult>,
) {
    let source = Arc::clone(source);
    let completions = completions.clone();
    tokio::spawn(async move {
        let result = source.fetch().await;
        if completions.send((generation, result)).is_err() {
            debug!(generation, "Phone stopped before credential arrived");
        }
    });
}

/// Run `register()` in its own task. Dropping the returned sender abandons
/// the registration and destroys the device.
fn start_registration(
    mut registration: Registration,
    completions: &mpsc::UnboundedSender<RegisterResult>,
) -> oneshot::Sender<()> {
    let (abandon_tx, abandon_rx) = oneshot::channel::<()>();
    let completions = completions.clone();
    let generation = registration.generation;

    tokio::spawn(async move {
        tokio::select! {
            result = registration.device.register() => {
                if let Err(mpsc::error::SendError((mut registration, _))) =
                    completions.send((registration, result))
                {
                    debug!(generation, "Phone stopped before registration finished");
                    registration.device.destroy();
                }
            }
            _ = abandon_rx => {
                debug!(generation, "Registration abandoned");
                registration.device.destroy();
            }
        }
    });

    abandon_tx
}

async fn run(
    mut phone: Phone,
    source: Arc<dyn CredentialSource>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel::<FetchResult>();
    let (register_tx, mut register_rx) = mpsc::unbounded_channel::<RegisterResult>();
    // Held while a registration may still be running
    let mut registration: Option<oneshot::Sender<()>> = None;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Mount) => {
                    if let Some(generation) = phone.mount() {
                        start_fetch(&source, generation, &fetch_tx);
                    }
                }
                Some(Command::Reinitialize) => {
                    registration = None;
                    if let Some(generation) = phone.reinitialize() {
                        start_fetch(&source, generation, &fetch_tx);
                    }
                }
                Some(Command::Dial { to, reply }) => {
                    let _ = reply.send(phone.dial(&to));
                }
                Some(Command::Answer { reply }) => {
                    let _ = reply.send(phone.answer());
                }
                Some(Command::Reject { reply }) => {
                    let _ = reply.send(phone.reject());
                }
                Some(Command::HangUp { reply }) => {
                    let _ = reply.send(phone.hang_up());
                }
                Some(Command::Unmount) | None => break,
            },
            Some(event) = phone.next_event() => phone.on_event(event).await,
            Some((generation, result)) = fetch_rx.recv() => {
                if let Some(pending) = phone.credential_ready(generation, result) {
                    registration = Some(start_registration(pending, &register_tx));
                }
            }
            Some((pending, result)) = register_rx.recv() => {
                phone.registered(pending, result);
            }
        }
    }

    drop(registration);
    phone.unmount();

    // Devices handed back after the loop stopped are released here
    register_rx.close();
    while let Ok((mut pending, _)) = register_rx.try_recv() {
        pending.device.destroy();
    }
    info!("Phone stopped");
}
