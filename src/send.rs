//! Batch send of saved compositions to the mail relay.
//!
//! [`SendFlow`] owns the client side of the exchange: the email prompt, the
//! single in-flight request and the user-facing notices. The transport sits
//! behind [`SendGateway`] so the flow can be driven without a network.

use std::sync::OnceLock;
use std::time::Duration;

use futures::channel::oneshot;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SendConfig;
use crate::export::PngDataUrl;
use crate::gallery::GalleryStore;
use crate::runtime::{self, TaskFuture};

pub const SENT_MESSAGE: &str = "Sent! Check your inbox.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("Select at least one saved note to send.")]
    EmptySelection,

    #[error("Please enter a valid email.")]
    InvalidEmail,

    #[error("A send is already in progress")]
    InFlight,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Relay answered with HTTP {0}")]
    Status(u16),
}

impl SendError {
    /// Text shown to the visitor.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status(_) => "Failed to send. Please try again later.".to_owned(),
            Self::Transport(_) => "Unexpected error.".to_owned(),
            other => other.to_string(),
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

/// Checks the trimmed address.
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email_regex().is_match(email)
}

/// JSON body of the relay request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendRequest {
    pub email: String,
    pub images: Vec<PngDataUrl>,
}

pub trait SendGateway: Send + Sync {
    /// Resolves `Ok` only on HTTP 200.
    fn send(&self, request: SendRequest) -> TaskFuture<Result<(), SendError>>;
}

/// POSTs the request as JSON to the relay endpoint.
#[derive(Debug, Clone)]
pub struct HttpSendGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSendGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                log::warn!("Falling back to a default HTTP client: {err}");
                reqwest::Client::new()
            });
        #[cfg(target_arch = "wasm32")]
        let client = {
            let _ = timeout;
            reqwest::Client::new()
        };
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &SendConfig) -> Self {
        Self::new(&config.endpoint, Duration::from_secs(config.timeout_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SendGateway for HttpSendGateway {
    fn send(&self, request: SendRequest) -> TaskFuture<Result<(), SendError>> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        runtime::boxed(async move {
            let response = client
                .post(&endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|err| SendError::Transport(err.to_string()))?;
            let status = response.status();
            if status == reqwest::StatusCode::OK {
                return Ok(());
            }
            let body = response.text().await.unwrap_or_default();
            log::error!("Send failed ({status}): {body}");
            Err(SendError::Status(status.as_u16()))
        })
    }
}

/// What a press of the send button led to.
pub enum SendStep {
    /// The email field was opened; nothing was sent.
    EmailRequested,
    /// The request is ready to run. Spawn it, then [`SendFlow::poll`].
    Dispatched(TaskFuture<()>),
}

impl std::fmt::Debug for SendStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailRequested => f.write_str("EmailRequested"),
            Self::Dispatched(_) => f.write_str("Dispatched"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

#[derive(Default)]
pub struct SendFlow {
    entering_email: bool,
    pub email: String,
    pending: Option<oneshot::Receiver<Result<(), SendError>>>,
    notice: Option<Notice>,
}

impl std::fmt::Debug for SendFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SendFlow")
            .field("entering_email", &self.entering_email)
            .field("email", &self.email)
            .field("in_flight", &self.in_flight())
            .field("notice", &self.notice)
            .finish()
    }
}

impl SendFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_entering_email(&self) -> bool {
        self.entering_email
    }

    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Label for the send button in the current state.
    pub fn button_label(&self) -> &'static str {
        if self.in_flight() {
            "Sending…"
        } else if self.entering_email {
            "Send"
        } else {
            "Send Notes"
        }
    }

    /// Handles a press of the send button.
    ///
    /// Validation failures set a notice and make no call on `gateway`.
    pub fn submit(
        &mut self,
        gallery: &GalleryStore,
        gateway: &dyn SendGateway,
    ) -> Result<SendStep, SendError> {
        let result = self.prepare(gallery).map(|request| match request {
            None => SendStep::EmailRequested,
            Some(request) => {
                log::info!("Sending {} note(s)", request.images.len());
                let (tx, rx) = oneshot::channel();
                let call = gateway.send(request);
                self.pending = Some(rx);
                SendStep::Dispatched(runtime::boxed(async move {
                    let _ = tx.send(call.await);
                }))
            }
        });
        if let Err(err) = &result {
            if *err != SendError::InFlight {
                self.notice = Some(Notice::Error(err.user_message()));
            }
        }
        result
    }

    fn prepare(&mut self, gallery: &GalleryStore) -> Result<Option<SendRequest>, SendError> {
        if self.in_flight() {
            return Err(SendError::InFlight);
        }
        let images = gallery.selected_images();
        if images.is_empty() {
            return Err(SendError::EmptySelection);
        }
        if !self.entering_email {
            self.entering_email = true;
            return Ok(None);
        }
        if !is_valid_email(&self.email) {
            return Err(SendError::InvalidEmail);
        }
        Ok(Some(SendRequest {
            email: self.email.trim().to_owned(),
            images,
        }))
    }

    /// Collects the in-flight result if it has arrived. Success clears the
    /// gallery selection and closes the email entry; failure keeps both.
    pub fn poll(&mut self, gallery: &mut GalleryStore) -> Option<Result<(), SendError>> {
        let rx = self.pending.as_mut()?;
        let result = match rx.try_recv() {
            Ok(None) => return None,
            Ok(Some(result)) => result,
            Err(oneshot::Canceled) => Err(SendError::Transport("send task dropped".to_owned())),
        };
        self.pending = None;
        match &result {
            Ok(()) => {
                gallery.clear_selection();
                self.entering_email = false;
                self.email.clear();
                self.notice = Some(Notice::Info(SENT_MESSAGE.to_owned()));
            }
            Err(err) => {
                log::warn!("Send failed: {err}");
                self.notice = Some(Notice::Error(err.user_message()));
            }
        }
        Some(result)
    }
}
