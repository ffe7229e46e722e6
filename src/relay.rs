//! Server side of the send exchange: validates a relay request and forwards
//! the PNG payloads as mail attachments through a [`MailProvider`].

use serde::Deserialize;
use thiserror::Error;

use crate::export::PNG_DATA_URL_PREFIX;
use crate::runtime::TaskFuture;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayConfig {
    /// Owner inbox (`DEST_EMAIL`).
    pub dest_email: Option<String>,
    /// Verified sender identity (`FROM_EMAIL`).
    pub from_email: Option<String>,
}

impl RelayConfig {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v: &String| !v.is_empty());
        Self {
            dest_email: var("DEST_EMAIL"),
            from_email: var("FROM_EMAIL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    /// Base64 PNG without the data URL prefix.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub text: String,
    pub attachments: Vec<Attachment>,
    pub reply_to: Option<String>,
}

#[derive(Debug, Clone, Error)]
#[error("Mail provider error: {0}")]
pub struct MailError(pub String);

pub trait MailProvider {
    fn send(&self, mail: OutgoingMail) -> TaskFuture<Result<(), MailError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: u16,
    pub body: String,
}

impl RelayResponse {
    fn new(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_owned(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RelayBody {
    email: Option<serde_json::Value>,
    images: Option<serde_json::Value>,
}

/// Handles one relay invocation. `now_ms` stamps the attachment names.
pub async fn handle(
    method: &str,
    body: Option<&str>,
    config: &RelayConfig,
    provider: &dyn MailProvider,
    now_ms: u64,
) -> RelayResponse {
    if !method.eq_ignore_ascii_case("POST") {
        return RelayResponse::new(405, "Method Not Allowed");
    }

    let body: RelayBody = match serde_json::from_str(body.filter(|b| !b.is_empty()).unwrap_or("{}"))
    {
        Ok(body) => body,
        Err(err) => {
            log::error!("Malformed relay body: {err}");
            return RelayResponse::new(500, "Server error");
        }
    };

    let images = match body.images {
        Some(serde_json::Value::Array(images)) if !images.is_empty() => images,
        _ => return RelayResponse::new(400, "No images provided"),
    };

    let Some(to) = config.dest_email.clone() else {
        return RelayResponse::new(500, "DEST_EMAIL env missing");
    };
    let Some(from) = config.from_email.clone() else {
        return RelayResponse::new(500, "FROM_EMAIL env missing");
    };

    let attachments: Vec<Attachment> = images
        .iter()
        .filter_map(|image| image.as_str()?.strip_prefix(PNG_DATA_URL_PREFIX))
        .enumerate()
        .map(|(i, content)| Attachment {
            filename: format!("note-{now_ms}-{}.png", i + 1),
            content: content.to_owned(),
        })
        .collect();
    if attachments.is_empty() {
        return RelayResponse::new(400, "Invalid images");
    }

    let email = body
        .email
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .filter(|e| !e.is_empty())
        .map(str::to_owned);
    let subject = if attachments.len() > 1 {
        "New notes from portfolio"
    } else {
        "New note from portfolio"
    };
    let mut text = vec!["You have received new note image(s) from your portfolio.".to_owned()];
    if let Some(email) = &email {
        text.push(format!("Visitor email: {email}"));
    }
    let names: Vec<&str> = attachments.iter().map(|a| a.filename.as_str()).collect();
    text.push(format!("Attached: {}", names.join(", ")));

    let mail = OutgoingMail {
        from,
        to,
        subject: subject.to_owned(),
        text: text.join("\n"),
        attachments,
        reply_to: email,
    };
    match provider.send(mail).await {
        Ok(()) => RelayResponse::new(200, "OK"),
        Err(err) => {
            log::error!("{err}");
            RelayResponse::new(502, "Email provider error")
        }
    }
}
