//! Voicemail persistence and notification.
//!
//! The recording callback hands us a URL to provider-hosted audio. The
//! recording is fetched, written under the per-mailbox directory, and the
//! configured recipient is notified by email with the audio attached. There
//! is no retry and no queue; a failed delivery is logged and the file, if
//! written, stays where it is.

mod mailer;

pub use mailer::{MailError, Mailer};

use crate::utils::sanitize_filename_component;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

const DEFAULT_AUDIO_EXT: &str = "wav";

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("download recording: {0}")]
    Download(#[from] reqwest::Error),
    #[error("store recording: {0}")]
    Storage(#[from] std::io::Error),
    #[error("email notification: {0}")]
    Email(#[from] MailError),
}

/// Voicemail destination resolved from the extension directory.
#[derive(Debug, Clone, Copy)]
pub struct MailboxTarget<'a> {
    pub extension_name: &'a str,
    pub directory: &'a str,
    pub recipient: Option<&'a str>,
}

/// Per-call facts threaded through the recording callback.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryRequest<'a> {
    pub recording_url: &'a str,
    pub caller: &'a str,
    pub caller_ip: &'a str,
    pub call_id: &'a str,
}

pub struct VoicemailDelivery {
    root: PathBuf,
    client: reqwest::Client,
    mailer: Option<Mailer>,
}

impl VoicemailDelivery {
    pub fn new(root: PathBuf, client: reqwest::Client, mailer: Option<Mailer>) -> Self {
        Self {
            root,
            client,
            mailer,
        }
    }

    /// Fetch the recording, persist it, and notify the mailbox recipient.
    /// A second call in the same second with the same caller and call id
    /// overwrites the previous file.
    pub async fn deliver(
        &self,
        mailbox: &MailboxTarget<'_>,
        request: &DeliveryRequest<'_>,
    ) -> Result<PathBuf, DeliveryError> {
        let target_dir = self.root.join(mailbox.directory);
        tokio::fs::create_dir_all(&target_dir).await?;

        let path = target_dir.join(compose_filename(request, Local::now()));

        let response = self
            .client
            .get(request.recording_url)
            .send()
            .await?
            .error_for_status()?;
        let audio = response.bytes().await?;
        tokio::fs::write(&path, &audio).await?;
        info!(
            caller = request.caller,
            call_id = request.call_id,
            bytes = audio.len(),
            path = %path.display(),
            "recording saved"
        );

        match (mailbox.recipient, self.mailer.as_ref()) {
            (Some(recipient), Some(mailer)) => {
                mailer
                    .send_voicemail(recipient, mailbox.extension_name, request, &path)
                    .await?;
                info!(
                    recipient,
                    extension = mailbox.extension_name,
                    "voicemail notification sent"
                );
            }
            (Some(recipient), None) => {
                warn!(
                    recipient,
                    extension = mailbox.extension_name,
                    "smtp is not configured, skipping voicemail notification"
                );
            }
            (None, _) => {
                debug!(
                    extension = mailbox.extension_name,
                    "mailbox has no recipient, skipping notification"
                );
            }
        }
        Ok(path)
    }
}

fn compose_filename(request: &DeliveryRequest<'_>, timestamp: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}.{}",
        timestamp.format("%Y%m%d-%H%M%S"),
        sanitize_filename_component(request.caller),
        sanitize_filename_component(request.call_id),
        recording_extension(request.recording_url),
    )
}

/// Extension of the URL's final path segment, `wav` when there is none.
/// Query strings do not leak into the name.
fn recording_extension(recording_url: &str) -> String {
    let segment = Url::parse(recording_url).ok().and_then(|url| {
        url.path_segments()
            .and_then(|segments| segments.last().map(|s| s.to_string()))
    });
    match segment {
        Some(name) => match name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => ext.to_string(),
            _ => DEFAULT_AUDIO_EXT.to_string(),
        },
        None => DEFAULT_AUDIO_EXT.to_string(),
    }
}
