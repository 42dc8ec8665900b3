use crate::config::SmtpConfig;
use crate::voicemail::DeliveryRequest;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("invalid content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),
    #[error("read attachment {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("smtp transport: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// SMTP notification sender. Port 465 gets implicit TLS, anything else
/// upgrades with STARTTLS.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, MailError> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        };
        Ok(Self {
            transport: builder.port(config.port).credentials(credentials).build(),
            sender: config.sender.parse()?,
        })
    }

    /// One plain-text notification with the saved audio attached. The
    /// attachment content type is fixed to audio/wav whatever the actual
    /// file extension.
    pub async fn send_voicemail(
        &self,
        recipient: &str,
        extension_name: &str,
        request: &DeliveryRequest<'_>,
        audio_path: &Path,
    ) -> Result<(), MailError> {
        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|source| MailError::Attachment {
                path: audio_path.display().to_string(),
                source,
            })?;
        let filename = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "voicemail.wav".to_string());

        let body = format!(
            "Hello,\n\n\
             You have a new voicemail for the {} extension.\n\n\
             Caller Number: {}\n\
             Source IP: {}\n\
             Recording URL: {}\n\n\
             The audio file is attached to this email.\n",
            extension_name, request.caller, request.caller_ip, request.recording_url
        );

        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient.parse()?)
            .subject(format!(
                "New Voicemail for {} from {}",
                extension_name, request.caller
            ))
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body))
                    .singlepart(
                        Attachment::new(filename).body(audio, ContentType::parse("audio/wav")?),
                    ),
            )?;

        self.transport.send(message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config(port: u16) -> SmtpConfig {
        SmtpConfig {
            host: "mail.example.com".to_string(),
            port,
            username: "pbx@example.com".to_string(),
            password: "secret".to_string(),
            sender: "pbx@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_mailer_builds_for_both_tls_modes() {
        assert!(Mailer::new(&smtp_config(465)).is_ok());
        assert!(Mailer::new(&smtp_config(587)).is_ok());
    }

    #[tokio::test]
    async fn test_mailer_rejects_bad_sender() {
        let config = SmtpConfig {
            sender: "not an address".to_string(),
            ..smtp_config(465)
        };
        assert!(matches!(Mailer::new(&config), Err(MailError::Address(_))));
    }
}
