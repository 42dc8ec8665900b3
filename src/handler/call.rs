use crate::app::AppState;
use crate::config::ExtensionAction;
use crate::twiml::VoiceResponse;
use crate::voicemail::{DeliveryError, DeliveryRequest, MailboxTarget};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use serde::Deserialize;
use std::fmt::Write;
use tracing::{error, info, warn};

use super::middleware::clientip::ClientIp;

const GREET_URL: &str = "/incoming_call";
const SELECT_URL: &str = "/handle_extension_selection";
const GATHER_TIMEOUT_SECS: u32 = 5;
const RECORD_MAX_SECS: u32 = 30;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(GREET_URL, get(incoming_call).post(incoming_call))
        .route(
            SELECT_URL,
            get(handle_extension_selection).post(handle_extension_selection),
        )
        .route(
            "/handle_recording/{selected_ext}",
            get(handle_recording).post(handle_recording),
        )
}

/// Webhook form fields posted by the provider. Every endpoint receives the
/// same superset; fields the provider did not send deserialize to None.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackForm {
    #[serde(rename = "From")]
    pub from: Option<String>,
    #[serde(rename = "To")]
    pub to: Option<String>,
    #[serde(rename = "Digits")]
    pub digits: Option<String>,
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "RecordingUrl")]
    pub recording_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecordingQuery {
    pub caller_ip: Option<String>,
}

fn twiml(doc: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], doc).into_response()
}

pub async fn incoming_call(
    client_ip: ClientIp,
    State(state): State<AppState>,
    Form(form): Form<CallbackForm>,
) -> Response {
    let caller = form.from.as_deref().unwrap_or("Unknown Caller");
    info!(
        caller,
        client_ip = client_ip.as_str(),
        to = form.to.as_deref().unwrap_or("-"),
        "incoming call"
    );

    let mut menu = state.config.menu_greeting().to_string();
    for entry in state.directory.entries() {
        let _ = write!(menu, " Press {} for {}.", entry.digits, entry.name);
    }

    let doc = VoiceResponse::new()
        .gather(
            state.directory.max_digits(),
            SELECT_URL,
            GATHER_TIMEOUT_SECS,
            &menu,
        )
        .redirect(GREET_URL)
        .build();
    twiml(doc)
}

pub async fn handle_extension_selection(
    client_ip: ClientIp,
    State(state): State<AppState>,
    Form(form): Form<CallbackForm>,
) -> Response {
    let caller = form.from.as_deref().unwrap_or("Unknown Caller");
    let digits = form.digits.as_deref().unwrap_or("");
    info!(
        caller,
        client_ip = client_ip.as_str(),
        digits,
        "extension selected"
    );

    let entry = match state.directory.lookup(digits) {
        Some(entry) => entry,
        None => {
            warn!(caller, digits, "invalid extension selection");
            let doc = VoiceResponse::new()
                .say("Sorry, that was not a valid option.")
                .redirect(GREET_URL)
                .build();
            return twiml(doc);
        }
    };

    let doc = match &entry.action {
        ExtensionAction::DialExternal { target } => VoiceResponse::new()
            .say(&format!("Connecting you to {}. Please wait.", entry.name))
            .dial(target)
            .build(),
        ExtensionAction::Voicemail { .. } => {
            let record_action = format!(
                "/handle_recording/{}?caller_ip={}",
                entry.digits,
                urlencoding::encode(client_ip.as_str())
            );
            VoiceResponse::new()
                .say(&format!(
                    "You've selected {}. Please leave your message after the tone.",
                    entry.name
                ))
                .record(&record_action, RECORD_MAX_SECS)
                // Only reached when the provider never invokes the callback
                .say("No message recorded. Goodbye.")
                .hangup()
                .build()
        }
        ExtensionAction::InfoMessage { message } => VoiceResponse::new()
            .say(message)
            .say("Thank you for calling. Goodbye.")
            .hangup()
            .build(),
    };
    twiml(doc)
}

pub async fn handle_recording(
    client_ip: ClientIp,
    Path(selected_ext): Path<String>,
    Query(query): Query<RecordingQuery>,
    State(state): State<AppState>,
    Form(form): Form<CallbackForm>,
) -> Response {
    let caller = form.from.as_deref().unwrap_or("Unknown Caller");
    let call_id = form.call_sid.as_deref().unwrap_or("unknown");
    let caller_ip = query.caller_ip.as_deref().unwrap_or(client_ip.as_str());
    info!(
        caller,
        caller_ip,
        call_id,
        selected_ext,
        recording_url = form.recording_url.as_deref().unwrap_or("-"),
        "recording callback"
    );

    let recording_url = match form.recording_url.as_deref() {
        Some(url) if !url.is_empty() => url,
        _ => {
            warn!(caller, call_id, "recording callback without a recording url");
            let doc = VoiceResponse::new()
                .say("Sorry, there was an issue recording your message. Goodbye.")
                .hangup()
                .build();
            return twiml(doc);
        }
    };

    // The extension comes back as a path parameter, so it can be forged or
    // stale. Re-resolve it and require a voicemail mailbox.
    let mailbox = match state.directory.lookup(&selected_ext) {
        Some(entry) => match &entry.action {
            ExtensionAction::Voicemail {
                directory,
                recipient,
            } => MailboxTarget {
                extension_name: &entry.name,
                directory,
                recipient: recipient.as_deref(),
            },
            _ => {
                warn!(
                    caller,
                    selected_ext, "recording callback for non-voicemail extension"
                );
                return twiml(internal_error());
            }
        },
        None => {
            warn!(
                caller,
                selected_ext, "recording callback for unknown extension"
            );
            return twiml(internal_error());
        }
    };

    let request = DeliveryRequest {
        recording_url,
        caller,
        caller_ip,
        call_id,
    };

    let mut response = VoiceResponse::new();
    match state.delivery.deliver(&mailbox, &request).await {
        Ok(path) => {
            info!(caller, call_id, path = %path.display(), "voicemail delivered");
        }
        Err(DeliveryError::Email(e)) => {
            // Logged only, the caller already left their message
            error!(caller, call_id, "voicemail email failed: {}", e);
        }
        Err(e) => {
            error!(caller, call_id, "voicemail delivery failed: {}", e);
            response = response.say("We encountered an error processing your message.");
        }
    }

    let doc = response
        .say("Thank you for your message. Goodbye.")
        .hangup()
        .build();
    twiml(doc)
}

fn internal_error() -> String {
    VoiceResponse::new()
        .say("Sorry, there was an internal error. Goodbye.")
        .hangup()
        .build()
}
