
use crate::app::{AppState, AppStateBuilder};
use crate::config::{Config, ExtensionAction, ExtensionEntry};
use axum::response::Response;
use tempfile::TempDir;

pub(crate) fn test_config(voicemail_root: &std::path::Path) -> Config {
    Config {
        voicemail_root: voicemail_root.to_string_lossy().into_owned(),
        extensions: vec![
            ExtensionEntry {
                digits: "101".to_string(),
                name: "Contact the CEO".to_string(),
                action: ExtensionAction::DialExternal {
                    target: "+12345678901".to_string(),
                },
            },
            ExtensionEntry {
                digits: "103".to_string(),
                name: "Leave a General Voicemail".to_string(),
                action: ExtensionAction::Voicemail {
                    directory: "general".to_string(),
                    recipient: None,
                },
            },
            ExtensionEntry {
                digits: "104".to_string(),
                name: "General Information".to_string(),
                action: ExtensionAction::InfoMessage {
                    message: "Our business hours are Monday to Friday, 9 AM to 5 PM.".to_string(),
                },
            },
        ],
        ..Config::default()
    }
}

pub(crate) fn test_state(tmp: &TempDir) -> AppState {
    AppStateBuilder::new()
        .config(test_config(tmp.path()))
        .build()
        .unwrap()
}

// Helper to read an axum response body back as text
pub(crate) async fn response_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
