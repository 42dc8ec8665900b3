use anyhow::Error;
use clap::Parser;
use serde::Deserialize;

const DEFAULT_GREETING: &str = "Welcome to our company's automated directory.";

#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    #[clap(long, default_value = "rustivr.toml")]
    pub conf: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub http_addr: String,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    /// Spoken before the menu options; the built-in greeting is used when
    /// absent.
    pub greeting: Option<String>,
    pub voicemail_root: String,
    pub smtp: Option<SmtpConfig>,
    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    /// May be left empty in the file and supplied via the SMTP_PASSWORD
    /// environment variable instead.
    #[serde(default)]
    pub password: String,
    pub sender: String,
}

fn default_smtp_port() -> u16 {
    465
}

/// One dial-pad entry. The `type` key selects the action and the remaining
/// keys belong to that action alone.
#[derive(Debug, Deserialize, Clone)]
pub struct ExtensionEntry {
    pub digits: String,
    pub name: String,
    #[serde(flatten)]
    pub action: ExtensionAction,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum ExtensionAction {
    DialExternal {
        target: String,
    },
    Voicemail {
        directory: String,
        recipient: Option<String>,
    },
    InfoMessage {
        message: String,
    },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:8080".to_string(),
            log_level: Some("info".to_string()),
            log_file: None,
            greeting: None,
            voicemail_root: "./voicemails".to_string(),
            smtp: None,
            extensions: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let mut config: Config = toml::from_str(
            &std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("{}: {}", e, path))?,
        )?;
        if let Some(smtp) = config.smtp.as_mut() {
            if smtp.password.is_empty() {
                if let Ok(password) = std::env::var("SMTP_PASSWORD") {
                    smtp.password = password;
                }
            }
        }
        Ok(config)
    }

    pub fn menu_greeting(&self) -> &str {
        self.greeting.as_deref().unwrap_or(DEFAULT_GREETING)
    }
}
