use crate::config::Config;
use crate::directory::ExtensionDirectory;
use crate::voicemail::{Mailer, VoicemailDelivery};
use anyhow::Result;
use axum::Router;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

// Bounds the recording download so a stalled provider cannot pin a request
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AppStateInner {
    pub config: Arc<Config>,
    pub directory: Arc<ExtensionDirectory>,
    pub delivery: Arc<VoicemailDelivery>,
    pub token: CancellationToken,
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateBuilder {
    pub config: Option<Config>,
    pub mailer: Option<Mailer>,
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            mailer: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn mailer(mut self, mailer: Mailer) -> Self {
        self.mailer = Some(mailer);
        self
    }

    pub fn build(self) -> Result<AppState> {
        let config = Arc::new(self.config.unwrap_or_default());
        let token = CancellationToken::new();

        let directory = Arc::new(ExtensionDirectory::new(config.extensions.clone())?);

        let mailer = match self.mailer {
            Some(mailer) => Some(mailer),
            None => match config.smtp.as_ref() {
                Some(smtp) => Some(Mailer::new(smtp)?),
                None => None,
            },
        };
        if mailer.is_none() && directory.has_mail_recipients() {
            warn!("voicemail recipients are configured but [smtp] is not, notifications are disabled");
        }

        let root = PathBuf::from(&config.voicemail_root);
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
            info!("created voicemail root: {}", root.display());
        }

        let client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        let delivery = Arc::new(VoicemailDelivery::new(root, client, mailer));

        Ok(Arc::new(AppStateInner {
            config,
            directory,
            delivery,
            token,
        }))
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn run(state: AppState) -> Result<()> {
    let token = state.token.clone();

    let app = create_router(state.clone());
    let addr: SocketAddr = state.config.http_addr.parse()?;
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            return Err(anyhow::anyhow!("Failed to bind to {}: {}", addr, e));
        }
    };

    let http_task = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .into_future();

    select! {
        http_result = http_task => {
            match http_result {
                Ok(_) => info!("Server shut down gracefully"),
                Err(e) => {
                    tracing::error!("Server error: {}", e);
                    return Err(anyhow::anyhow!("Server error: {}", e));
                }
            }
        }
        _ = token.cancelled() => {
            info!("Shutting down due to cancellation");
        }
    }
    token.cancel();
    Ok(())
}

fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    crate::handler::router().with_state(state).layer(cors)
}
