mod config;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};

use deskline_api::identity::{SessionKeys, hash_password};
use deskline_api::messaging::{DisabledGateway, MessagingGateway, WhatsAppGateway};
use deskline_api::{AppStateInner, router};
use deskline_db::Database;
use deskline_db::models::NewUser;
use deskline_types::models::{Capability, Role};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "deskline=debug,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Refusing to start: {e}");
            std::process::exit(1);
        }
    };

    let db = Database::open(&config.db_path)?;
    db.seed_defaults()?;

    if let Some(admin) = &config.admin {
        let created = db.ensure_admin(&NewUser {
            email: admin.email.trim().to_lowercase(),
            name: "Administrator".into(),
            phone: None,
            password_hash: hash_password(&admin.password)?,
            role: Role::Admin,
            capabilities: Capability::ALL.into_iter().collect(),
        })?;
        if !created {
            info!("Bootstrap admin {} already exists", admin.email);
        }
    }

    let gateway: Arc<dyn MessagingGateway> = match config.whatsapp.clone() {
        Some(wa) => Arc::new(WhatsAppGateway::new(wa)),
        None => {
            warn!("WhatsApp credentials not set; OTP codes will not be delivered");
            Arc::new(DisabledGateway)
        }
    };

    let state = Arc::new(AppStateInner {
        db,
        keys: SessionKeys::new(&config.jwt_secret, config.session_ttl),
        gateway,
        otp_template: config.otp_template.clone(),
    });

    let app = router(state, config.request_timeout);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Deskline listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM: {e}");
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
