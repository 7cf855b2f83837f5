use std::{io, net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::notification::repo::seaorm::SeaOrmNotificationRepository;
use service::pet::repo::seaorm::SeaOrmPetRepository;
use service::presence::SocketRegistry;
use service::PetServiceConfig;

use crate::errors::StartupError;
use crate::routes;
use crate::state::AppState;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// `config.toml` (or `CONFIG_PATH`) when present, otherwise environment only.
/// A config file that exists but fails to parse or validate is an error.
pub fn load_config() -> Result<AppConfig, StartupError> {
    dotenv().ok();
    resolve_config(AppConfig::load_and_validate(), AppConfig::from_env)
}

fn resolve_config(
    from_file: anyhow::Result<AppConfig>,
    from_env: impl FnOnce() -> anyhow::Result<AppConfig>,
) -> Result<AppConfig, StartupError> {
    match from_file {
        Ok(cfg) => Ok(cfg),
        Err(e) if is_missing_file(&e) => {
            info!("config_file_absent_using_env");
            from_env().map_err(|e| StartupError::InvalidConfig(format!("environment: {e}")))
        }
        Err(e) => Err(StartupError::InvalidConfig(format!("config file: {e}"))),
    }
}

fn is_missing_file(err: &anyhow::Error) -> bool {
    err.downcast_ref::<io::Error>()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

/// Wire adapters, services and routes against a live database.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    if cfg.database.run_migrations {
        migration::Migrator::up(&db, None).await?;
        info!("migrations_applied");
    }

    let registry = Arc::new(SocketRegistry::new(cfg.notifications.channel_capacity));
    let state = AppState::new(
        Arc::new(SeaOrmPetRepository { db: db.clone() }),
        Arc::new(SeaOrmNotificationRepository { db }),
        registry,
        PetServiceConfig::from(cfg),
        cfg.auth.jwt_secret.clone(),
    );
    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: build the app and run the HTTP server
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "server_listening");
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_cfg() -> anyhow::Result<AppConfig> {
        let mut cfg = AppConfig::default();
        cfg.server.port = 4321;
        Ok(cfg)
    }

    #[test]
    fn missing_file_falls_back_to_environment() {
        let missing = Err(io::Error::from(io::ErrorKind::NotFound).into());
        let cfg = resolve_config(missing, env_cfg).expect("env config");
        assert_eq!(cfg.server.port, 4321);
    }

    #[test]
    fn broken_file_is_reported_not_replaced() {
        let invalid = Err(anyhow::anyhow!("server.port must be within 1..=65535"));
        let err = resolve_config(invalid, env_cfg).expect_err("file error must surface");
        assert!(matches!(err, StartupError::InvalidConfig(ref m) if m.starts_with("config file:")));

        let denied = Err(io::Error::from(io::ErrorKind::PermissionDenied).into());
        assert!(resolve_config(denied, env_cfg).is_err());
    }

    #[test]
    fn environment_errors_surface_after_fallback() {
        let missing = Err(io::Error::from(io::ErrorKind::NotFound).into());
        let err = resolve_config(missing, || Err(anyhow::anyhow!("database.url is empty"))).expect_err("env invalid");
        assert!(matches!(err, StartupError::InvalidConfig(ref m) if m.contains("database.url is empty")));
    }
}
