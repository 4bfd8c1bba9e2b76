mod config;

use tracing::info;

use laterna_api::AppStateInner;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "laterna_server=debug,laterna_api=debug,laterna_gateway=debug,laterna_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = laterna_db::Database::open(&config.db_path)?;
    let state = AppStateInner::new(db, config.jwt_secret);
    let app = laterna_api::router(state);

    info!("Laterna server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
