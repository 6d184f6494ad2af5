use std::sync::Arc;

use tokio::net::TcpListener;
use vapi_todo_core::{
    CalendarApi, Config, Database, GoogleCalendar, SyncService, TokenStore, ToolRouter,
};

use crate::routes;
use crate::state::AppState;

pub async fn run(bind: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    let db_path = config.database_path()?;
    let db = Database::open(&db_path)?;
    tracing::info!(path = %db_path.display(), "database ready");

    let calendar = connect_calendar(&config).await?;
    let sync = SyncService::new(db, calendar).with_time_zone(config.google.time_zone.clone());
    let syncing = sync.is_syncing();

    let state = AppState::new(ToolRouter::new(Arc::new(sync)));
    let app = routes::router(state, &config.server.route_prefix);

    let addr = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        prefix = %config.server.route_prefix,
        calendar_sync = syncing,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

/// Build the Google client, or `None` when sync is off or unconfigured.
///
/// Missing credentials disable sync for this process; any other
/// authorization failure is retried on the first calendar call.
async fn connect_calendar(
    config: &Config,
) -> Result<Option<Arc<dyn CalendarApi>>, Box<dyn std::error::Error>> {
    if !config.google.sync_enabled {
        tracing::info!("Google Calendar sync disabled by config");
        return Ok(None);
    }

    let http = reqwest::Client::new();
    let tokens = Arc::new(TokenStore::from_config(config, http.clone())?);
    match tokens.obtain().await {
        Ok(_) => tracing::info!(calendar_id = %config.google.calendar_id, "Google Calendar connected"),
        Err(e) if e.is_missing_credentials() => {
            tracing::warn!(error = %e, "Google Calendar sync disabled");
            return Ok(None);
        }
        Err(e) => tracing::warn!(error = %e, "Google authorization failed, will retry on demand"),
    }

    let calendar = GoogleCalendar::from_config(&config.google, http, tokens);
    Ok(Some(Arc::new(calendar)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
