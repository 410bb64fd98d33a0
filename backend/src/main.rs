//! Backend entry-point: loads settings, wires adapters, and runs the server.

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{self, OptionExt, WrapErr};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use users_backend::domain::ports::UserRepository;
use users_backend::domain::{DiagnosticEvent, Diagnostics};
use users_backend::inbound::http::state::HttpState;
use users_backend::outbound::log_sink::HttpLogSink;
use users_backend::outbound::persistence::{DbPool, DieselUserRepository};
use users_backend::server::{SWAGGER_PATH, ServerConfig, create_server};
use users_backend::settings::{AppSettings, Environment, LogSinkSettings, Settings};

const PROGRAM: &str = "users-backend";
const DIAGNOSTICS_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Application bootstrap.
#[actix_web::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let settings = Settings::load(PROGRAM)?;
    init_tracing(settings.app.environment());

    let pool = DbPool::new(&settings.postgres.pool_config()?);
    let repository = Arc::new(DieselUserRepository::new(pool));
    let (diagnostics, worker) = start_diagnostics(&settings.log_sink)?;

    // Schema setup must not delay the listener.
    tokio::spawn({
        let repository = repository.clone();
        let diagnostics = diagnostics.clone();
        async move { prepare_schema(repository.as_ref(), &diagnostics).await }
    });

    let bind_addr = resolve_bind_addr(&settings.app)?;
    let state = HttpState::new(repository, diagnostics.clone(), settings.app.message());
    let server = create_server(state, &ServerConfig::new(bind_addr))
        .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;
    info!(%bind_addr, shipping = diagnostics.is_shipping(), "listening");
    announce_startup(&settings.app, &diagnostics);

    server.await.wrap_err("server terminated with an error")?;

    drop(diagnostics);
    if let Some(worker) = worker {
        drain_diagnostics(worker).await;
    }
    Ok(())
}

fn init_tracing(environment: Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = match environment {
        Environment::Development => fmt().with_env_filter(filter).pretty().try_init(),
        Environment::Production => fmt().with_env_filter(filter).json().try_init(),
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

fn start_diagnostics(
    settings: &LogSinkSettings,
) -> eyre::Result<(Diagnostics, Option<JoinHandle<()>>)> {
    let Some(target) = settings.target()? else {
        return Ok((Diagnostics::local_only(), None));
    };
    let sink = HttpLogSink::new(target.endpoint, target.token, settings.timeout())
        .wrap_err("failed to build log sink client")?;
    let (diagnostics, worker) = Diagnostics::spawn(Arc::new(sink), settings.queue_capacity());
    Ok((diagnostics, Some(worker)))
}

/// Create the users table, reporting the outcome without stopping startup.
async fn prepare_schema(repository: &dyn UserRepository, diagnostics: &Diagnostics) {
    match repository.ensure_schema().await {
        Ok(()) => diagnostics.emit(DiagnosticEvent::info("database schema ready")),
        Err(err) => diagnostics.emit(
            DiagnosticEvent::error("database schema initialisation failed")
                .with_field("cause", err.to_string()),
        ),
    }
}

fn announce_startup(app: &AppSettings, diagnostics: &Diagnostics) {
    match app.environment() {
        Environment::Development => {
            let base = format!("http://localhost:{}", app.port);
            diagnostics.emit(DiagnosticEvent::info(format!("server running at {base}")));
            diagnostics.emit(DiagnosticEvent::info(format!(
                "swagger at {base}{SWAGGER_PATH}"
            )));
        }
        Environment::Production => {
            diagnostics.emit(DiagnosticEvent::info(
                "server running in production environment",
            ));
        }
    }
}

fn resolve_bind_addr(app: &AppSettings) -> eyre::Result<SocketAddr> {
    (app.bind_host(), app.port)
        .to_socket_addrs()
        .wrap_err_with(|| format!("invalid bind host {:?}", app.bind_host()))?
        .next()
        .ok_or_eyre("bind host resolved to no addresses")
}

async fn drain_diagnostics(worker: JoinHandle<()>) {
    match tokio::time::timeout(DIAGNOSTICS_DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "diagnostics worker panicked"),
        Err(_) => warn!("diagnostics worker did not drain before timeout"),
    }
}
