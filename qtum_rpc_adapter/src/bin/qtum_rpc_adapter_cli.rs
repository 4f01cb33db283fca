//! Binary entrypoint: parse flags, bring up tracing, build the adapter, and
//! serve it -- plain HTTP, or TLS when `--https-key`/`--https-cert` are set.
//!
//! Grounded on the teacher's own CLI binary (`argh::from_env` into a config
//! struct, a `tracing-subscriber` + `tracing-appender` setup routed to
//! `--log-file` when given, then `axum::Server`/`axum_server` serving the
//! built router), adapted to this adapter's single-process, single-upstream
//! shape.

use std::net::SocketAddr;
use std::process::ExitCode;

use axum_server::tls_rustls::RustlsConfig;
use qtum_rpc_adapter::app::AdapterState;
use qtum_rpc_adapter::config::{AppConfig, CliArgs};
use qtum_rpc_adapter::frontend;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args: CliArgs = argh::from_env();

    let config = match AppConfig::from_args_and_env(args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("qtum_rpc_adapter_cli: invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = init_tracing(config.log_file.as_deref());

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "qtum_rpc_adapter_cli exiting");
            ExitCode::FAILURE
        }
    }
}

/// returns the tracing-appender worker guard; dropping it flushes the file
/// sink, so the caller must keep it alive for the process lifetime.
fn init_tracing(log_file: Option<&std::path::Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
            let filename = path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("qtum_rpc_adapter.log"));
            let file_appender = tracing_appender::rolling::never(directory, filename);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::fmt().with_env_filter(env_filter).with_writer(non_blocking).with_ansi(false).init();

            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(env_filter).init();
            None
        }
    }
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    let bind = config.bind;
    let port = config.port;
    let tls = config.tls.clone();

    let (state, tasks) = AdapterState::spawn(config).await?;
    let router = frontend::router(state);
    let addr = SocketAddr::new(bind, port);

    let result: anyhow::Result<()> = match tls {
        Some(tls) => {
            info!(%addr, "listening (tls)");
            let tls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path).await?;
            axum_server::bind_rustls(addr, tls_config)
                .serve(router.into_make_service())
                .await
                .map_err(anyhow::Error::from)
        }
        None => {
            info!(%addr, "listening");
            axum::Server::bind(&addr)
                .serve(router.into_make_service())
                .with_graceful_shutdown(shutdown_signal())
                .await
                .map_err(anyhow::Error::from)
        }
    };

    for task in tasks {
        task.abort();
    }

    result
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}
