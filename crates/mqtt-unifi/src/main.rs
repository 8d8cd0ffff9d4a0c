mod cli;
mod error;
mod mqtt;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use mqtt_unifi_core::{Bridge, BusError, Controller};

use crate::cli::{Cli, LogFormat};
use crate::error::AppError;

const CRATES: &[&str] = &["mqtt_unifi", "mqtt_unifi_core", "mqtt_unifi_api", "mqtt_unifi_config"];
const DISCONNECT_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, debug: bool, format: LogFormat) {
    let level = match verbosity {
        0 if debug => "debug",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let directives = CRATES
        .iter()
        .fold(String::from("warn"), |acc, krate| format!("{acc},{krate}={level}"));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = mqtt_unifi_config::load(cli.config.as_deref())?;
    init_tracing(cli.verbose, config.debug, cli.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        controller = %config.controller.url,
        site = %config.controller.site,
        broker = %format!("{}:{}", config.bus.host, config.bus.port),
        namespace = %config.bridge.namespace,
        interval = ?config.bridge.poll_interval,
        "starting"
    );
    debug!(api_version = config.api_version, platform = ?config.controller.platform, "controller settings");

    let controller = Arc::new(Controller::new(config.controller));
    controller.connect().await?;

    let bus_cancel = CancellationToken::new();
    let connection = match mqtt::connect(&config.bus, bus_cancel.clone()).await {
        Ok(connection) => connection,
        Err(e) => {
            controller.disconnect().await;
            return Err(e.into());
        }
    };
    let mqtt::MqttConnection {
        bus,
        inbound,
        mut errors,
        event_loop,
    } = connection;

    let bridge = Bridge::new(config.bridge, Arc::clone(&controller), Arc::clone(&bus));
    let handle = match bridge.start(inbound).await {
        Ok(handle) => handle,
        Err(e) => {
            controller.disconnect().await;
            bus.disconnect().await;
            bus_cancel.cancel();
            return Err(e.into());
        }
    };
    info!("bridge running");

    wait_for_shutdown(&mut errors).await;
    info!("shutting down");

    handle.shutdown().await;
    controller.disconnect().await;
    bus.disconnect().await;

    let abort = event_loop.abort_handle();
    if tokio::time::timeout(DISCONNECT_GRACE, event_loop).await.is_err() {
        debug!("broker event loop did not stop in time");
        bus_cancel.cancel();
        abort.abort();
    }

    info!("stopped");
    Ok(())
}

/// Block until SIGINT or SIGTERM, logging broker errors meanwhile.
async fn wait_for_shutdown(errors: &mut mpsc::UnboundedReceiver<BusError>) {
    let terminate = terminate_signal();
    tokio::pin!(terminate);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received SIGINT");
                break;
            }
            () = &mut terminate => {
                info!("received SIGTERM");
                break;
            }
            Some(err) = errors.recv() => {
                warn!(error = %err, "broker connection lost, reconnecting");
            }
        }
    }
}

#[cfg(unix)]
async fn terminate_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await;
}
