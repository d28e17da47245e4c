//! SpeedSim - Speeduino-compatible ECU simulator
//!
//! Serves the engine model to tuning software over TCP or a serial port, with
//! an optional HTTP/JSON monitor alongside.

mod cli;
mod config;
mod driver;
mod monitor;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;

use speedsim_core::engine::EngineSimulator;
use speedsim_core::platform::{EntropyRandom, RandomProvider, SeededRandom, SystemClock};
use speedsim_core::protocol::{
    list_ports, ProtocolHandler, SerialChannel, SerialInterface, TcpChannel,
};

use crate::cli::Cli;
use crate::config::{LogFormat, SimConfig, TransportConfig};
use crate::driver::Driver;

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .json()
                .with_current_span(true)
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .compact()
                .init();
        }
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

fn print_ports() {
    let ports = list_ports();
    if ports.is_empty() {
        println!("No serial ports found");
        return;
    }
    for port in ports {
        match port.product {
            Some(product) => println!("{}  ({})", port.name, product),
            None => println!("{}", port.name),
        }
    }
}

fn open_transport(config: &SimConfig) -> anyhow::Result<Box<dyn SerialInterface>> {
    match &config.transport {
        TransportConfig::Tcp { listen } => {
            let channel = TcpChannel::listen(listen.as_str())
                .with_context(|| format!("failed to listen on {}", listen))?;
            let addr = channel.local_addr()?;
            tracing::info!(%addr, "waiting for tuning client");
            Ok(Box::new(channel))
        }
        TransportConfig::Serial { port } => {
            tracing::info!(port = %port, baud = config.baud_rate, "using serial port");
            Ok(Box::new(SerialChannel::new(port.clone())))
        }
    }
}

fn random_source(seed: Option<u32>) -> Box<dyn RandomProvider + Send> {
    match seed {
        Some(seed) => {
            tracing::info!(seed, "using fixed random seed");
            Box::new(SeededRandom::new(seed))
        }
        None => Box::new(EntropyRandom::new()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.list_ports {
        print_ports();
        return Ok(());
    }

    let config = cli.resolve()?;
    init_tracing(config.log_format);
    tracing::info!(version = speedsim_core::VERSION, "speedsim starting");

    let transport = open_transport(&config)?;
    let engine = EngineSimulator::new(SystemClock::new(), random_source(config.seed));
    let protocol = ProtocolHandler::with_baud_rate(transport, config.baud_rate);
    let (driver, handle) = Driver::new(engine, protocol);

    let mut driver_task = tokio::task::spawn_blocking(move || driver.run());

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let monitor_task = match config.monitor_addr()? {
        Some(addr) => {
            let handle = handle.clone();
            let shutdown = async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
            };
            Some(tokio::spawn(monitor::serve(addr, handle, shutdown)))
        }
        None => None,
    };

    let result = tokio::select! {
        joined = &mut driver_task => joined,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
            handle.stop();
            driver_task.await
        }
    };

    let _ = shutdown_tx.send(true);
    if let Some(task) = monitor_task {
        match task.await {
            Ok(Err(e)) => tracing::error!(error = %e, "monitor error"),
            Err(e) => tracing::error!(error = %e, "monitor task failed"),
            Ok(Ok(())) => {}
        }
    }

    result
        .context("simulation thread panicked")?
        .context("simulation stopped on a transport error")?;
    Ok(())
}
