//! Hold'em table server speaking a line-based text protocol.
//!
//! This server runs one TableActor and a task per TCP connection. Table
//! events are fanned out to every connection over a broadcast channel.

mod config;
mod connection;
mod logging;
mod protocol;

use std::net::SocketAddr;

use anyhow::{Context, Error};
use ctrlc::set_handler;
use holdem::TableActor;
use log::{debug, error, info};
use pico_args::Arguments;
use tokio::{
    net::TcpListener,
    sync::{broadcast, mpsc},
};

use config::ServerConfig;
use protocol::Outbound;

const HELP: &str = "\
Run a hold'em table server

USAGE:
  holdem_server [OPTIONS]

OPTIONS:
  --bind            IP:PORT   Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --action-timeout  SECS      Seconds a player has to act  [default: env ACTION_TIMEOUT_SECS or 30]

FLAGS:
  -h, --help                  Print help information

ENVIRONMENT:
  SERVER_BIND                 Server bind address (e.g., 0.0.0.0:6969)
  TABLE_MAX_PLAYERS           Seats at the table (2-10)
  TABLE_SMALL_BLIND           Small blind
  TABLE_BIG_BLIND             Big blind
  TABLE_STARTING_STACK        Chips a new player sits down with
  ACTION_TIMEOUT_SECS         Seconds a player has to act
  COUNTDOWN_SECS              Pre-round countdown length
  JOIN_EXTENSION_SECS         Seconds each new player adds to the countdown
  (A .env file in the working directory is read too)
";

/// Broadcast buffer per connection before slow readers start missing lines
const OUTBOUND_CAPACITY: usize = 256;

struct Args {
    bind: Option<SocketAddr>,
    action_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        action_timeout: pargs.opt_value_from_str("--action-timeout")?,
    };

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.action_timeout)?;
    config.validate()?;
    info!("Starting hold'em server at {}", config.bind);

    let (events, mut event_rx) = mpsc::unbounded_channel();
    let (actor, table) = TableActor::new(config.table.clone(), events);
    tokio::spawn(actor.run());

    let (outbound, _) = broadcast::channel(OUTBOUND_CAPACITY);
    let fan_out = outbound.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("{event}");
            // No subscribers just means nobody is connected.
            fan_out.send(Outbound::Game(event)).ok();
        }
    });

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;
    info!(
        "Server is running at {}. Press Ctrl+C to stop.",
        config.bind
    );

    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("Failed to accept connection: {e}");
                continue;
            }
        };
        let table = table.clone();
        let outbound = outbound.clone();
        tokio::spawn(async move {
            if let Err(e) = connection::handle_connection(stream, addr, table, outbound).await {
                error!("{addr}: connection error: {e}");
            }
        });
    }
}
