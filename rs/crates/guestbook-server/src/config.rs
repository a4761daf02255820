use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use guestbook_core::TICK_INTERVAL;

/// Command-line flags; each one can also come from the environment.
#[derive(Parser, Debug)]
#[command(author, version, about = "Live guest book server")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "GUESTBOOK_LISTEN", default_value = "0.0.0.0:4000")]
    pub listen: SocketAddr,
    /// Visitor counter tick period in milliseconds
    #[arg(
        long,
        env = "GUESTBOOK_TICK_MS",
        default_value_t = 5000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub tick_ms: u64,
    /// Default log filter (RUST_LOG takes precedence)
    #[arg(long, env = "GUESTBOOK_LOG", default_value = "info")]
    pub log: String,
    /// Page title of the standalone guest book
    #[arg(long, env = "GUESTBOOK_TITLE", default_value = "Guest Book")]
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    pub tick_interval: Duration,
    pub log: String,
    pub title: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: SocketAddr::from(([0, 0, 0, 0], 4000)),
            tick_interval: TICK_INTERVAL,
            log: "info".to_string(),
            title: "Guest Book".to_string(),
        }
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            listen: args.listen,
            tick_interval: Duration::from_millis(args.tick_ms),
            log: args.log,
            title: args.title,
        }
    }
}
