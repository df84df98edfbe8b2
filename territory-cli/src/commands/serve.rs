//! Serve command - run the HTTP server.

use std::net::{IpAddr, SocketAddr};

use clap::Args;
use territory::serve::{serve, AppState};
use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the serve command.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind (overrides [server] bind)
    #[arg(long)]
    pub bind: Option<String>,

    /// Port to listen on (overrides [server] port and $PORT)
    #[arg(long)]
    pub port: Option<u16>,
}

/// Run the serve command.
pub async fn run(runner: &CliRunner, args: ServeArgs) -> Result<(), CliError> {
    runner.log_startup("serve");
    let config = runner.config();

    let bind = args.bind.unwrap_or_else(|| config.server.bind.clone());
    let port = args.port.unwrap_or_else(|| config.server.effective_port());
    let addr = listen_addr(&bind, port)?;

    let cache = runner.create_cache()?;
    let registry = runner.create_registry(&cache);
    info!(registry = %registry.path().display(), "Site registry ready");

    println!("Serving clipped polygons on http://{}", addr);
    serve(addr, AppState::new(cache, registry))
        .await
        .map_err(CliError::Serve)
}

fn listen_addr(bind: &str, port: u16) -> Result<SocketAddr, CliError> {
    let ip: IpAddr = bind
        .parse()
        .map_err(|e| CliError::Address(format!("'{}': {}", bind, e)))?;
    Ok(SocketAddr::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listen_addr() {
        let addr = listen_addr("0.0.0.0", 8080).unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn test_listen_addr_rejects_hostname() {
        assert!(matches!(
            listen_addr("localhost", 3000),
            Err(CliError::Address(_))
        ));
    }
}
