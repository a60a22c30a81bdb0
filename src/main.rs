// LedgerGate - Read-oriented HTTP gateway for a blockchain node
//
// Main entry point. The binary wires the subsystems in dependency
// order: configuration, the MongoDB document store, the per-entity
// cursors, and finally the REST listener. The gateway is strictly
// read-only and stateless between requests; shutdown is a matter of
// draining the listener.

use anyhow::Result;
use tracing::{error, info};

use ledgergate_api::{AppState, RestApi};
use ledgergate_core::GatewayConfig;
use ledgergate_store::DocumentStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured JSON logging; RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ledgergate=info".parse()?),
        )
        .json()
        .init();

    info!("starting ledgergate");

    let config = GatewayConfig::load().await?;
    let network = config.network.kind()?;

    let store = match DocumentStore::connect(&config.db).await {
        Ok(store) => store,
        Err(err) => {
            error!("failed to connect to document store: {err}");
            return Err(err.into());
        }
    };

    let state = AppState::new(store, network, &config);
    let api = RestApi::new(&config.api, state);

    info!(
        network = %config.network.name,
        "ledgergate ready; serving on {}:{}",
        config.api.bind_address,
        config.api.port
    );

    // serves until ctrl-c
    api.serve().await?;

    info!("ledgergate stopped");
    Ok(())
}
