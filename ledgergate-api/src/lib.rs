//! # LedgerGate REST API
//!
//! Route adaptor over the cursor engine: maps URL parameters to anchor
//! kinds and entities, enforces the configured limit policies (redirecting
//! invalid limits instead of rejecting them), and translates engine
//! errors into status codes — 404 for missing anchors, 409 for
//! malformed keys and unknown enum values, 500 with a redacted message
//! for store faults.

use anyhow::Result;
use tracing::{info, warn};

use ledgergate_core::{ApiConfig, CountRangeConfig, GatewayConfig, NetworkKind, PageSizeConfig};
use ledgergate_cursor::{
    AccountCursor, BlockCursor, MosaicCursor, NamespaceCursor, TransactionCursor, TransactionGroup,
};
use ledgergate_store::DocumentStore;

mod error;
mod params;
mod rest;

pub use error::*;
pub use params::*;
pub use rest::*;

/// Shared handler state: one cursor per entity plus the limit policies.
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub blocks: BlockCursor,
    pub confirmed: TransactionCursor,
    pub unconfirmed: TransactionCursor,
    pub partial: TransactionCursor,
    pub mosaics: MosaicCursor,
    pub namespaces: NamespaceCursor,
    pub accounts: AccountCursor,
    pub page_size: PageSizeConfig,
    pub count_range: CountRangeConfig,
}

impl AppState {
    pub fn new(store: DocumentStore, network: NetworkKind, config: &GatewayConfig) -> Self {
        Self {
            store: store.clone(),
            blocks: BlockCursor::new(store.clone()),
            confirmed: TransactionCursor::new(store.clone(), TransactionGroup::Confirmed),
            unconfirmed: TransactionCursor::new(store.clone(), TransactionGroup::Unconfirmed),
            partial: TransactionCursor::new(store.clone(), TransactionGroup::Partial),
            mosaics: MosaicCursor::new(store.clone()),
            namespaces: NamespaceCursor::new(store.clone()),
            accounts: AccountCursor::new(store, network),
            page_size: config.page_size.clone(),
            count_range: config.count_range.clone(),
        }
    }
}

/// The REST listener.
pub struct RestApi {
    config: ApiConfig,
    state: AppState,
}

impl RestApi {
    pub fn new(config: &ApiConfig, state: AppState) -> Self {
        Self {
            config: config.clone(),
            state,
        }
    }

    /// Serve until the process receives a shutdown signal.
    pub async fn serve(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.bind_address, self.config.port);
        let router = rest::router(self.state, self.config.cors_enabled);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(%addr, "REST API listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("REST API stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("unable to listen for shutdown signal: {err}");
    }
}
