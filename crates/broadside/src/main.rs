//! The Broadside server binary.
//!
//! Runs with the development authenticator (the URL token is the
//! username) and a logging-only history sink. Production deployments
//! embed the library and supply real `Authenticator`/`HistorySink`
//! implementations instead.

use broadside::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), BroadsideError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("BROADSIDE_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let server = BroadsideServerBuilder::new()
        .bind(&addr)
        .build(InsecureAuth, NullHistory)
        .await?;

    tracing::info!(%addr, "broadside-server listening");
    server.run().await
}
