//! `BroadsideServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session → room.
//! Every accepted connection gets its own handler task; a maintenance
//! task periodically expires stale sessions and reaps dead rooms.

use std::sync::Arc;
use std::time::Duration;

use broadside_protocol::{Codec, JsonCodec};
use broadside_room::{HistorySink, RoomConfig, RoomRegistry};
use broadside_session::{Authenticator, SessionConfig, SessionManager};
use broadside_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::BroadsideError;

/// How often the maintenance sweep runs (session expiry, room reaping).
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(5);

/// Shared server state passed to each connection handler task.
///
/// Both locks are held only across registry/manager map operations —
/// never across network I/O and never while a room processes a command.
pub(crate) struct ServerState<A: Authenticator, H: HistorySink, C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) registry: Mutex<RoomRegistry<H>>,
    pub(crate) auth: A,
    pub(crate) codec: C,
}

/// Builder for configuring and starting a Broadside server.
///
/// # Example
///
/// ```rust,ignore
/// use broadside::prelude::*;
///
/// let server = BroadsideServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(InsecureAuth, NullHistory)
///     .await?;
/// server.run().await
/// ```
pub struct BroadsideServerBuilder {
    bind_addr: String,
    session_config: SessionConfig,
    room_config: RoomConfig,
}

impl BroadsideServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            session_config: SessionConfig::default(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets the room configuration (grace window, idle timeout, …).
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Builds the server with the given authenticator and history sink.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<A: Authenticator, H: HistorySink>(
        self,
        auth: A,
        history: H,
    ) -> Result<BroadsideServer<A, H, JsonCodec>, BroadsideError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.session_config)),
            registry: Mutex::new(RoomRegistry::new(
                self.room_config,
                Arc::new(history),
            )),
            auth,
            codec: JsonCodec,
        });

        Ok(BroadsideServer { transport, state })
    }
}

impl Default for BroadsideServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Broadside game server.
pub struct BroadsideServer<A: Authenticator, H: HistorySink, C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<A, H, C>>,
}

impl<A, H, C> BroadsideServer<A, H, C>
where
    A: Authenticator,
    H: HistorySink,
    C: Codec + Clone + 'static,
{
    /// Creates a new builder.
    pub fn builder() -> BroadsideServerBuilder {
        BroadsideServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(mut self) -> Result<(), BroadsideError> {
        tracing::info!("Broadside server running");

        // Maintenance sweep: expire stale sessions and drop registry
        // entries whose room actor has exited.
        let sweep_state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(MAINTENANCE_INTERVAL);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let expired = sweep_state.sessions.lock().await.expire_stale();
                for user in &expired {
                    sweep_state.registry.lock().await.detach(user).await;
                }
                sweep_state.registry.lock().await.reap();
            }
        });

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection::<A, H, C>(conn, state).await
                        {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
