//! Per-connection handler: authentication and message routing.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The flow is:
//!   1. Resolve the bearer credential from the upgrade path (`/ws/{token}`)
//!   2. Register the session (resuming one if the user just dropped)
//!   3. Re-attach to the user's room, if they have one
//!   4. Loop: multiplex inbound frames and the room's outbound events
//!
//! The connection is a pure I/O endpoint — it decodes, forwards, and
//! encodes, but never touches game state itself.

use std::sync::Arc;

use broadside_game::PlayerCommand;
use broadside_protocol::{
    ClientMessage, Codec, Coord, ServerMessage, UserId,
};
use broadside_room::{HistorySink, PlayerSender};
use broadside_session::Authenticator;
use broadside_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::BroadsideError;

/// Panic backstop: detaches the player if the handler task dies without
/// reaching its ordered cleanup. Normal exits disarm it and clean up
/// inline, so the disconnect is guaranteed to land before this task
/// ends — a fast reconnect can never race a still-pending cleanup.
struct ConnectionGuard<A: Authenticator, H: HistorySink, C: Codec> {
    user: UserId,
    state: Arc<ServerState<A, H, C>>,
    armed: bool,
}

impl<A: Authenticator, H: HistorySink, C: Codec>
    ConnectionGuard<A, H, C>
{
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl<A: Authenticator, H: HistorySink, C: Codec> Drop
    for ConnectionGuard<A, H, C>
{
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let user = self.user.clone();
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let _ = state.sessions.lock().await.disconnect(&user);
            state.registry.lock().await.detach(&user).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<A, H, C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<A, H, C>>,
) -> Result<(), BroadsideError>
where
    A: Authenticator,
    H: HistorySink,
    C: Codec,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: identity ---
    let token = conn.path().rsplit('/').next().unwrap_or("");
    let user = match state.auth.authenticate(token).await {
        Ok(user) => user,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "authentication failed");
            send_error(&conn, &state.codec, "authentication failed").await?;
            let _ = conn.close().await;
            return Err(BroadsideError::Session(e));
        }
    };

    // --- Step 2: session ---
    let outcome = {
        let mut sessions = state.sessions.lock().await;
        match sessions.connect(user.clone()) {
            Ok(outcome) => outcome,
            Err(e) => {
                drop(sessions);
                send_error(&conn, &state.codec, &e.to_string()).await?;
                let _ = conn.close().await;
                return Err(BroadsideError::Session(e));
            }
        }
    };
    tracing::info!(%conn_id, %user, ?outcome, "player connected");

    let mut guard = ConnectionGuard {
        user: user.clone(),
        state: Arc::clone(&state),
        armed: true,
    };

    // --- Steps 3–4 ---
    let result = message_loop(&conn, &user, &state).await;

    // Ordered cleanup: the disconnect lands before this handler returns,
    // so the next connection for this identity observes it.
    guard.disarm();
    let _ = state.sessions.lock().await.disconnect(&user);
    state.registry.lock().await.detach(&user).await;
    tracing::info!(%user, "player disconnected");

    result
}

/// Attaches the outbound channel and runs the multiplexing loop until
/// the connection ends.
async fn message_loop<A, H, C>(
    conn: &WebSocketConnection,
    user: &UserId,
    state: &Arc<ServerState<A, H, C>>,
) -> Result<(), BroadsideError>
where
    A: Authenticator,
    H: HistorySink,
    C: Codec,
{
    let (tx, mut outbox): (PlayerSender, _) = mpsc::unbounded_channel();

    // Room membership can outlive the session record (a placement-phase
    // room idles longer than the session grace), so re-attachment is
    // attempted for every connection; it is a no-op without membership.
    let room = state
        .registry
        .lock()
        .await
        .attach(user, tx.clone())
        .await?;
    if let Some(code) = room {
        tracing::info!(%user, room = %code, "rejoined room in progress");
    }

    loop {
        tokio::select! {
            outbound = outbox.recv() => {
                // This task owns a sender clone, so `recv` only ever
                // yields `Some` here.
                if let Some(msg) = outbound {
                    let text = state.codec.encode(&msg)?;
                    conn.send(&text).await.map_err(BroadsideError::Transport)?;
                }
            }

            inbound = conn.recv() => match inbound {
                Ok(Some(text)) => {
                    handle_frame(user, &text, &tx, state).await;
                }
                Ok(None) => {
                    tracing::debug!(%user, "connection closed cleanly");
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!(%user, error = %e, "recv error");
                    return Ok(());
                }
            },
        }
    }
}

/// Decodes and dispatches one inbound frame.
///
/// All failures — malformed JSON, unknown rooms, rule violations — come
/// back to the sender as a wire `error` event through their own outbound
/// channel; nothing here can take the room or the connection down.
async fn handle_frame<A, H, C>(
    user: &UserId,
    text: &str,
    tx: &PlayerSender,
    state: &Arc<ServerState<A, H, C>>,
) where
    A: Authenticator,
    H: HistorySink,
    C: Codec,
{
    let msg: ClientMessage = match state.codec.decode(text) {
        Ok(msg) => msg,
        Err(e) => {
            tracing::debug!(%user, error = %e, "malformed frame");
            let _ = tx.send(ServerMessage::Error {
                message: "malformed message".into(),
            });
            return;
        }
    };

    match msg {
        ClientMessage::CreateRoom => {
            let result = state
                .registry
                .lock()
                .await
                .create_room(user.clone(), tx.clone());
            match result {
                Ok(code) => {
                    let _ = tx.send(ServerMessage::RoomCreated {
                        room_code: code,
                    });
                }
                Err(e) => {
                    let _ = tx.send(ServerMessage::Error {
                        message: e.to_string(),
                    });
                }
            }
        }

        ClientMessage::JoinRoom { room_code } => {
            let result = state
                .registry
                .lock()
                .await
                .join_room(user.clone(), &room_code, tx.clone())
                .await;
            if let Err(e) = result {
                let _ = tx.send(ServerMessage::Error {
                    message: e.to_string(),
                });
            }
            // Success is announced by the room's player_joined broadcast.
        }

        ClientMessage::PlaceShips { ships } => {
            route(user, PlayerCommand::PlaceShips(ships), tx, state).await;
        }

        ClientMessage::Attack { x, y } => {
            route(user, PlayerCommand::Attack(Coord::new(x, y)), tx, state)
                .await;
        }

        ClientMessage::Chat { message } => {
            route(user, PlayerCommand::Chat(message), tx, state).await;
        }
    }
}

/// Routes an in-room command; room-lookup failures become `error` events.
async fn route<A, H, C>(
    user: &UserId,
    command: PlayerCommand,
    tx: &PlayerSender,
    state: &Arc<ServerState<A, H, C>>,
) where
    A: Authenticator,
    H: HistorySink,
    C: Codec,
{
    let result = state.registry.lock().await.route(user, command).await;
    if let Err(e) = result {
        let _ = tx.send(ServerMessage::Error {
            message: e.to_string(),
        });
    }
}

/// Sends an `error` event directly on the connection. Only used before
/// the outbound channel exists (pre-session failures).
async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    message: &str,
) -> Result<(), BroadsideError> {
    let msg = ServerMessage::Error {
        message: message.to_string(),
    };
    let text = codec.encode(&msg)?;
    conn.send(&text).await.map_err(BroadsideError::Transport)?;
    Ok(())
}
