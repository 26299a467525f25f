//! Room actor: an isolated Tokio task that owns one match.
//!
//! Each room runs in its own task and communicates with the outside
//! world only through its command channel. All mutation of the room's
//! [`GameSession`] happens inside that task, so no two messages for the
//! same room are ever applied concurrently and the single-writer
//! invariant on board/phase/turn holds by construction.
//!
//! The actor also owns the room's only timers: the reconnection grace
//! window, pre-game idle teardown, and post-game linger. They share one
//! deadline slot raced against the command channel — a room never needs
//! more than one pending timer.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use broadside_game::{GameSession, Phase, PlayerCommand};
use broadside_protocol::{Recipient, RoomCode, ServerMessage, UserId};
use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Sleep;

use crate::{HistorySink, MatchRecord, RoomConfig, RoomError};

/// Channel sender for delivering outbound events to one participant's
/// connection task. The receiver half lives with the connection; when
/// the connection dies the sender just starts failing, which the actor
/// treats as "detached".
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Add the second participant.
    Join {
        user: UserId,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Re-attach a connection for an existing participant.
    Reattach {
        user: UserId,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// A participant's connection went away.
    Detach { user: UserId },

    /// An in-room command from a participant (fire-and-forget; errors
    /// go back to the participant as wire `error` events).
    Command {
        user: UserId,
        command: PlayerCommand,
    },

    /// Request a metadata snapshot.
    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    /// Tear the room down.
    Shutdown,
}

/// A snapshot of room metadata (not the boards themselves).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub phase: Phase,
    /// Participants in join order (creator first).
    pub participants: Vec<UserId>,
    /// How many participants have a live connection attached.
    pub connected: usize,
    pub turn_owner: Option<UserId>,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// `true` once the actor task has exited.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Adds a participant to the room.
    pub async fn join(
        &self,
        user: UserId,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                user,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Re-attaches a returning participant's connection.
    pub async fn reattach(
        &self,
        user: UserId,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Reattach {
                user,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Reports a participant's connection as gone.
    pub async fn detach(&self, user: UserId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Detach { user })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Sends an in-room command (fire-and-forget).
    pub async fn command(
        &self,
        user: UserId,
        command: PlayerCommand,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Command { user, command })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

// ---------------------------------------------------------------------------
// Actor internals
// ---------------------------------------------------------------------------

/// What a pending deadline means when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DeadlineKind {
    /// Zero attached connections; tear the room down.
    IdleTeardown,
    /// The named participant left mid-game; forfeit to their opponent.
    Forfeit(UserId),
    /// The match finished; stop lingering.
    FinishedLinger,
}

struct Deadline {
    kind: DeadlineKind,
    sleep: Pin<Box<Sleep>>,
}

enum ActorEvent {
    Command(Option<RoomCommand>),
    DeadlineFired,
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor<H: HistorySink> {
    code: RoomCode,
    config: RoomConfig,
    session: GameSession,
    /// Per-participant outbound channels. Presence here is what
    /// "attached" means.
    senders: HashMap<UserId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
    history: Arc<H>,
    deadline: Option<Deadline>,
    recorded: bool,
}

impl<H: HistorySink> RoomActor<H> {
    /// Runs the actor loop until teardown.
    async fn run(mut self) {
        tracing::info!(room = %self.code, "room opened");

        loop {
            let event = match &mut self.deadline {
                Some(deadline) => tokio::select! {
                    cmd = self.receiver.recv() => ActorEvent::Command(cmd),
                    _ = deadline.sleep.as_mut() => ActorEvent::DeadlineFired,
                },
                None => ActorEvent::Command(self.receiver.recv().await),
            };

            let done = match event {
                // Registry dropped the handle: nothing can reach us.
                ActorEvent::Command(None) => true,
                ActorEvent::Command(Some(cmd)) => self.handle_command(cmd),
                ActorEvent::DeadlineFired => self.handle_deadline(),
            };
            if done {
                break;
            }
        }

        tracing::info!(room = %self.code, "room closed");
    }

    /// Handles one command. Returns `true` when the actor should exit.
    fn handle_command(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                user,
                sender,
                reply,
            } => {
                let result = self.handle_join(user, sender);
                let _ = reply.send(result);
                false
            }
            RoomCommand::Reattach {
                user,
                sender,
                reply,
            } => {
                let result = self.handle_reattach(user, sender);
                let _ = reply.send(result);
                false
            }
            RoomCommand::Detach { user } => self.handle_detach(user),
            RoomCommand::Command { user, command } => {
                self.handle_player_command(user, command)
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
                false
            }
            RoomCommand::Shutdown => {
                tracing::info!(room = %self.code, "room shutting down");
                true
            }
        }
    }

    fn handle_join(
        &mut self,
        user: UserId,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let events = self.session.join(user.clone()).map_err(|e| {
            match e {
                broadside_game::GameError::MatchFull => {
                    RoomError::RoomFull(self.code.clone())
                }
                broadside_game::GameError::AlreadyJoined(u) => {
                    RoomError::AlreadyInRoom(u, self.code.clone())
                }
                other => RoomError::InvalidState(other.to_string()),
            }
        })?;

        self.senders.insert(user.clone(), sender);
        // A join proves the room is not idle.
        if matches!(
            self.deadline,
            Some(Deadline {
                kind: DeadlineKind::IdleTeardown,
                ..
            })
        ) {
            self.deadline = None;
        }

        tracing::info!(
            room = %self.code,
            %user,
            participants = self.session.participants().len(),
            "player joined"
        );
        self.dispatch(events);
        Ok(())
    }

    fn handle_reattach(
        &mut self,
        user: UserId,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        self.session
            .reconnect(&user)
            .map_err(|_| RoomError::NotInRoom(user.clone()))?;
        self.senders.insert(user.clone(), sender);

        // Their return cancels the timer that was waiting on them.
        match &self.deadline {
            Some(Deadline {
                kind: DeadlineKind::Forfeit(quitter),
                ..
            }) if *quitter == user => self.deadline = None,
            Some(Deadline {
                kind: DeadlineKind::IdleTeardown,
                ..
            }) => self.deadline = None,
            _ => {}
        }

        // If the opponent is still absent mid-game, their clock starts
        // (or restarts) now.
        if self.session.phase() == Phase::Playing {
            let absent = self
                .session
                .participants()
                .iter()
                .find(|p| !p.is_connected())
                .map(|p| p.user().clone());
            if let Some(absent) = absent {
                self.arm(DeadlineKind::Forfeit(absent), self.config.reconnect_grace);
            }
        }

        tracing::info!(room = %self.code, %user, "player reattached");
        Ok(())
    }

    /// Returns `true` when the actor should exit.
    fn handle_detach(&mut self, user: UserId) -> bool {
        self.senders.remove(&user);
        if self.session.disconnect(&user).is_err() {
            // Not a participant; nothing to track.
            return false;
        }

        tracing::info!(
            room = %self.code,
            %user,
            attached = self.senders.len(),
            "player detached"
        );

        if self.senders.is_empty() {
            if self.session.phase() == Phase::Finished {
                // Everyone has the result (or left); nothing to wait for.
                return true;
            }
            // Resuming after both peers disconnect is unsupported, but a
            // solo room may still be joined or reattached within the
            // idle window.
            self.arm(DeadlineKind::IdleTeardown, self.config.idle_timeout);
        } else if self.session.phase() == Phase::Playing {
            // The opponent is still here: hold state for the grace
            // window, then forfeit.
            self.arm(
                DeadlineKind::Forfeit(user),
                self.config.reconnect_grace,
            );
        }
        false
    }

    /// Returns `true` when the actor should exit.
    fn handle_player_command(
        &mut self,
        user: UserId,
        command: PlayerCommand,
    ) -> bool {
        match self.session.apply(&user, command) {
            Ok(events) => {
                self.dispatch(events);
                if self.session.phase() == Phase::Finished {
                    self.record_history();
                    if self.senders.is_empty() {
                        return true;
                    }
                    self.arm(
                        DeadlineKind::FinishedLinger,
                        self.config.finished_linger,
                    );
                }
                false
            }
            Err(e) => {
                tracing::debug!(
                    room = %self.code,
                    %user,
                    error = %e,
                    "command rejected"
                );
                self.send_to(
                    &user,
                    ServerMessage::Error {
                        message: e.to_string(),
                    },
                );
                false
            }
        }
    }

    /// Returns `true` when the actor should exit.
    fn handle_deadline(&mut self) -> bool {
        let kind = match self.deadline.take() {
            Some(deadline) => deadline.kind,
            None => return false,
        };

        match kind {
            DeadlineKind::IdleTeardown => {
                tracing::info!(room = %self.code, "idle timeout, tearing down");
                true
            }
            DeadlineKind::FinishedLinger => true,
            DeadlineKind::Forfeit(quitter) => {
                tracing::info!(
                    room = %self.code,
                    %quitter,
                    "grace window elapsed, forfeiting"
                );
                if let Some(events) = self.session.forfeit(&quitter) {
                    self.dispatch(events);
                    self.record_history();
                }
                if self.senders.is_empty() {
                    true
                } else {
                    self.arm(
                        DeadlineKind::FinishedLinger,
                        self.config.finished_linger,
                    );
                    false
                }
            }
        }
    }

    fn arm(&mut self, kind: DeadlineKind, after: Duration) {
        self.deadline = Some(Deadline {
            kind,
            sleep: Box::pin(tokio::time::sleep(after)),
        });
    }

    /// Hands the finished match to the history sink. At most once.
    ///
    /// The sink call runs in its own task so a slow store can never
    /// stall this room's command processing.
    fn record_history(&mut self) {
        if self.recorded {
            return;
        }
        let participants = self.session.participants();
        let (Some(winner), [p1, p2]) =
            (self.session.winner().cloned(), participants)
        else {
            return;
        };
        let loser = if *p1.user() == winner {
            p2.user().clone()
        } else {
            p1.user().clone()
        };
        let record = MatchRecord {
            player1: p1.user().clone(),
            player2: p2.user().clone(),
            winner,
            loser,
            duration_secs: self
                .session
                .match_duration()
                .map(|d| d.as_secs())
                .unwrap_or(0),
            finished_at: Utc::now(),
        };
        self.recorded = true;
        let history = Arc::clone(&self.history);
        tokio::spawn(async move {
            history.record(record).await;
        });
    }

    /// Dispatches outbound events to the right recipients.
    fn dispatch(&self, events: broadside_game::Events) {
        for (recipient, msg) in events {
            match recipient {
                Recipient::All => {
                    for user in self.senders.keys() {
                        self.send_to(user, msg.clone());
                    }
                }
                Recipient::Player(user) => {
                    self.send_to(&user, msg);
                }
                Recipient::AllExcept(excluded) => {
                    for user in self.senders.keys() {
                        if *user != excluded {
                            self.send_to(user, msg.clone());
                        }
                    }
                }
            }
        }
    }

    /// Sends an event to a single participant. Silently drops if their
    /// connection is gone.
    fn send_to(&self, user: &UserId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(user) {
            let _ = sender.send(msg);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.code.clone(),
            phase: self.session.phase(),
            participants: self
                .session
                .participants()
                .iter()
                .map(|p| p.user().clone())
                .collect(),
            connected: self.senders.len(),
            turn_owner: self.session.turn_owner().cloned(),
        }
    }
}

/// Spawns a new room actor with the creator already attached, and
/// returns a handle to it.
pub(crate) fn spawn_room<H: HistorySink>(
    code: RoomCode,
    creator: UserId,
    creator_sender: PlayerSender,
    config: RoomConfig,
    history: Arc<H>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);

    let mut senders = HashMap::new();
    senders.insert(creator.clone(), creator_sender);

    let actor = RoomActor {
        code: code.clone(),
        config,
        session: GameSession::new(creator),
        senders,
        receiver: rx,
        history,
        deadline: None,
        recorded: false,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
