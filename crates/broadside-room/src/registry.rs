//! The room registry: code allocation, membership, and teardown.
//!
//! The registry is the only process-wide mutable state. It maps live
//! room codes to actor handles and users to their current room. Its
//! lock (held by the layer above) only ever covers these map operations
//! — routing a command into a room is a channel send, never a wait on
//! the room's processing.

use std::collections::HashMap;
use std::sync::Arc;

use broadside_game::PlayerCommand;
use broadside_protocol::{RoomCode, UserId};
use rand::Rng;

use crate::room::spawn_room;
use crate::{HistorySink, PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo};

/// Alphabet for generated room codes. Uppercase only — codes are
/// case-insensitive on input and normalized before lookup.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Tracks all live rooms and which user is in which room.
pub struct RoomRegistry<H: HistorySink> {
    /// Live rooms, keyed by code.
    rooms: HashMap<RoomCode, RoomHandle>,

    /// Maps each user to their current room. A user is in at most one
    /// room at a time; the entry survives disconnects so a returning
    /// user can be routed back to their match.
    user_rooms: HashMap<UserId, RoomCode>,

    config: RoomConfig,
    history: Arc<H>,
}

impl<H: HistorySink> RoomRegistry<H> {
    /// Creates an empty registry. The history sink is shared with every
    /// room actor the registry spawns.
    pub fn new(config: RoomConfig, history: Arc<H>) -> Self {
        Self {
            rooms: HashMap::new(),
            user_rooms: HashMap::new(),
            config,
            history,
        }
    }

    /// Creates a room and registers `owner` as its first participant.
    ///
    /// The code is collision-checked against live rooms only; codes of
    /// torn-down rooms may be reused.
    pub fn create_room(
        &mut self,
        owner: UserId,
        sender: PlayerSender,
    ) -> Result<RoomCode, RoomError> {
        if let Some(current) = self.user_rooms.get(&owner) {
            return Err(RoomError::AlreadyInRoom(owner, current.clone()));
        }

        let code = self.generate_code();
        let handle = spawn_room(
            code.clone(),
            owner.clone(),
            sender,
            self.config.clone(),
            Arc::clone(&self.history),
        );
        self.rooms.insert(code.clone(), handle);
        self.user_rooms.insert(owner.clone(), code.clone());

        tracing::info!(room = %code, %owner, "room created");
        Ok(code)
    }

    /// Adds a user to an existing room.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] for unknown codes,
    /// [`RoomError::RoomFull`] for a third participant, and
    /// [`RoomError::AlreadyInRoom`] when the user hasn't left their
    /// current room.
    pub async fn join_room(
        &mut self,
        user: UserId,
        code: &RoomCode,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.user_rooms.get(&user) {
            return Err(RoomError::AlreadyInRoom(user, current.clone()));
        }

        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        handle.join(user.clone(), sender).await?;
        self.user_rooms.insert(user, code.clone());
        Ok(())
    }

    /// Routes an in-room command from a user to their room.
    pub async fn route(
        &self,
        user: &UserId,
        command: PlayerCommand,
    ) -> Result<(), RoomError> {
        let code = self
            .user_rooms
            .get(user)
            .ok_or_else(|| RoomError::NotInRoom(user.clone()))?;

        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        handle.command(user.clone(), command).await
    }

    /// Re-attaches a returning user's connection to their room, if they
    /// have one. Returns the room code on success, `None` when the user
    /// has no live room (the stale membership entry is dropped).
    pub async fn attach(
        &mut self,
        user: &UserId,
        sender: PlayerSender,
    ) -> Result<Option<RoomCode>, RoomError> {
        let Some(code) = self.user_rooms.get(user).cloned() else {
            return Ok(None);
        };

        let alive = match self.rooms.get(&code) {
            Some(handle) => {
                handle.reattach(user.clone(), sender).await.is_ok()
            }
            None => false,
        };

        if alive {
            Ok(Some(code))
        } else {
            self.user_rooms.remove(user);
            Ok(None)
        }
    }

    /// Reports a user's connection as gone. Membership is kept so they
    /// can be routed back on reconnect; the room actor decides what the
    /// disconnect means (grace window, idle teardown, nothing).
    pub async fn detach(&mut self, user: &UserId) {
        let Some(code) = self.user_rooms.get(user).cloned() else {
            return;
        };
        match self.rooms.get(&code) {
            Some(handle) if !handle.is_closed() => {
                let _ = handle.detach(user.clone()).await;
            }
            _ => {
                // Room already gone; drop the stale membership.
                self.user_rooms.remove(user);
            }
        }
    }

    /// Returns info about a specific room.
    pub async fn room_info(
        &self,
        code: &RoomCode,
    ) -> Result<RoomInfo, RoomError> {
        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        handle.info().await
    }

    /// Shuts a room down and removes all its membership entries.
    pub async fn destroy_room(
        &mut self,
        code: &RoomCode,
    ) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        let _ = handle.shutdown().await;
        self.user_rooms.retain(|_, c| c != code);

        tracing::info!(room = %code, "room destroyed");
        Ok(())
    }

    /// Drops registry entries whose actor task has exited (finished
    /// matches, idle teardowns, forfeits with nobody left). Called from
    /// the server's periodic sweep. Returns how many rooms were reaped.
    pub fn reap(&mut self) -> usize {
        let dead: Vec<RoomCode> = self
            .rooms
            .iter()
            .filter(|(_, handle)| handle.is_closed())
            .map(|(code, _)| code.clone())
            .collect();

        for code in &dead {
            self.rooms.remove(code);
            self.user_rooms.retain(|_, c| c != code);
            tracing::debug!(room = %code, "reaped dead room");
        }
        dead.len()
    }

    /// The room a user is currently in, if any.
    pub fn user_room(&self, user: &UserId) -> Option<&RoomCode> {
        self.user_rooms.get(user)
    }

    /// The number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Generates a code not used by any live room.
    fn generate_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let raw: String = (0..self.config.code_length)
                .map(|_| {
                    let i = rng.random_range(0..CODE_ALPHABET.len());
                    CODE_ALPHABET[i] as char
                })
                .collect();
            let code = RoomCode::new(raw);
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}
