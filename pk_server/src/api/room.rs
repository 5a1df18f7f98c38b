//! Waiting room seating WebSocket connections into games.
//!
//! Connections wait here until enough of them are present to fill a game.
//! The room then creates the game through the [`GameManager`] and hands
//! every member its [`Seat`].

use log::{debug, error, warn};
use parking_lot::Mutex;
use pirate_king::{
    GameHandle, GameManager, PublishedState,
    entities::{Player, PlayerId, Username},
};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};

use crate::{logging, metrics};

/// A player's place in a started game.
#[derive(Clone, Debug)]
pub struct Seat {
    pub player: PlayerId,
    pub game: GameHandle,
}

/// Returned by [`WaitingRoom::join`].
#[derive(Debug)]
pub struct Ticket {
    pub player: Player,
    /// Who was waiting when this player joined, this player included.
    pub waiting: Vec<Username>,
    /// Resolves once the player is seated. Closed if game creation failed.
    pub seat: oneshot::Receiver<Seat>,
    /// Later changes to the waiting list.
    pub roster: watch::Receiver<Vec<Username>>,
}

#[derive(Debug)]
struct Waiter {
    player: Player,
    seat: oneshot::Sender<Seat>,
}

#[derive(Debug, Default)]
struct RoomState {
    next_player_id: u32,
    waiting: Vec<Waiter>,
}

impl RoomState {
    fn usernames(&self) -> Vec<Username> {
        self.waiting
            .iter()
            .map(|waiter| waiter.player.username.clone())
            .collect()
    }
}

pub struct WaitingRoom {
    manager: Arc<GameManager>,
    seats: usize,
    state: Mutex<RoomState>,
    roster: watch::Sender<Vec<Username>>,
}

impl WaitingRoom {
    pub fn new(manager: Arc<GameManager>, seats: usize) -> Self {
        Self {
            manager,
            seats,
            state: Mutex::new(RoomState::default()),
            roster: watch::Sender::new(Vec::new()),
        }
    }

    pub fn seats(&self) -> usize {
        self.seats
    }

    /// Usernames currently waiting, in arrival order.
    pub fn waiting(&self) -> Vec<Username> {
        self.state.lock().usernames()
    }

    /// Seat a new connection. When this fills a game, the game is created
    /// before returning and the ticket's seat is already resolved.
    pub async fn join(&self, username: &str) -> Ticket {
        let (seat_tx, seat_rx) = oneshot::channel();

        let (player, waiting, table) = {
            let mut state = self.state.lock();
            state.next_player_id += 1;
            let player = Player::new(state.next_player_id, username);
            state.waiting.push(Waiter {
                player: player.clone(),
                seat: seat_tx,
            });
            let waiting = state.usernames();

            let table = (state.waiting.len() >= self.seats)
                .then(|| state.waiting.drain(..self.seats).collect::<Vec<_>>());
            if table.is_none() {
                self.publish_roster(&state);
            }
            (player, waiting, table)
        };
        let roster = self.roster.subscribe();

        if let Some(table) = table {
            self.start_game(table).await;
            let state = self.state.lock();
            self.publish_roster(&state);
        }

        Ticket {
            player,
            waiting,
            seat: seat_rx,
            roster,
        }
    }

    /// Remove a player who is still waiting. Returns whether they were.
    pub fn leave(&self, player: PlayerId) -> bool {
        let mut state = self.state.lock();
        let before = state.waiting.len();
        state.waiting.retain(|waiter| waiter.player.id != player);
        let left = state.waiting.len() != before;
        if left {
            self.publish_roster(&state);
        }
        left
    }

    fn publish_roster(&self, state: &RoomState) {
        let usernames = state.usernames();
        metrics::waiting_players(usernames.len());
        self.roster.send_replace(usernames);
    }

    async fn start_game(&self, table: Vec<Waiter>) {
        let players: Vec<Player> = table.iter().map(|waiter| waiter.player.clone()).collect();
        let game = match self.manager.create_game(players).await {
            Ok(game) => game,
            Err(e) => {
                // Dropping the waiters closes their seat channels.
                error!("failed to start game: {e}");
                return;
            }
        };

        metrics::game_started();
        logging::log_game_event(game.id(), "created", &format!("{} players", table.len()));
        tokio::spawn(watch_outcome(game.clone()));

        for waiter in table {
            let player = waiter.player.id;
            let seat = Seat {
                player,
                game: game.clone(),
            };
            if waiter.seat.send(seat).is_err() {
                warn!("{player} left before game {} started", game.id());
                game.seat_lost(player);
            }
        }
    }
}

/// Follows a game's publications to record how it ended.
async fn watch_outcome(game: GameHandle) {
    let mut publications = game.subscribe();
    let mut outcome = "aborted";
    while publications.changed().await.is_ok() {
        let Some(publication) = publications.borrow_and_update().clone() else {
            continue;
        };
        match &publication.state {
            PublishedState::GameOver { .. } => {
                outcome = "completed";
                logging::log_game_event(game.id(), "completed", "game over");
            }
            PublishedState::Aborted { reason } => {
                logging::log_game_event(game.id(), "aborted", reason);
            }
            state => debug!("game {}: {}", game.id(), state.phase_name()),
        }
    }
    metrics::game_ended(outcome);
}
