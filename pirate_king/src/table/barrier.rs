//! Acknowledgment barrier gating phase advancement.
//!
//! The game task arms the barrier with the sequence number of every
//! publication it sends, then waits on it for gated ones. Connection tasks
//! record acks as they arrive. The waiter is woken through a
//! [`tokio::sync::Notify`], never by polling.

use log::{debug, warn};
use parking_lot::Mutex;
use std::collections::HashSet;
use tokio::sync::Notify;

use crate::game::{GameError, entities::PlayerId};

/// What an acknowledgment did to the barrier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AckOutcome {
    /// Counted towards the armed publication.
    Counted,
    /// This player already acked the armed publication.
    Duplicate,
    /// Refers to a publication that is no longer armed.
    Stale,
}

#[derive(Debug, Default)]
struct BarrierState {
    armed: Option<u64>,
    acked: HashSet<PlayerId>,
    lost: Option<PlayerId>,
}

#[derive(Debug)]
pub struct SyncBarrier {
    seats: HashSet<PlayerId>,
    state: Mutex<BarrierState>,
    notify: Notify,
}

impl SyncBarrier {
    pub fn new(seats: impl IntoIterator<Item = PlayerId>) -> Self {
        Self {
            seats: seats.into_iter().collect(),
            state: Mutex::new(BarrierState::default()),
            notify: Notify::new(),
        }
    }

    #[must_use]
    pub fn seat_count(&self) -> usize {
        self.seats.len()
    }

    /// Starts collecting acks for publication `seq`. Acks for anything
    /// earlier become stale.
    pub fn arm(&self, seq: u64) {
        let mut state = self.state.lock();
        state.armed = Some(seq);
        state.acked.clear();
    }

    /// Records an ack from `player`. An ack without a sequence number counts
    /// towards whatever is armed.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownPlayer`] if `player` has no seat in this game.
    pub fn ack(&self, player: PlayerId, seq: Option<u64>) -> Result<AckOutcome, GameError> {
        if !self.seats.contains(&player) {
            return Err(GameError::UnknownPlayer(player));
        }

        let mut state = self.state.lock();
        let Some(armed) = state.armed else {
            return Ok(AckOutcome::Stale);
        };
        if seq.is_some_and(|seq| seq != armed) {
            debug!("stale ack from {player} for {seq:?}, armed {armed}");
            return Ok(AckOutcome::Stale);
        }
        if !state.acked.insert(player) {
            return Ok(AckOutcome::Duplicate);
        }
        if state.acked.len() == self.seats.len() {
            self.notify.notify_waiters();
        }
        Ok(AckOutcome::Counted)
    }

    /// Whether every seat has acked publication `seq`.
    #[must_use]
    pub fn is_clear(&self, seq: u64) -> bool {
        let state = self.state.lock();
        state.armed == Some(seq) && state.acked.len() == self.seats.len()
    }

    #[must_use]
    pub fn acked_count(&self) -> usize {
        self.state.lock().acked.len()
    }

    /// Marks a seat as gone. The barrier can never clear again, so every
    /// waiter is woken to fail.
    pub fn seat_lost(&self, player: PlayerId) {
        if !self.seats.contains(&player) {
            return;
        }
        let mut state = self.state.lock();
        if state.lost.is_none() {
            warn!("seat {player} lost");
            state.lost = Some(player);
        }
        drop(state);
        self.notify.notify_waiters();
    }

    #[must_use]
    pub fn lost_seat(&self) -> Option<PlayerId> {
        self.state.lock().lost
    }

    /// Waits until every seat has acked publication `seq`.
    ///
    /// # Errors
    ///
    /// [`GameError::SeatLost`] once any seat is lost.
    pub async fn wait(&self, seq: u64) -> Result<(), GameError> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a notify between the check and
            // the await is not missed.
            notified.as_mut().enable();

            {
                let state = self.state.lock();
                if let Some(player) = state.lost {
                    return Err(GameError::SeatLost(player));
                }
                if state.armed != Some(seq) || state.acked.len() == self.seats.len() {
                    return Ok(());
                }
            }

            notified.await;
        }
    }

    /// Resolves once any seat is lost.
    pub async fn lost(&self) -> PlayerId {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(player) = self.lost_seat() {
                return player;
            }

            notified.await;
        }
    }
}
