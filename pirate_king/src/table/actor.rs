//! Game actor: the single writer of one game's round state.

use log::{debug, error, info, warn};
use std::{collections::VecDeque, sync::Arc};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use super::{
    barrier::{AckOutcome, SyncBarrier},
    messages::{GameId, GameMessage, Intent, PlayerIntent, Publication},
};
use crate::game::{
    GameError, GameSettings, GameStateMachine, Phase, PublishedState, RoundState,
    entities::{Player, PlayerId, ScoreSheet},
    state_machine::Action,
};

pub type PublicationReceiver = watch::Receiver<Option<Arc<Publication>>>;

/// Handle for talking to a running game.
#[derive(Clone, Debug)]
pub struct GameHandle {
    id: GameId,
    players: Arc<[Player]>,
    sender: mpsc::Sender<GameMessage>,
    closer: Arc<watch::Sender<bool>>,
    barrier: Arc<SyncBarrier>,
    publications: PublicationReceiver,
}

impl GameHandle {
    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Routes an intent. Acks go straight to the barrier; bids and plays are
    /// queued for the game task.
    ///
    /// # Errors
    ///
    /// * [`GameError::UnknownPlayer`] - sender has no seat in this game
    /// * [`GameError::InboxFull`] - the inbox is at capacity, intent dropped
    /// * [`GameError::GameClosed`] - the game task has ended
    pub fn submit(&self, intent: PlayerIntent) -> Result<(), GameError> {
        let PlayerIntent { player, intent } = intent;
        match intent.action() {
            Some(action) => self.send(GameMessage::Action { player, action }),
            None => {
                let Intent::Ack { seq } = intent else {
                    return Ok(());
                };
                self.ack(player, seq).map(|_| ())
            }
        }
    }

    /// # Errors
    ///
    /// [`GameError::UnknownPlayer`] for a player without a seat.
    pub fn ack(&self, player: PlayerId, seq: Option<u64>) -> Result<AckOutcome, GameError> {
        let outcome = self.barrier.ack(player, seq)?;
        if outcome != AckOutcome::Counted {
            debug!("game {}: {outcome:?} ack from {player}", self.id);
        }
        Ok(outcome)
    }

    /// Latest publications. The current value is available immediately.
    pub fn subscribe(&self) -> PublicationReceiver {
        self.publications.clone()
    }

    /// The most recent publication, if the game has published anything.
    pub fn snapshot(&self) -> Option<Arc<Publication>> {
        self.publications.borrow().clone()
    }

    /// Reports that a seat's connection is gone. The game aborts.
    pub fn seat_lost(&self, player: PlayerId) {
        self.barrier.seat_lost(player);
    }

    /// Asks the game to end early. Never waits on the inbox, so a backlog
    /// of intents can't hold a close back.
    ///
    /// # Errors
    ///
    /// [`GameError::GameClosed`] if the game already ended.
    pub fn close(&self) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::GameClosed);
        }
        self.closer.send_replace(true);
        Ok(())
    }

    /// Whether the game task has ended.
    pub fn is_finished(&self) -> bool {
        self.sender.is_closed()
    }

    fn send(&self, message: GameMessage) -> Result<(), GameError> {
        self.sender.try_send(message).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => GameError::InboxFull,
            mpsc::error::TrySendError::Closed(_) => GameError::GameClosed,
        })
    }
}

/// Owns a game's [`RoundState`] and drives it through its phases.
pub struct GameActor {
    id: GameId,
    machine: GameStateMachine,
    state: Arc<RoundState>,
    inbox: mpsc::Receiver<GameMessage>,
    closed: watch::Receiver<bool>,
    barrier: Arc<SyncBarrier>,
    publisher: watch::Sender<Option<Arc<Publication>>>,
    seq: u64,
    /// Actions received while waiting on the barrier, one slot per seat.
    deferred: VecDeque<(PlayerId, Action)>,
}

impl GameActor {
    /// Create a new game actor
    ///
    /// # Arguments
    ///
    /// * `settings` - Game settings
    /// * `players` - Seated players, in seating order
    ///
    /// # Returns
    ///
    /// * `(GameActor, GameHandle)` - Actor and handle for sending messages
    ///
    /// # Errors
    ///
    /// [`GameError::InvalidSettings`] if the settings don't fit the players.
    pub fn new(
        settings: GameSettings,
        players: Vec<Player>,
    ) -> Result<(Self, GameHandle), GameError> {
        let id = Uuid::new_v4();
        let mut machine = GameStateMachine::new(settings, players)?;
        let state = Arc::new(machine.initial_state());
        let players = Arc::clone(machine.players());

        let (sender, inbox) = mpsc::channel(players.len());
        let (publisher, publications) = watch::channel(None);
        let (closer, closed) = watch::channel(false);
        let barrier = Arc::new(SyncBarrier::new(players.iter().map(|p| p.id)));

        let handle = GameHandle {
            id,
            players,
            sender,
            closer: Arc::new(closer),
            barrier: Arc::clone(&barrier),
            publications,
        };
        let actor = Self {
            id,
            machine,
            state,
            inbox,
            closed,
            barrier,
            publisher,
            seq: 0,
            deferred: VecDeque::new(),
        };
        Ok((actor, handle))
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    /// Runs the game to completion and returns the final score sheet.
    ///
    /// A terminal publication is sent either way: `GAME_OVER` on success,
    /// `ABORTED` with the error text otherwise.
    ///
    /// # Errors
    ///
    /// The fatal [`GameError`] that ended the game early.
    pub async fn run(mut self) -> Result<ScoreSheet, GameError> {
        info!(
            "game {} starting with {} players",
            self.id,
            self.state.seated_count()
        );

        match self.play().await {
            Ok(()) => {
                info!("game {} over: {:?}", self.id, self.state.score_sheet);
                Ok(self.state.score_sheet.clone())
            }
            Err(e) => {
                error!(
                    "game {} aborted in round {} ({}): {e}",
                    self.id, self.state.round, self.state.phase
                );
                self.publish_view(PublishedState::Aborted {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn play(&mut self) -> Result<(), GameError> {
        loop {
            self.state = Arc::new(self.machine.enter(&self.state)?);

            if self.state.phase.accepts_intents() {
                self.collect_actions().await?;
            } else {
                self.publish();
            }

            if self.state.phase == Phase::GameOver {
                return Ok(());
            }
            if self.state.phase.is_gated() {
                self.wait_for_acks().await?;
            }

            self.state = Arc::new(self.machine.next_phase(&self.state));
        }
    }

    /// Blocks until every seat acked the latest publication. Actions that
    /// arrive meanwhile are held back for the next phase that takes them.
    async fn wait_for_acks(&mut self) -> Result<(), GameError> {
        let seq = self.seq;
        loop {
            tokio::select! {
                result = self.barrier.wait(seq) => {
                    result?;
                    debug!("game {}: publication {seq} cleared", self.id);
                    return Ok(());
                }
                () = close_requested(&mut self.closed) => return Err(GameError::GameClosed),
                message = self.inbox.recv() => {
                    let GameMessage::Action { player, action } =
                        message.ok_or(GameError::GameClosed)?;
                    self.defer(player, action);
                }
            }
        }
    }

    /// Holds an action for later. A seat's newer action replaces the one it
    /// already has waiting.
    fn defer(&mut self, player: PlayerId, action: Action) {
        match self.deferred.iter_mut().find(|(seat, _)| *seat == player) {
            Some(held) => {
                debug!("game {}: {action} from {player} replaces {}", self.id, held.1);
                held.1 = action;
            }
            None => self.deferred.push_back((player, action)),
        }
    }

    /// Applies queued actions until the phase is complete, publishing each
    /// time the inbox is drained and something changed.
    async fn collect_actions(&mut self) -> Result<(), GameError> {
        while !GameStateMachine::is_phase_complete(&self.state) {
            let before = Arc::clone(&self.state);

            if self.deferred.is_empty() {
                let message = tokio::select! {
                    message = self.inbox.recv() => message.ok_or(GameError::GameClosed)?,
                    player = self.barrier.lost() => return Err(GameError::SeatLost(player)),
                    () = close_requested(&mut self.closed) => return Err(GameError::GameClosed),
                };
                self.handle_message(message)?;
            }
            while !GameStateMachine::is_phase_complete(&self.state)
                && let Some((player, action)) = self.deferred.pop_front()
            {
                self.apply(player, action)?;
            }
            while !GameStateMachine::is_phase_complete(&self.state)
                && let Ok(message) = self.inbox.try_recv()
            {
                self.handle_message(message)?;
            }

            if !Arc::ptr_eq(&before, &self.state) {
                self.publish();
            }
        }
        Ok(())
    }

    fn handle_message(&mut self, message: GameMessage) -> Result<(), GameError> {
        let GameMessage::Action { player, action } = message;
        self.apply(player, action)
    }

    fn apply(&mut self, player: PlayerId, action: Action) -> Result<(), GameError> {
        match self.machine.apply(&self.state, player, action) {
            Ok(next) => {
                debug!("game {}: {player} {action}", self.id);
                self.state = Arc::new(next);
                Ok(())
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!("game {}: dropped {action} from {player}: {e}", self.id);
                Ok(())
            }
        }
    }

    fn publish(&mut self) {
        let view = PublishedState::from_state(&self.state);
        self.publish_view(view);
    }

    fn publish_view(&mut self, state: PublishedState) {
        self.seq += 1;
        self.barrier.arm(self.seq);
        debug!(
            "game {}: publishing {} as {}",
            self.id,
            state.phase_name(),
            self.seq
        );
        let publication = Publication {
            game_id: self.id,
            seq: self.seq,
            state,
            snapshot: Some(Arc::clone(&self.state)),
        };
        self.publisher.send_replace(Some(Arc::new(publication)));
    }
}

/// Resolves once any handle asked the game to close.
async fn close_requested(closed: &mut watch::Receiver<bool>) {
    let requested = closed.wait_for(|closed| *closed).await.is_ok();
    if !requested {
        // Every handle is gone, so nobody can ask anymore.
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn players() -> Vec<Player> {
        (1..=3).map(|i| Player::new(i, &format!("p{i}"))).collect()
    }

    fn settings() -> GameSettings {
        GameSettings {
            max_rounds: 1,
            first_dealer: Some(0),
            seed: Some(21),
        }
    }

    async fn next_publication(rx: &mut PublicationReceiver) -> Arc<Publication> {
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .expect("timed out waiting for publication")
            .unwrap();
        rx.borrow_and_update().clone().unwrap()
    }

    #[test]
    fn test_new_rejects_bad_settings() {
        let Err(err) = GameActor::new(settings(), players()[..2].to_vec()) else {
            panic!("two players should not make a game");
        };
        assert!(matches!(err, GameError::InvalidSettings(_)));
    }

    #[tokio::test]
    async fn test_first_publication_is_starting_and_gated() {
        let (actor, handle) = GameActor::new(settings(), players()).unwrap();
        let mut rx = handle.subscribe();
        assert!(handle.snapshot().is_none());
        let task = tokio::spawn(actor.run());

        let publication = next_publication(&mut rx).await;
        assert_eq!(publication.seq, 1);
        assert_eq!(publication.state.phase_name(), "STARTING");

        // Two of three acks don't clear the gate.
        handle.ack(PlayerId(1), Some(1)).unwrap();
        handle.ack(PlayerId(2), Some(1)).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(handle.snapshot().unwrap().seq, 1);

        handle.ack(PlayerId(3), Some(1)).unwrap();
        let publication = next_publication(&mut rx).await;
        assert_eq!(publication.seq, 2);
        assert_eq!(publication.state.phase_name(), "DEALING");

        handle.close().unwrap();
        let result = task.await.unwrap();
        assert_eq!(result, Err(GameError::GameClosed));
    }

    #[tokio::test]
    async fn test_close_with_full_inbox_during_gate() {
        let (actor, handle) = GameActor::new(settings(), players()).unwrap();
        let mut rx = handle.subscribe();
        let task = tokio::spawn(actor.run());
        next_publication(&mut rx).await;

        // STARTING is never acked, so the game sits on its gate
        for _ in 0..6 {
            let _ = handle.submit(PlayerIntent::new(PlayerId(1), Intent::Bid { bid: 1 }));
        }
        assert_eq!(
            handle.submit(PlayerIntent::new(PlayerId(1), Intent::Bid { bid: 1 })),
            Err(GameError::InboxFull)
        );

        handle.close().unwrap();
        let result = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("close should end the game")
            .unwrap();
        assert_eq!(result, Err(GameError::GameClosed));
        assert!(matches!(
            handle.snapshot().unwrap().state,
            PublishedState::Aborted { .. }
        ));
        assert_eq!(handle.close(), Err(GameError::GameClosed));
    }

    #[tokio::test]
    async fn test_gate_holds_one_action_per_seat() {
        let (actor, handle) = GameActor::new(settings(), players()).unwrap();
        let mut rx = handle.subscribe();
        let task = tokio::spawn(actor.run());
        let starting = next_publication(&mut rx).await;

        for _ in 0..6 {
            let _ = handle.submit(PlayerIntent::new(PlayerId(1), Intent::Bid { bid: 1 }));
        }
        // Let the game move the backlog off its inbox
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            handle.submit(PlayerIntent::new(PlayerId(2), Intent::Bid { bid: 0 })),
            Ok(())
        );

        for id in 1..=3 {
            handle.ack(PlayerId(id), Some(starting.seq)).unwrap();
        }
        let dealing = next_publication(&mut rx).await;
        assert_eq!(dealing.state.phase_name(), "DEALING");
        for id in 1..=3 {
            handle.ack(PlayerId(id), Some(dealing.seq)).unwrap();
        }

        let bidding = tokio::time::timeout(
            Duration::from_secs(1),
            rx.wait_for(|publication| {
                publication
                    .as_ref()
                    .is_some_and(|p| p.state.phase_name() == "BIDDING")
            }),
        )
        .await
        .expect("timed out waiting for bidding")
        .unwrap()
        .clone()
        .unwrap();
        let state = bidding.snapshot.as_ref().unwrap();
        assert_eq!(state.bids.len(), 2);
        assert_eq!(state.bids.get(&PlayerId(1)), Some(&1));
        assert_eq!(state.bids.get(&PlayerId(2)), Some(&0));

        handle.close().unwrap();
        assert_eq!(task.await.unwrap(), Err(GameError::GameClosed));
    }

    #[tokio::test]
    async fn test_unknown_player_ack_rejected() {
        let (_actor, handle) = GameActor::new(settings(), players()).unwrap();
        let intent = PlayerIntent::new(PlayerId(7), Intent::Ack { seq: None });
        assert_eq!(
            handle.submit(intent),
            Err(GameError::UnknownPlayer(PlayerId(7)))
        );
    }

    #[tokio::test]
    async fn test_seat_lost_aborts() {
        let (actor, handle) = GameActor::new(settings(), players()).unwrap();
        let mut rx = handle.subscribe();
        let task = tokio::spawn(actor.run());

        next_publication(&mut rx).await;
        handle.seat_lost(PlayerId(2));

        let result = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(result, Err(GameError::SeatLost(PlayerId(2))));

        let last = handle.snapshot().unwrap();
        assert!(matches!(last.state, PublishedState::Aborted { .. }));
        assert!(handle.is_finished());
        assert_eq!(
            handle.submit(PlayerIntent::new(PlayerId(1), Intent::Bid { bid: 0 })),
            Err(GameError::GameClosed)
        );
    }
}
