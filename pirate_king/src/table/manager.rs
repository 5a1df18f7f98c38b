//! Game manager for spawning and tracking game actors.

use log::{info, warn};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::{
    actor::{GameActor, GameHandle},
    messages::{GameId, GameSummary},
};
use crate::game::{GameError, GameSettings, entities::Player};

/// Registry of running games. Games remove themselves when their task ends.
#[derive(Clone)]
pub struct GameManager {
    /// Settings every new game starts from
    settings: GameSettings,

    /// Active game handles
    games: Arc<RwLock<HashMap<GameId, GameHandle>>>,
}

impl GameManager {
    pub fn new(settings: GameSettings) -> Self {
        Self {
            settings,
            games: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    /// Seat `players` in a new game and start it
    ///
    /// # Arguments
    ///
    /// * `players` - Seated players, in seating order
    ///
    /// # Returns
    ///
    /// * `Result<GameHandle, GameError>` - Handle to the running game
    pub async fn create_game(&self, players: Vec<Player>) -> Result<GameHandle, GameError> {
        let (actor, handle) = GameActor::new(self.settings.clone(), players)?;
        let id = handle.id();

        self.games.write().await.insert(id, handle.clone());

        let games = Arc::clone(&self.games);
        tokio::spawn(async move {
            match actor.run().await {
                Ok(scores) => info!("game {id} finished with {scores:?}"),
                Err(e) => warn!("game {id} ended early: {e}"),
            }
            games.write().await.remove(&id);
        });

        info!("created game {id}");
        Ok(handle)
    }

    pub async fn get_game(&self, id: GameId) -> Option<GameHandle> {
        self.games.read().await.get(&id).cloned()
    }

    pub async fn list_games(&self) -> Vec<GameSummary> {
        let games = self.games.read().await;
        games
            .values()
            .map(|handle| {
                let snapshot = handle.snapshot();
                GameSummary {
                    game_id: handle.id(),
                    players: handle.players().iter().map(|p| p.username.clone()).collect(),
                    phase: snapshot
                        .as_ref()
                        .map(|publication| publication.state.phase_name().to_string()),
                    round: snapshot
                        .as_ref()
                        .and_then(|publication| publication.snapshot.as_ref())
                        .map(|state| state.round),
                }
            })
            .collect()
    }

    pub async fn active_game_count(&self) -> usize {
        self.games.read().await.len()
    }

    /// Ask every running game to stop.
    pub async fn close_all(&self) {
        let handles: Vec<GameHandle> = self.games.read().await.values().cloned().collect();
        for handle in handles {
            if handle.close().is_err() {
                warn!("game {} already closed", handle.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn players(n: u32) -> Vec<Player> {
        (1..=n).map(|i| Player::new(i, &format!("p{i}"))).collect()
    }

    fn manager() -> GameManager {
        GameManager::new(GameSettings {
            max_rounds: 2,
            first_dealer: Some(0),
            seed: Some(4),
        })
    }

    #[tokio::test]
    async fn test_create_and_get_game() {
        let manager = manager();
        let handle = manager.create_game(players(3)).await.unwrap();

        assert_eq!(manager.active_game_count().await, 1);
        let found = manager.get_game(handle.id()).await.unwrap();
        assert_eq!(found.players().len(), 3);
    }

    #[tokio::test]
    async fn test_create_game_rejects_small_table() {
        let manager = manager();
        let err = manager.create_game(players(2)).await.unwrap_err();
        assert!(matches!(err, GameError::InvalidSettings(_)));
        assert_eq!(manager.active_game_count().await, 0);
    }

    #[tokio::test]
    async fn test_list_games() {
        let manager = manager();
        let handle = manager.create_game(players(4)).await.unwrap();
        let mut rx = handle.subscribe();
        tokio::time::timeout(Duration::from_secs(1), rx.changed())
            .await
            .unwrap()
            .unwrap();

        let games = manager.list_games().await;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].game_id, handle.id());
        assert_eq!(games[0].players.len(), 4);
        assert_eq!(games[0].phase.as_deref(), Some("STARTING"));
        assert_eq!(games[0].round, Some(1));
    }

    #[tokio::test]
    async fn test_closed_game_is_removed() {
        let manager = manager();
        let handle = manager.create_game(players(3)).await.unwrap();
        manager.close_all().await;

        tokio::time::timeout(Duration::from_secs(1), async {
            while manager.active_game_count().await > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
        assert!(manager.get_game(handle.id()).await.is_none());
    }
}
