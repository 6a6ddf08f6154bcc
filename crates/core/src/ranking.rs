//! Player statistics and the persisted leaderboard.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::{GameError, Result},
    storage::BlobStore,
};

/// Blob key holding the serialized player list.
pub const PLAYERS_KEY: &str = "WorldNavigationPlayers";

/// Cumulative statistics for one player name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Unique player name.
    pub name: String,
    /// Sum of the total times of every completed session.
    #[serde(with = "duration_secs")]
    pub total_time: Duration,
    /// Number of completed sessions.
    pub games_played: u32,
}

impl Player {
    /// Mean session time; zero when no games were played.
    pub fn average_time(&self) -> Duration {
        if self.games_played == 0 {
            Duration::ZERO
        } else {
            self.total_time / self.games_played
        }
    }
}

/// Player collection kept sorted by average time and mirrored to a [`BlobStore`].
pub struct RankingStore<S> {
    store: S,
    players: Vec<Player>,
}

impl<S: BlobStore> RankingStore<S> {
    /// Restore the collection from `store`. Missing or unreadable data yields an empty list.
    pub fn load(store: S) -> Self {
        let players = match store.read_blob(PLAYERS_KEY) {
            Ok(Some(bytes)) => match serde_json::from_slice::<Vec<Player>>(&bytes) {
                Ok(players) => players,
                Err(err) => {
                    warn!("Discarding unreadable rankings: {err}");
                    Vec::new()
                }
            },
            Ok(None) => {
                debug!("No stored rankings yet");
                Vec::new()
            }
            Err(err) => {
                warn!("Failed to read rankings: {err:#}");
                Vec::new()
            }
        };
        info!(players = players.len(), "Rankings loaded");
        Self { store, players }
    }

    /// Fold a finished session into the player's statistics, re-rank and persist.
    ///
    /// Returns the player's 1-based rank. A failed write is logged and the
    /// in-memory update is kept.
    pub fn record_session(&mut self, player_name: &str, total_time: Duration) -> usize {
        match self
            .players
            .iter_mut()
            .find(|player| player.name == player_name)
        {
            Some(player) => {
                // Stored values are untrusted; saturate rather than overflow.
                player.total_time = player.total_time.saturating_add(total_time);
                player.games_played = player.games_played.saturating_add(1);
            }
            None => self.players.push(Player {
                name: player_name.to_string(),
                total_time,
                games_played: 1,
            }),
        }

        // Stable, so equal averages keep their insertion order.
        self.players
            .sort_by(|a, b| a.average_time().cmp(&b.average_time()));

        if let Err(err) = self.save() {
            warn!(player = player_name, "Failed to persist rankings: {err}");
        }

        let rank = self.rank_of(player_name).unwrap_or(self.players.len());
        info!(
            player = player_name,
            total_secs = total_time.as_secs_f64(),
            rank,
            "Session recorded"
        );
        rank
    }

    /// Write the current collection to the backing store.
    pub fn save(&self) -> Result<()> {
        let bytes = serde_json::to_vec(&self.players).map_err(GameError::storage)?;
        self.store
            .write_blob(PLAYERS_KEY, &bytes)
            .map_err(GameError::storage)
    }

    /// Players ordered by ascending average time.
    pub fn rankings_sorted(&self) -> &[Player] {
        &self.players
    }

    /// 1-based leaderboard position of `name`.
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.players
            .iter()
            .position(|player| player.name == name)
            .map(|index| index + 1)
    }

    /// Statistics for `name`, if they finished at least one session.
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.name == name)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|_| de::Error::custom(format!("invalid duration {secs}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};

    use crate::storage::MemoryBlobStore;

    struct FailingStore;

    impl BlobStore for FailingStore {
        fn read_blob(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(anyhow!("disk on fire"))
        }

        fn write_blob(&self, _key: &str, _bytes: &[u8]) -> Result<()> {
            Err(anyhow!("disk on fire"))
        }
    }

    fn secs(value: u64) -> Duration {
        Duration::from_secs(value)
    }

    #[test]
    fn accumulates_existing_players() {
        let mut rankings = RankingStore::load(MemoryBlobStore::new());
        rankings.record_session("Alice", secs(100));
        rankings.record_session("Alice", secs(300));

        let alice = rankings.player("Alice").expect("alice");
        assert_eq!(alice.total_time, secs(400));
        assert_eq!(alice.games_played, 2);
        assert_eq!(alice.average_time(), secs(200));
        assert_eq!(rankings.rankings_sorted().len(), 1);
    }

    #[test]
    fn aggregate_does_not_depend_on_session_order() {
        let mut forward = RankingStore::load(MemoryBlobStore::new());
        forward.record_session("Bob", Duration::from_millis(1_234));
        forward.record_session("Bob", Duration::from_millis(98_765));

        let mut backward = RankingStore::load(MemoryBlobStore::new());
        backward.record_session("Bob", Duration::from_millis(98_765));
        backward.record_session("Bob", Duration::from_millis(1_234));

        assert_eq!(forward.player("Bob"), backward.player("Bob"));
    }

    #[test]
    fn rankings_are_sorted_by_average_with_stable_ties() {
        let mut rankings = RankingStore::load(MemoryBlobStore::new());
        assert_eq!(rankings.record_session("Slow", secs(900)), 1);
        assert_eq!(rankings.record_session("Fast", secs(300)), 1);
        assert_eq!(rankings.record_session("TieA", secs(600)), 2);
        assert_eq!(rankings.record_session("TieB", secs(600)), 3);

        let names: Vec<_> = rankings
            .rankings_sorted()
            .iter()
            .map(|player| player.name.as_str())
            .collect();
        assert_eq!(names, ["Fast", "TieA", "TieB", "Slow"]);
        assert!(rankings
            .rankings_sorted()
            .windows(2)
            .all(|pair| pair[0].average_time() <= pair[1].average_time()));
        assert_eq!(rankings.rank_of("Slow"), Some(4));
        assert_eq!(rankings.rank_of("Nobody"), None);
    }

    #[test]
    fn persists_and_reloads_in_ranked_order() -> Result<()> {
        let store = MemoryBlobStore::new();
        let mut rankings = RankingStore::load(store.clone());
        rankings.record_session("Carol", secs(500));
        rankings.record_session("Dave", Duration::from_millis(250_500));

        let raw: serde_json::Value =
            serde_json::from_slice(&store.read_blob(PLAYERS_KEY)?.expect("blob"))?;
        assert_eq!(raw[0]["name"], "Dave");
        assert_eq!(raw[0]["totalTime"], 250.5);
        assert_eq!(raw[0]["gamesPlayed"], 1);

        let reloaded = RankingStore::load(store);
        assert_eq!(reloaded.rankings_sorted(), rankings.rankings_sorted());
        Ok(())
    }

    #[test]
    fn corrupt_blob_loads_as_empty() -> Result<()> {
        let store = MemoryBlobStore::new();
        store.write_blob(PLAYERS_KEY, b"{\"oops\": true")?;
        assert!(RankingStore::load(store.clone()).rankings_sorted().is_empty());

        store.write_blob(PLAYERS_KEY, br#"[{"name":"E","totalTime":-5,"gamesPlayed":1}]"#)?;
        assert!(RankingStore::load(store).rankings_sorted().is_empty());
        Ok(())
    }

    #[test]
    fn storage_failures_keep_in_memory_state() {
        let mut rankings = RankingStore::load(FailingStore);
        assert!(rankings.rankings_sorted().is_empty());
        assert_eq!(rankings.record_session("Frank", secs(42)), 1);
        assert_eq!(rankings.player("Frank").map(|p| p.games_played), Some(1));
        assert!(rankings.save().is_err_and(|err| err.is_storage()));
    }

    #[test]
    fn extreme_stored_totals_saturate_instead_of_overflowing() -> Result<()> {
        let store = MemoryBlobStore::new();
        store.write_blob(
            PLAYERS_KEY,
            br#"[{"name":"A","totalTime":10,"gamesPlayed":4294967295}]"#,
        )?;

        let mut rankings = RankingStore::load(store);
        assert_eq!(rankings.record_session("A", secs(600)), 1);
        let a = rankings.player("A").expect("a");
        assert_eq!(a.games_played, u32::MAX);
        assert_eq!(a.total_time, secs(610));

        let mut rankings = RankingStore::load(MemoryBlobStore::new());
        rankings.record_session("B", Duration::MAX);
        rankings.record_session("B", secs(1));
        assert_eq!(rankings.player("B").map(|p| p.total_time), Some(Duration::MAX));
        Ok(())
    }

    #[test]
    fn average_of_unplayed_player_is_zero() {
        let player = Player {
            name: "Ghost".to_string(),
            total_time: secs(10),
            games_played: 0,
        };
        assert_eq!(player.average_time(), Duration::ZERO);
    }
}
