use std::time::Duration;

use rand::Rng;
use tracing::{debug, info, warn};

use crate::{
    catalog::{City, CityCatalog},
    clock::{Clock, SystemClock},
    error::{GameError, Result},
    geo::{self, Coordinate},
    ranking::{Player, RankingStore},
    storage::BlobStore,
};

use super::models::{
    elapsed, tier_for, ArrivalOutcome, GameSession, SessionSnapshot, SessionState,
    CITIES_PER_SESSION,
};

/// Drives a single game session from start to the final arrival and records the result.
pub struct ProgressionController<S, C = SystemClock> {
    rankings: RankingStore<S>,
    clock: C,
    session: GameSession,
    state: SessionState,
    player: Option<String>,
    last_leg_time: Duration,
    awaiting_next_city: bool,
}

impl<S: BlobStore> ProgressionController<S, SystemClock> {
    /// Controller using the wall clock.
    pub fn with_system_clock(rankings: RankingStore<S>) -> Self {
        Self::new(rankings, SystemClock)
    }
}

impl<S: BlobStore, C: Clock> ProgressionController<S, C> {
    pub fn new(rankings: RankingStore<S>, clock: C) -> Self {
        Self {
            rankings,
            clock,
            session: GameSession::default(),
            state: SessionState::Idle,
            player: None,
            last_leg_time: Duration::ZERO,
            awaiting_next_city: false,
        }
    }

    /// Begin a new session, abandoning any session in progress.
    pub fn start_game(&mut self, player_name: &str, first_city: Option<City>) -> Result<()> {
        let player_name = validate_player_name(player_name)?;
        let first_city = first_city.ok_or_else(|| {
            warn!(player = player_name, "No starting city available");
            GameError::validation("no city available to start the game")
        })?;

        if self.state == SessionState::InProgress {
            debug!(
                player = self.player.as_deref().unwrap_or_default(),
                visited = self.session.cities_visited,
                "Abandoning running session"
            );
        }

        info!(player = player_name, city = %first_city.display_name(), "Game started");
        self.session = GameSession::start(first_city, self.clock.now());
        self.state = SessionState::InProgress;
        self.player = Some(player_name.to_string());
        self.last_leg_time = Duration::ZERO;
        self.awaiting_next_city = false;
        Ok(())
    }

    /// Draw a tier-1 city from `catalog` and start the game with it.
    pub fn start_with_catalog<R: Rng + ?Sized>(
        &mut self,
        player_name: &str,
        catalog: &CityCatalog,
        rng: &mut R,
    ) -> Result<()> {
        validate_player_name(player_name)?;
        let first_city = catalog.random_city(tier_for(0), rng);
        self.start_game(player_name, first_city)
    }

    /// Close the current leg: book its time and finish the session after the last city.
    pub fn arrived_at_current_city(&mut self) -> Result<ArrivalOutcome> {
        if self.state != SessionState::InProgress {
            return Err(self.reject(format!(
                "arrival reported while {:?}",
                self.state
            )));
        }
        if self.awaiting_next_city {
            return Err(self.reject("arrival already recorded for the current city"));
        }
        let (Some(started), Some(city), Some(player)) = (
            self.session.current_city_start_time,
            self.session.current_city.clone(),
            self.player.clone(),
        ) else {
            return Err(self.reject("session has no current leg"));
        };

        let leg_time = elapsed(self.clock.now(), started);
        self.last_leg_time = leg_time;
        self.session.total_time += leg_time;
        self.session.cities_visited += 1;
        info!(
            player = %player,
            city = %city.name,
            visited = self.session.cities_visited,
            leg_secs = leg_time.as_secs_f64(),
            "City reached"
        );

        if self.session.cities_visited >= CITIES_PER_SESSION {
            self.session.is_active = false;
            self.state = SessionState::Completed;
            let total_time = self.session.total_time;
            let rank = self.rankings.record_session(&player, total_time);
            info!(
                player = %player,
                total_secs = total_time.as_secs_f64(),
                rank,
                "Session completed"
            );
            return Ok(ArrivalOutcome::Completed {
                city,
                leg_time,
                total_time,
                rank,
            });
        }

        self.awaiting_next_city = true;
        Ok(ArrivalOutcome::Leg {
            city,
            leg_time,
            cities_visited: self.session.cities_visited,
            next_tier: self.next_tier(),
        })
    }

    /// Set the next target after an arrival and restart the leg timer.
    pub fn advance_to_city(&mut self, next_city: City) -> Result<()> {
        if self.state != SessionState::InProgress || !self.awaiting_next_city {
            return Err(self.reject(format!(
                "cannot advance to {} while {:?} without a pending arrival",
                next_city.name, self.state
            )));
        }
        debug!(city = %next_city.display_name(), tier = self.next_tier(), "Next city");
        self.session.current_city = Some(next_city);
        self.session.current_city_start_time = Some(self.clock.now());
        self.awaiting_next_city = false;
        Ok(())
    }

    /// Draw the next target for the current tier and advance to it.
    pub fn continue_to_next_city<R: Rng + ?Sized>(
        &mut self,
        catalog: &CityCatalog,
        rng: &mut R,
    ) -> Result<City> {
        if self.state != SessionState::InProgress || !self.awaiting_next_city {
            return Err(self.reject("no arrival to continue from"));
        }
        let tier = self.next_tier();
        let next_city = catalog.random_city(tier, rng).ok_or_else(|| {
            warn!(tier, "No city available for tier");
            GameError::validation(format!("no city available for tier {tier}"))
        })?;
        self.advance_to_city(next_city.clone())?;
        Ok(next_city)
    }

    /// Feed a plane position; performs the arrival when it is within range of the target.
    pub fn update_position(&mut self, position: Coordinate) -> Option<ArrivalOutcome> {
        if self.state != SessionState::InProgress || self.awaiting_next_city {
            return None;
        }
        let target = self.session.current_city.as_ref()?.coordinate;
        if !geo::has_arrived(position, target) {
            return None;
        }
        self.arrived_at_current_city().ok()
    }

    /// Tier used for the next city draw.
    pub fn next_tier(&self) -> u32 {
        self.session.tier()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn player(&self) -> Option<&str> {
        self.player.as_deref()
    }

    pub fn last_leg_time(&self) -> Duration {
        self.last_leg_time
    }

    pub fn is_awaiting_next_city(&self) -> bool {
        self.awaiting_next_city
    }

    pub fn rankings(&self) -> &RankingStore<S> {
        &self.rankings
    }

    pub fn rankings_sorted(&self) -> &[Player] {
        self.rankings.rankings_sorted()
    }

    /// Snapshot of the session as of the controller's clock.
    pub fn snapshot(&self) -> SessionSnapshot {
        let leg_elapsed = match (self.state, self.session.current_city_start_time) {
            (SessionState::InProgress, Some(started)) if !self.awaiting_next_city => {
                elapsed(self.clock.now(), started)
            }
            (SessionState::Idle, _) => Duration::ZERO,
            _ => self.last_leg_time,
        };
        SessionSnapshot {
            state: self.state,
            player: self.player.clone(),
            target: self.session.current_city.clone(),
            cities_visited: self.session.cities_visited,
            tier: self.next_tier(),
            leg_elapsed,
            total_time: self.session.total_time,
            last_leg_time: self.last_leg_time,
            awaiting_next_city: self.awaiting_next_city,
        }
    }

    fn reject(&self, message: impl Into<String>) -> GameError {
        let err = GameError::state(message);
        warn!("Ignoring transition: {err}");
        err
    }
}

fn validate_player_name(player_name: &str) -> Result<&str> {
    let trimmed = player_name.trim();
    if trimmed.is_empty() {
        warn!("Rejected empty player name");
        return Err(GameError::validation("player name must not be empty"));
    }
    Ok(trimmed)
}
