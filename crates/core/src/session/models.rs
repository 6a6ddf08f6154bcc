use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::catalog::City;

/// Number of cities that make up one complete session.
pub const CITIES_PER_SESSION: u32 = 20;

/// Highest difficulty tier.
pub const MAX_TIER: u32 = 10;

/// Lifecycle of the controller's session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    InProgress,
    Completed,
}

/// Mutable record of the game being played.
///
/// While `is_active` is set, `current_city` and `current_city_start_time` are too.
#[derive(Debug, Clone, Default)]
pub struct GameSession {
    pub current_city: Option<City>,
    pub cities_visited: u32,
    pub session_start_time: Option<DateTime<Utc>>,
    pub current_city_start_time: Option<DateTime<Utc>>,
    pub total_time: Duration,
    pub is_active: bool,
}

impl GameSession {
    pub fn start(first_city: City, now: DateTime<Utc>) -> Self {
        Self {
            current_city: Some(first_city),
            cities_visited: 0,
            session_start_time: Some(now),
            current_city_start_time: Some(now),
            total_time: Duration::ZERO,
            is_active: true,
        }
    }

    /// Difficulty tier for the next target: rises every two cities, capped at [`MAX_TIER`].
    pub fn tier(&self) -> u32 {
        tier_for(self.cities_visited)
    }
}

/// Tier reached after `cities_visited` arrivals.
pub fn tier_for(cities_visited: u32) -> u32 {
    (cities_visited / 2 + 1).min(MAX_TIER)
}

/// Time from `start` to `now`, clamped at zero.
pub fn elapsed(now: DateTime<Utc>, start: DateTime<Utc>) -> Duration {
    (now - start).to_std().unwrap_or(Duration::ZERO)
}

/// Caller-visible result of an arrival.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrivalOutcome {
    /// A leg finished; the caller should continue to the next city.
    Leg {
        city: City,
        leg_time: Duration,
        cities_visited: u32,
        next_tier: u32,
    },
    /// The last leg finished and the session was recorded.
    Completed {
        city: City,
        leg_time: Duration,
        total_time: Duration,
        rank: usize,
    },
}

impl ArrivalOutcome {
    pub fn city(&self) -> &City {
        match self {
            Self::Leg { city, .. } | Self::Completed { city, .. } => city,
        }
    }

    pub fn leg_time(&self) -> Duration {
        match self {
            Self::Leg { leg_time, .. } | Self::Completed { leg_time, .. } => *leg_time,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Read-only view of the session for presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub player: Option<String>,
    pub target: Option<City>,
    pub cities_visited: u32,
    pub tier: u32,
    /// Time spent on the current leg; frozen once the session stops.
    pub leg_elapsed: Duration,
    pub total_time: Duration,
    pub last_leg_time: Duration,
    pub awaiting_next_city: bool,
}
