#![allow(missing_docs)]

//! Game session state and the progression state machine.

mod controller;
mod models;

pub use controller::ProgressionController;
pub use models::{
    elapsed, tier_for, ArrivalOutcome, GameSession, SessionSnapshot, SessionState,
    CITIES_PER_SESSION, MAX_TIER,
};
