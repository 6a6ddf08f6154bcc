#![warn(clippy::all, missing_docs)]

//! Core game logic for World Navigation.
//!
//! The player flies a plane across a world map towards randomly drawn
//! cities. This crate owns everything except presentation: the city
//! catalog and its record store, arrival detection, the session state
//! machine, and the persisted player rankings.

pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod geo;
pub mod ranking;
pub mod session;
pub mod storage;

pub use catalog::{City, CityCatalog, CityStore, JsonCityStore, MemoryCityStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use crate::config::AppConfig;
pub use error::{GameError, Result};
pub use geo::{distance_meters, has_arrived, Coordinate};
pub use ranking::{Player, RankingStore};
pub use session::{
    ArrivalOutcome, GameSession, ProgressionController, SessionSnapshot, SessionState,
};
pub use storage::{BlobStore, FileBlobStore, MemoryBlobStore};
