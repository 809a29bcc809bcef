//! Service layer for the duel arena
//!
//! This module contains the request-facing coordination of matchmaking,
//! vote recording and ranking queries.

pub mod arena;

pub use arena::ArenaService;
