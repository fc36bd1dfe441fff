//! Narrative Translation: turns game-state variables into narrative context.
//!
//! Maps a snapshot of ordinal scales, facts, boundaries and unlocked lessons
//! onto fixed, hand-authored sentences, and composes them in a stable order
//! for a downstream text generator. All prose lives in RON registry data;
//! the engine only validates and resolves.

pub mod core;
pub mod schema;
