//! SRS Module
//!
//! WaniKani's spaced repetition ladder as a finite state machine:
//! - Ordered stages with clamped advancement
//! - Category grouping for display
//! - Apprentice intervals (accelerated for the first two levels)
//! - Review slot and Guru date projection for assignments
//!
//! Everything here is a pure function of its inputs.

mod assignment;
mod stage;

pub use assignment::{Assignment, GURU_IN_PAST};
pub use stage::{is_accelerated_level, SrsStage, SrsStageCategory, ACCELERATED_LEVEL_MAX};
