//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed per-tick mutation order (unswaps, collapse, speeds, merges,
//!   bullets, player actions)
//! - Seeded RNG only (sole consumer: field generation)
//! - One logical thread of control; nothing here blocks or suspends
//! - No rendering or platform dependencies

pub mod bullets;
pub mod field;
pub mod kinematics;
pub mod matching;
pub mod players;
pub mod tick;

pub use bullets::{BulletSystem, CatchOutcome, Emitter, FireOutcome, SegmentRef};
pub use field::{JewelField, Piece, Segment, SegmentKind, SegmentRemap, SwapOutcome};
pub use players::{ActionKind, MoveOutcome, Player, PlayerCommand, Role};
pub use tick::{Engine, TickInput};
