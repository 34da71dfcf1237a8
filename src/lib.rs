//! Jewel Strip - a 1-D match-three simulation core
//!
//! The playing surface is a linear strip of colored pieces, dynamically
//! partitioned into *segments*: contiguous runs that share one kinematic
//! state (drifting at a speed, or counting down a collapse). Segments split
//! when a match forms inside one, merge when neighbors drift back together,
//! and collapse away after a match - all while bullets fired across the
//! strip must be intercepted by whichever segment currently owns their
//! position.
//!
//! Core modules:
//! - `sim`: Deterministic simulation (field, segments, bullets, players)
//! - `config`: Level configuration record
//!
//! Rendering, audio and input polling are external collaborators; this
//! crate never touches a device.

pub mod config;
pub mod sim;

pub use config::LevelConfig;
pub use sim::{Engine, TickInput};

/// Simulation tuning constants
pub mod consts {
    /// Minimum run length that triggers a match
    pub const MATCH_RUN: usize = 3;

    /// Hard cap on piece storage; inserts past this overwrite the furthest slot
    pub const FIELD_CAPACITY: usize = 256;
    /// Hard cap on live bullets; fires past this are dropped
    pub const MAX_BULLETS: usize = 32;

    /// Forward drift of a lone segment (slots per second)
    pub const NORMAL_FORWARD_SPEED: f32 = 0.9;
    /// Forward drift behind a non-matching neighbor
    pub const SLOW_FORWARD_SPEED: f32 = 0.25;
    /// Backward drift toward a matching neighbor (closes the gap for a merge)
    pub const RETROGRADE_SPEED: f32 = -1.8;
    /// Maximum segment acceleration (slots per second squared)
    pub const MAX_ACCEL: f32 = 4.0;

    /// Seconds for a collapsing segment to shrink away
    pub const COLLAPSE_TIME: f32 = 2.0;

    /// Bullet travel speed (negative: inbound from the emitting end)
    pub const BULLET_SPEED: f32 = -24.0;
    /// Seconds between fires
    pub const FIRE_COOLDOWN: f64 = 0.35;
    /// Seconds between player steps
    pub const MOVE_COOLDOWN: f64 = 0.08;
    /// Seconds between catch attempts
    pub const CATCH_COOLDOWN: f64 = 0.25;
    /// Seconds between swaps
    pub const SWAP_COOLDOWN: f64 = 0.3;
    /// Seconds before a no-match swap reverts
    pub const UNSWAP_DELAY: f64 = 1.5;
    /// Catch reach around the player's position (slots)
    pub const CATCH_RADIUS: f32 = 1.5;
}

/// Fractional part of a shift value, in [0, 1)
#[inline]
pub fn frac(x: f32) -> f32 {
    x - x.floor()
}
