//! Level configuration
//!
//! A plain record handed to `Engine::new`. File parsing, level selection and
//! round orchestration belong to the host.

use serde::{Deserialize, Serialize};

/// Parameters for one level's playing field
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Number of pieces generated at level start
    pub field_length: usize,
    /// Number of distinct piece types in play
    pub palette_size: u8,
    /// Probability that a generated piece repeats its right neighbor's type.
    /// Decays by 10% each time a fresh type is drawn.
    pub same_bias: f32,
    /// Multiplier on all segment drift speeds
    pub speed_bias: f32,
    /// Initial visual shift of the field's single segment
    pub start_offset: f32,
    /// Total addressable positions on the strip. Pieces drifting past the
    /// high end are lost; bullets enter from the high end and exit at zero.
    pub strip_length: usize,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            field_length: 60,
            palette_size: 5,
            same_bias: 0.55,
            speed_bias: 1.0,
            start_offset: 4.0,
            strip_length: 90,
        }
    }
}

impl LevelConfig {
    /// Visual position past which the field has overrun the strip
    pub fn consuming_boundary(&self) -> i64 {
        self.strip_length as i64
    }

    /// Position bullets spawn at (the emitting end)
    pub fn emitter_position(&self) -> f32 {
        self.strip_length as f32
    }
}
