//! Player roster, roles and the command surface
//!
//! Players are thin: a strip position and two cooldown clocks. All actual
//! game effects are delegated to the field and bullet systems; the methods
//! here gate on role and cooldown and translate the player's visual position
//! into segment coordinates.

use serde::{Deserialize, Serialize};

use crate::consts::*;

use super::bullets::{CatchOutcome, FireOutcome};
use super::field::SwapOutcome;
use super::tick::Engine;

/// What a player is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Fires bullets from the emitting end; cannot move
    Pitcher,
    /// Roams the strip catching bullets into the field
    Catcher,
    /// Roams the strip swapping adjacent pieces
    Swapper,
}

/// Result of a move attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// The role cannot move (Pitcher is fixed at the emitter)
    Ignored,
    OnCooldown,
}

/// One discrete player action for a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Step one slot; sign is direction
    Move(i8),
    Fire,
    CycleJewel,
    Catch,
    /// Swap the piece under the player with a neighbor; sign picks the side
    Swap(i8),
}

/// A player action paired with the roster index issuing it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerCommand {
    pub player: usize,
    pub action: ActionKind,
}

/// One participant
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Player {
    /// Continuous strip position
    pub position: f32,
    pub role: Role,
    /// Earliest time the next move is accepted
    pub move_ready: f64,
    /// Earliest time the next role action is accepted
    pub action_ready: f64,
}

impl Player {
    pub fn new(role: Role, position: f32) -> Self {
        Self {
            position,
            role,
            move_ready: f64::NEG_INFINITY,
            action_ready: f64::NEG_INFINITY,
        }
    }

    /// Return to a round-start position with cooldowns cleared
    pub fn reset_round(&mut self, position: f32) {
        self.position = position;
        self.move_ready = f64::NEG_INFINITY;
        self.action_ready = f64::NEG_INFINITY;
    }
}

impl Engine {
    /// Step a player one slot along the strip, clamped to its bounds.
    pub fn move_player(&mut self, player: usize, dir: i8) -> MoveOutcome {
        let max_pos = (self.config.strip_length - 1) as f32;
        let p = &mut self.players[player];
        if p.role == Role::Pitcher {
            return MoveOutcome::Ignored;
        }
        if self.now < p.move_ready {
            return MoveOutcome::OnCooldown;
        }
        p.position = (p.position + dir.signum() as f32).clamp(0.0, max_pos);
        p.move_ready = self.now + MOVE_COOLDOWN;
        MoveOutcome::Moved
    }

    /// Fire a bullet of the emitter's current type. Pitcher only.
    pub fn fire(&mut self, player: usize) -> FireOutcome {
        assert_eq!(self.players[player].role, Role::Pitcher, "fire needs a Pitcher");
        self.bullets.fire(self.now, self.config.emitter_position())
    }

    /// Advance the shared emitter to the next palette type. Pitcher only.
    pub fn cycle_jewel(&mut self, player: usize) {
        assert_eq!(self.players[player].role, Role::Pitcher, "cycle needs a Pitcher");
        self.bullets.emitter.cycle(self.config.palette_size);
    }

    /// Catch the nearest bullet within reach of the player. Catcher only.
    /// The cooldown is spent on every attempt, hit or miss.
    pub fn catch(&mut self, player: usize) -> CatchOutcome {
        let p = &mut self.players[player];
        assert_eq!(p.role, Role::Catcher, "catch needs a Catcher");
        if self.now < p.action_ready {
            return CatchOutcome::Missed;
        }
        p.action_ready = self.now + CATCH_COOLDOWN;
        let position = p.position;
        self.bullets.catch(position, CATCH_RADIUS, &mut self.field)
    }

    /// Swap the piece under the player with the neighbor on `dir`'s side and
    /// evaluate matches. Swapper only.
    pub fn swap(&mut self, player: usize, dir: i8) -> SwapOutcome {
        assert_eq!(
            self.players[player].role,
            Role::Swapper,
            "swap needs a Swapper"
        );
        if self.now < self.players[player].action_ready {
            return SwapOutcome::OnCooldown;
        }

        let slot = self.players[player].position.round() as i64;
        let Some((segment, visual)) = self.field.segment_at_visual(slot) else {
            return SwapOutcome::OutOfReach;
        };
        let storage = self.field.storage_offset(segment, visual);
        let length = self.field.segments[segment].length;

        // Pick the pair so `left_offset` names its left piece.
        let left_offset = if dir < 0 {
            let Some(off) = storage.checked_sub(1) else {
                return SwapOutcome::OutOfReach;
            };
            off
        } else {
            storage
        };
        if left_offset + 1 >= length {
            return SwapOutcome::OutOfReach;
        }

        let outcome = self.field.swap_and_evaluate(segment, left_offset, self.now);
        // Any reachable pair spends the cooldown, including a same-type
        // no-op, so spamming invisible swaps is not free.
        if !matches!(outcome, SwapOutcome::OutOfReach) {
            self.players[player].action_ready = self.now + SWAP_COOLDOWN;
            self.apply_remaps();
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LevelConfig;

    fn engine_with(role: Role, position: f32) -> (Engine, usize) {
        let mut engine = Engine::new(LevelConfig::default(), 11);
        let idx = engine.add_player(role, position);
        (engine, idx)
    }

    #[test]
    fn test_pitcher_cannot_move() {
        let (mut engine, p) = engine_with(Role::Pitcher, 90.0);
        assert_eq!(engine.move_player(p, -1), MoveOutcome::Ignored);
        assert_eq!(engine.players[p].position, 90.0);
    }

    #[test]
    fn test_move_cooldown_and_clamp() {
        let (mut engine, p) = engine_with(Role::Catcher, 1.0);
        assert_eq!(engine.move_player(p, -1), MoveOutcome::Moved);
        assert_eq!(engine.players[p].position, 0.0);
        assert_eq!(engine.move_player(p, -1), MoveOutcome::OnCooldown);

        engine.now += MOVE_COOLDOWN + 0.01;
        // Already at the left edge: accepted but clamped in place
        assert_eq!(engine.move_player(p, -1), MoveOutcome::Moved);
        assert_eq!(engine.players[p].position, 0.0);
    }

    #[test]
    fn test_fire_and_cycle() {
        let (mut engine, p) = engine_with(Role::Pitcher, 90.0);
        engine.cycle_jewel(p);
        assert_eq!(engine.bullets.emitter.current_jewel_type, 1);
        let outcome = engine.fire(p);
        assert!(matches!(outcome, FireOutcome::Fired(_)));
        assert_eq!(engine.bullets.bullets[0].jewel_type, 1);
        assert_eq!(
            engine.bullets.bullets[0].position,
            engine.config.emitter_position()
        );
    }

    #[test]
    fn test_cycle_wraps_palette() {
        let (mut engine, p) = engine_with(Role::Pitcher, 90.0);
        let palette = engine.config.palette_size;
        for _ in 0..palette {
            engine.cycle_jewel(p);
        }
        assert_eq!(engine.bullets.emitter.current_jewel_type, 0);
    }

    #[test]
    fn test_catch_cooldown_spent_on_miss() {
        let (mut engine, p) = engine_with(Role::Catcher, 50.0);
        assert_eq!(engine.catch(p), CatchOutcome::Missed);
        // Second attempt inside the cooldown window is also a miss even if a
        // bullet were in reach
        assert_eq!(engine.catch(p), CatchOutcome::Missed);
        assert!(engine.players[p].action_ready > engine.now);
    }

    #[test]
    fn test_swap_out_of_reach_far_from_field() {
        let (mut engine, p) = engine_with(Role::Swapper, 80.0);
        assert_eq!(engine.swap(p, 1), SwapOutcome::OutOfReach);
        // A reach failure does not spend the cooldown
        assert!(engine.players[p].action_ready < engine.now + SWAP_COOLDOWN);
    }

    #[test]
    fn test_swap_over_field_schedules_revert_and_cools_down() {
        let mut engine = Engine::new(LevelConfig::default(), 11);
        let p = engine.add_player(Role::Swapper, 0.0);
        engine.field = crate::sim::JewelField::from_types(&[0, 1, 2, 3, 0, 1], 10.0);
        engine.players[p].position = 12.0;

        let outcome = engine.swap(p, 1);
        assert!(matches!(
            outcome,
            SwapOutcome::Matched | SwapOutcome::RevertScheduled
        ));
        assert_eq!(engine.swap(p, 1), SwapOutcome::OnCooldown);
    }

    #[test]
    fn test_same_type_swap_spends_cooldown() {
        let mut engine = Engine::new(LevelConfig::default(), 11);
        let p = engine.add_player(Role::Swapper, 0.0);
        engine.field = crate::sim::JewelField::from_types(&[0, 1, 1, 3, 0, 2], 10.0);
        engine.players[p].position = 11.0;

        assert_eq!(engine.swap(p, 1), SwapOutcome::Unchanged);
        assert_eq!(engine.swap(p, 1), SwapOutcome::OnCooldown);
    }

    #[test]
    fn test_swap_left_edge_needs_left_neighbor() {
        let mut engine = Engine::new(LevelConfig::default(), 11);
        let p = engine.add_player(Role::Swapper, 0.0);
        engine.field = crate::sim::JewelField::from_types(&[0, 1, 2, 3], 10.0);
        engine.players[p].position = 10.0;
        // Leftmost piece has no left neighbor
        assert_eq!(engine.swap(p, -1), SwapOutcome::OutOfReach);
    }
}
