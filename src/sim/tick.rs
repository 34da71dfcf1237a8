//! Engine state and the per-tick update
//!
//! One `tick` call advances the whole simulation by `dt`. The mutation order
//! is fixed and load-bearing: due swap reverts run before collapse deletion,
//! deletions invalidate every index computed earlier so the tick ends there,
//! kinematics run before merges, and player commands apply last against the
//! settled table. Same seed plus same input stream replays bit-identically.

use serde::{Deserialize, Serialize};

use crate::config::LevelConfig;

use super::bullets::BulletSystem;
use super::field::JewelField;
use super::kinematics;
use super::players::{ActionKind, Player, PlayerCommand, Role};

/// All player commands for one tick, applied in order after physics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickInput {
    pub commands: Vec<PlayerCommand>,
}

/// Complete simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    pub config: LevelConfig,
    pub seed: u64,
    pub field: JewelField,
    pub bullets: BulletSystem,
    pub players: Vec<Player>,
    /// Simulation clock in seconds, advanced only by `tick`
    pub now: f64,
    pub time_ticks: u64,
}

impl Engine {
    pub fn new(config: LevelConfig, seed: u64) -> Self {
        let field = JewelField::generate(&config, seed);
        log::info!("engine start: seed {seed}, strip {}", config.strip_length);
        Self {
            config,
            seed,
            field,
            bullets: BulletSystem::new(),
            players: Vec::new(),
            now: 0.0,
            time_ticks: 0,
        }
    }

    /// Add a participant, returning its roster index
    pub fn add_player(&mut self, role: Role, position: f32) -> usize {
        let position = if role == Role::Pitcher {
            self.config.emitter_position()
        } else {
            position
        };
        self.players.push(Player::new(role, position));
        self.players.len() - 1
    }

    /// Regenerate the field from a fresh seed and clear transient state.
    /// Players keep their positions; the clock keeps running.
    pub fn reset_round(&mut self, seed: u64) {
        self.seed = seed;
        self.field = JewelField::generate(&self.config, seed);
        self.bullets = BulletSystem::new();
        for player in &mut self.players {
            let position = if player.role == Role::Pitcher {
                self.config.emitter_position()
            } else {
                player.position
            };
            player.reset_round(position);
        }
        log::info!("round reset: seed {seed}");
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, input: &TickInput, dt: f32) {
        self.time_ticks += 1;
        self.now += dt as f64;

        self.field.drain_unswaps(self.now);

        if self.field.advance_collapse(dt) {
            // Deletions moved storage under every index computed before this
            // point; the rest of the tick waits for the next call.
            self.apply_remaps();
            return;
        }

        kinematics::update_speeds(&mut self.field, dt, self.config.speed_bias);
        kinematics::merge_pass(&mut self.field);
        self.apply_remaps();

        self.bullets
            .tick(dt, &mut self.field, self.config.strip_length as f32);
        self.bullets.assign_segment_info(&mut self.field);

        for command in &input.commands {
            self.apply_command(command);
        }
    }

    /// Round won: every piece has collapsed away
    pub fn cleared(&self) -> bool {
        self.field.is_empty()
    }

    /// Round lost: a Moving segment's hole has reached the consuming end
    pub fn overrun(&self) -> bool {
        let boundary = self.config.consuming_boundary();
        self.field.segments.iter().any(|seg| {
            seg.is_moving()
                && seg.length > 0
                && seg.visual_start() + seg.hole_offset() as i64 >= boundary
        })
    }

    /// Replay pending table edits against bullet bookkeeping
    pub fn apply_remaps(&mut self) {
        for remap in self.field.drain_remaps() {
            self.bullets.apply_remap(&remap);
        }
    }

    fn apply_command(&mut self, command: &PlayerCommand) {
        if command.player >= self.players.len() {
            log::warn!("command for unknown player {}", command.player);
            return;
        }
        let role = self.players[command.player].role;
        match (command.action, role) {
            (ActionKind::Move(dir), _) => {
                self.move_player(command.player, dir);
            }
            (ActionKind::Fire, Role::Pitcher) => {
                self.fire(command.player);
            }
            (ActionKind::CycleJewel, Role::Pitcher) => self.cycle_jewel(command.player),
            (ActionKind::Catch, Role::Catcher) => {
                self.catch(command.player);
            }
            (ActionKind::Swap(dir), Role::Swapper) => {
                self.swap(command.player, dir);
            }
            (action, role) => log::debug!("{action:?} ignored for {role:?}"),
        }
    }
}
