//! Transient projectiles and the shared emitter
//!
//! Bullets fly inbound from the emitting end across the drifting field. A
//! bullet's `segment_info` is transient bookkeeping: cleared at the end of
//! every tick and re-derived from the rendered layout before the next one
//! (the renderer may overwrite it via `set_segment_info`, since overlap
//! depends on visual rounding, not raw shift alone). Table edits are replayed
//! here as remap events so a registered bullet stays pointed at whichever
//! segment currently owns its position.

use serde::{Deserialize, Serialize};

use crate::consts::*;

use super::field::{JewelField, SegmentKind, SegmentRemap};

/// Explicit segment/offset pair registering a bullet against a segment.
/// Offset is a visual slot within the segment's L+1-slot arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentRef {
    pub segment: usize,
    pub offset: usize,
}

/// A live projectile
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub jewel_type: u8,
    /// Continuous strip position
    pub position: f32,
    /// Signed travel speed; negative while inbound
    pub speed: f32,
    /// Which segment currently owns this bullet's position, if any
    pub segment_info: Option<SegmentRef>,
    /// Cleared on catch; the corpse is swept next tick so a second catch at
    /// the same spot reports AlreadyCaught instead of silently missing
    pub alive: bool,
}

/// Result of a fire attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Fired(u32),
    /// Cooldown has not elapsed; silent no-op
    OnCooldown,
    /// Bullet table full; the new bullet is dropped
    Dropped,
}

/// Result of a catch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchOutcome {
    /// No bullet within reach
    Missed,
    /// Nearest bullet was already consumed this tick
    AlreadyCaught,
    /// Bullet found but not registered against any segment
    NoSegment,
    /// Payload inserted into the field
    Caught { jewel_type: u8 },
}

/// Shared bullet source; its type is cycled by Pitcher input
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Emitter {
    pub current_jewel_type: u8,
    pub last_fire_time: f64,
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            current_jewel_type: 0,
            last_fire_time: f64::NEG_INFINITY,
        }
    }

    /// Advance to the next type in the palette
    pub fn cycle(&mut self, palette_size: u8) {
        self.current_jewel_type = (self.current_jewel_type + 1) % palette_size.max(1);
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Unordered list of live bullets plus the emitter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BulletSystem {
    pub bullets: Vec<Bullet>,
    pub emitter: Emitter,
    next_id: u32,
}

impl BulletSystem {
    pub fn new() -> Self {
        Self {
            bullets: Vec::with_capacity(MAX_BULLETS),
            emitter: Emitter::new(),
            next_id: 1,
        }
    }

    /// Fire a bullet of the emitter's current type from the emitting end.
    /// Cooldown-gated; at capacity the bullet is dropped rather than grown.
    pub fn fire(&mut self, now: f64, origin: f32) -> FireOutcome {
        if now - self.emitter.last_fire_time < FIRE_COOLDOWN {
            return FireOutcome::OnCooldown;
        }
        if self.bullets.len() >= MAX_BULLETS {
            return FireOutcome::Dropped;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.bullets.push(Bullet {
            id,
            jewel_type: self.emitter.current_jewel_type,
            position: origin,
            speed: BULLET_SPEED,
            segment_info: None,
            alive: true,
        });
        self.emitter.last_fire_time = now;
        log::trace!("fired bullet {id} type {}", self.emitter.current_jewel_type);
        FireOutcome::Fired(id)
    }

    /// Advance bullets and delete the expired. A bullet exiting the leftmost
    /// boundary while still registered nudges its segment's shift by a whole
    /// slot first (its drift through the segment becomes permanent). All
    /// surviving bullets end the tick unregistered.
    pub fn tick(&mut self, dt: f32, field: &mut JewelField, strip_end: f32) {
        for bullet in &mut self.bullets {
            if !bullet.alive {
                continue;
            }
            bullet.position += bullet.speed * dt;
            if bullet.position < 0.0 {
                if let Some(info) = bullet.segment_info.take() {
                    field.add_shift(info.segment, 1.0);
                }
                bullet.alive = false;
            } else if bullet.position > strip_end + 1.0 {
                bullet.alive = false;
            }
        }
        self.bullets.retain(|b| b.alive);
        for bullet in &mut self.bullets {
            bullet.segment_info = None;
        }
    }

    /// Default overlap pass: register each bullet against the Moving segment
    /// whose visual span covers its rounded position, and ratchet segment
    /// discombobulation up to the per-segment bullet count. A renderer doing
    /// its own collision resolution overwrites this via `set_segment_info`.
    pub fn assign_segment_info(&mut self, field: &mut JewelField) {
        let mut counts = vec![0i32; field.segments.len()];
        for bullet in &mut self.bullets {
            let slot = bullet.position.round() as i64;
            bullet.segment_info = field
                .segment_at_visual(slot)
                .map(|(segment, offset)| SegmentRef { segment, offset });
            if let Some(info) = bullet.segment_info {
                counts[info.segment] += 1;
            }
        }
        for (seg, count) in field.segments.iter_mut().zip(counts) {
            if let SegmentKind::Moving {
                discombobulation, ..
            } = &mut seg.kind
            {
                *discombobulation = (*discombobulation).max(count);
            }
        }
    }

    /// Renderer write-back: overlap depends on rendered layout, so the
    /// external collision pass may re-point a bullet between ticks.
    pub fn set_segment_info(&mut self, bullet_id: u32, info: Option<SegmentRef>) {
        if let Some(bullet) = self.bullets.iter_mut().find(|b| b.id == bullet_id) {
            bullet.segment_info = info;
        }
    }

    /// Catch the nearest bullet within `radius` of `position`, inserting its
    /// payload at the registered segment/offset.
    pub fn catch(&mut self, position: f32, radius: f32, field: &mut JewelField) -> CatchOutcome {
        let mut nearest: Option<usize> = None;
        for (i, bullet) in self.bullets.iter().enumerate() {
            let d = (bullet.position - position).abs();
            if d > radius {
                continue;
            }
            let better = nearest
                .map(|j| d < (self.bullets[j].position - position).abs())
                .unwrap_or(true);
            if better {
                nearest = Some(i);
            }
        }
        let Some(i) = nearest else {
            return CatchOutcome::Missed;
        };
        if !self.bullets[i].alive {
            return CatchOutcome::AlreadyCaught;
        }
        let Some(info) = self.bullets[i].segment_info else {
            return CatchOutcome::NoSegment;
        };
        // The ref was written before this tick's table edits; re-check it.
        if info.segment >= field.segments.len()
            || !field.segments[info.segment].is_moving()
            || info.offset > field.segments[info.segment].length
        {
            return CatchOutcome::NoSegment;
        }

        let jewel_type = self.bullets[i].jewel_type;
        let storage = field.storage_offset(info.segment, info.offset);
        self.bullets[i].alive = false;
        self.bullets[i].segment_info = None;
        field.insert_and_evaluate(info.segment, storage, jewel_type);
        for remap in field.drain_remaps() {
            self.apply_remap(&remap);
        }
        log::trace!("caught bullet into segment {} offset {storage}", info.segment);
        CatchOutcome::Caught { jewel_type }
    }

    /// Replay a table edit against every registered bullet so one that
    /// overlaps a segment stays registered against it.
    pub fn apply_remap(&mut self, remap: &SegmentRemap) {
        for bullet in &mut self.bullets {
            let Some(info) = &mut bullet.segment_info else {
                continue;
            };
            match *remap {
                SegmentRemap::Remove { segment } => {
                    if info.segment == segment {
                        bullet.segment_info = None;
                    } else if info.segment > segment {
                        info.segment -= 1;
                    }
                }
                SegmentRemap::Merge {
                    left,
                    right,
                    left_len,
                } => {
                    if info.segment == right {
                        info.segment = left;
                        info.offset += left_len;
                    } else if info.segment > right {
                        info.segment -= 1;
                    }
                }
                SegmentRemap::Split {
                    segment,
                    left_len,
                    run_len,
                    left_index,
                    mid_index,
                    right_index,
                } => {
                    if info.segment == segment {
                        if info.offset < left_len {
                            match left_index {
                                Some(idx) => info.segment = idx,
                                None => bullet.segment_info = None,
                            }
                        } else if info.offset < left_len + run_len {
                            info.segment = mid_index;
                            info.offset -= left_len;
                        } else {
                            match right_index {
                                Some(idx) => {
                                    info.segment = idx;
                                    info.offset -= left_len + run_len;
                                }
                                None => bullet.segment_info = None,
                            }
                        }
                    } else if info.segment > segment {
                        // Parts minus the reused table slot
                        let added = usize::from(left_index.is_some())
                            + usize::from(right_index.is_some());
                        info.segment += added;
                    }
                }
            }
        }
    }
}
