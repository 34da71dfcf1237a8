//! Piece storage and the segment table
//!
//! The field is a dense, left-packed `Vec<Piece>` of bounded capacity plus an
//! ordered table of segments partitioning it. Storage indices and visual
//! positions are deliberately decoupled: a segment's `shift` is where its
//! pieces are drawn, its `start` is where they live in the vec. Every
//! structural mutation (insert, swap, collapse, merge) must leave the table a
//! gapless partition of `[0, len)`.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::config::LevelConfig;
use crate::consts::*;
use crate::frac;

use super::matching;

/// One colored piece on the strip
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Piece {
    /// Opaque type id, bounded by the level palette
    pub jewel_type: u8,
    /// Monotonic id, diagnostic only
    pub id: u32,
    /// Animation phases consumed by the external renderer; never read here
    pub phase: [f32; 2],
}

/// Kinematic state shared by every piece of a segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SegmentKind {
    /// Drifting at a continuous speed (positive = toward the consuming end)
    Moving {
        speed: f32,
        /// Permanent drift accumulated from bullets passing through uncaught.
        /// Raised each tick to the count of overlapping bullets, lowered only
        /// by `insert_and_evaluate`.
        discombobulation: i32,
    },
    /// Matched run shrinking away; deleted once `progress` goes negative
    Collapsing { progress: f32 },
}

/// A contiguous run of pieces sharing one kinematic state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// First storage index of the run
    pub start: usize,
    /// Number of pieces in the run
    pub length: usize,
    /// Continuous visual position of the first piece, decoupled from `start`
    pub shift: f32,
    pub kind: SegmentKind,
}

impl Segment {
    pub fn is_moving(&self) -> bool {
        matches!(self.kind, SegmentKind::Moving { .. })
    }

    pub fn is_collapsing(&self) -> bool {
        matches!(self.kind, SegmentKind::Collapsing { .. })
    }

    pub fn speed(&self) -> f32 {
        match self.kind {
            SegmentKind::Moving { speed, .. } => speed,
            SegmentKind::Collapsing { .. } => 0.0,
        }
    }

    pub fn discombobulation(&self) -> i32 {
        match self.kind {
            SegmentKind::Moving {
                discombobulation, ..
            } => discombobulation,
            SegmentKind::Collapsing { .. } => 0,
        }
    }

    /// Leftmost visual slot occupied by this segment
    pub fn visual_start(&self) -> i64 {
        self.shift.floor() as i64
    }

    /// Offset of the unfilled slot within the L+1 visual slots of a Moving
    /// segment. The hole sits at the leading edge of travel and migrates
    /// backward as `shift` grows, animating insertion one slot at a time.
    pub fn hole_offset(&self) -> usize {
        if self.length <= 2 {
            return self.length;
        }
        let h = (self.length as f32) * (1.0 - frac(self.shift));
        (h.floor() as usize).min(self.length)
    }
}

/// Table edit event, replayed against bullet `segment_info` bookkeeping so a
/// bullet overlapping a segment stays registered against the right one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SegmentRemap {
    /// A segment split into Moving|Collapsing|Moving (empty remainders
    /// omitted). Indices are the parts' table slots after the edit.
    Split {
        segment: usize,
        left_len: usize,
        run_len: usize,
        left_index: Option<usize>,
        mid_index: usize,
        right_index: Option<usize>,
    },
    /// `right` was folded into `left`; `left_len` is left's length before
    Merge {
        left: usize,
        right: usize,
        left_len: usize,
    },
    /// A segment was deleted outright (collapse finished, or discarded)
    Remove { segment: usize },
}

/// Result of a swap attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapOutcome {
    /// At least one of the two positions matched and split
    Matched,
    /// No match; a timed revert has been scheduled
    RevertScheduled,
    /// Both pieces share a type; the swap happened but changed nothing
    Unchanged,
    /// No swappable pair at the requested position
    OutOfReach,
    /// The acting player's swap cooldown has not elapsed
    OnCooldown,
}

/// A scheduled revert of a no-match swap. Identified by piece ids so a stale
/// revert (pieces moved by a later mutation) is skipped instead of corrupting
/// unrelated slots.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PendingUnswap {
    left_id: u32,
    right_id: u32,
    due_at: f64,
}

/// Piece storage plus the segment table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JewelField {
    /// Dense, left-packed storage; logical field length == `pieces.len()`
    pub pieces: Vec<Piece>,
    /// Ordered by `start`; a gapless partition of `[0, pieces.len())`
    pub segments: Vec<Segment>,
    pending_unswaps: Vec<PendingUnswap>,
    /// Table edits since the last drain, for bullet bookkeeping
    #[serde(skip)]
    remaps: Vec<SegmentRemap>,
    next_piece_id: u32,
}

impl JewelField {
    /// Generate a level-start arrangement: one Moving segment spanning the
    /// field at default forward speed.
    ///
    /// Pieces are drawn right-to-left; each either repeats its right
    /// neighbor's type (probability `same_bias`, decayed 10% whenever a fresh
    /// type is drawn) or takes a uniform random new type.
    pub fn generate(config: &LevelConfig, seed: u64) -> Self {
        assert!(config.field_length <= FIELD_CAPACITY);
        assert!(config.palette_size > 0);

        let mut rng = Pcg32::seed_from_u64(seed);
        let n = config.field_length;
        let mut types = vec![0u8; n];
        let mut bias = config.same_bias;
        for i in (0..n).rev() {
            let repeat = i + 1 < n && rng.random::<f32>() < bias;
            if repeat {
                types[i] = types[i + 1];
            } else {
                types[i] = rng.random_range(0..config.palette_size);
                bias *= 0.9;
            }
        }

        let mut field = Self {
            pieces: Vec::with_capacity(FIELD_CAPACITY),
            segments: Vec::new(),
            pending_unswaps: Vec::new(),
            remaps: Vec::new(),
            next_piece_id: 1,
        };
        for &jewel_type in &types {
            let phase = [rng.random::<f32>(), rng.random::<f32>()];
            let mut piece = field.alloc_piece(jewel_type);
            piece.phase = phase;
            field.pieces.push(piece);
        }
        field.segments.push(Segment {
            start: 0,
            length: n,
            shift: config.start_offset,
            kind: SegmentKind::Moving {
                speed: NORMAL_FORWARD_SPEED * config.speed_bias,
                discombobulation: 0,
            },
        });

        log::info!(
            "Generated field: {} pieces, palette {}, shift {}",
            n,
            config.palette_size,
            config.start_offset
        );
        field
    }

    /// Build a field with explicit piece types as a single Moving segment.
    /// Used by tests and host tooling to stage exact arrangements.
    pub fn from_types(types: &[u8], shift: f32) -> Self {
        let mut field = Self {
            pieces: Vec::with_capacity(FIELD_CAPACITY),
            segments: Vec::new(),
            pending_unswaps: Vec::new(),
            remaps: Vec::new(),
            next_piece_id: 1,
        };
        for &jewel_type in types {
            let piece = field.alloc_piece(jewel_type);
            field.pieces.push(piece);
        }
        field.segments.push(Segment {
            start: 0,
            length: types.len(),
            shift,
            kind: SegmentKind::Moving {
                speed: SLOW_FORWARD_SPEED,
                discombobulation: 0,
            },
        });
        field
    }

    fn alloc_piece(&mut self, jewel_type: u8) -> Piece {
        let id = self.next_piece_id;
        self.next_piece_id += 1;
        Piece {
            jewel_type,
            id,
            phase: [0.0, 0.0],
        }
    }

    /// Logical field length
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// Piece type at an offset within a segment
    pub fn jewel_type_at(&self, segment: usize, offset: usize) -> u8 {
        let seg = &self.segments[segment];
        assert!(offset < seg.length, "offset {offset} out of segment");
        self.pieces[seg.start + offset].jewel_type
    }

    /// Find the Moving segment whose visual span covers a slot, with the
    /// visual offset into it. The span of a length-L segment is L+1 slots
    /// (the extra one is the hole).
    pub fn segment_at_visual(&self, slot: i64) -> Option<(usize, usize)> {
        for (idx, seg) in self.segments.iter().enumerate() {
            if !seg.is_moving() {
                continue;
            }
            let vs = seg.visual_start();
            if slot >= vs && slot <= vs + seg.length as i64 {
                return Some((idx, (slot - vs) as usize));
            }
        }
        None
    }

    /// Convert a visual slot within a segment to a storage offset, skipping
    /// over the hole.
    pub fn storage_offset(&self, segment: usize, visual_slot: usize) -> usize {
        let seg = &self.segments[segment];
        let hole = seg.hole_offset();
        let off = if visual_slot > hole {
            visual_slot - 1
        } else {
            visual_slot
        };
        off.min(seg.length)
    }

    pub(crate) fn push_remap(&mut self, remap: SegmentRemap) {
        self.remaps.push(remap);
    }

    /// Take the table edits accumulated since the last drain. The caller
    /// replays them against bullet bookkeeping in order.
    pub fn drain_remaps(&mut self) -> Vec<SegmentRemap> {
        std::mem::take(&mut self.remaps)
    }

    /// Insert a caught bullet's payload into a Moving segment and evaluate
    /// matches at the insertion point.
    ///
    /// Grows the field by one; at capacity the furthest slot is overwritten
    /// instead (soft degradation, never a failure). Returns true if the
    /// insertion produced a match.
    pub fn insert_and_evaluate(&mut self, segment: usize, offset: usize, jewel_type: u8) -> bool {
        assert!(segment < self.segments.len(), "bad segment index");
        assert!(
            self.segments[segment].is_moving(),
            "insert into non-Moving segment"
        );

        if self.pieces.len() >= FIELD_CAPACITY {
            // Drop the furthest piece to make room. The last segment keeps a
            // zero-length entry only when it is also the insertion target.
            self.pieces.pop();
            let last = self.segments.len() - 1;
            self.segments[last].length -= 1;
            if self.segments[last].length == 0 && last != segment {
                self.segments.remove(last);
                self.push_remap(SegmentRemap::Remove { segment: last });
            }
        }

        // Clamp only after any capacity shrink: the target segment may have
        // just lost its tail slot.
        let offset = offset.min(self.segments[segment].length);
        let piece = self.alloc_piece(jewel_type);
        let pos = self.segments[segment].start + offset;
        self.pieces.insert(pos, piece);
        self.segments[segment].length += 1;
        if let SegmentKind::Moving {
            discombobulation, ..
        } = &mut self.segments[segment].kind
        {
            *discombobulation -= 1;
        }
        for seg in &mut self.segments[segment + 1..] {
            seg.start += 1;
        }
        debug_assert!(self.partition_ok());

        matching::evaluate_at(self, segment, offset).is_some()
    }

    /// Exchange the pieces at `left_offset` and `left_offset + 1` of a Moving
    /// segment and evaluate both positions. If neither matches, a timed
    /// revert is scheduled instead of failing.
    pub fn swap_and_evaluate(
        &mut self,
        segment: usize,
        left_offset: usize,
        now: f64,
    ) -> SwapOutcome {
        assert!(segment < self.segments.len(), "bad segment index");
        let seg = &self.segments[segment];
        assert!(seg.is_moving(), "swap in non-Moving segment");
        assert!(left_offset + 1 < seg.length, "swap pair out of segment");

        let pos = seg.start + left_offset;
        let left_id = self.pieces[pos].id;
        let right_id = self.pieces[pos + 1].id;
        if self.pieces[pos].jewel_type == self.pieces[pos + 1].jewel_type {
            // Same type both sides; nothing can match and a revert would be
            // invisible.
            return SwapOutcome::Unchanged;
        }
        self.pieces.swap(pos, pos + 1);

        let mut matched = matching::evaluate_at(self, segment, left_offset).is_some();
        if matched {
            // The split may have moved the right piece; re-locate it by id.
            if let Some((seg2, off2)) = self.locate_piece(right_id) {
                if self.segments[seg2].is_moving() {
                    matching::evaluate_at(self, seg2, off2);
                }
            }
        } else {
            matched = matching::evaluate_at(self, segment, left_offset + 1).is_some();
        }

        if matched {
            SwapOutcome::Matched
        } else {
            self.pending_unswaps.push(PendingUnswap {
                left_id,
                right_id,
                due_at: now + UNSWAP_DELAY,
            });
            SwapOutcome::RevertScheduled
        }
    }

    /// Nudge a segment's visual position by a whole unit (bullet left the
    /// segment uncaught, baking its drift into the shift).
    pub fn add_shift(&mut self, segment: usize, amount: f32) {
        if let Some(seg) = self.segments.get_mut(segment) {
            seg.shift += amount;
        }
    }

    /// Revert due no-match swaps. A revert whose pieces are no longer
    /// adjacent in swapped order is stale and dropped.
    pub fn drain_unswaps(&mut self, now: f64) {
        let due: Vec<PendingUnswap> = {
            let (due, keep) = self
                .pending_unswaps
                .drain(..)
                .partition(|u| u.due_at <= now);
            self.pending_unswaps = keep;
            due
        };
        for unswap in due {
            if let Some(pos) = self.pieces.iter().position(|p| p.id == unswap.right_id) {
                if pos + 1 < self.pieces.len() && self.pieces[pos + 1].id == unswap.left_id {
                    self.pieces.swap(pos, pos + 1);
                    log::debug!("reverted swap of pieces {}/{}", unswap.left_id, unswap.right_id);
                    // The restored arrangement can complete a run formed by
                    // mutations since the swap; a revert is still a swap.
                    for id in [unswap.left_id, unswap.right_id] {
                        if let Some((seg, off)) = self.locate_piece(id) {
                            if self.segments[seg].is_moving() {
                                matching::evaluate_at(self, seg, off);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Advance collapse countdowns; delete finished segments, closing the
    /// storage gap and sliding later starts left. Returns true if anything
    /// was deleted (the caller must not reuse indices computed earlier this
    /// tick).
    pub fn advance_collapse(&mut self, dt: f32) -> bool {
        for seg in &mut self.segments {
            if let SegmentKind::Collapsing { progress } = &mut seg.kind {
                *progress -= dt / COLLAPSE_TIME;
            }
        }

        let mut any = false;
        let mut i = self.segments.len();
        while i > 0 {
            i -= 1;
            let finished = matches!(
                self.segments[i].kind,
                SegmentKind::Collapsing { progress } if progress < 0.0
            );
            if !finished {
                continue;
            }
            let (start, length) = (self.segments[i].start, self.segments[i].length);
            self.pieces.drain(start..start + length);
            for seg in &mut self.segments[i + 1..] {
                seg.start -= length;
            }
            self.segments.remove(i);
            self.push_remap(SegmentRemap::Remove { segment: i });
            log::debug!("collapse finished: {length} pieces freed, field now {}", self.len());
            any = true;
        }
        if any {
            debug_assert!(self.partition_ok());
        }
        any
    }

    /// Locate a piece by id as (segment index, offset)
    pub fn locate_piece(&self, id: u32) -> Option<(usize, usize)> {
        let pos = self.pieces.iter().position(|p| p.id == id)?;
        let seg = self
            .segments
            .iter()
            .position(|s| pos >= s.start && pos < s.start + s.length)?;
        Some((seg, pos - self.segments[seg].start))
    }

    /// Segment ranges exactly cover `[0, len)` with no gaps or overlap
    pub fn partition_ok(&self) -> bool {
        let mut cursor = 0usize;
        for seg in &self.segments {
            if seg.start != cursor {
                return false;
            }
            cursor += seg.length;
        }
        cursor == self.pieces.len()
    }

    /// No two Collapsing segments are adjacent
    pub fn collapsing_adjacency_ok(&self) -> bool {
        self.segments
            .windows(2)
            .all(|w| !(w[0].is_collapsing() && w[1].is_collapsing()))
    }

    /// Longest same-type run inside any Moving segment
    pub fn max_run_in_moving(&self) -> usize {
        let mut best = 0;
        for seg in &self.segments {
            if !seg.is_moving() || seg.length == 0 {
                continue;
            }
            let mut run = 1;
            for i in 1..seg.length {
                if self.pieces[seg.start + i].jewel_type == self.pieces[seg.start + i - 1].jewel_type
                {
                    run += 1;
                } else {
                    run = 1;
                }
                best = best.max(run);
            }
            best = best.max(run.min(seg.length));
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> LevelConfig {
        LevelConfig::default()
    }

    #[test]
    fn test_generate_deterministic() {
        let config = default_config();
        let a = JewelField::generate(&config, 42);
        let b = JewelField::generate(&config, 42);
        assert_eq!(a.pieces, b.pieces);
        assert_eq!(a.segments, b.segments);
    }

    #[test]
    fn test_generate_single_moving_segment() {
        let config = default_config();
        let field = JewelField::generate(&config, 7);
        assert_eq!(field.len(), config.field_length);
        assert_eq!(field.segments.len(), 1);
        assert!(field.segments[0].is_moving());
        assert_eq!(field.segments[0].discombobulation(), 0);
        assert!(field.partition_ok());
        for p in &field.pieces {
            assert!(p.jewel_type < config.palette_size);
        }
    }

    #[test]
    fn test_hole_offset_migrates_backward() {
        let mut seg = Segment {
            start: 0,
            length: 10,
            shift: 5.0,
            kind: SegmentKind::Moving {
                speed: 0.0,
                discombobulation: 0,
            },
        };
        // frac 0: hole at the leading edge
        assert_eq!(seg.hole_offset(), 10);
        seg.shift = 5.5;
        assert_eq!(seg.hole_offset(), 5);
        seg.shift = 5.95;
        assert_eq!(seg.hole_offset(), 0);
    }

    #[test]
    fn test_hole_migrates_one_slot_at_a_time() {
        // Over small shift increments (no wrap of the fractional part) the
        // hole walks backward without skipping slots.
        let mut seg = Segment {
            start: 0,
            length: 12,
            shift: 5.05,
            kind: SegmentKind::Moving {
                speed: 0.0,
                discombobulation: 0,
            },
        };
        let mut prev = seg.hole_offset();
        while frac(seg.shift) < 0.95 {
            seg.shift += SLOW_FORWARD_SPEED * 0.025;
            let hole = seg.hole_offset();
            assert!(prev == hole || prev == hole + 1, "hole jumped {prev} -> {hole}");
            prev = hole;
        }
        assert!(prev < 12);
    }

    #[test]
    fn test_hole_offset_short_segment_clamped() {
        let seg = Segment {
            start: 0,
            length: 2,
            shift: 3.7,
            kind: SegmentKind::Moving {
                speed: 0.0,
                discombobulation: 0,
            },
        };
        assert_eq!(seg.hole_offset(), 2);
    }

    #[test]
    fn test_insert_grows_by_one() {
        let mut field = JewelField::from_types(&[0, 1, 2, 0, 1], 0.0);
        let before = field.len();
        let matched = field.insert_and_evaluate(0, 2, 3);
        assert!(!matched);
        assert_eq!(field.len(), before + 1);
        assert_eq!(field.jewel_type_at(0, 2), 3);
        assert!(field.partition_ok());
        // Insertion ratchets discombobulation down
        assert_eq!(field.segments[0].discombobulation(), -1);
    }

    #[test]
    fn test_insert_at_capacity_overwrites_furthest() {
        let types: Vec<u8> = (0..FIELD_CAPACITY).map(|i| (i % 4) as u8).collect();
        let mut field = JewelField::from_types(&types, 0.0);
        assert_eq!(field.len(), FIELD_CAPACITY);
        field.insert_and_evaluate(0, 10, 5);
        assert_eq!(field.len(), FIELD_CAPACITY);
        assert_eq!(field.jewel_type_at(0, 10), 5);
        assert!(field.partition_ok());
    }

    #[test]
    fn test_insert_at_capacity_tail_slot() {
        let types: Vec<u8> = (0..FIELD_CAPACITY).map(|i| (i % 4) as u8).collect();
        let mut field = JewelField::from_types(&types, 0.0);
        // The leading-edge slot maps to offset == length; the capacity pop
        // shrinks the segment first, so the insert lands on the new tail.
        let tail = field.segments[0].length;
        field.insert_and_evaluate(0, tail, 5);
        assert_eq!(field.len(), FIELD_CAPACITY);
        assert_eq!(field.jewel_type_at(0, FIELD_CAPACITY - 1), 5);
        assert!(field.partition_ok());
    }

    #[test]
    fn test_swap_same_type_pair_is_noop() {
        let mut field = JewelField::from_types(&[0, 1, 1, 2], 0.0);
        let before = field.pieces.clone();
        assert_eq!(field.swap_and_evaluate(0, 1, 0.0), SwapOutcome::Unchanged);
        assert_eq!(field.pieces, before);
        // Nothing to revert later either
        field.drain_unswaps(UNSWAP_DELAY + 1.0);
        assert_eq!(field.pieces, before);
    }

    #[test]
    fn test_unswap_revert_evaluates_new_runs() {
        // Swap 1<->2, then insert 1s around the displaced piece; the revert
        // restores 1,1,1 and must split it rather than leave a settled run.
        let mut field = JewelField::from_types(&[0, 1, 2, 3, 0], 0.0);
        assert_eq!(field.swap_and_evaluate(0, 1, 0.0), SwapOutcome::RevertScheduled);
        // Field is now 0,2,1,3,0; build 1s left of the moved piece
        field.insert_and_evaluate(0, 1, 1);
        field.insert_and_evaluate(0, 1, 1);
        // 0,1,1,2,1,3,0 with the original pair at offsets 3/4
        field.drain_unswaps(UNSWAP_DELAY + 1.0);
        assert!(field.max_run_in_moving() < MATCH_RUN);
        assert!(field.segments.iter().any(|s| s.is_collapsing()));
        assert!(field.partition_ok());
    }

    #[test]
    fn test_swap_no_match_schedules_revert() {
        let mut field = JewelField::from_types(&[0, 1, 2, 3, 0], 0.0);
        let before = field.pieces.clone();
        let outcome = field.swap_and_evaluate(0, 1, 10.0);
        assert_eq!(outcome, SwapOutcome::RevertScheduled);
        assert_eq!(field.pieces[1].jewel_type, 2);
        assert_eq!(field.pieces[2].jewel_type, 1);

        // Not due yet
        field.drain_unswaps(10.0 + UNSWAP_DELAY - 0.1);
        assert_ne!(field.pieces, before);

        // Past the timeout: bit-identical restore
        field.drain_unswaps(10.0 + UNSWAP_DELAY + 0.1);
        assert_eq!(field.pieces, before);
    }

    #[test]
    fn test_stale_unswap_skipped() {
        let mut field = JewelField::from_types(&[0, 1, 2, 3, 0], 0.0);
        let outcome = field.swap_and_evaluate(0, 1, 0.0);
        assert_eq!(outcome, SwapOutcome::RevertScheduled);
        // A later insert moves the pair apart
        field.insert_and_evaluate(0, 2, 4);
        let snapshot = field.pieces.clone();
        field.drain_unswaps(UNSWAP_DELAY + 1.0);
        assert_eq!(field.pieces, snapshot);
    }

    #[test]
    fn test_collapse_countdown_deletes_on_negative() {
        let mut field = JewelField::from_types(&[0, 0, 0, 1, 2], 0.0);
        field.segments[0].kind = SegmentKind::Collapsing { progress: 1.0 };
        // Give the table a second segment so deletion exercises start fixup
        field.segments[0].length = 3;
        field.segments.push(Segment {
            start: 3,
            length: 2,
            shift: 4.0,
            kind: SegmentKind::Moving {
                speed: 0.0,
                discombobulation: 0,
            },
        });
        assert!(field.partition_ok());

        // COLLAPSE_TIME = 2.0s at 25ms ticks: alive through tick 79
        let dt = 0.025;
        for _ in 0..79 {
            assert!(!field.advance_collapse(dt));
        }
        let mut deleted = false;
        for _ in 0..3 {
            if field.advance_collapse(dt) {
                deleted = true;
                break;
            }
        }
        assert!(deleted);
        assert_eq!(field.len(), 2);
        assert_eq!(field.segments.len(), 1);
        assert_eq!(field.segments[0].start, 0);
        assert!(field.partition_ok());
    }

    #[test]
    fn test_segment_at_visual() {
        let mut field = JewelField::from_types(&[0, 1, 2, 3], 0.0);
        field.segments[0].shift = 10.3;
        assert_eq!(field.segment_at_visual(9), None);
        assert_eq!(field.segment_at_visual(10), Some((0, 0)));
        // L+1 slots: 10..=14 for a length-4 segment
        assert_eq!(field.segment_at_visual(14), Some((0, 4)));
        assert_eq!(field.segment_at_visual(15), None);
    }

    #[test]
    fn test_storage_offset_skips_hole() {
        let mut field = JewelField::from_types(&[0, 1, 2, 3, 4, 5, 6, 7, 8, 9], 0.0);
        field.segments[0].shift = 5.5; // hole at offset 5
        assert_eq!(field.segments[0].hole_offset(), 5);
        assert_eq!(field.storage_offset(0, 3), 3);
        assert_eq!(field.storage_offset(0, 5), 5);
        assert_eq!(field.storage_offset(0, 6), 5);
        assert_eq!(field.storage_offset(0, 10), 9);
    }
}
