//! Match evaluation and the split/collapse algorithm
//!
//! The tricky part of the engine: a match inside a Moving segment cuts it
//! into Moving|Collapsing|Moving, and each new part's `shift` must be
//! recomputed so the cut is visually seamless. The parent's hole occupies a
//! visual slot, so parts to its right sit one slot further out than their
//! storage offsets suggest; getting that plus/minus one wrong shows up as
//! seams or teleporting pieces.

use crate::consts::MATCH_RUN;

use super::field::{JewelField, Segment, SegmentKind, SegmentRemap};

/// A detected run of same-type pieces, as offsets within the segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchInfo {
    pub run_start: usize,
    pub run_len: usize,
}

/// Scan around a changed offset for a run of at least `MATCH_RUN` same-type
/// pieces, splitting the segment if one is found.
///
/// Invoked after insert, swap and merge-seam events. Returns the run if a
/// split happened.
pub fn evaluate_at(field: &mut JewelField, segment: usize, offset: usize) -> Option<MatchInfo> {
    let seg = &field.segments[segment];
    if !seg.is_moving() || offset >= seg.length {
        return None;
    }
    let start = seg.start;
    let jewel = field.pieces[start + offset].jewel_type;

    let mut lo = offset;
    while lo > 0 && field.pieces[start + lo - 1].jewel_type == jewel {
        lo -= 1;
    }
    let mut hi = offset;
    while hi + 1 < seg.length && field.pieces[start + hi + 1].jewel_type == jewel {
        hi += 1;
    }

    let run_len = hi - lo + 1;
    if run_len < MATCH_RUN {
        return None;
    }
    split_segment(field, segment, lo, run_len);
    Some(MatchInfo {
        run_start: lo,
        run_len,
    })
}

/// Cut a Moving segment around a matched run into up to three parts: left
/// remainder, a fresh Collapsing segment holding the run, and right
/// remainder. Empty remainders are omitted; the left remainder keeps the
/// original table slot.
fn split_segment(field: &mut JewelField, segment: usize, run_start: usize, run_len: usize) {
    let parent = field.segments[segment];
    let (speed, disc) = match parent.kind {
        SegmentKind::Moving {
            speed,
            discombobulation,
        } => (speed, discombobulation),
        SegmentKind::Collapsing { .. } => unreachable!("split of non-Moving segment"),
    };

    // Hole position before the cut decides the one-slot corrections below.
    let hole = parent.hole_offset();
    let left_len = run_start;
    let lln = left_len + run_len;
    let right_len = parent.length - lln;
    let base_floor = parent.shift.floor();

    // The run's first piece sits one visual slot further out if the hole lies
    // at or left of it.
    let mid_slot = left_len + if hole <= left_len { 1 } else { 0 };
    let mid = Segment {
        start: parent.start + left_len,
        length: run_len,
        shift: base_floor + mid_slot as f32,
        kind: SegmentKind::Collapsing { progress: 1.0 },
    };

    let right = (right_len > 0).then(|| {
        let shift = if hole >= parent.length {
            // Hole at the parent's leading edge: the right part keeps it there
            base_floor + lln as f32
        } else if hole > lln {
            // Hole inside the right remainder: pick a fractional shift that
            // reproduces the same local hole offset.
            let h_local = (hole - lln) as f32;
            base_floor + lln as f32 + 1.0 - (h_local + 0.5) / right_len as f32
        } else {
            // Hole left of or inside the run: every right piece sat one slot
            // further out.
            base_floor + (lln + 1) as f32
        };
        Segment {
            start: parent.start + lln,
            length: right_len,
            shift,
            kind: SegmentKind::Moving {
                speed,
                discombobulation: 0,
            },
        }
    });

    let (left_index, mid_index, right_index);
    if left_len > 0 {
        field.segments[segment].length = left_len;
        field.segments[segment].kind = SegmentKind::Moving {
            speed,
            discombobulation: disc,
        };
        field.segments.insert(segment + 1, mid);
        left_index = Some(segment);
        mid_index = segment + 1;
    } else {
        field.segments[segment] = mid;
        left_index = None;
        mid_index = segment;
    }
    right_index = right.map(|r| {
        field.segments.insert(mid_index + 1, r);
        mid_index + 1
    });

    field.push_remap(SegmentRemap::Split {
        segment,
        left_len,
        run_len,
        left_index,
        mid_index,
        right_index,
    });
    log::debug!(
        "split segment {segment}: {left_len}|{run_len}|{right_len} (hole was at {hole})"
    );

    // A run at a segment edge can land flush against an existing Collapsing
    // neighbor; fold them so collapsing runs never touch.
    let mut mid_index = mid_index;
    if left_index.is_none() && mid_index > 0 && field.segments[mid_index - 1].is_collapsing() {
        fold_collapsing_pair(field, mid_index - 1);
        mid_index -= 1;
    }
    if right_index.is_none()
        && mid_index + 1 < field.segments.len()
        && field.segments[mid_index + 1].is_collapsing()
    {
        fold_collapsing_pair(field, mid_index);
    }

    debug_assert!(field.partition_ok());
    debug_assert!(field.collapsing_adjacency_ok());
}

/// Merge two adjacent Collapsing segments into the left one. The combined
/// countdown takes the larger remaining progress, so the fresher run keeps
/// its full collapse time.
fn fold_collapsing_pair(field: &mut JewelField, left: usize) {
    let right = left + 1;
    let left_len = field.segments[left].length;
    let progress = match (field.segments[left].kind, field.segments[right].kind) {
        (
            SegmentKind::Collapsing { progress: a },
            SegmentKind::Collapsing { progress: b },
        ) => a.max(b),
        _ => unreachable!("fold of non-Collapsing pair"),
    };
    field.segments[left].length += field.segments[right].length;
    field.segments[left].kind = SegmentKind::Collapsing { progress };
    field.segments.remove(right);
    field.push_remap(SegmentRemap::Merge {
        left,
        right,
        left_len,
    });
    log::debug!("folded adjacent collapsing segments {left}+{right}");
}
