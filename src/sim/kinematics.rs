//! Per-tick segment kinematics: target speeds, integration, merge detection
//!
//! Speeds are rule-driven per tick (a segment chases a target speed under an
//! acceleration clamp); merges are detected right-to-left from visual
//! distance, so that a retrograde segment rejoining its neighbor does not
//! invalidate indices of pairs still to be tested.

use crate::consts::*;

use super::field::{JewelField, Segment, SegmentKind, SegmentRemap};
use super::matching;

/// Recompute Moving-segment target speeds, clamp the rate of change to
/// `MAX_ACCEL`, and integrate `shift += speed * dt`.
pub fn update_speeds(field: &mut JewelField, dt: f32, speed_bias: f32) {
    let targets: Vec<Option<f32>> = (0..field.segments.len())
        .map(|idx| {
            field.segments[idx]
                .is_moving()
                .then(|| target_speed(field, idx) * speed_bias)
        })
        .collect();

    for (seg, target) in field.segments.iter_mut().zip(targets) {
        let Some(target) = target else { continue };
        if let SegmentKind::Moving { speed, .. } = &mut seg.kind {
            let max_delta = MAX_ACCEL * dt;
            *speed += (target - *speed).clamp(-max_delta, max_delta);
            seg.shift += *speed * dt;
        }
    }
}

/// Target-speed rule for the Moving segment at a table slot:
/// - zero length: 0
/// - only segment in the table: normal forward
/// - slot 0 (no left neighbor): slow forward
/// - head type equals the left Moving neighbor's tail type: retrograde,
///   closing in for a merge; otherwise slow forward
fn target_speed(field: &JewelField, idx: usize) -> f32 {
    let seg = &field.segments[idx];
    if seg.length == 0 {
        return 0.0;
    }
    if field.segments.len() == 1 {
        return NORMAL_FORWARD_SPEED;
    }
    if idx == 0 {
        return SLOW_FORWARD_SPEED;
    }
    let left = (0..idx)
        .rev()
        .map(|i| &field.segments[i])
        .find(|s| s.is_moving() && s.length > 0);
    match left {
        None => SLOW_FORWARD_SPEED,
        Some(left) => {
            let head = field.pieces[seg.start].jewel_type;
            let tail = field.pieces[left.start + left.length - 1].jewel_type;
            if head == tail {
                RETROGRADE_SPEED
            } else {
                SLOW_FORWARD_SPEED
            }
        }
    }
}

/// Visual gap between two Moving segments, in whole slots. Below 1 they have
/// drifted together and must merge.
fn visual_distance(left: &Segment, right: &Segment) -> i64 {
    let mut vd = right.visual_start()
        - left.visual_start()
        - (left.length as i64 + left.discombobulation() as i64);
    if left.speed() > 0.0 {
        vd -= 1;
    }
    vd
}

/// Test and perform merges, right to left, until none remain. Each merge
/// discards intervening Collapsing segments, folds the right segment into
/// the left, and re-evaluates matches at the new seam.
pub fn merge_pass(field: &mut JewelField) {
    // Bounded: every merge removes at least one table entry.
    while let Some((left, right)) = find_mergeable(field) {
        merge(field, left, right);
    }
}

fn find_mergeable(field: &JewelField) -> Option<(usize, usize)> {
    for right in (1..field.segments.len()).rev() {
        if !field.segments[right].is_moving() {
            continue;
        }
        let Some(left) = (0..right).rev().find(|&i| field.segments[i].is_moving()) else {
            continue;
        };
        if visual_distance(&field.segments[left], &field.segments[right]) < 1 {
            return Some((left, right));
        }
    }
    None
}

fn merge(field: &mut JewelField, left: usize, mut right: usize) {
    // Drop intervening Collapsing segments (at most one, since split always
    // yields Moving|Collapsing|Moving) together with their pieces.
    while left + 1 < right {
        let victim = left + 1;
        let (start, length) = (field.segments[victim].start, field.segments[victim].length);
        field.pieces.drain(start..start + length);
        for seg in &mut field.segments[victim + 1..] {
            seg.start -= length;
        }
        field.segments.remove(victim);
        field.push_remap(SegmentRemap::Remove { segment: victim });
        right -= 1;
    }

    let left_len = field.segments[left].length;
    let right_len = field.segments[right].length;
    field.segments[left].length = left_len + right_len;
    field.segments.remove(right);
    field.push_remap(SegmentRemap::Merge {
        left,
        right,
        left_len,
    });
    log::debug!("merged segments {left}+{right}: lengths {left_len}+{right_len}");
    debug_assert!(field.partition_ok());

    if left_len > 0 && right_len > 0 {
        matching::evaluate_at(field, left, left_len);
    }
}
