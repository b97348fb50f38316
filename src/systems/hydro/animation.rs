// motion clips: two keyframes per animated primitive, interpolation and
// cycling are left to the host

use std::f32::consts::TAU;

use bevy::prelude::*;

use super::primitive::{Placement, PrimitiveId};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Keyframe {
    pub frame: u32,
    pub pose: Placement,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotionKind {
    /// One full turn about the vertical axis.
    Rotation,
    /// Offset by `delta` from the start pose.
    Translation { delta: Vec3 },
}

/// Start and end frame of a clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSpan {
    pub start: u32,
    pub end: u32,
}

impl FrameSpan {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MotionClip {
    pub target: PrimitiveId,
    pub kind: MotionKind,
    pub start: Keyframe,
    pub end: Keyframe,
    /// Replay forever, wrapping time modulo the clip duration.
    pub cyclic: bool,
}

impl MotionClip {
    pub fn keyframes(&self) -> [Keyframe; 2] {
        [self.start, self.end]
    }

    /// Pose at a (fractional) frame, see `sample_track`.
    pub fn sample(&self, frame: f32) -> Placement {
        sample_track(&self.keyframes(), self.cyclic, frame).unwrap_or(self.start.pose)
    }
}

/// Pose at a (fractional) frame along keyframes sorted by frame.
/// Before the first key the first pose holds; past the last key a cyclic track
/// wraps modulo its duration and a one-shot track holds its last pose.
pub fn sample_track(keys: &[Keyframe], cyclic: bool, frame: f32) -> Option<Placement> {
    let (first, last) = (keys.first()?, keys.last()?);
    let start = first.frame as f32;
    let duration = (last.frame.saturating_sub(first.frame)).max(1) as f32;
    let elapsed = frame - start;

    let local = if elapsed <= 0.0 {
        0.0
    } else if cyclic {
        elapsed.rem_euclid(duration)
    } else {
        elapsed.min(duration)
    };
    let at = start + local;

    for pair in keys.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if at <= b.frame as f32 {
            let span = (b.frame as f32 - a.frame as f32).max(f32::EPSILON);
            let t = ((at - a.frame as f32) / span).clamp(0.0, 1.0);
            return Some(a.pose.lerp(&b.pose, t));
        }
    }
    Some(last.pose)
}

/// Builds a cyclic two-keyframe clip for `target`, starting from `pose`.
/// A span that does not move forward in time is widened to one frame.
pub fn make_clip(target: PrimitiveId, pose: Placement, kind: MotionKind, span: FrameSpan) -> MotionClip {
    let span = if span.end > span.start {
        span
    } else {
        warn!("clip for {:?} spans frames {}..{}, widening to one frame", target, span.start, span.end);
        FrameSpan::new(span.start, span.start.saturating_add(1))
    };

    let end_pose = match kind {
        MotionKind::Rotation => Placement {
            rotation: pose.rotation + Vec3::Y * TAU,
            ..pose
        },
        MotionKind::Translation { delta } => Placement {
            translation: pose.translation + delta,
            ..pose
        },
    };

    MotionClip {
        target,
        kind,
        start: Keyframe { frame: span.start, pose },
        end: Keyframe { frame: span.end, pose: end_pose },
        cyclic: true,
    }
}
