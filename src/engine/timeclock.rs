//! Anchor/position conversion
//!
//! A playing track is described by an anchor `a` and a rate `r` such that
//! `position = (now - a) * r`. Resuming always derives a fresh anchor from
//! the frozen position, so repeated pause/resume cycles do not accumulate
//! drift.

/// Elapsed track position for a running anchor
#[inline]
pub fn to_position(now_millis: f64, anchor_millis: f64, rate: f64) -> f64 {
    (now_millis - anchor_millis) * rate
}

/// Anchor that makes `to_position(now, anchor, rate) == position`
#[inline]
pub fn to_anchor(now_millis: f64, position_millis: f64, rate: f64) -> f64 {
    now_millis - position_millis / rate
}
