use serde::Serialize;

pub const POINTS_PER_LEVEL: u64 = 100;

/// Points awarded for each recorded completion.
pub const POINTS_PER_COMPLETION: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct XpState {
    pub level: u64,
    /// Points earned inside the current level, `0..POINTS_PER_LEVEL`.
    pub in_level: u64,
    /// `in_level` as a fraction, always within `[0, 1]`.
    pub pct: f64,
    /// Point total at which the next level starts.
    pub next_at: u64,
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn xp_from_points(points: u64) -> XpState {
    let level = points / POINTS_PER_LEVEL + 1;
    let in_level = points % POINTS_PER_LEVEL;
    let pct = (in_level as f64 / POINTS_PER_LEVEL as f64).clamp(0.0, 1.0);
    XpState {
        level,
        in_level,
        pct,
        next_at: level.saturating_mul(POINTS_PER_LEVEL),
    }
}
