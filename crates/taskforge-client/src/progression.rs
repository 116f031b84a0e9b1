//! Gamification arithmetic.
//!
//! Fired exactly once per `completed: false -> true` transition (the
//! mutation coordinator gates on the pre-mutation value). The award and
//! level-up are computed here and persisted through the profile
//! endpoint; the server stores whatever the client reports. That makes
//! progression client-trusted, which is a real weakness kept for parity
//! with the original system -- a hardened deployment would move this
//! server-side.

use taskforge_shared::constants::{xp_threshold, XP_HIGH, XP_LOW, XP_MEDIUM};
use taskforge_shared::types::Priority;

/// XP awarded for completing a task of the given priority.
pub fn xp_gain(priority: Priority) -> u32 {
    match priority {
        Priority::High => XP_HIGH,
        Priority::Medium => XP_MEDIUM,
        Priority::Low => XP_LOW,
    }
}

/// Result of applying an XP award to `(xp, level)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Award {
    pub xp: u32,
    pub level: u32,
    /// How many thresholds the award crossed (0 = no level-up).
    pub levels_gained: u32,
}

/// Add `gain` XP, carrying overflow across as many thresholds as it
/// spans. The carry loops rather than stopping after one level, so the
/// resulting `xp` always sits below the current threshold.
pub fn apply_award(xp: u32, level: u32, gain: u32) -> Award {
    let mut level = level.max(1);
    let mut xp = xp + gain;
    let mut levels_gained = 0;

    while xp >= xp_threshold(level) {
        xp -= xp_threshold(level);
        level += 1;
        levels_gained += 1;
    }

    Award {
        xp,
        level,
        levels_gained,
    }
}

/// Award for completing a task of `priority` at `(xp, level)`.
pub fn completion_award(xp: u32, level: u32, priority: Priority) -> Award {
    apply_award(xp, level, xp_gain(priority))
}
