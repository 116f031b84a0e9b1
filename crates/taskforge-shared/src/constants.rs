//! Shared constants for gamification and the virtual lists.

/// XP awarded for completing a high-priority task.
pub const XP_HIGH: u32 = 50;
/// XP awarded for completing a medium-priority task.
pub const XP_MEDIUM: u32 = 30;
/// XP awarded for completing a low-priority (or default) task.
pub const XP_LOW: u32 = 10;

/// XP required to advance from `level` to `level + 1`.
pub fn xp_threshold(level: u32) -> u32 {
    level * 100
}

/// Identifier of the "Important" virtual list.
pub const VIEW_IMPORTANT: &str = "important";
/// Identifier of the "Planned" virtual list.
pub const VIEW_PLANNED: &str = "planned";
/// Identifier of the "Today" virtual list.
pub const VIEW_TODAY: &str = "today";

/// Name of the list created for a user on their first login.
pub const DEFAULT_LIST_NAME: &str = "My Tasks";
/// Icon of the default list.
pub const DEFAULT_LIST_ICON: &str = "Clock";
/// Icon given to lists created without one.
pub const LIST_ICON_FALLBACK: &str = "List";

/// Session token lifetime in days.
pub const SESSION_TTL_DAYS: i64 = 7;
