//! Shared constants for the integration tests.

// ============================================================================
// Chart weeks (Fridays, with the default 06:00 cutover)
// ============================================================================

pub const WEEK_1: &str = "2025-01-03";
pub const WEEK_2: &str = "2025-01-10";
pub const WEEK_3: &str = "2025-01-17";
pub const WEEK_4: &str = "2025-01-24";

/// Last chart week of 2024.
pub const WEEK_2024: &str = "2024-12-27";

// ============================================================================
// Songs
// ============================================================================

pub const ARTIST_1: &str = "The Test Band";
pub const ARTIST_2: &str = "Jazz Ensemble";

pub const SONG_A: &str = "Opening Track";
pub const SONG_B: &str = "Second Song";
pub const SONG_C: &str = "Late Bloomer";

pub const ALBUM_1: &str = "First Album";
