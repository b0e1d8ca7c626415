// SPDX-License-Identifier: GPL-3.0-only

//! Exposure step tables, canonical exposure lines, and session tuning constants

/// Discrete ISO steps in third stops
///
/// These are the only sensitivities ever sent to the engine; requested values
/// are snapped to the nearest entry first.
pub const ISO_TABLE: &[i32] = &[
    100, 125, 160, 200, 250, 320, 400, 500, 640, 800, 1000, 1250, 1600, 2000, 2500, 3200, 4000,
    5000, 6400, 8000, 10000, 12800,
];

/// Discrete shutter times in nanoseconds, 1/8000 s to 1 s in third stops
pub const SHUTTER_TABLE_NS: &[i64] = &[
    125_000,       // 1/8000
    156_250,       // 1/6400
    200_000,       // 1/5000
    250_000,       // 1/4000
    312_500,       // 1/3200
    400_000,       // 1/2500
    500_000,       // 1/2000
    625_000,       // 1/1600
    800_000,       // 1/1250
    1_000_000,     // 1/1000
    1_250_000,     // 1/800
    1_562_500,     // 1/640
    2_000_000,     // 1/500
    2_500_000,     // 1/400
    3_125_000,     // 1/320
    4_000_000,     // 1/250
    5_000_000,     // 1/200
    6_250_000,     // 1/160
    8_000_000,     // 1/125
    10_000_000,    // 1/100
    12_500_000,    // 1/80
    16_666_667,    // 1/60
    20_000_000,    // 1/50
    25_000_000,    // 1/40
    33_333_333,    // 1/30
    40_000_000,    // 1/25
    50_000_000,    // 1/20
    66_666_667,    // 1/15
    76_923_077,    // 1/13
    100_000_000,   // 1/10
    125_000_000,   // 1/8
    166_666_667,   // 1/6
    200_000_000,   // 1/5
    250_000_000,   // 1/4
    333_333_333,   // 1/3
    400_000_000,   // 0.4
    500_000_000,   // 0.5
    625_000_000,   // 0.6
    800_000_000,   // 0.8
    1_000_000_000, // 1.0
];

/// Anchor points `(iso, shutter_ns)` of the standard exposure line
///
/// Shutter time is extended first (down to 1/30), then ISO ramps up, with a
/// slower-shutter excursion only once ISO headroom runs out. Anchors are
/// strictly monotonic in EV, one stop apart.
pub const STANDARD_EXPOSURE_LINE: &[(i32, i64)] = &[
    (100, 250_000),       // 1/4000
    (100, 500_000),       // 1/2000
    (100, 1_000_000),     // 1/1000
    (100, 2_000_000),     // 1/500
    (100, 4_000_000),     // 1/250
    (100, 8_000_000),     // 1/125
    (100, 16_666_667),    // 1/60
    (100, 33_333_333),    // 1/30
    (200, 33_333_333),
    (400, 33_333_333),
    (800, 33_333_333),
    (800, 66_666_667),    // 1/15
    (1600, 66_666_667),
    (3200, 66_666_667),
    (3200, 125_000_000),  // 1/8
    (6400, 125_000_000),
    (6400, 250_000_000),  // 1/4
    (12800, 250_000_000),
];

/// Anchor points of the HDR exposure line
///
/// The secondary HDR frame must stay motion-safe, so shutter time is capped
/// at 1/60 and ISO ramps much earlier than on the standard line.
pub const HDR_EXPOSURE_LINE: &[(i32, i64)] = &[
    (100, 125_000),      // 1/8000
    (100, 250_000),      // 1/4000
    (100, 500_000),      // 1/2000
    (100, 1_000_000),    // 1/1000
    (100, 2_000_000),    // 1/500
    (100, 4_000_000),    // 1/250
    (200, 4_000_000),
    (200, 8_000_000),    // 1/125
    (400, 8_000_000),
    (800, 8_000_000),
    (800, 16_666_667),   // 1/60
    (1600, 16_666_667),
    (3200, 16_666_667),
    (6400, 16_666_667),
    (12800, 16_666_667),
];

/// Exposure defaults
pub mod exposure {
    /// Aperture assumed when the camera does not report one
    pub const DEFAULT_APERTURE: f64 = 1.6;

    /// Fallback exposure before the first camera report arrives (ISO 100, 1/30)
    pub const DEFAULT_ISO: i32 = 100;
    pub const DEFAULT_SHUTTER_NS: i64 = 33_333_333;

    /// Application-imposed ceiling on shutter time for handheld capture (1/4 s)
    pub const MAX_SHUTTER_NS: i64 = 250_000_000;

    /// EV offset between the HDR base and secondary frame, in stops
    pub const DEFAULT_HDR_EV: f64 = 2.0;
}

/// Mode-switching and gesture thresholds
pub mod thresholds {
    /// Reported ISO above which the scene counts as a night scene
    pub const NIGHT_MODE_ISO: i32 = 1000;

    /// Reported shutter time above which the scene counts as a night scene (1/40 s)
    pub const NIGHT_MODE_SHUTTER_NS: i64 = 25_000_000;

    /// Touch points inside this margin of any screen edge are rejected
    pub const TOUCH_EDGE_MARGIN: f32 = 0.05;

    /// Minimum normalized distance between successive focus points;
    /// closer touches are treated as duplicates and ignored
    pub const MIN_FOCUS_POINT_DISTANCE: f32 = 0.05;
}

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// Default window after a user focus request in which an
    /// exposure-searching report does NOT cancel the user's focus point
    pub const FOCUS_REVERT_TIMEOUT_MS: u64 = 3000;

    /// Tighter revert window used by the single-camera session profile
    pub const FOCUS_REVERT_TIMEOUT_SINGLE_CAMERA_MS: u64 = 1000;

    /// How long `close()` waits for the in-flight engine operation
    pub const DISPATCHER_CLOSE_GRACE: Duration = Duration::from_millis(500);
}
