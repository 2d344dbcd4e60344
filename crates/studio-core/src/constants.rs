use std::time::Duration;

/// Root of the status nodes owned by the listener
pub const CANVAS: &str = "/_canvas";

/// Heartbeat timestamp
pub const CANVAS_LISTENING: &str = "/_canvas/listening";

/// Set while the listener is attached to the feed
pub const CANVAS_TWOWAY: &str = "/_canvas/twoway";

/// Error messages from the last gateway reply (null when clear)
pub const CANVAS_ERRORS: &str = "/_canvas/errors";

/// Mirrors the working flag
pub const CANVAS_WORKING: &str = "/_canvas/working";

/// Root of the nodes written by Studio
pub const STUDIO: &str = "/_studio";

/// Node the change feed subscribes to; cleared once a request is answered
pub const STUDIO_CALLBACK: &str = "/_studio/callback";

/// Quiet period before a burst of edits is dispatched
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(250);

/// Debounce countdown tick
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

/// Steady-state heartbeat interval
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(60_000);

/// Heartbeat interval used right after activity
pub const DEFAULT_FAST_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(2_000);

/// Number of fast heartbeats before decaying back to the steady interval
pub const DEFAULT_FAST_HEARTBEAT_CYCLES: u32 = 5;

/// Message published when a gateway reply cannot be decoded
pub const UNREADABLE_REPLY_MESSAGE: &str = "Unable to read result from canvas";
