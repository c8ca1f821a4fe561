//! Content service configuration.

/// Configuration shared by the content services.
#[derive(Debug, Clone)]
pub struct ContentConfig {
    /// Prefix for the name of a duplicated chart (default: `"Copy of "`).
    pub duplicate_name_prefix: String,
    /// Location reported on pinned-list events (default: `"homepage"`).
    pub pinned_list_location: String,
    /// Attempts per post-commit step (default: 1, no retry).
    pub side_effect_attempts: u32,
    /// Capacity of the event-delivery queue (default: 1024).
    pub event_buffer: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            duplicate_name_prefix: "Copy of ".into(),
            pinned_list_location: "homepage".into(),
            side_effect_attempts: 1,
            event_buffer: 1024,
        }
    }
}
