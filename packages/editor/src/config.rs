use crate::annotations::Layout;
use crate::render::Relevance;
use crate::EditorError;
use std::time::Duration;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(80);
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Timing and presentation of a live session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Quiet period after the last edit before a pass may run
    pub debounce: Duration,
    /// How often the session checks for a pending pass
    pub tick_interval: Duration,
    pub relevance: Relevance,
    pub layout: Layout,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            tick_interval: DEFAULT_TICK_INTERVAL,
            relevance: Relevance::default(),
            layout: Layout::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.debounce.is_zero() {
            return Err(EditorError::InvalidConfig(
                "debounce must be greater than 0".to_string(),
            ));
        }
        if self.tick_interval.is_zero() {
            return Err(EditorError::InvalidConfig(
                "tick interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
