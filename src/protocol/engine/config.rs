//! Runtime knobs of the bus engine. Line settings and timing live in
//! [`transport`](crate::protocol::transport) as compile-time constants.
use crate::protocol::transport::priority::PriorityPolicy;

/// Engine configuration. The default matches the production firmware:
/// fixed priority 8 and unbounded collision retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EngineConfig {
    /// Priority used to size the collision backoff.
    pub priority: PriorityPolicy,
    /// Retries allowed after the first attempt before a message is dropped.
    /// `None` retries forever and leaves arbitration to the bus.
    pub max_retries: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    pub const fn new() -> Self {
        Self {
            priority: PriorityPolicy::Fixed(crate::protocol::transport::priority::Priority::LOWEST),
            max_retries: None,
        }
    }

    pub const fn with_priority(mut self, priority: PriorityPolicy) -> Self {
        self.priority = priority;
        self
    }

    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}
