//! Transmission priority used to size the collision backoff.
//!
//! J1708 priorities run from 1 (most urgent, shortest backoff) to 8 (least
//! urgent, longest backoff). The firmware transmits everything at priority 8
//! by default. Deriving the priority from the MID's leading zero bits is
//! kept as an opt-in alternative: that mapping is not what SAE J1708 defines,
//! so it must be asked for explicitly.
use crate::core::Message;

//==================================================================================PRIORITY
/// Priority level, always within `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Priority(u8);

impl Priority {
    /// Most urgent level.
    pub const HIGHEST: Self = Self(1);
    /// Least urgent level; the default for every message.
    pub const LOWEST: Self = Self(8);

    /// Build a priority, clamping `level` into `1..=8`.
    pub const fn new(level: u8) -> Self {
        if level < Self::HIGHEST.0 {
            Self::HIGHEST
        } else if level > Self::LOWEST.0 {
            Self::LOWEST
        } else {
            Self(level)
        }
    }

    #[inline]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// `leading_zeros(mid) + 1`, clamped to 8 (a zero MID maps to 8).
    pub const fn from_mid_leading_zeros(mid: u8) -> Self {
        Self::new(mid.leading_zeros() as u8 + 1)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::LOWEST
    }
}

//==================================================================================POLICY
/// How the engine picks the priority of an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PriorityPolicy {
    /// Same priority for every message.
    Fixed(Priority),
    /// Derived from the MID: `leading_zeros(mid) + 1`.
    ///
    /// Alternative mapping, not the J1708 definition. Off unless selected.
    MidLeadingZeros,
}

impl Default for PriorityPolicy {
    fn default() -> Self {
        Self::Fixed(Priority::LOWEST)
    }
}

impl PriorityPolicy {
    /// Priority that applies to `msg` under this policy.
    pub fn priority_of(&self, msg: &Message) -> Priority {
        match self {
            Self::Fixed(priority) => *priority,
            Self::MidLeadingZeros => Priority::from_mid_leading_zeros(msg.mid()),
        }
    }
}
