/// Countdown state for a session.
///
/// `remaining` only moves toward zero. Expiry is latched so it is reported
/// exactly once, which keeps the forced-submit path single-shot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTimer {
    total_secs: u64,
    remaining_secs: u64,
    expiry_reported: bool,
}

impl SessionTimer {
    #[must_use]
    pub fn new(total_secs: u64) -> Self {
        Self {
            total_secs,
            remaining_secs: total_secs,
            expiry_reported: false,
        }
    }

    #[must_use]
    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    /// Count down one second. Returns `true` exactly once, on the tick
    /// that reaches zero.
    pub fn tick(&mut self) -> bool {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 && !self.expiry_reported {
            self.expiry_reported = true;
            return true;
        }
        false
    }
}
