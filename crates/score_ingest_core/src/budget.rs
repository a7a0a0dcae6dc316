use std::time::{Duration, Instant};

pub const DEFAULT_DEADLINE_RESERVE: Duration = Duration::from_millis(2_000);

/// Time budget of one invocation.
///
/// The handler asks [`RunBudget::allows_new_row`] before it starts each row.
/// Once the remaining time drops to `reserve` or below, no further row is
/// started, leaving enough headroom to assemble and return the result before
/// the platform kills the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBudget {
    deadline: Option<Instant>,
    reserve: Duration,
}

impl RunBudget {
    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            reserve: Duration::ZERO,
        }
    }

    pub fn until(deadline: Instant, reserve: Duration) -> Self {
        Self {
            deadline: Some(deadline),
            reserve,
        }
    }

    /// Budget for a platform deadline expressed as epoch milliseconds. A
    /// deadline too far out to represent as an `Instant` is unbounded.
    pub fn from_epoch_deadline_ms(
        deadline_ms: u64,
        now_epoch_ms: u64,
        now: Instant,
        reserve: Duration,
    ) -> Self {
        let remaining = Duration::from_millis(deadline_ms.saturating_sub(now_epoch_ms));
        match now.checked_add(remaining) {
            Some(deadline) => Self::until(deadline, reserve),
            None => Self::unbounded(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn allows_new_row(&self, now: Instant) -> bool {
        match self.deadline {
            None => true,
            Some(deadline) => now + self.reserve < deadline,
        }
    }
}
