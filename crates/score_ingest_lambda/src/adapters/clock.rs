use std::time::Instant;

use chrono::{DateTime, Utc};

/// Wall-clock time stamps stored records; the monotonic instant is checked
/// against the invocation deadline.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
    fn instant(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}
