//! Wall-clock source for the scheduler.

use chrono::{Local, NaiveDateTime};

/// Local wall-clock time. Scheduling never looks at timezones.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
pub mod testing {
    use super::Clock;
    use chrono::{NaiveDateTime, TimeDelta};
    use std::sync::{Arc, Mutex};

    /// A clock that only moves when told to. Clones share the same time.
    #[derive(Clone)]
    pub struct ManualClock(Arc<Mutex<NaiveDateTime>>);

    impl ManualClock {
        pub fn at(now: NaiveDateTime) -> Self {
            ManualClock(Arc::new(Mutex::new(now)))
        }

        pub fn advance(&self, by: TimeDelta) {
            *self.0.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> NaiveDateTime {
            *self.0.lock().unwrap()
        }
    }

    /// Wall clock that follows tokio's (pausable) time from a fixed start.
    pub struct TokioClock {
        base: NaiveDateTime,
        started: tokio::time::Instant,
    }

    impl TokioClock {
        pub fn starting_at(base: NaiveDateTime) -> Self {
            TokioClock {
                base,
                started: tokio::time::Instant::now(),
            }
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> NaiveDateTime {
            let elapsed = TimeDelta::from_std(self.started.elapsed()).unwrap();
            self.base + elapsed
        }
    }
}
