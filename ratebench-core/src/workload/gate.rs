use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// Admits loop passes until a wall-clock deadline.
#[derive(Debug)]
pub struct DurationGate {
    duration: Duration,
    deadline: OnceLock<Instant>,
}

impl DurationGate {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            deadline: OnceLock::new(),
        }
    }

    pub fn start_at(&self, started: Instant) {
        if self.deadline.get().is_some() {
            return;
        }
        let _ = self.deadline.set(started + self.duration);
    }

    pub fn start(&self) {
        self.start_at(Instant::now());
    }

    pub fn next(&self) -> bool {
        let now = Instant::now();

        // Not started explicitly: the first pass starts the clock.
        if self.deadline.get().is_none() {
            self.start_at(now);
        }

        self.deadline.get().is_none_or(|deadline| now < *deadline)
    }
}
