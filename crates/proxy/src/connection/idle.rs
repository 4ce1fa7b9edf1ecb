use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::debug;

use crate::protocol::IdleElapsed;

/// A re-armable deadline shared by every blocking step of one connection.
///
/// Each step is wrapped with [`IdleTimeout::guard`]; progress is signalled with
/// [`IdleTimeout::rearm`], which pushes the deadline one full `duration` into the future.
#[derive(Debug, Clone, Copy)]
pub struct IdleTimeout {
    duration: Duration,
    deadline: Instant,
}

impl IdleTimeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration, deadline: Instant::now() + duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    #[inline]
    pub fn rearm(&mut self) {
        self.deadline = Instant::now() + self.duration;
    }

    /// Runs `future` until it completes or the current deadline passes.
    pub async fn guard<F: Future>(&self, stage: &'static str, future: F) -> Result<F::Output, IdleElapsed> {
        match timeout_at(self.deadline, future).await {
            Ok(output) => Ok(output),
            Err(_elapsed) => {
                debug!(stage, idle_timeout = ?self.duration, "idle deadline passed");
                Err(IdleElapsed { stage })
            }
        }
    }
}
