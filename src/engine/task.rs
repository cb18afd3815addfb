use std::future::Future;

use tokio::task::JoinHandle;
use tracing::debug;

/// Owning handle for a spawned timer task. Dropping it aborts the task, so
/// releasing a simulation is just letting go of its handle.
#[derive(Debug)]
pub struct ScopedTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl ScopedTask {
    pub fn spawn<F>(name: &'static str, future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            name,
            handle: tokio::spawn(future),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub fn cancel(self) {}
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            self.handle.abort();
            debug!(task = self.name, "timer task cancelled");
        }
    }
}

/// Timer slots owned by one booking session.
#[derive(Debug, Default)]
pub struct SessionTimers {
    pub estimate: Option<ScopedTask>,
    pub arrival: Option<ScopedTask>,
    pub tracking: Option<ScopedTask>,
    pub sos: Option<ScopedTask>,
}

impl SessionTimers {
    pub fn running(&self) -> usize {
        [&self.estimate, &self.arrival, &self.tracking, &self.sos]
            .into_iter()
            .flatten()
            .filter(|task| !task.is_finished())
            .count()
    }
}
