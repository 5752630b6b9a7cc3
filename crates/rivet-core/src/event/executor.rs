use tokio::runtime::Handle;

/// A unit of event delivery.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Strategy used by [`EventBus`](super::EventBus) to run deliveries.
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task);
}

/// Runs each task inline on the caller's thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Synchronous;

impl Executor for Synchronous {
    fn execute(&self, task: Task) {
        task();
    }
}

/// Runs each task on a tokio runtime's blocking pool.
///
/// Listeners are plain synchronous closures, so they go through
/// `spawn_blocking` rather than the async worker threads.
#[derive(Debug, Clone)]
pub struct TokioExecutor {
    handle: Handle,
}

impl TokioExecutor {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running inside, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Executor for TokioExecutor {
    fn execute(&self, task: Task) {
        // Detached; failures are reported by the bus's delivery wrapper.
        drop(self.handle.spawn_blocking(task));
    }
}
