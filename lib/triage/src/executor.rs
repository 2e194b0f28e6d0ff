//! Completion executors.
//!
//! An enqueued call finishes on a runtime worker. When a [`CallbackExecutor`]
//! is configured, the callback is posted to it instead of running there, which
//! is how results get back to a "main" loop that owns UI-like state.
//!
//! ```ignore
//! use triage::{QueueExecutor, ServiceClient};
//!
//! let (executor, mut queue) = QueueExecutor::new();
//! let client = ServiceClient::builder()
//!     .base_url("https://jsonplaceholder.typicode.com/")
//!     .callback_executor(executor)
//!     .build()?;
//!
//! // later, on the thread owning the state
//! queue.run_pending();
//! ```

use std::fmt;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::warn;

/// A unit of completion work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Where completion callbacks run.
pub trait CallbackExecutor: Send + Sync + 'static {
    /// Run `task`, now or later, exactly once.
    fn execute(&self, task: Task);
}

impl<F> CallbackExecutor for F
where
    F: Fn(Task) + Send + Sync + 'static,
{
    fn execute(&self, task: Task) {
        self(task);
    }
}

/// Run `task` on `executor`, or inline when there is none.
pub fn dispatch(executor: Option<&dyn CallbackExecutor>, task: Task) {
    match executor {
        Some(executor) => executor.execute(task),
        None => task(),
    }
}

/// Posts tasks to a [`TaskQueue`] drained by its owner.
#[derive(Clone)]
pub struct QueueExecutor {
    sender: mpsc::UnboundedSender<Task>,
}

impl fmt::Debug for QueueExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueExecutor")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

impl QueueExecutor {
    /// Create an executor and the queue it posts to.
    #[must_use]
    pub fn new() -> (Self, TaskQueue) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, TaskQueue { receiver })
    }
}

impl CallbackExecutor for QueueExecutor {
    fn execute(&self, task: Task) {
        if self.sender.send(task).is_err() {
            warn!("task queue dropped, completion discarded");
        }
    }
}

/// Receiving end of a [`QueueExecutor`].
pub struct TaskQueue {
    receiver: mpsc::UnboundedReceiver<Task>,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.receiver.len())
            .finish()
    }
}

impl TaskQueue {
    /// Run every task already queued, without waiting. Returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(task) = self.receiver.try_recv() {
            task();
            count += 1;
        }
        count
    }

    /// Wait for the next task and run it.
    ///
    /// Returns `false` once every [`QueueExecutor`] is dropped and the queue
    /// is empty.
    pub async fn run_next(&mut self) -> bool {
        match self.receiver.recv().await {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Blocking form of [`TaskQueue::run_next`] for plain threads.
    ///
    /// # Panics
    ///
    /// Panics when called from within an async runtime.
    pub fn run_next_blocking(&mut self) -> bool {
        match self.receiver.blocking_recv() {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` when no task is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Posts tasks onto a tokio runtime.
#[derive(Debug, Clone)]
pub struct RuntimeExecutor {
    handle: Handle,
}

impl RuntimeExecutor {
    /// Post tasks onto the runtime behind `handle`.
    #[must_use]
    pub const fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl CallbackExecutor for RuntimeExecutor {
    fn execute(&self, task: Task) {
        self.handle.spawn(async move { task() });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_task(counter: &Arc<AtomicUsize>) -> Task {
        let counter = Arc::clone(counter);
        Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn dispatch_without_executor_runs_inline() {
        let counter = Arc::new(AtomicUsize::new(0));
        dispatch(None, counting_task(&counter));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn queue_defers_until_drained() {
        let counter = Arc::new(AtomicUsize::new(0));
        let (executor, mut queue) = QueueExecutor::new();

        dispatch(Some(&executor), counting_task(&counter));
        dispatch(Some(&executor), counting_task(&counter));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(queue.len(), 2);

        assert_eq!(queue.run_pending(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn closed_queue_reports_end() {
        let (executor, mut queue) = QueueExecutor::new();
        drop(executor);
        assert!(!queue.run_next_blocking());
    }

    #[test]
    fn closures_are_executors() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_by_executor = Arc::clone(&seen);
        let executor = move |task: Task| {
            seen_by_executor.fetch_add(1, Ordering::SeqCst);
            task();
        };

        dispatch(Some(&executor), counting_task(&counter));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn runtime_executor_spawns() {
        let (executor, mut queue) = QueueExecutor::new();
        let runtime = RuntimeExecutor::new(Handle::current());

        runtime.execute(Box::new(move || {
            executor.execute(Box::new(|| {}));
        }));

        assert!(queue.run_next().await);
    }
}
