//! Execution contexts: single-owner task queues.
//!
//! Each side of a channel owns its state inside an [`ExecutionContext`]. The
//! transport never touches that state directly; it posts tasks through a
//! [`ContextHandle`] and the context runs them in order on whichever thread
//! drives it (the host's tick loop, or [`ExecutionContext::run`] on a tokio
//! task).

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::error::{HandlerError, NetError};

/// A unit of work run against a context's state.
pub type Task<S> = Box<dyn FnOnce(&mut S) -> Result<(), HandlerError> + Send>;

/// Owns a piece of state and the queue of tasks that mutate it.
pub struct ExecutionContext<S> {
    name: Arc<str>,
    state: S,
    rx: mpsc::UnboundedReceiver<Task<S>>,
    tx: mpsc::UnboundedSender<Task<S>>,
}

impl<S> std::fmt::Debug for ExecutionContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<S> ExecutionContext<S> {
    /// Wrap `state` in a new context called `name` (used in logs).
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, state: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            name: name.into(),
            state,
            rx,
            tx,
        }
    }

    /// The context's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A handle for posting tasks from other threads.
    #[must_use]
    pub fn handle(&self) -> ContextHandle<S> {
        ContextHandle {
            name: Arc::clone(&self.name),
            tx: self.tx.clone(),
        }
    }

    /// Shared access to the owned state.
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Exclusive access to the owned state, for work done on the owning
    /// thread outside of a task.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Give the state back, dropping any tasks still queued.
    pub fn into_state(self) -> S {
        self.state
    }

    /// Run every task queued so far, in submission order. Returns how many ran.
    ///
    /// A failing or panicking task is logged and does not stop the ones
    /// behind it.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(task) = self.rx.try_recv() {
            self.execute(task);
            ran += 1;
        }
        if ran > 0 {
            debug!(context = %self.name, ran, "ran queued tasks");
        }
        ran
    }

    /// Run tasks as they arrive until every [`ContextHandle`] has been
    /// dropped, then return the state.
    pub async fn run(self) -> S
    where
        S: Send,
    {
        let Self {
            name,
            mut state,
            mut rx,
            tx,
        } = self;
        drop(tx);
        while let Some(task) = rx.recv().await {
            run_task(&name, &mut state, task);
        }
        debug!(context = %name, "all handles dropped, context stopping");
        state
    }

    fn execute(&mut self, task: Task<S>) {
        run_task(&self.name, &mut self.state, task);
    }
}

fn run_task<S>(name: &str, state: &mut S, task: Task<S>) {
    match catch_unwind(AssertUnwindSafe(|| task(state))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(context = name, error = %e, "task failed"),
        Err(_) => error!(context = name, "task panicked"),
    }
}

/// Cloneable sender side of an [`ExecutionContext`].
pub struct ContextHandle<S> {
    name: Arc<str>,
    tx: mpsc::UnboundedSender<Task<S>>,
}

impl<S> Clone for ContextHandle<S> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            tx: self.tx.clone(),
        }
    }
}

impl<S> std::fmt::Debug for ContextHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<S> ContextHandle<S> {
    /// Name of the target context.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue `task` to run on the context.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::ContextClosed`] if the context has been dropped.
    pub fn run_on<F>(&self, task: F) -> Result<(), NetError>
    where
        F: FnOnce(&mut S) -> Result<(), HandlerError> + Send + 'static,
    {
        self.tx
            .send(Box::new(task))
            .map_err(|_| NetError::ContextClosed(self.name.to_string()))
    }
}
