//! Sequencing for multi-step exchanges.
//!
//! A [`Chain`] holds an ordered list of single-shot asynchronous steps and
//! runs them strictly one after another: each step, including everything it
//! awaits, completes before the next begins. Multi-step exchanges
//! (connect, write, read, interpret) are described by building a chain
//! instead of nesting completion callbacks at every call site.

use std::collections::VecDeque;
use std::future::Future;

use futures::future::BoxFuture;

type Step<E> = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), E>> + Send>;

pub struct Chain<E> {
    steps: VecDeque<Step<E>>,
}

impl<E> Default for Chain<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Chain<E> {
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
        }
    }

    /// Append an asynchronous step.
    pub fn add<F, Fut>(&mut self, step: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        self.steps.push_back(Box::new(move || Box::pin(step())));
    }

    /// Append a step that completes immediately.
    pub fn add_sync<F>(&mut self, step: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Send + 'static,
    {
        self.add(move || futures::future::ready(step()));
    }

    /// Run every step in FIFO order, each to full completion before the
    /// next starts. The first failing step aborts the remainder.
    ///
    /// Executing an empty chain is a programming error.
    pub async fn execute(mut self) -> Result<(), E> {
        debug_assert!(!self.steps.is_empty(), "executing an empty chain");

        while let Some(step) = self.steps.pop_front() {
            step().await?;
        }
        Ok(())
    }
}
