//! Per-call deadline and cancellation.
//!
//! Every facade operation takes an [`OperationContext`]. A context carries an
//! optional deadline and an optional cancellation signal; `run` races the
//! store call against both.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Why an operation stopped before finishing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Interrupted {
    Cancelled,
    DeadlineExceeded,
}

/// Deadline and cancellation scope for one operation.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    deadline: Option<Instant>,
    cancel: Option<watch::Receiver<bool>>,
}

/// Cancels every context cloned from the one it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // send_replace never fails, even with no receivers left.
        self.sender.send_replace(true);
    }
}

impl OperationContext {
    /// No deadline and no cancellation.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().deadline_after(timeout)
    }

    /// A context with no deadline plus the handle that cancels it.
    pub fn cancellable() -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        let ctx = Self {
            deadline: None,
            cancel: Some(receiver),
        };
        (ctx, CancelHandle { sender })
    }

    /// Tighten the deadline to `timeout` from now. An earlier deadline wins.
    pub fn deadline_after(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Check the context without running anything.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(Interrupted::DeadlineExceeded);
        }
        Ok(())
    }

    /// Drive `fut` until it finishes, the deadline passes, or the context is
    /// cancelled, whichever comes first. An interrupted `fut` is dropped.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, Interrupted>
    where
        F: Future<Output = T>,
    {
        self.check()?;

        let mut cancel = self.cancel.clone();
        let cancelled = async move {
            match cancel.as_mut() {
                Some(rx) => {
                    let closed = rx.wait_for(|c| *c).await.is_err();
                    // A dropped handle can never cancel.
                    if closed {
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        let work = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| Interrupted::DeadlineExceeded),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(Interrupted::Cancelled),
            result = work => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_context_runs_to_completion() {
        let ctx = OperationContext::background();
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn expired_deadline_fails_before_polling() {
        let ctx = OperationContext::with_timeout(Duration::ZERO);
        let result = ctx.run(async { panic!("must not be polled") }).await;
        assert_eq!(result, Err::<(), _>(Interrupted::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_work_hits_the_deadline() {
        let ctx = OperationContext::with_timeout(Duration::from_millis(50));
        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert_eq!(result, Err(Interrupted::DeadlineExceeded));
    }

    #[tokio::test]
    async fn cancelled_context_stops_pending_work() {
        let (ctx, handle) = OperationContext::cancellable();
        let task = {
            let ctx = ctx.clone();
            tokio::spawn(async move { ctx.run(std::future::pending::<()>()).await })
        };

        handle.cancel();
        assert_eq!(task.await.unwrap(), Err(Interrupted::Cancelled));
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn dropped_handle_never_cancels() {
        let (ctx, handle) = OperationContext::cancellable();
        drop(handle);
        assert_eq!(ctx.run(async { "done" }).await, Ok("done"));
    }

    #[test]
    fn earlier_deadline_wins() {
        let ctx = OperationContext::with_timeout(Duration::from_secs(1))
            .deadline_after(Duration::from_secs(60));
        let deadline = ctx.deadline().unwrap();
        assert!(deadline <= Instant::now() + Duration::from_secs(1));
    }
}
