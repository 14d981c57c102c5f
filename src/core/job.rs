//! Job trait and related types

use crate::core::error::Result;
use std::fmt;

/// A trait representing a unit of work to be executed by the thread pool
pub trait Job: Send {
    /// Execute the job
    ///
    /// # Errors
    ///
    /// Returns an error if the job execution fails. The pool logs and counts
    /// the failure; it is never reported back to the submitter.
    fn execute(&mut self) -> Result<()>;

    /// Get the job's type name for debugging and statistics
    fn job_type(&self) -> &str {
        "Job"
    }
}

impl fmt::Debug for dyn Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Job({})", self.job_type())
    }
}

/// A boxed job that can be sent across threads
pub type BoxedJob = Box<dyn Job>;

impl<J: Job + ?Sized> Job for Box<J> {
    fn execute(&mut self) -> Result<()> {
        (**self).execute()
    }

    fn job_type(&self) -> &str {
        (**self).job_type()
    }
}

/// Helper to create a job from a closure
pub struct ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    closure: Option<F>,
    name: String,
}

impl<F> ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    /// Create a new closure job
    pub fn new(closure: F) -> Self {
        Self {
            closure: Some(closure),
            name: "ClosureJob".to_string(),
        }
    }

    /// Create a new closure job with a custom name
    pub fn with_name<S: Into<String>>(closure: F, name: S) -> Self {
        Self {
            closure: Some(closure),
            name: name.into(),
        }
    }
}

impl<F> Job for ClosureJob<F>
where
    F: FnOnce() -> Result<()> + Send,
{
    fn execute(&mut self) -> Result<()> {
        if let Some(closure) = self.closure.take() {
            closure()
        } else {
            Err(crate::core::ThreadError::other(
                "ClosureJob already executed - cannot execute twice",
            ))
        }
    }

    fn job_type(&self) -> &str {
        &self.name
    }
}

/// A function paired with the argument it consumes.
///
/// The argument is owned by the job from submission onwards and is dropped
/// as soon as the function returns, on the worker that ran it.
pub struct ArgJob<F, A>
where
    F: FnOnce(A) + Send,
    A: Send,
{
    task: Option<(F, A)>,
}

impl<F, A> ArgJob<F, A>
where
    F: FnOnce(A) + Send,
    A: Send,
{
    /// Create a job that calls `func(arg)` once
    pub fn new(func: F, arg: A) -> Self {
        Self {
            task: Some((func, arg)),
        }
    }

    /// Take the argument back from a job that never ran
    pub fn into_arg(self) -> Option<A> {
        self.task.map(|(_, arg)| arg)
    }
}

impl<F, A> Job for ArgJob<F, A>
where
    F: FnOnce(A) + Send,
    A: Send,
{
    fn execute(&mut self) -> Result<()> {
        match self.task.take() {
            Some((func, arg)) => {
                func(arg);
                Ok(())
            }
            None => Err(crate::core::ThreadError::other(
                "ArgJob already executed - cannot execute twice",
            )),
        }
    }

    fn job_type(&self) -> &str {
        "ArgJob"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_closure_job() {
        let mut job = ClosureJob::new(|| Ok(()));

        assert_eq!(job.job_type(), "ClosureJob");
        assert!(job.execute().is_ok());
        assert!(job.execute().is_err());
    }

    #[test]
    fn test_closure_job_with_name() {
        let job = ClosureJob::with_name(|| Ok(()), "TestJob");
        assert_eq!(job.job_type(), "TestJob");
    }

    #[test]
    fn test_arg_job_releases_argument_after_run() {
        let arg = Arc::new(AtomicUsize::new(0));
        let witness = Arc::downgrade(&arg);

        let mut job = ArgJob::new(
            |n: Arc<AtomicUsize>| {
                n.fetch_add(7, Ordering::SeqCst);
            },
            arg,
        );
        assert_eq!(job.job_type(), "ArgJob");
        assert!(witness.upgrade().is_some());

        job.execute().expect("first run succeeds");
        assert!(witness.upgrade().is_none(), "argument should be dropped");
        assert!(job.execute().is_err());
    }

    #[test]
    fn test_arg_job_hands_back_unused_argument() {
        let job = ArgJob::new(|_: String| {}, String::from("unused"));
        assert_eq!(job.into_arg().as_deref(), Some("unused"));

        let mut job = ArgJob::new(|_: String| {}, String::from("used"));
        job.execute().expect("run succeeds");
        assert!(job.into_arg().is_none());
    }

    #[test]
    fn test_boxed_job_delegates() {
        let job: BoxedJob = Box::new(ClosureJob::with_name(|| Ok(()), "Inner"));
        let mut outer: Box<BoxedJob> = Box::new(job);
        assert_eq!(outer.job_type(), "Inner");
        assert!(outer.execute().is_ok());
    }
}
