//! Drives a task handler and records its outcome on the task.

use std::error::Error;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};

use tracing::{debug, error, info_span};

use crate::error::{StateError, describe_error};
use crate::store::State;
use crate::task::{TaskId, TaskStatus};

/// Runs task handlers against a shared [`State`].
#[derive(Debug, Clone)]
pub struct TaskRunner {
    state: State,
}

impl TaskRunner {
    /// Runner bound to `state`.
    #[must_use]
    pub const fn new(state: State) -> Self {
        Self { state }
    }

    /// State the runner operates on.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Mark `task` running, invoke `handler` without holding the lock, then
    /// record the outcome. A handler that already finalized the task keeps
    /// its status. A panicking handler leaves the task in error before the
    /// panic continues.
    ///
    /// # Errors
    ///
    /// Returns the handler's error after recording it on the task, or a
    /// state error when the task does not exist.
    pub fn run<E, F>(&self, task: TaskId, handler: F) -> Result<TaskStatus, E>
    where
        E: Error + From<StateError> + 'static,
        F: FnOnce() -> Result<(), E>,
    {
        let (kind, summary, change) = {
            let mut guard = self.state.lock();
            let entry = guard.task_mut(task)?;
            entry.set_status(TaskStatus::Running);
            let kind = entry.kind().to_string();
            let summary = entry.summary().to_string();
            let change = entry.change();
            let change_kind = guard
                .change(change)
                .map(|owner| owner.kind().to_string())
                .unwrap_or_default();
            (kind, summary, change_kind)
        };
        let span = info_span!(
            "task",
            task_id = %task,
            kind = %kind,
            summary = %summary,
            change = %change
        );
        let _entered = span.enter();

        let outcome = match catch_unwind(AssertUnwindSafe(handler)) {
            Ok(outcome) => outcome,
            Err(payload) => {
                let mut guard = self.state.lock();
                if let Ok(entry) = guard.task_mut(task) {
                    entry.errorf("task handler panicked");
                    entry.set_status(TaskStatus::Error);
                }
                error!("task handler panicked");
                drop(guard);
                resume_unwind(payload);
            }
        };

        let mut guard = self.state.lock();
        let entry = guard.task_mut(task)?;
        match outcome {
            Ok(()) => {
                if !entry.status().is_terminal() {
                    entry.set_status(TaskStatus::Done);
                }
                debug!(status = entry.status().as_str(), "task finished");
                Ok(entry.status())
            }
            Err(err) => {
                let rendered = describe_error(&err);
                entry.errorf(rendered.clone());
                entry.set_status(TaskStatus::Error);
                error!(error = %rendered, "task failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::LogLevel;
    use anyhow::Result;
    use thiserror::Error;

    #[derive(Debug, Error)]
    enum HandlerError {
        #[error("handler failed")]
        Failed,
        #[error("state failure")]
        State(#[from] StateError),
    }

    fn setup() -> Result<(TaskRunner, TaskId)> {
        let state = State::new();
        let task = {
            let mut guard = state.lock();
            let change = guard.new_change("refresh-snap", "Refresh");
            guard.new_task(change, "update-gadget-assets", "Update")?
        };
        Ok((TaskRunner::new(state), task))
    }

    #[test]
    fn successful_handler_marks_done() -> Result<()> {
        let (runner, task) = setup()?;
        let status = runner.run(task, || -> Result<(), HandlerError> {
            let guard = runner.state().lock();
            assert_eq!(guard.task(task)?.status(), TaskStatus::Running);
            Ok(())
        })?;
        assert_eq!(status, TaskStatus::Done);
        Ok(())
    }

    #[test]
    fn failing_handler_records_error() -> Result<()> {
        let (runner, task) = setup()?;
        let result = runner.run(task, || Err(HandlerError::Failed));
        assert!(matches!(result, Err(HandlerError::Failed)));
        let guard = runner.state().lock();
        let entry = guard.task(task)?;
        assert_eq!(entry.status(), TaskStatus::Error);
        assert_eq!(entry.log().last().map(|line| line.level), Some(LogLevel::Error));
        Ok(())
    }

    #[test]
    fn handler_status_is_preserved() -> Result<()> {
        let (runner, task) = setup()?;
        let status = runner.run(task, || -> Result<(), HandlerError> {
            let mut guard = runner.state().lock();
            guard.task_mut(task)?.set_status(TaskStatus::Done);
            Ok(())
        })?;
        assert_eq!(status, TaskStatus::Done);
        Ok(())
    }

    #[test]
    fn panicking_handler_leaves_task_in_error() -> Result<()> {
        let (runner, task) = setup()?;
        let unwound = std::panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = runner.run(task, || -> Result<(), HandlerError> {
                panic!("update algorithm crashed")
            });
        }));
        assert!(unwound.is_err());
        let guard = runner.state().lock();
        let entry = guard.task(task)?;
        assert_eq!(entry.status(), TaskStatus::Error);
        assert_eq!(
            entry.log().last().map(|line| line.message.as_str()),
            Some("task handler panicked")
        );
        Ok(())
    }

    #[test]
    fn unknown_task_is_rejected() {
        let runner = TaskRunner::new(State::new());
        let result = runner.run(TaskId::new(), || Ok::<_, HandlerError>(()));
        assert!(matches!(
            result,
            Err(HandlerError::State(StateError::TaskNotFound { .. }))
        ));
    }
}
