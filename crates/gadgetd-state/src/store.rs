//! The shared state handle and its critical section.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};

use chrono::Utc;
use gadgetd_snap::Model;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{error, info, warn};

use crate::error::{StateError, StateResult};
use crate::restart::{RestartRequest, RestartType};
use crate::snapstate::SnapState;
use crate::task::{Change, ChangeId, Task, TaskId};

#[derive(Debug, Default)]
struct StateData {
    changes: HashMap<ChangeId, Change>,
    tasks: HashMap<TaskId, Task>,
    model: Option<Model>,
    remodel_contexts: HashMap<ChangeId, Model>,
    snaps: BTreeMap<String, SnapState>,
    restarts: Vec<RestartRequest>,
}

#[derive(Debug)]
struct Inner {
    data: Mutex<StateData>,
    restart_tx: Option<UnboundedSender<RestartRequest>>,
}

/// Process-wide state store. Cloning yields another handle to the same store.
#[derive(Debug, Clone)]
pub struct State {
    inner: Arc<Inner>,
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl State {
    /// Empty state without a restart listener.
    #[must_use]
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Empty state delivering restart requests to the returned receiver.
    #[must_use]
    pub fn with_restart_channel() -> (Self, UnboundedReceiver<RestartRequest>) {
        let (tx, rx) = unbounded_channel();
        (Self::build(Some(tx)), rx)
    }

    fn build(restart_tx: Option<UnboundedSender<RestartRequest>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                data: Mutex::new(StateData::default()),
                restart_tx,
            }),
        }
    }

    /// Acquire the exclusive state lock, blocking until it is available.
    #[must_use]
    pub fn lock(&self) -> StateGuard<'_> {
        StateGuard {
            state: self,
            guard: Some(self.acquire()),
        }
    }

    /// Acquire the lock only if nobody holds it.
    #[must_use]
    pub fn try_lock(&self) -> Option<StateGuard<'_>> {
        let guard = match self.inner.data.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return None,
            Err(TryLockError::Poisoned(poisoned)) => {
                error!("state mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        };
        Some(StateGuard {
            state: self,
            guard: Some(guard),
        })
    }

    fn acquire(&self) -> MutexGuard<'_, StateData> {
        match self.inner.data.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("state mutex poisoned; continuing with recovered guard");
                poisoned.into_inner()
            }
        }
    }
}

/// Exclusive access to the state. Dropping the guard releases the lock.
#[derive(Debug)]
pub struct StateGuard<'a> {
    state: &'a State,
    guard: Option<MutexGuard<'a, StateData>>,
}

impl<'a> StateGuard<'a> {
    /// Release the lock while `f` runs and re-acquire it before returning,
    /// including when `f` unwinds.
    pub fn unlocked<R>(&mut self, f: impl FnOnce() -> R) -> R {
        struct Relock<'g, 's> {
            guard: &'g mut StateGuard<'s>,
        }

        impl Drop for Relock<'_, '_> {
            fn drop(&mut self) {
                let state = self.guard.state;
                self.guard.guard = Some(state.acquire());
            }
        }

        self.guard = None;
        let _relock = Relock { guard: self };
        f()
    }

    /// Handle of the store this guard locks.
    #[must_use]
    pub const fn state(&self) -> &'a State {
        self.state
    }

    fn data(&self) -> &StateData {
        match self.guard.as_deref() {
            Some(data) => data,
            None => unreachable!("state accessed while unlocked"),
        }
    }

    fn data_mut(&mut self) -> &mut StateData {
        match self.guard.as_deref_mut() {
            Some(data) => data,
            None => unreachable!("state accessed while unlocked"),
        }
    }

    /// Create an empty change.
    pub fn new_change(&mut self, kind: &str, summary: &str) -> ChangeId {
        let change = Change::new(kind, summary);
        let id = change.id();
        self.data_mut().changes.insert(id, change);
        id
    }

    /// Create a pending task inside `change`.
    ///
    /// # Errors
    ///
    /// Returns `StateError::ChangeNotFound` for unknown changes.
    pub fn new_task(&mut self, change: ChangeId, kind: &str, summary: &str) -> StateResult<TaskId> {
        let task = Task::new(change, kind, summary);
        let id = task.id();
        let data = self.data_mut();
        data.changes
            .get_mut(&change)
            .ok_or(StateError::ChangeNotFound { change_id: change })?
            .push_task(id);
        data.tasks.insert(id, task);
        Ok(id)
    }

    /// Look up a change.
    #[must_use]
    pub fn change(&self, id: ChangeId) -> Option<&Change> {
        self.data().changes.get(&id)
    }

    /// Look up a task.
    ///
    /// # Errors
    ///
    /// Returns `StateError::TaskNotFound` for unknown tasks.
    pub fn task(&self, id: TaskId) -> StateResult<&Task> {
        self.data()
            .tasks
            .get(&id)
            .ok_or(StateError::TaskNotFound { task_id: id })
    }

    /// Look up a task for modification.
    ///
    /// # Errors
    ///
    /// Returns `StateError::TaskNotFound` for unknown tasks.
    pub fn task_mut(&mut self, id: TaskId) -> StateResult<&mut Task> {
        self.data_mut()
            .tasks
            .get_mut(&id)
            .ok_or(StateError::TaskNotFound { task_id: id })
    }

    /// Record the model the device currently runs.
    pub fn set_model(&mut self, model: Model) {
        self.data_mut().model = Some(model);
    }

    /// Model the device currently runs, if seeded.
    #[must_use]
    pub fn model(&self) -> Option<&Model> {
        self.data().model.as_ref()
    }

    /// Register the candidate model of a remodel change.
    pub fn set_remodel_context(&mut self, change: ChangeId, candidate: Model) {
        self.data_mut().remodel_contexts.insert(change, candidate);
    }

    /// Candidate model of a remodel change.
    #[must_use]
    pub fn remodel_context(&self, change: ChangeId) -> Option<&Model> {
        self.data().remodel_contexts.get(&change)
    }

    /// Record the installation state of a snap.
    pub fn set_snap_state(&mut self, name: &str, snap_state: SnapState) {
        self.data_mut().snaps.insert(name.to_string(), snap_state);
    }

    /// Installation state of a snap.
    #[must_use]
    pub fn snap_state(&self, name: &str) -> Option<&SnapState> {
        self.data().snaps.get(name)
    }

    /// Ask the owning environment to restart. Delivery is fire-and-forget.
    pub fn request_restart(&mut self, restart_type: RestartType) {
        let request = RestartRequest {
            restart_type,
            requested_at: Utc::now(),
        };
        self.data_mut().restarts.push(request.clone());
        info!(restart = ?restart_type, "restart requested");

        match self.state.inner.restart_tx.as_ref() {
            Some(tx) => {
                if tx.send(request).is_err() {
                    warn!(restart = ?restart_type, "restart listener closed; request recorded only");
                }
            }
            None => warn!(restart = ?restart_type, "no restart listener; request recorded only"),
        }
    }

    /// Restart requests issued so far.
    #[must_use]
    pub fn restart_requests(&self) -> &[RestartRequest] {
        &self.data().restarts
    }
}
