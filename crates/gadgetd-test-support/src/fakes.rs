//! Instrumented collaborators for gadget update tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use gadgetd_boot::{BootError, BootResult, ObserverResolution, ObserverResolver};
use gadgetd_gadget::{
    ContentChange, ContentChangeAction, ContentObserver, ContentOperation, GadgetError,
    GadgetResult, GadgetUpdater, UpdateOutcome, UpdatePolicy, UpdateRequest,
};
use gadgetd_snap::Model;
use gadgetd_state::State;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Arguments seen by one [`RecordingUpdater`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    /// Content root of the current gadget.
    pub current_root: PathBuf,
    /// Content root of the pending gadget.
    pub pending_root: PathBuf,
    /// Rollback workspace handed to the algorithm.
    pub rollback_dir: PathBuf,
    /// Whether the workspace existed when the call started.
    pub rollback_dir_existed: bool,
    /// Policy handed to the algorithm.
    pub policy: UpdatePolicy,
    /// Whether an observer was supplied.
    pub had_observer: bool,
    /// Whether the state lock was free while the algorithm ran.
    pub state_unlocked: bool,
}

/// A content write the fake algorithm reports to the observer.
#[derive(Debug, Clone)]
pub struct ObservedWrite {
    /// Structure name.
    pub structure: String,
    /// Path relative to the structure root.
    pub relative_path: String,
    /// Source file relative to the pending gadget root.
    pub source: String,
}

#[derive(Debug)]
enum Script {
    Applied,
    NoUpdate,
    Fail(&'static str),
}

/// Fake update algorithm recording each call and whether the state lock was
/// held while it ran.
#[derive(Debug)]
pub struct RecordingUpdater {
    state: State,
    script: Script,
    writes: Vec<ObservedWrite>,
    clobber_workspace: bool,
    calls: Mutex<Vec<UpdateCall>>,
}

impl RecordingUpdater {
    fn scripted(state: &State, script: Script) -> Self {
        Self {
            state: state.clone(),
            script,
            writes: Vec::new(),
            clobber_workspace: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Updater reporting that assets were written.
    #[must_use]
    pub fn applied(state: &State) -> Self {
        Self::scripted(state, Script::Applied)
    }

    /// Updater reporting that nothing needed updating.
    #[must_use]
    pub fn no_update(state: &State) -> Self {
        Self::scripted(state, Script::NoUpdate)
    }

    /// Updater failing with `message`.
    #[must_use]
    pub fn failing(state: &State, message: &'static str) -> Self {
        Self::scripted(state, Script::Fail(message))
    }

    /// Report a content write to the observer before finishing.
    #[must_use]
    pub fn with_write(mut self, structure: &str, relative_path: &str, source: &str) -> Self {
        self.writes.push(ObservedWrite {
            structure: structure.to_string(),
            relative_path: relative_path.to_string(),
            source: source.to_string(),
        });
        self
    }

    /// Replace the rollback workspace with a regular file before reporting
    /// success, so removing it afterwards fails.
    #[must_use]
    pub const fn clobbering_workspace(mut self) -> Self {
        self.clobber_workspace = true;
        self
    }

    /// Calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<UpdateCall> {
        lock(&self.calls).clone()
    }

    /// Number of calls recorded so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn notify_observer(&self, request: &mut UpdateRequest<'_>) -> GadgetResult<()> {
        let Some(observer) = request.observer.as_deref_mut() else {
            return Ok(());
        };
        observer.before_write()?;
        for write in &self.writes {
            let after = request.pending.root_dir.join(&write.source);
            let change = ContentChange {
                structure: &write.structure,
                target_root: request.rollback_dir,
                relative_path: &write.relative_path,
                after: &after,
                before: None,
            };
            observer.observe(ContentOperation::Write, &change)?;
        }
        Ok(())
    }
}

impl GadgetUpdater for RecordingUpdater {
    fn update(&self, mut request: UpdateRequest<'_>) -> GadgetResult<UpdateOutcome> {
        let state_unlocked = self.state.try_lock().is_some();
        lock(&self.calls).push(UpdateCall {
            current_root: request.current.root_dir.clone(),
            pending_root: request.pending.root_dir.clone(),
            rollback_dir: request.rollback_dir.to_path_buf(),
            rollback_dir_existed: request.rollback_dir.is_dir(),
            policy: request.policy,
            had_observer: request.observer.is_some(),
            state_unlocked,
        });

        match self.script {
            Script::Applied => {
                self.notify_observer(&mut request)?;
                if self.clobber_workspace {
                    clobber(request.rollback_dir)?;
                }
                Ok(UpdateOutcome::Applied)
            }
            Script::NoUpdate => Ok(UpdateOutcome::NoUpdate),
            Script::Fail(message) => {
                if let Some(observer) = request.observer.as_deref_mut() {
                    observer.canceled()?;
                }
                Err(GadgetError::update("write", message))
            }
        }
    }
}

fn clobber(workspace: &Path) -> GadgetResult<()> {
    fs::remove_dir_all(workspace).map_err(|err| GadgetError::update("clobber", err))?;
    fs::write(workspace, b"not a directory").map_err(|err| GadgetError::update("clobber", err))
}

/// Observer accepting every change.
#[derive(Debug, Default)]
pub struct NullObserver {
    observed: usize,
}

impl NullObserver {
    /// Number of changes observed.
    #[must_use]
    pub const fn observed(&self) -> usize {
        self.observed
    }
}

impl ContentObserver for NullObserver {
    fn observe(
        &mut self,
        _operation: ContentOperation,
        _change: &ContentChange<'_>,
    ) -> GadgetResult<ContentChangeAction> {
        self.observed += 1;
        Ok(ContentChangeAction::Apply)
    }
}

#[derive(Debug, Clone, Copy)]
enum Resolution {
    Observer,
    NotApplicable,
    Fail,
}

/// Observer resolver returning a fixed outcome and recording the models it saw.
#[derive(Debug)]
pub struct StaticObserverResolver {
    resolution: Resolution,
    models: Mutex<Vec<String>>,
}

impl StaticObserverResolver {
    fn with(resolution: Resolution) -> Self {
        Self {
            resolution,
            models: Mutex::new(Vec::new()),
        }
    }

    /// Resolver yielding a [`NullObserver`].
    #[must_use]
    pub fn observer() -> Self {
        Self::with(Resolution::Observer)
    }

    /// Resolver reporting that observation does not apply.
    #[must_use]
    pub fn not_applicable() -> Self {
        Self::with(Resolution::NotApplicable)
    }

    /// Resolver failing to set up an observer.
    #[must_use]
    pub fn failing() -> Self {
        Self::with(Resolution::Fail)
    }

    /// `brand/model` references resolved so far.
    #[must_use]
    pub fn models(&self) -> Vec<String> {
        lock(&self.models).clone()
    }
}

impl ObserverResolver for StaticObserverResolver {
    fn observer_for_model(&self, model: &Model) -> BootResult<ObserverResolution> {
        lock(&self.models).push(model.reference());
        match self.resolution {
            Resolution::Observer => Ok(ObserverResolution::Observer(Box::<NullObserver>::default())),
            Resolution::NotApplicable => Ok(ObserverResolution::NotApplicable),
            Resolution::Fail => Err(BootError::Io {
                operation: "create_cache_dir",
                path: PathBuf::from("/var/lib/snapd/boot-assets"),
                source: std::io::Error::other("read-only file system"),
            }),
        }
    }
}
