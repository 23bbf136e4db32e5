use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::info;

use crate::config::ServiceSettings;

use super::{Runner, RunnerError};

type RunnerFactory = dyn Fn() -> Result<Runner, RunnerError> + Send + Sync;

struct Inner {
    runner: OnceLock<Arc<Runner>>,
    init_lock: Mutex<()>,
    factory: Box<RunnerFactory>,
}

/// Shared, lazily constructed [`Runner`].
///
/// Clones share the same runner. Once initialized, reads are lock-free. Construction happens
/// under a mutex with a second check, so concurrent first callers build exactly one runner and
/// all of them observe it. A failed construction leaves the cell empty.
#[derive(Clone)]
pub struct RunnerCell {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RunnerCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerCell")
            .field("initialized", &self.inner.runner.get().is_some())
            .finish()
    }
}

impl RunnerCell {
    /// A cell that builds its runner from `settings` on first use.
    pub fn new(settings: ServiceSettings) -> Self {
        Self::with_factory(move || Runner::new(&settings))
    }

    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> Result<Runner, RunnerError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                runner: OnceLock::new(),
                init_lock: Mutex::new(()),
                factory: Box::new(factory),
            }),
        }
    }

    /// An already-initialized cell.
    pub fn from_runner(runner: Runner) -> Self {
        let cell = Self::with_factory(|| {
            Err(RunnerError::WorkerFailed {
                reason: "runner cell was initialized from an existing runner".to_string(),
            })
        });
        let _ = cell.inner.runner.set(Arc::new(runner));
        cell
    }

    /// The runner, if it has been constructed.
    pub fn get(&self) -> Option<Arc<Runner>> {
        self.inner.runner.get().cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.runner.get().is_some()
    }

    /// Returns the runner, constructing it on the current thread if needed.
    pub fn get_or_init_blocking(&self) -> Result<Arc<Runner>, RunnerError> {
        if let Some(runner) = self.inner.runner.get() {
            return Ok(Arc::clone(runner));
        }

        let _guard = self.inner.init_lock.lock();
        if let Some(runner) = self.inner.runner.get() {
            return Ok(Arc::clone(runner));
        }

        info!("Constructing AlignScore runner");
        let runner = Arc::new((self.inner.factory)()?);
        runner.log_loaded();

        // Only this thread can set the cell while the init lock is held.
        let _ = self.inner.runner.set(Arc::clone(&runner));
        Ok(runner)
    }

    /// Returns the runner, constructing it on the blocking pool if needed.
    pub async fn get_or_init(&self) -> Result<Arc<Runner>, RunnerError> {
        if let Some(runner) = self.get() {
            return Ok(runner);
        }

        let cell = self.clone();
        tokio::task::spawn_blocking(move || cell.get_or_init_blocking())
            .await
            .map_err(|e| RunnerError::WorkerFailed {
                reason: e.to_string(),
            })?
    }
}
