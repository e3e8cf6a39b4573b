//! Daemon context - shared state for the periodic loops.
//!
//! DaemonContext owns everything the engine and recovery loops need: the
//! task store behind an async mutex and the publishing collaborators
//! behind their trait objects. Tests construct one with fakes.

use crate::config::Config;
use crate::error::Result;
use crate::publish::{ContentGenerator, HttpContentGenerator, HttpPublisher, Publisher};
use crate::store::TaskStore;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared dependencies for daemon loops and CLI commands.
pub struct DaemonContext {
    pub config: Config,
    pub store: Arc<Mutex<TaskStore>>,
    pub generator: Arc<dyn ContentGenerator>,
    pub publisher: Arc<dyn Publisher>,
}

impl DaemonContext {
    /// Build a production context: store on disk, HTTP collaborators.
    pub fn new(config: Config) -> Result<Self> {
        let store = match &config.storage.taskstore_dir {
            Some(dir) => TaskStore::open_at(dir)?,
            None => {
                let cwd = std::env::current_dir()
                    .map_err(|e| crate::error::PostrError::Storage(format!("cannot resolve current directory: {}", e)))?;
                TaskStore::open(&cwd)?
            }
        };
        let generator = HttpContentGenerator::new(&config.api)?;
        let publisher = HttpPublisher::new(&config.api)?;

        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            generator: Arc::new(generator),
            publisher: Arc::new(publisher),
            config,
        })
    }

    /// Build a context around explicit collaborators.
    pub fn with_collaborators(
        config: Config,
        store: TaskStore,
        generator: Arc<dyn ContentGenerator>,
        publisher: Arc<dyn Publisher>,
    ) -> Self {
        Self {
            config,
            store: Arc::new(Mutex::new(store)),
            generator,
            publisher,
        }
    }
}
