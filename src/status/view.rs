use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use clap::ValueEnum;

use crate::config::Settings;

/// Key under which the build status is written to a view's status bar.
pub const STATUS_BAR_KEY: &str = "(.0.travis-ci-status";

/// Host notifications that make the pipeline re-evaluate a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TriggerEvent {
    Opened,
    Cloned,
    Loaded,
    Closed,
    Saved,
    Activated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub u64);

/// Write-only status bar primitives exposed by the host for one view.
///
/// Animator ticks write from a timer task, hence `Send + Sync`.
pub trait StatusSink: Send + Sync {
    fn set_status(&self, key: &str, text: &str);
    fn erase_status(&self, key: &str);
}

/// A display target as seen by the controller.
#[derive(Clone)]
pub struct View {
    pub id: ViewId,
    /// Path of the file on disk, `None` for unsaved buffers
    pub file_name: Option<PathBuf>,
    pub is_scratch: bool,
    pub is_widget: bool,
    /// View-level settings, consulted before the global ones
    pub settings: Settings,
    pub sink: Arc<dyn StatusSink>,
}

impl View {
    pub fn new(id: ViewId, file_name: Option<PathBuf>, sink: Arc<dyn StatusSink>) -> Self {
        Self {
            id,
            file_name,
            is_scratch: false,
            is_widget: false,
            settings: Settings::default(),
            sink,
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Scratch buffers and widgets (find panels, consoles) never get a status.
    pub fn is_internal(&self) -> bool {
        self.is_scratch || self.is_widget
    }
}

/// Keeps the status texts in memory, one entry per key.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemorySink {
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    /// Number of `set_status` calls received so far.
    #[cfg(test)]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl StatusSink for MemorySink {
    fn set_status(&self, key: &str, text: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), text.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn erase_status(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }
}
