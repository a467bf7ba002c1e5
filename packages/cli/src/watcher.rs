use interspy_editor::EditSender;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to create watcher: {0}")]
    CreateError(#[from] notify::Error),

    #[error("Cannot watch {0}: not a file path")]
    InvalidPath(String),
}

pub type WatcherResult<T> = Result<T, WatcherError>;

/// Forwards changes to one file as edit notifications.
///
/// Watches the parent directory; saves that replace the file via rename
/// show up as a create event for the file name.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
}

impl FileWatcher {
    pub fn new(path: &Path, edits: EditSender) -> WatcherResult<Self> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| WatcherError::InvalidPath(path.display().to_string()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_change_to(&event, &file_name) => {
                    debug!(kind = ?event.kind, "file changed");
                    // the session is gone once the command is shutting down
                    let _ = edits.notify();
                }
                Ok(_) => {}
                Err(err) => warn!("watch error: {}", err),
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn is_change_to(event: &Event, file_name: &OsString) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name.as_os_str()))
}
