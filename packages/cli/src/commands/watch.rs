use super::{annotated_listing, language_for};
use crate::config::{Config, ConfigOverrides};
use crate::watcher::FileWatcher;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use interspy_editor::{AnnotationBatch, Document, Host, Session};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Script to watch
    pub file: PathBuf,

    /// Language identifier (derived from the file extension by default)
    #[arg(long)]
    pub language: Option<String>,

    /// Keep earlier output instead of clearing the screen on each pass
    #[arg(long)]
    pub no_clear: bool,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Host backed by a file on disk that prints every batch to the terminal
pub struct TerminalHost {
    path: PathBuf,
    language: String,
    clear: bool,
    /// Text the last snapshot was taken from
    text: RefCell<String>,
    passes: usize,
}

impl TerminalHost {
    pub fn new(path: PathBuf, language: String, clear: bool) -> Self {
        Self {
            path,
            language,
            clear,
            text: RefCell::new(String::new()),
            passes: 0,
        }
    }
}

impl Host for TerminalHost {
    fn document_text(&self) -> String {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => {
                *self.text.borrow_mut() = text.clone();
                text
            }
            Err(err) => {
                // mid-save the file can briefly be missing
                warn!("cannot read {}: {}", self.path.display(), err);
                self.text.borrow().clone()
            }
        }
    }

    fn language_identifier(&self) -> String {
        self.language.clone()
    }

    fn render_annotations(&mut self, batch: &AnnotationBatch) {
        self.passes += 1;
        let document = Document::new(self.text.borrow().clone());

        if self.clear {
            print!("\x1B[2J\x1B[1;1H");
        }
        println!(
            "{} {} {}",
            "👀".bright_blue(),
            self.path.display().to_string().bold(),
            format!("(pass {}, {} annotations)", self.passes, batch.len()).dimmed()
        );
        println!();
        print!("{}", annotated_listing(&document, batch));
        println!();
        println!("{}", "Press Ctrl-C to stop".dimmed());
    }
}

pub fn watch(args: WatchArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?.with_overrides(&args.overrides);
    let session_config = config.session_config()?;
    let path = if args.file.is_absolute() {
        args.file.clone()
    } else {
        Path::new(cwd).join(&args.file)
    };
    if !path.is_file() {
        return Err(anyhow::anyhow!("File does not exist: {}", path.display()));
    }
    let language = language_for(&path, args.language.as_deref());

    let runtime = tokio::runtime::Runtime::new().context("Cannot start async runtime")?;
    runtime.block_on(async move {
        let host = TerminalHost::new(path.clone(), language, !args.no_clear);
        let handle = Session::new(host, session_config)?.spawn();
        let watcher = FileWatcher::new(&path, handle.edit_sender())?;
        info!(path = %watcher.path().display(), "watching for changes");

        tokio::signal::ctrl_c()
            .await
            .context("Cannot listen for Ctrl-C")?;
        drop(watcher);

        let stats = handle.shutdown().await?;
        println!();
        println!(
            "{} Stopped watching {} ({} edits, {} passes)",
            "✓".green(),
            path.display(),
            stats.edits,
            stats.passes
        );
        Ok::<(), anyhow::Error>(())
    })
}
