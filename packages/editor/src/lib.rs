//! # Interspy Editor
//!
//! Live annotation engine: evaluates a script buffer line by line and shows
//! each line's values next to it in the host editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ host: buffer text, line spans, render sink  │
//! └─────────────────────────────────────────────┘
//!            ↓ edits                ↑ batches
//! ┌─────────────────────────────────────────────┐
//! │ session: scheduler (debounce + tick)        │
//! │  - one task per buffer                      │
//! │  - runs a pass when edits have settled      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ pipeline: evaluate → render → reconcile     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ evaluator: line → bindings / value          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ### One pass
//!
//! ```rust
//! use interspy_editor::{Document, EvaluatorRegistry, Pipeline, SessionConfig};
//!
//! let mut pipeline = Pipeline::for_language(
//!     &EvaluatorRegistry::default(),
//!     "source.python",
//!     &SessionConfig::default(),
//! )?;
//! pipeline.run(&Document::new("a = 1\nb = a + 1\nb"));
//!
//! let batch = pipeline.batch();
//! assert_eq!(batch.items[2].items, vec!["2 :: int".to_string()]);
//! # Ok::<(), interspy_editor::EditorError>(())
//! ```
//!
//! ### Live session
//!
//! ```rust,ignore
//! use interspy_editor::{Session, SessionConfig};
//!
//! let handle = Session::new(host, SessionConfig::default())?.spawn();
//! handle.notify_edit()?; // on every buffer change
//! let stats = handle.shutdown().await?;
//! ```

mod annotations;
mod config;
mod document;
mod errors;
mod evaluators;
mod host;
mod pipeline;
mod render;
mod scheduler;
mod session;

pub use annotations::{
    reconcile, Annotation, AnnotationBatch, AnnotationSet, AnnotationView, DisplayHandle, Layout,
    Reconciled,
};
pub use config::{SessionConfig, DEFAULT_DEBOUNCE, DEFAULT_TICK_INTERVAL};
pub use document::{Document, Region};
pub use errors::EditorError;
pub use evaluators::{EvaluatorFactory, EvaluatorRegistry, LanguageEvaluator, ScriptEvaluator};
pub use host::Host;
pub use pipeline::{LineResult, PassResult, PassSummary, Pipeline};
pub use render::{
    escape_html, AnnotationRenderer, Fragment, FragmentKind, IdentifierMatch, Relevance,
    RelevanceFilter, SubstringRelevance,
};
pub use scheduler::{SchedulerState, UpdateScheduler};
pub use session::{EditSender, Session, SessionHandle, SessionStats};

// Re-export evaluator types hosts commonly need
pub use interspy_evaluator::{EvalContext, LineFailure, LineOutcome, Value};
