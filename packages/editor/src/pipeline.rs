//! # Evaluation Pipeline
//!
//! One full pass over a document snapshot:
//!
//! 1. Reset the evaluator
//! 2. For every line in order: execute it, render it against the bindings
//!    as they stand right after it, and reconcile the fragment
//! 3. Prune annotations past the end of the document
//!
//! The annotation set outlives the pass; everything else is rebuilt.

use crate::annotations::{AnnotationBatch, AnnotationSet, Layout, Reconciled};
use crate::config::SessionConfig;
use crate::document::{Document, Region};
use crate::evaluators::{EvaluatorRegistry, LanguageEvaluator};
use crate::render::{AnnotationRenderer, Fragment};
use crate::EditorError;
use interspy_evaluator::{LineFailure, LineOutcome};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Runs passes for one document
#[derive(Debug)]
pub struct Pipeline {
    evaluator: Box<dyn LanguageEvaluator>,
    renderer: AnnotationRenderer,
    annotations: AnnotationSet,
    layout: Layout,
}

impl Pipeline {
    pub fn new(
        evaluator: Box<dyn LanguageEvaluator>,
        renderer: AnnotationRenderer,
        layout: Layout,
    ) -> Self {
        Self {
            evaluator,
            renderer,
            annotations: AnnotationSet::new(),
            layout,
        }
    }

    /// Pipeline for a buffer with the given language identifier
    pub fn for_language(
        registry: &EvaluatorRegistry,
        identifier: &str,
        config: &SessionConfig,
    ) -> Result<Self, EditorError> {
        let evaluator = registry
            .find(identifier)
            .ok_or_else(|| EditorError::NoEvaluator(identifier.to_string()))?;
        Ok(Self::new(
            evaluator,
            AnnotationRenderer::new(config.relevance.filter()),
            config.layout,
        ))
    }

    #[instrument(skip_all, fields(language = self.evaluator.language(), lines = document.lines().len()))]
    pub fn run(&mut self, document: &Document) -> PassResult {
        self.evaluator.reset();

        let mut summary = PassSummary {
            lines: document.lines().len(),
            ..PassSummary::default()
        };
        let mut lines = Vec::with_capacity(summary.lines);

        for (region, text) in document.iter_lines() {
            let outcome = self.evaluator.evaluate_line(text);
            let fragment = match &outcome {
                Ok(LineOutcome::Captured(_)) => {
                    summary.captured += 1;
                    self.renderer.render(self.evaluator.context(), text)
                }
                Ok(LineOutcome::Executed) => {
                    summary.executed += 1;
                    self.renderer.render(self.evaluator.context(), text)
                }
                Err(_) => {
                    summary.failed += 1;
                    None
                }
            };

            match self.annotations.reconcile(fragment.clone(), region, self.layout) {
                Reconciled::Inserted { replaced, .. } => {
                    summary.inserted += 1;
                    summary.replaced += replaced;
                }
                Reconciled::Duplicate => summary.duplicates += 1,
                Reconciled::Empty => {}
            }

            lines.push(LineResult {
                region,
                text: text.to_string(),
                outcome,
                fragment,
            });
        }

        summary.pruned = self.annotations.prune(document.len());
        summary.annotations = self.annotations.len();

        if summary.pruned > 0 {
            debug!(pruned = summary.pruned, "dropped annotations past end of document");
        }
        info!(
            executed = summary.executed,
            captured = summary.captured,
            failed = summary.failed,
            annotations = summary.annotations,
            "pass complete"
        );

        PassResult { summary, lines }
    }

    pub fn annotations(&self) -> &AnnotationSet {
        &self.annotations
    }

    pub fn batch(&self) -> AnnotationBatch {
        self.annotations.batch()
    }

    pub fn evaluator(&self) -> &dyn LanguageEvaluator {
        self.evaluator.as_ref()
    }
}

/// Counts for one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub lines: usize,
    /// Statements that ran without capturing a value
    pub executed: usize,
    /// Expression lines whose value was recorded
    pub captured: usize,
    pub failed: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub duplicates: usize,
    pub pruned: usize,
    /// Size of the annotation set after the pass
    pub annotations: usize,
}

/// What happened to one line
#[derive(Debug, Clone, PartialEq)]
pub struct LineResult {
    pub region: Region,
    pub text: String,
    pub outcome: Result<LineOutcome, LineFailure>,
    /// Rendered content, before deduplication
    pub fragment: Option<Fragment>,
}

#[derive(Debug, Clone)]
pub struct PassResult {
    pub summary: PassSummary,
    pub lines: Vec<LineResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pipeline() -> Pipeline {
        Pipeline::for_language(
            &EvaluatorRegistry::default(),
            "source.python",
            &SessionConfig::default(),
        )
        .unwrap()
    }

    fn contents(pipeline: &Pipeline) -> Vec<Vec<String>> {
        pipeline
            .annotations()
            .iter()
            .map(|a| a.fragment.items().to_vec())
            .collect()
    }

    #[test]
    fn test_unknown_language_has_no_pipeline() {
        let err = Pipeline::for_language(
            &EvaluatorRegistry::default(),
            "source.rust",
            &SessionConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EditorError::NoEvaluator(_)));
    }

    #[test]
    fn test_pass_annotates_bindings_and_expressions() {
        let mut pipeline = pipeline();
        let result = pipeline.run(&Document::new("a = 1\nb = a + 1\nb"));

        assert_eq!(result.summary.lines, 3);
        assert_eq!(result.summary.captured, 1);
        assert_eq!(
            contents(&pipeline),
            vec![
                vec!["a: 1 :: int".to_string()],
                vec!["a: 1 :: int".to_string(), "b: 2 :: int".to_string()],
                vec!["2 :: int".to_string()],
            ]
        );
    }

    #[test]
    fn test_each_line_shows_values_as_of_that_line() {
        let mut pipeline = pipeline();
        let result = pipeline.run(&Document::new("x = 1\nx\nx = 2\nx"));

        assert_eq!(result.summary.duplicates, 0);
        assert_eq!(
            contents(&pipeline),
            vec![
                vec!["x: 1 :: int".to_string()],
                vec!["1 :: int".to_string()],
                vec!["x: 2 :: int".to_string()],
                vec!["2 :: int".to_string()],
            ]
        );
    }

    #[test]
    fn test_later_assignment_does_not_leak_into_earlier_lines() {
        let mut pipeline = pipeline();
        pipeline.run(&Document::new("total = 1\ncount = total\ntotal = 10"));

        assert_eq!(
            contents(&pipeline),
            vec![
                vec!["total: 1 :: int".to_string()],
                vec!["total: 1 :: int".to_string(), "count: 1 :: int".to_string()],
                vec!["total: 10 :: int".to_string()],
            ]
        );
    }

    #[test]
    fn test_failing_line_is_not_annotated() {
        let mut pipeline = pipeline();
        let result = pipeline.run(&Document::new("x = 1/0"));
        assert_eq!(result.summary.failed, 1);
        assert!(result.lines[0].fragment.is_none());
        assert!(pipeline.annotations().is_empty());
        assert!(pipeline.evaluator().context().bindings().is_empty());
    }

    #[test]
    fn test_second_pass_on_same_text_is_idempotent() {
        let mut pipeline = pipeline();
        let document = Document::new("a = 1\nb = a * 2\nb\nc = [a, b]");
        pipeline.run(&document);
        let first = pipeline.batch();

        let result = pipeline.run(&document);
        assert_eq!(result.summary.inserted, 0);
        assert_eq!(pipeline.batch(), first);
    }

    #[test]
    fn test_changed_line_replaces_its_annotation() {
        let mut pipeline = pipeline();
        pipeline.run(&Document::new("a = 1\na"));
        let before: Vec<_> = pipeline.batch().handles().collect();

        let result = pipeline.run(&Document::new("a = 2\na"));
        assert_eq!(result.summary.replaced, 2);
        let after: Vec<_> = pipeline.batch().handles().collect();
        assert_eq!(after.len(), 2);
        assert!(after.iter().all(|handle| !before.contains(handle)));
    }

    #[test]
    fn test_shrinking_document_prunes_annotations() {
        let mut pipeline = pipeline();
        pipeline.run(&Document::new("a = 1\nbb = 22222\nbb"));
        assert_eq!(pipeline.annotations().len(), 3);

        let result = pipeline.run(&Document::new("a = 1"));
        assert_eq!(result.summary.pruned, 2);
        assert_eq!(contents(&pipeline), vec![vec!["a: 1 :: int".to_string()]]);
    }

    #[test]
    fn test_identical_content_on_two_lines_is_shown_once() {
        let mut pipeline = pipeline();
        let result = pipeline.run(&Document::new("x = 5\ny = 1\nx + 0\nx + 0"));
        assert_eq!(result.summary.duplicates, 1);
        assert_eq!(pipeline.annotations().len(), 3);
        assert!(result.lines[3].fragment.is_some());
    }
}
