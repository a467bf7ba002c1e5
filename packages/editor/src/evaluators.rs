//! Language evaluators and the registry that matches them to a host buffer.

use interspy_evaluator::{EvalContext, LineFailure, LineOutcome};
use std::fmt;

/// Runs one language line by line for the live pass
pub trait LanguageEvaluator: fmt::Debug + Send {
    /// Language name matched against the host's language identifier
    fn language(&self) -> &'static str;

    /// Forget all state from the previous pass
    fn reset(&mut self);

    fn evaluate_line(&mut self, text: &str) -> Result<LineOutcome, LineFailure>;

    /// Bindings and expression records of the current pass
    fn context(&self) -> &EvalContext;
}

/// Evaluator for the Python-subset script language
#[derive(Debug, Default)]
pub struct ScriptEvaluator {
    context: EvalContext,
}

impl ScriptEvaluator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LanguageEvaluator for ScriptEvaluator {
    fn language(&self) -> &'static str {
        "python"
    }

    fn reset(&mut self) {
        self.context.reset();
    }

    fn evaluate_line(&mut self, text: &str) -> Result<LineOutcome, LineFailure> {
        self.context.evaluate_line(text)
    }

    fn context(&self) -> &EvalContext {
        &self.context
    }
}

fn script_evaluator() -> Box<dyn LanguageEvaluator> {
    Box::new(ScriptEvaluator::new())
}

pub type EvaluatorFactory = fn() -> Box<dyn LanguageEvaluator>;

#[derive(Clone)]
struct Registration {
    names: Vec<String>,
    create: EvaluatorFactory,
}

/// Known evaluators, checked in registration order
#[derive(Clone)]
pub struct EvaluatorRegistry {
    registrations: Vec<Registration>,
}

impl Default for EvaluatorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(&["python", "interspy"], script_evaluator);
        registry
    }
}

impl fmt::Debug for EvaluatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.registrations.iter().map(|r| &r.names))
            .finish()
    }
}

impl EvaluatorRegistry {
    pub fn empty() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    pub fn register(&mut self, names: &[&str], create: EvaluatorFactory) {
        self.registrations.push(Registration {
            names: names.iter().map(|name| name.to_lowercase()).collect(),
            create,
        });
    }

    /// Evaluator whose name occurs in `identifier`, ignoring case.
    /// Hosts pass identifiers such as `source.python` or `Python`.
    pub fn find(&self, identifier: &str) -> Option<Box<dyn LanguageEvaluator>> {
        let identifier = identifier.to_lowercase();
        self.registrations
            .iter()
            .find(|r| r.names.iter().any(|name| identifier.contains(name.as_str())))
            .map(|r| (r.create)())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interspy_evaluator::Value;

    #[test]
    fn test_gate_is_case_insensitive_substring() {
        let registry = EvaluatorRegistry::default();
        assert!(registry.find("source.python").is_some());
        assert!(registry.find("Python").is_some());
        assert!(registry.find("text.interspy").is_some());
        assert!(registry.find("source.rust").is_none());
        assert!(registry.find("").is_none());
    }

    #[test]
    fn test_found_evaluator_runs_lines() {
        let mut evaluator = EvaluatorRegistry::default().find("python").unwrap();
        assert_eq!(evaluator.language(), "python");
        evaluator.evaluate_line("n = 4").unwrap();
        assert_eq!(evaluator.context().binding("n"), Some(&Value::Int(4)));
        evaluator.reset();
        assert!(evaluator.context().bindings().is_empty());
    }

    #[test]
    fn test_empty_registry_finds_nothing() {
        assert!(EvaluatorRegistry::empty().find("python").is_none());
    }
}
