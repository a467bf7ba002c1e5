use super::{annotated_listing, language_for};
use crate::config::{Config, ConfigOverrides};
use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use interspy_editor::{
    AnnotationBatch, Document, EvaluatorRegistry, LineFailure, PassResult, PassSummary, Pipeline,
    SessionConfig,
};
use interspy_parser::format_error;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct EvalArgs {
    /// Script to evaluate
    pub file: PathBuf,

    /// Show why lines were skipped
    #[arg(long)]
    pub explain: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Language identifier (derived from the file extension by default)
    #[arg(long)]
    pub language: Option<String>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// A line that did not run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line: usize,
    pub text: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingReport {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Machine-readable result of `interspy eval --format json`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalReport {
    pub file: String,
    pub language: String,
    pub summary: PassSummary,
    pub skipped: Vec<SkippedLine>,
    pub bindings: Vec<BindingReport>,
    pub annotations: AnnotationBatch,
}

/// One evaluated file
pub struct Evaluation {
    pub language: String,
    pub document: Document,
    pub pipeline: Pipeline,
    pub result: PassResult,
}

impl Evaluation {
    pub fn run(path: &Path, language: &str, config: &SessionConfig) -> Result<Self> {
        let document = Document::load(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let mut pipeline = Pipeline::for_language(&EvaluatorRegistry::default(), language, config)?;
        let result = pipeline.run(&document);

        Ok(Self {
            language: language.to_string(),
            document,
            pipeline,
            result,
        })
    }

    pub fn skipped(&self) -> Vec<SkippedLine> {
        self.result
            .lines
            .iter()
            .enumerate()
            .filter_map(|(index, line)| {
                line.outcome.as_ref().err().map(|err| SkippedLine {
                    line: index + 1,
                    text: line.text.clone(),
                    error: err.to_string(),
                })
            })
            .collect()
    }

    pub fn report(&self, file: &Path) -> EvalReport {
        let bindings = self
            .pipeline
            .evaluator()
            .context()
            .bindings()
            .iter()
            .map(|(name, value)| BindingReport {
                name: name.clone(),
                value: value.repr(),
                type_name: value.type_name().to_string(),
            })
            .collect();

        EvalReport {
            file: file.display().to_string(),
            language: self.language.clone(),
            summary: self.result.summary,
            skipped: self.skipped(),
            bindings,
            annotations: self.pipeline.batch(),
        }
    }
}

pub fn eval(args: EvalArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?.with_overrides(&args.overrides);
    let session_config = config.session_config()?;
    let path = if args.file.is_absolute() {
        args.file.clone()
    } else {
        Path::new(cwd).join(&args.file)
    };
    let language = language_for(&path, args.language.as_deref());

    let evaluation = Evaluation::run(&path, &language, &session_config)?;

    match args.format {
        OutputFormat::Json => {
            let report = evaluation.report(&args.file);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            print!(
                "{}",
                annotated_listing(&evaluation.document, &evaluation.pipeline.batch())
            );
            if args.explain {
                explain(&evaluation, &args.file);
            }
            print_summary(&evaluation.result.summary);
        }
    }

    Ok(())
}

fn explain(evaluation: &Evaluation, file: &Path) {
    let skipped: Vec<_> = evaluation
        .result
        .lines
        .iter()
        .enumerate()
        .filter_map(|(index, line)| line.outcome.as_ref().err().map(|err| (index, line, err)))
        .collect();

    if skipped.is_empty() {
        return;
    }

    println!();
    for (index, line, err) in skipped {
        match err {
            LineFailure::Syntax(parse_error) => {
                let name = format!("{}:{}", file.display(), index + 1);
                eprint!("{}", format_error(&line.text, &name, parse_error));
            }
            LineFailure::Runtime(runtime_error) => {
                eprintln!(
                    "  {} line {} - {}",
                    "✗".red(),
                    index + 1,
                    runtime_error.to_string().red()
                );
            }
        }
    }
}

fn print_summary(summary: &PassSummary) {
    println!();
    if summary.failed == 0 {
        println!(
            "{} Evaluated {} lines, {} annotations",
            "✓".green(),
            summary.lines,
            summary.annotations
        );
    } else {
        println!(
            "{} Evaluated {} lines, {} annotations, {} skipped",
            "⚠️".yellow(),
            summary.lines,
            summary.annotations,
            summary.failed
        );
    }
}
