pub mod eval;
pub mod watch;

pub use eval::{eval, EvalArgs};
pub use watch::{watch, WatchArgs};

use colored::Colorize;
use interspy_editor::{AnnotationBatch, AnnotationView, Document};
use std::fmt::Write;
use std::path::Path;

/// Language identifier for a script, in the editor's `source.<ext>` form
pub fn language_for(path: &Path, explicit: Option<&str>) -> String {
    if let Some(language) = explicit {
        return language.to_string();
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("py") => "source.python".to_string(),
        Some(ext) => format!("source.{}", ext),
        None => "source.python".to_string(),
    }
}

/// The document with each line followed by the annotations anchored on it
pub fn annotated_listing(document: &Document, batch: &AnnotationBatch) -> String {
    let lines = document.lines();
    let mut by_line: Vec<Vec<&AnnotationView>> = vec![Vec::new(); lines.len()];

    for view in &batch.items {
        // annotations kept from an earlier pass may no longer line up exactly
        let index = lines.partition_point(|line| line.end < view.region.start);
        if let Some(slot) = by_line.get_mut(index) {
            slot.push(view);
        }
    }

    let width = lines.len().to_string().len();
    let mut out = String::new();
    for (number, ((_, text), views)) in document.iter_lines().zip(by_line).enumerate() {
        let _ = writeln!(
            out,
            "{} {} {}",
            format!("{:>width$}", number + 1, width = width).dimmed(),
            "│".dimmed(),
            text
        );
        for view in views {
            for item in &view.items {
                let _ = writeln!(
                    out,
                    "{} {} {}",
                    " ".repeat(width),
                    "↳".cyan(),
                    item.bright_black()
                );
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use interspy_editor::{EvaluatorRegistry, Pipeline, SessionConfig};
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_language_from_extension() {
        assert_eq!(language_for(&PathBuf::from("demo.py"), None), "source.python");
        assert_eq!(language_for(&PathBuf::from("demo.rb"), None), "source.rb");
        assert_eq!(language_for(&PathBuf::from("demo"), None), "source.python");
        assert_eq!(
            language_for(&PathBuf::from("demo.txt"), Some("interspy")),
            "interspy"
        );
    }

    #[test]
    fn test_listing_puts_items_under_their_line() {
        colored::control::set_override(false);

        let document = Document::new("a = 1\nb = a + 1\nb");
        let mut pipeline = Pipeline::for_language(
            &EvaluatorRegistry::default(),
            "source.python",
            &SessionConfig::default(),
        )
        .unwrap();
        pipeline.run(&document);

        let listing = annotated_listing(&document, &pipeline.batch());
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(
            lines,
            vec![
                "1 │ a = 1",
                "  ↳ a: 1 :: int",
                "2 │ b = a + 1",
                "  ↳ a: 1 :: int",
                "  ↳ b: 2 :: int",
                "3 │ b",
                "  ↳ 2 :: int",
            ]
        );
    }

    #[test]
    fn test_listing_without_annotations() {
        colored::control::set_override(false);

        let document = Document::new("x = 1/0");
        let listing = annotated_listing(&document, &AnnotationBatch::default());
        assert_eq!(listing, "1 │ x = 1/0\n");
    }
}
