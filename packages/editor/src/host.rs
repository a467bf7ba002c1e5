use crate::annotations::AnnotationBatch;
use crate::document::{Document, Region};

/// The editor an edit session is attached to
pub trait Host: Send {
    /// Current buffer contents
    fn document_text(&self) -> String;

    /// Byte spans of every line, in order
    fn document_lines(&self) -> Vec<Region> {
        Document::new(self.document_text()).lines().to_vec()
    }

    /// Syntax or language name of the buffer, e.g. `source.python`
    fn language_identifier(&self) -> String;

    /// Replace every shown annotation with `batch`. Widgets whose handle is
    /// not in the batch are disposed of.
    fn render_annotations(&mut self, batch: &AnnotationBatch);

    /// Snapshot of the buffer for one pass, built from a single text read.
    /// Hosts that report their own line spans override this and pair them
    /// with the text they were computed from.
    fn snapshot(&self) -> Document {
        Document::new(self.document_text())
    }
}
