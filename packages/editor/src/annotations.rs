//! # Annotation Set
//!
//! The annotations currently shown in the host, in discovery order. The set
//! persists across passes: an unchanged line re-renders to identical
//! content and keeps its annotation (and its display handle), while a line
//! whose content changed replaces whatever it overlaps.

use crate::document::Region;
use crate::render::Fragment;
use serde::{Deserialize, Serialize};

/// Identifies one widget in the host across batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DisplayHandle(pub u64);

/// How the host places an annotation relative to its line
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Below,
    Inline,
    Block,
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "below" => Ok(Layout::Below),
            "inline" => Ok(Layout::Inline),
            "block" => Ok(Layout::Block),
            other => Err(format!(
                "unknown layout '{}' (expected 'below', 'inline' or 'block')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub region: Region,
    pub fragment: Fragment,
    pub handle: DisplayHandle,
    pub layout: Layout,
}

impl Annotation {
    /// Markup shown by the host; identity for deduplication
    pub fn content(&self) -> &str {
        self.fragment.markup()
    }
}

/// What reconciling one line did to the set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    /// Nothing to show for the line
    Empty,
    /// Identical content is already shown
    Duplicate,
    /// Added, after dropping `replaced` overlapping annotations
    Inserted { handle: DisplayHandle, replaced: usize },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationSet {
    annotations: Vec<Annotation>,
    next_handle: u64,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    /// Fold one rendered line into the set.
    ///
    /// Content already present anywhere in the set is skipped. Otherwise
    /// every annotation whose region intersects `region` is removed and
    /// the new one appended.
    pub fn reconcile(
        &mut self,
        content: Option<Fragment>,
        region: Region,
        layout: Layout,
    ) -> Reconciled {
        let Some(fragment) = content else {
            return Reconciled::Empty;
        };

        if self
            .annotations
            .iter()
            .any(|existing| existing.content() == fragment.markup())
        {
            return Reconciled::Duplicate;
        }

        let before = self.annotations.len();
        self.annotations
            .retain(|existing| !existing.region.intersects(&region));
        let replaced = before - self.annotations.len();

        let handle = DisplayHandle(self.next_handle);
        self.next_handle += 1;
        self.annotations.push(Annotation {
            region,
            fragment,
            handle,
            layout,
        });

        Reconciled::Inserted { handle, replaced }
    }

    /// Drop annotations that end beyond a document of `len` bytes
    pub fn prune(&mut self, len: usize) -> usize {
        let before = self.annotations.len();
        self.annotations.retain(|annotation| annotation.region.end <= len);
        before - self.annotations.len()
    }

    /// Snapshot handed to the host in one piece
    pub fn batch(&self) -> AnnotationBatch {
        AnnotationBatch {
            items: self
                .annotations
                .iter()
                .map(|annotation| AnnotationView {
                    region: annotation.region,
                    content: annotation.content().to_string(),
                    items: annotation.fragment.items().to_vec(),
                    handle: annotation.handle,
                    layout: annotation.layout,
                })
                .collect(),
        }
    }
}

/// Value-passing form of [`AnnotationSet::reconcile`]
pub fn reconcile(
    content: Option<Fragment>,
    region: Region,
    mut set: AnnotationSet,
) -> AnnotationSet {
    set.reconcile(content, region, Layout::default());
    set
}

/// One annotation as the host sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationView {
    pub region: Region,
    /// Escaped markup
    pub content: String,
    /// Plain text lines
    pub items: Vec<String>,
    pub handle: DisplayHandle,
    pub layout: Layout,
}

/// Full replacement for the host's annotations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationBatch {
    pub items: Vec<AnnotationView>,
}

impl AnnotationBatch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn handles(&self) -> impl Iterator<Item = DisplayHandle> + '_ {
        self.items.iter().map(|item| item.handle)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
