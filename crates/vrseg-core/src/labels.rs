// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Label palette and the paint selector.

use vrseg_mesh::Rgba;
pub use vrseg_proto::labels::BACKGROUND;

/// A named, colored category a vertex can be assigned to.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    /// Display name.
    pub name: String,
    /// Color painted onto labeled vertices.
    pub color: Rgba,
}

impl Label {
    /// Creates a label.
    pub fn new(name: impl Into<String>, color: Rgba) -> Self {
        Self {
            name: name.into(),
            color,
        }
    }
}

/// Ordered label list; a label's index is its mask value.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelTable {
    labels: Vec<Label>,
    background: Rgba,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new(
            vec![
                Label::new("Red", Rgba::RED),
                Label::new("Green", Rgba::GREEN),
                Label::new("Blue", Rgba::BLUE),
                Label::new("Yellow", Rgba::YELLOW),
                Label::new("Cyan", Rgba::CYAN),
            ],
            Rgba::WHITE,
        )
    }
}

impl LabelTable {
    /// Creates a table with an explicit background color.
    pub fn new(labels: Vec<Label>, background: Rgba) -> Self {
        Self { labels, background }
    }

    /// Number of labels (the background pseudo-label is not counted).
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the table has no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at `index`.
    pub fn get(&self, index: usize) -> Option<&Label> {
        self.labels.get(index)
    }

    /// Label for a mask value; `None` for background or unknown values.
    pub fn for_mask_value(&self, value: i32) -> Option<&Label> {
        usize::try_from(value).ok().and_then(|i| self.labels.get(i))
    }

    /// Color painted for background.
    pub fn background(&self) -> Rgba {
        self.background
    }

    /// Iterate labels in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Label> {
        self.labels.iter()
    }
}

/// What a paint action writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintLabel {
    /// Un-label: writes -1 and the background color.
    Background,
    /// Writes the given label index and its color.
    Label(usize),
}

impl PaintLabel {
    /// Mask value written by this selector.
    pub fn mask_value(self) -> i32 {
        match self {
            PaintLabel::Background => BACKGROUND,
            PaintLabel::Label(i) => i32::try_from(i).unwrap_or(i32::MAX),
        }
    }

    /// Color written by this selector, or `None` if the label is not in `table`.
    pub fn color(self, table: &LabelTable) -> Option<Rgba> {
        match self {
            PaintLabel::Background => Some(table.background()),
            PaintLabel::Label(i) => table.get(i).map(|l| l.color),
        }
    }
}
