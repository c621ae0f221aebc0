//! Transient text filter over rendered rows.

use log::debug;

use super::ListRow;

/// Result of applying a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// The text was empty: filtering is off and the list must be rebuilt.
    Reset,
    /// Rows were removed in place.
    Applied { removed: usize },
}

/// Filter state.
#[derive(Debug, Clone, Default)]
pub struct FilterView {
    active: bool,
    text: String,
}

impl FilterView {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn reset(&mut self) {
        self.active = false;
        self.text.clear();
    }

    /// Remove rows whose label and title both lack `text`, ignoring case,
    /// then drop headers left without rows under them.
    pub fn apply(&mut self, rows: &mut Vec<ListRow>, text: &str) -> FilterOutcome {
        if text.is_empty() {
            self.reset();
            return FilterOutcome::Reset;
        }

        let needle = text.to_lowercase();
        let before = rows.len();

        // walk backwards so a header sees the already-filtered row after it
        let mut kept: Vec<ListRow> = Vec::with_capacity(rows.len());
        for row in rows.drain(..).rev() {
            let keep = if row.is_header() {
                kept.last().is_some_and(|next| !next.is_header())
            } else {
                contains_ignore_case(row.label(), &needle) || contains_ignore_case(row.text(), &needle)
            };
            if keep {
                kept.push(row);
            }
        }
        kept.reverse();
        *rows = kept;

        self.active = true;
        self.text = text.to_string();

        let removed = before - rows.len();
        debug!("FilterView: '{}' removed {} of {} rows", text, removed, before);
        FilterOutcome::Applied { removed }
    }
}

fn contains_ignore_case(haystack: &str, lowercase_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_needle)
}
