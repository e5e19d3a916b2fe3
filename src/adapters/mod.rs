//! Consumers of classified capture streams. None of them look at the tree
//! directly; they only see what the classifier produced.

pub mod outline;
pub mod runnables;
pub mod textobject;

use crate::classify::ClassifiedCapture;

/// Display label for a capture: its name attribute, else the first line of its text.
pub(crate) fn label(capture: &ClassifiedCapture<'_>) -> String {
    capture
        .name
        .unwrap_or_else(|| capture.text.lines().next().unwrap_or_default())
        .trim()
        .to_string()
}
