//! Year dropdown fallback rule.

use serde::{Deserialize, Serialize};

/// One `<option>` of a dropdown as seen by the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub text: String,
    pub selected: bool,
}

impl DropdownOption {
    pub fn new(text: impl Into<String>, selected: bool) -> Self {
        Self {
            text: text.into(),
            selected,
        }
    }
}

/// The option listed immediately before the selected one.
///
/// If several options claim to be selected the last of them counts. The
/// list wraps: when the first option is selected, the last one precedes it.
/// Returns `None` when nothing is selected.
pub fn preceding_selected(options: &[DropdownOption]) -> Option<&DropdownOption> {
    let selected = options.iter().rposition(|o| o.selected)?;
    let index = (selected + options.len() - 1) % options.len();
    options.get(index)
}
