//! Interactive picker abstraction.
//!
//! Commands never open dialogs themselves; the host supplies a [Picker] and
//! a `None` return means the user closed the dialog, which commands map to
//! [crate::QualiError::OperationCancelled]. Cancellation aborts the rest of
//! the pipeline; steps that already executed stay committed.

/// Presents a filterable list and returns the user's selection index, or
/// None on cancellation.
pub trait Picker: Send + Sync {
    fn pick(&self, prompt: &str, items: &[String]) -> Option<usize>;

    fn pick_many(&self, prompt: &str, items: &[String]) -> Option<Vec<usize>> {
        self.pick(prompt, items).map(|i| vec![i])
    }
}

/// Picks by exact item text. Intended for tests and scripted hosts.
#[derive(Debug, Clone)]
pub struct FixedPicker {
    choice: Option<String>,
}

impl FixedPicker {
    pub fn choose<S: Into<String>>(item: S) -> Self {
        FixedPicker {
            choice: Some(item.into()),
        }
    }

    pub fn cancelled() -> Self {
        FixedPicker { choice: None }
    }
}

impl Picker for FixedPicker {
    fn pick(&self, _prompt: &str, items: &[String]) -> Option<usize> {
        let wanted = self.choice.as_ref()?;
        items.iter().position(|item| item == wanted)
    }
}
