/// A draft checked against the last loaded or saved value.
///
/// The form is dirty while the two differ, and only a dirty form may be
/// submitted.
#[derive(Debug, Clone, Default)]
pub struct EditForm<T> {
    saved: T,
    draft: T,
}

impl<T: Clone + PartialEq> EditForm<T> {
    pub fn new(loaded: T) -> EditForm<T> {
        EditForm {
            draft: loaded.clone(),
            saved: loaded,
        }
    }

    pub fn draft(&self) -> &T {
        &self.draft
    }

    pub fn saved(&self) -> &T {
        &self.saved
    }

    pub fn edit(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.draft);
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.saved
    }

    /// Whether the save control is enabled.
    pub fn can_submit(&self) -> bool {
        self.is_dirty()
    }

    /// Replaces both values, e.g. after a fresh fetch.
    pub fn reset(&mut self, loaded: T) {
        self.draft = loaded.clone();
        self.saved = loaded;
    }

    /// Records a successful save of `stored`, which also becomes the draft.
    pub fn mark_saved(&mut self, stored: T) {
        self.reset(stored);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteConfirmation {
    #[default]
    Idle,
    ConfirmPending,
    Deleted,
}

impl DeleteConfirmation {
    /// Opens the confirmation prompt.
    pub fn request(&mut self) {
        if *self == DeleteConfirmation::Idle {
            *self = DeleteConfirmation::ConfirmPending;
        }
    }

    pub fn cancel(&mut self) {
        if *self == DeleteConfirmation::ConfirmPending {
            *self = DeleteConfirmation::Idle;
        }
    }

    pub fn is_pending(&self) -> bool {
        *self == DeleteConfirmation::ConfirmPending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Draft {
        name: String,
    }

    #[test]
    fn edit_form_tracks_difference_from_saved() {
        let mut form = EditForm::new(Draft { name: "Ana".into() });
        assert!(!form.can_submit());

        form.edit(|d| d.name = "Bia".into());
        assert!(form.can_submit());

        form.edit(|d| d.name = "Ana".into());
        assert!(!form.can_submit());

        form.edit(|d| d.name = "Caio".into());
        let stored = form.draft().clone();
        form.mark_saved(stored);
        assert!(!form.can_submit());
        assert_eq!(form.saved().name, "Caio");
    }

    #[test]
    fn delete_confirmation_transitions() {
        let mut c = DeleteConfirmation::default();
        c.cancel();
        assert_eq!(c, DeleteConfirmation::Idle);
        c.request();
        assert!(c.is_pending());
        c.cancel();
        assert_eq!(c, DeleteConfirmation::Idle);
    }
}
