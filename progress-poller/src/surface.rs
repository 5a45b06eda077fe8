//! Presentation surface contract
//!
//! The poll controller never draws anything itself. Whatever shows the dialog
//! and the progress bar (a web page bridge, a terminal, a desktop toolkit)
//! implements [`PresentationSurface`] and the controller calls into it.

use crate::config::DialogOptions;
use crate::error::PollerError;

/// Capabilities the poll controller needs from a dialog with a progress bar.
///
/// All methods are called from the controller's task, one at a time, in the
/// order the state machine dictates. `show_dialog` may be called while the
/// dialog is already visible and must be idempotent.
#[cfg_attr(test, mockall::automock)]
pub trait PresentationSurface: Send {
    /// Build the dialog. Called exactly once, when the controller is created.
    fn mount(&mut self, dialog: &DialogOptions);

    /// Make the dialog visible
    fn show_dialog(&mut self);

    /// Hide the dialog
    fn hide_dialog(&mut self);

    /// Update the progress bar
    fn render_progress(&mut self, value: f64, max: f64);

    /// A status fetch failed. The default implementation ignores it.
    fn report_error(&mut self, _error: &PollerError) {}
}

impl<S: PresentationSurface + ?Sized> PresentationSurface for Box<S> {
    fn mount(&mut self, dialog: &DialogOptions) {
        (**self).mount(dialog)
    }

    fn show_dialog(&mut self) {
        (**self).show_dialog()
    }

    fn hide_dialog(&mut self) {
        (**self).hide_dialog()
    }

    fn render_progress(&mut self, value: f64, max: f64) {
        (**self).render_progress(value, max)
    }

    fn report_error(&mut self, error: &PollerError) {
        (**self).report_error(error)
    }
}
