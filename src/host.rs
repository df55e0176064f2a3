//! Seams towards the host application's toolbar and menu.

use crate::identity::LabelSource;
use crate::menu::MenuPath;

/// A button as the host's toolbar control reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostButton {
    pub command: u32,
    pub is_separator: bool,
}

impl HostButton {
    pub fn command(command: u32) -> Self {
        Self {
            command,
            is_separator: false,
        }
    }

    pub fn separator() -> Self {
        Self {
            command: 0,
            is_separator: true,
        }
    }
}

/// The live toolbar plus the menu text it is labelled from.
///
/// Implementations wrap the host UI toolkit. Every call is made from the
/// layout worker thread, one at a time.
pub trait ToolbarHost: LabelSource + Send {
    /// Buttons currently on the toolbar, left to right.
    fn enumerate_buttons(&self) -> Vec<HostButton>;

    fn remove_all_buttons(&mut self);

    fn install_buttons(&mut self, buttons: &[HostButton]);

    /// Command id of the menu item reached by following `path`, if any.
    fn command_for_menu_path(&self, path: &MenuPath) -> Option<u32>;

    /// Give the button carrying `from` the command id `to`, dropping any
    /// button that already carried `to`.
    fn reassign_command(&mut self, from: u32, to: u32);

    /// Store `label` as the toolbar string of the button carrying `command`.
    fn set_toolbar_label(&mut self, _command: u32, _label: &str) {}

    fn apply_wrap(&mut self, _wrap: bool) {}

    /// Mirror menu check/enable state onto the toolbar buttons.
    fn sync_button_states(&mut self) {}
}
