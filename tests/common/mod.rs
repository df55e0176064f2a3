#![allow(dead_code)]

use customize_toolbar::host::{HostButton, ToolbarHost};
use customize_toolbar::identity::LabelSource;
use customize_toolbar::menu::{MenuPath, MenuTree};

/// Toolbar and menu kept in memory, recording what the session did to it.
#[derive(Debug, Default, Clone)]
pub struct MockHost {
    pub menu: MenuTree,
    pub toolbar: Vec<HostButton>,
    pub wrap: Option<bool>,
    pub rebuilds: usize,
    pub state_syncs: usize,
}

impl MockHost {
    pub fn new(menu: MenuTree, toolbar: Vec<HostButton>) -> Self {
        Self {
            menu,
            toolbar,
            ..Self::default()
        }
    }

    pub fn commands(&self) -> Vec<u32> {
        self.toolbar.iter().map(|b| b.command).collect()
    }
}

impl LabelSource for MockHost {
    fn menu_label(&self, command: u32) -> String {
        self.menu.menu_label(command)
    }

    fn parent_menu_label(&self, command: u32) -> String {
        self.menu.parent_menu_label(command)
    }

    fn toolbar_label(&self, button: &HostButton) -> String {
        self.menu.toolbar_label(button)
    }
}

impl ToolbarHost for MockHost {
    fn enumerate_buttons(&self) -> Vec<HostButton> {
        self.toolbar.clone()
    }

    fn remove_all_buttons(&mut self) {
        self.toolbar.clear();
        self.rebuilds += 1;
    }

    fn install_buttons(&mut self, buttons: &[HostButton]) {
        self.toolbar.extend_from_slice(buttons);
    }

    fn command_for_menu_path(&self, path: &MenuPath) -> Option<u32> {
        self.menu.find_command(path)
    }

    fn reassign_command(&mut self, from: u32, to: u32) {
        self.toolbar.retain(|b| b.is_separator || b.command != to);
        for button in self.toolbar.iter_mut().filter(|b| b.command == from) {
            button.command = to;
        }
    }

    fn set_toolbar_label(&mut self, command: u32, label: &str) {
        self.menu.set_toolbar_string(command, label);
    }

    fn apply_wrap(&mut self, wrap: bool) {
        self.wrap = Some(wrap);
    }

    fn sync_button_states(&mut self) {
        self.state_syncs += 1;
    }
}

pub fn buttons(commands: &[u32]) -> Vec<HostButton> {
    commands
        .iter()
        .map(|&c| {
            if c == 0 {
                HostButton::separator()
            } else {
                HostButton::command(c)
            }
        })
        .collect()
}

/// Two built-ins, a separator and two plugin commands at `first_plugin_id`
/// and the id after it.
pub fn editor_host(first_plugin_id: u32) -> MockHost {
    let mut menu = MenuTree::new();
    let file = menu.add_submenu(None, "&File");
    menu.add_item(Some(file), "&New\tCtrl+N", 41001);
    menu.add_item(Some(file), "&Open...\tCtrl+O", 41002);
    let edit = menu.add_submenu(None, "&Edit");
    menu.add_item(Some(edit), "Select &All\tCtrl+A", 42007);
    let plugins = menu.add_submenu(None, "&Plugins");
    let compare = menu.add_submenu(Some(plugins), "Compare");
    menu.add_item(Some(compare), "Navigation Bar", first_plugin_id);
    let other = menu.add_submenu(Some(plugins), "Other");
    menu.add_item(Some(other), "Run", first_plugin_id + 1);
    MockHost::new(
        menu,
        buttons(&[41001, 41002, 0, first_plugin_id, first_plugin_id + 1]),
    )
}
