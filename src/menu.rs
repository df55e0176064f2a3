//! Host menu model used to derive button labels and to look up command ids
//! from a menu path.
//!
//! Nodes live in an arena and point at their parent by index, so every walk
//! is an explicit loop with a bounded stack.

use crate::host::HostButton;
use crate::identity::LabelSource;
use std::collections::HashMap;

/// Up to four menu labels, outermost first. Unused trailing levels are empty.
pub type MenuPath = [String; 4];

pub const MENU_PATH_DEPTH: usize = 4;

/// Remove `&` accelerator markers and anything from the first tab on.
pub fn strip_menu_label(label: &str) -> String {
    label
        .split('\t')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| *c != '&')
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuNode {
    pub label: String,
    /// Command fired by a leaf item. Submenus carry `None`.
    pub command: Option<u32>,
    pub parent: Option<usize>,
    children: Vec<usize>,
}

impl MenuNode {
    pub fn is_submenu(&self) -> bool {
        self.command.is_none()
    }

    pub fn children(&self) -> &[usize] {
        &self.children
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuTree {
    nodes: Vec<MenuNode>,
    roots: Vec<usize>,
    /// Extra string-table text for buttons that have no menu entry.
    toolbar_strings: HashMap<u32, String>,
}

impl MenuTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_submenu(&mut self, parent: Option<usize>, label: impl Into<String>) -> usize {
        self.push(parent, label.into(), None)
    }

    pub fn add_item(&mut self, parent: Option<usize>, label: impl Into<String>, command: u32) -> usize {
        self.push(parent, label.into(), Some(command))
    }

    fn push(&mut self, parent: Option<usize>, label: String, command: Option<u32>) -> usize {
        let idx = self.nodes.len();
        let parent = parent.filter(|p| *p < idx);
        self.nodes.push(MenuNode {
            label,
            command,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.nodes[p].children.push(idx),
            None => self.roots.push(idx),
        }
        idx
    }

    pub fn node(&self, idx: usize) -> Option<&MenuNode> {
        self.nodes.get(idx)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Rename a node, as plugins sometimes do once they have initialised.
    pub fn set_label(&mut self, idx: usize, label: impl Into<String>) {
        if let Some(node) = self.nodes.get_mut(idx) {
            node.label = label.into();
        }
    }

    pub fn set_toolbar_string(&mut self, command: u32, text: impl Into<String>) {
        self.toolbar_strings.insert(command, text.into());
    }

    /// First item carrying `command`, in menu order.
    pub fn find_item(&self, command: u32) -> Option<usize> {
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(idx) = stack.pop() {
            let node = &self.nodes[idx];
            if node.command == Some(command) {
                return Some(idx);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    pub fn label_for(&self, command: u32) -> String {
        self.find_item(command)
            .map(|idx| strip_menu_label(&self.nodes[idx].label))
            .unwrap_or_default()
    }

    /// Label of the submenu holding `command`; empty for top-level items.
    pub fn parent_label_for(&self, command: u32) -> String {
        self.find_item(command)
            .and_then(|idx| self.nodes[idx].parent)
            .map(|p| strip_menu_label(&self.nodes[p].label))
            .unwrap_or_default()
    }

    /// Follow `path` level by level. The first leaf reached whose labels
    /// match the path returns its command. Empty labels never match.
    pub fn find_command(&self, path: &MenuPath) -> Option<u32> {
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&i| (i, 0)).collect();
        while let Some((idx, depth)) = stack.pop() {
            let node = &self.nodes[idx];
            let label = strip_menu_label(&node.label);
            if label.is_empty() || label != path[depth] {
                continue;
            }
            if let Some(command) = node.command {
                return Some(command);
            }
            if depth + 1 < MENU_PATH_DEPTH {
                stack.extend(node.children.iter().rev().map(|&c| (c, depth + 1)));
            }
        }
        None
    }
}

impl LabelSource for MenuTree {
    fn menu_label(&self, command: u32) -> String {
        self.label_for(command)
    }

    fn parent_menu_label(&self, command: u32) -> String {
        self.parent_label_for(command)
    }

    fn toolbar_label(&self, button: &HostButton) -> String {
        self.toolbar_strings
            .get(&button.command)
            .cloned()
            .unwrap_or_else(|| self.label_for(button.command))
    }
}

#[cfg(test)]
mod tests {
    use super::{strip_menu_label, MenuPath, MenuTree};

    fn path(parts: [&str; 4]) -> MenuPath {
        parts.map(String::from)
    }

    fn sample() -> MenuTree {
        let mut menu = MenuTree::new();
        let edit = menu.add_submenu(None, "&Edit");
        menu.add_item(Some(edit), "Select &All\tCtrl+A", 42007);
        let plugins = menu.add_submenu(None, "&Plugins");
        let compare = menu.add_submenu(Some(plugins), "Compare");
        menu.add_item(Some(compare), "&Settings...", 22010);
        menu.add_item(Some(compare), "Navigation Bar", 22011);
        let other = menu.add_submenu(Some(plugins), "Other");
        menu.add_item(Some(other), "Settings...", 22020);
        menu
    }

    #[test]
    fn strips_accelerators_and_tab_suffix() {
        assert_eq!(strip_menu_label("Select &All\tCtrl+A"), "Select All");
        assert_eq!(strip_menu_label("&&Double"), "Double");
        assert_eq!(strip_menu_label("\tonly shortcut"), "");
    }

    #[test]
    fn labels_and_parent_labels_are_stripped() {
        let menu = sample();
        assert_eq!(menu.label_for(42007), "Select All");
        assert_eq!(menu.parent_label_for(42007), "Edit");
        assert_eq!(menu.label_for(22020), "Settings...");
        assert_eq!(menu.parent_label_for(22020), "Other");
        assert_eq!(menu.label_for(1), "");
        assert_eq!(menu.parent_label_for(1), "");
    }

    #[test]
    fn finds_command_by_path() {
        let menu = sample();
        assert_eq!(menu.find_command(&path(["Edit", "Select All", "", ""])), Some(42007));
        assert_eq!(
            menu.find_command(&path(["Plugins", "Compare", "Settings...", ""])),
            Some(22010)
        );
        assert_eq!(
            menu.find_command(&path(["Plugins", "Other", "Settings...", ""])),
            Some(22020)
        );
        assert_eq!(menu.find_command(&path(["Plugins", "Compare", "", ""])), None);
        assert_eq!(menu.find_command(&path(["Edit", "Nope", "", ""])), None);
    }

    #[test]
    fn backtracks_across_duplicate_submenu_labels() {
        let mut menu = MenuTree::new();
        let first = menu.add_submenu(None, "Tools");
        menu.add_item(Some(first), "A", 1);
        let second = menu.add_submenu(None, "Tools");
        menu.add_item(Some(second), "B", 2);
        assert_eq!(menu.find_command(&path(["Tools", "B", "", ""])), Some(2));
    }

    #[test]
    fn paths_deeper_than_four_levels_do_not_match() {
        let mut menu = MenuTree::new();
        let mut parent = None;
        for label in ["a", "b", "c", "d"] {
            parent = Some(menu.add_submenu(parent, label));
        }
        menu.add_item(parent, "e", 99);
        assert_eq!(menu.find_command(&path(["a", "b", "c", "d"])), None);
    }
}
