use crate::host::HostButton;
use crate::identity::Identity;
use std::collections::{HashMap, HashSet};

/// Built-in commands whose extra buttons are only offered in the
/// customization dialog on first run, not placed on the toolbar.
pub const DEFAULT_HIDDEN_COMMANDS: [u32; 26] = [
    41005, // close all but current
    42006, // delete
    42009, // decrease indent
    42008, // increase indent
    42010, // duplicate line
    42035, // block comment set
    42036, // block uncomment
    50001, // word completion
    42024, // trim trailing space
    42046, // tab to space
    42054, // space to tab (all)
    43013, // find in files
    43010, // find previous
    43002, // find next
    43017, // incremental search
    43045, // focus on search results
    43004, // go to line
    43007, // previous bookmark
    43006, // next bookmark
    43008, // clear bookmarks
    44033, // restore zoom
    10001, // move to other view
    10002, // clone to other view
    44042, // hide lines
    44010, // fold all
    44011, // unfold all
];

/// One button the host could place on the toolbar this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableButton {
    pub identity: Identity,
    /// Position in the startup enumeration.
    pub ordinal: usize,
    pub label: String,
    pub button: HostButton,
}

impl AvailableButton {
    pub fn is_separator(&self) -> bool {
        self.button.is_separator
    }
}

/// Rebuild this session's toolbar from the last saved layout.
///
/// Saved toolbar entries are restored in order, each taking the first unused
/// current button with the same identity. Separators are interchangeable, so
/// once every current separator is in use the first one is placed again.
/// Buttons whose identity was not available when the layout was saved are
/// new and go at the end; buttons that were available but not on the toolbar
/// were removed by the user and stay off.
pub fn reconcile(
    saved_on_toolbar: &[Identity],
    saved_available: &[Identity],
    current: &[AvailableButton],
) -> Vec<AvailableButton> {
    let mut consumed = vec![false; current.len()];
    let mut result = Vec::with_capacity(current.len());

    for identity in saved_on_toolbar {
        let mut candidates = current
            .iter()
            .enumerate()
            .filter(|(_, b)| b.identity == *identity)
            .map(|(i, _)| i)
            .peekable();
        let Some(&first) = candidates.peek() else {
            tracing::debug!(%identity, "saved button no longer available");
            continue;
        };
        let pick = candidates
            .find(|&i| !consumed[i])
            .or_else(|| current[first].is_separator().then_some(first));
        if let Some(i) = pick {
            consumed[i] = true;
            result.push(current[i].clone());
        }
    }

    let seen_commands: HashSet<u32> = saved_available
        .iter()
        .filter(|id| !id.is_content_hash())
        .map(|id| id.to_raw())
        .collect();
    let mut seen_hashes: HashMap<u32, usize> = HashMap::new();
    for id in saved_available.iter().filter(|id| id.is_content_hash()) {
        *seen_hashes.entry(id.to_raw()).or_default() += 1;
    }

    for (i, button) in current.iter().enumerate() {
        let raw = button.identity.to_raw();
        let known = if button.identity.is_content_hash() {
            match seen_hashes.get_mut(&raw) {
                Some(n) if *n > 0 => {
                    *n -= 1;
                    true
                }
                _ => false,
            }
        } else {
            seen_commands.contains(&raw)
        };
        if !known && !consumed[i] {
            tracing::debug!(identity = %button.identity, label = %button.label, "new button");
            result.push(button.clone());
        }
    }

    result
}

/// First-run layout: everything available, in startup order, minus `hidden`.
pub fn bootstrap(current: &[AvailableButton], hidden: &[u32]) -> Vec<AvailableButton> {
    current
        .iter()
        .filter(|b| b.is_separator() || !hidden.contains(&b.button.command))
        .cloned()
        .collect()
}
