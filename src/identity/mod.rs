//! Stable identities for toolbar buttons.
//!
//! Built-in commands keep their numeric id from one session to the next, but
//! plugin commands and custom buttons are handed fresh ids every time the host
//! starts. Those are fingerprinted by their display text instead, and the
//! fingerprint carries [`HASHFLAG`] so a persisted value can be told apart from
//! a raw command id.

pub mod hash;

use crate::host::HostButton;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::RangeInclusive;
use thiserror::Error;

pub use hash::{hash, hash_pair, StableHasher};

/// High bit reserved for content hashes. No raw command id may carry it.
pub const HASHFLAG: u32 = 0x8000_0000;

pub const PLUGIN_CMD_FIRST: u32 = 22000;
/// Last plugin command id with a menu entry on hosts before 8.1.3.
pub const PLUGIN_CMD_LIMIT_OLD: u32 = 22499;
/// Last plugin command id with a menu entry on 8.1.3 and later.
pub const PLUGIN_CMD_LIMIT_NEW: u32 = 22999;
pub const PLUGIN_DYNAMIC_FIRST: u32 = 23000;
pub const PLUGIN_DYNAMIC_LIMIT: u32 = 24999;
pub const CUSTOM_CMD_FIRST: u32 = 26000;
pub const CUSTOM_CMD_LIMIT: u32 = 26099;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("command id {0:#010x} collides with the content-hash flag")]
    ReservedBit(u32),
}

/// Key a button is recognised by across sessions.
///
/// Two identities are equal when they persist to the same 32-bit value, so
/// `ContentHash(x)` equals `ContentHash(x | HASHFLAG)` and a command id built
/// with the flag set is treated as the hash it would read back as.
#[derive(Debug, Clone, Copy)]
pub enum Identity {
    CommandId(u32),
    ContentHash(u32),
}

impl Identity {
    pub fn command(id: u32) -> Result<Self, IdentityError> {
        if id & HASHFLAG != 0 {
            return Err(IdentityError::ReservedBit(id));
        }
        Ok(Identity::CommandId(id))
    }

    pub fn content_hash(value: u32) -> Self {
        Identity::ContentHash(value | HASHFLAG)
    }

    /// Interpret a persisted 32-bit value. The high bit alone decides which
    /// variant it is.
    pub fn from_raw(raw: u32) -> Self {
        if raw & HASHFLAG != 0 {
            Identity::ContentHash(raw)
        } else {
            Identity::CommandId(raw)
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Identity::CommandId(id) => id,
            Identity::ContentHash(value) => value | HASHFLAG,
        }
    }

    pub fn is_content_hash(self) -> bool {
        self.to_raw() & HASHFLAG != 0
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.to_raw() == other.to_raw()
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<S: Hasher>(&self, state: &mut S) {
        self.to_raw().hash(state);
    }
}

impl PartialOrd for Identity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_raw().cmp(&other.to_raw())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::CommandId(_) if self.is_content_hash() => {
                write!(f, "hash:{:08x}", self.to_raw())
            }
            Identity::CommandId(id) => write!(f, "{id}"),
            Identity::ContentHash(_) => write!(f, "hash:{:08x}", self.to_raw()),
        }
    }
}

/// Host application version as reported by the host. `minor` is the packed
/// minor number (8.1.3 reports minor `13`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostVersion {
    pub major: u16,
    pub minor: u16,
}

impl Default for HostVersion {
    fn default() -> Self {
        Self {
            major: 8,
            minor: 13,
        }
    }
}

impl HostVersion {
    pub fn plugin_command_limit(self) -> u32 {
        if self.major >= 9 || (self.major == 8 && self.minor >= 13) {
            PLUGIN_CMD_LIMIT_NEW
        } else {
            PLUGIN_CMD_LIMIT_OLD
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandCategory {
    /// Built-in command or separator; the numeric id is stable.
    BuiltIn,
    /// Plugin command reachable from the menu.
    PluginMenu,
    /// Plugin command allocated without a menu entry.
    PluginDynamic,
    /// Custom button whose menu path did not resolve.
    Custom,
}

impl CommandCategory {
    pub fn is_stable(self) -> bool {
        self == CommandCategory::BuiltIn
    }
}

/// Source of the display text a content hash is derived from.
///
/// Menu labels must already be stripped of `&` markers and cut at any tab.
pub trait LabelSource {
    fn menu_label(&self, command: u32) -> String;
    fn parent_menu_label(&self, command: u32) -> String;
    /// Text stored for the button in the toolbar's own string table.
    fn toolbar_label(&self, button: &HostButton) -> String;
}

#[derive(Debug, Clone)]
pub struct IdentityResolver {
    plugin_menu: RangeInclusive<u32>,
}

impl IdentityResolver {
    pub fn new(version: HostVersion) -> Self {
        Self {
            plugin_menu: PLUGIN_CMD_FIRST..=version.plugin_command_limit(),
        }
    }

    pub fn plugin_menu_range(&self) -> RangeInclusive<u32> {
        self.plugin_menu.clone()
    }

    pub fn category(&self, command: u32) -> CommandCategory {
        if self.plugin_menu.contains(&command) {
            CommandCategory::PluginMenu
        } else if (PLUGIN_DYNAMIC_FIRST..=PLUGIN_DYNAMIC_LIMIT).contains(&command) {
            CommandCategory::PluginDynamic
        } else if (CUSTOM_CMD_FIRST..=CUSTOM_CMD_LIMIT).contains(&command) {
            CommandCategory::Custom
        } else {
            CommandCategory::BuiltIn
        }
    }

    pub fn resolve<L: LabelSource + ?Sized>(
        &self,
        button: &HostButton,
        labels: &L,
    ) -> Result<Identity, IdentityError> {
        if button.is_separator {
            return Identity::command(button.command);
        }
        match self.category(button.command) {
            CommandCategory::BuiltIn => Identity::command(button.command),
            CommandCategory::PluginMenu => {
                let label = labels.menu_label(button.command);
                let parent = labels.parent_menu_label(button.command);
                Ok(Identity::ContentHash(hash_pair(&label, &parent)))
            }
            CommandCategory::PluginDynamic | CommandCategory::Custom => {
                Ok(Identity::ContentHash(hash(&labels.toolbar_label(button))))
            }
        }
    }

    /// Text shown for the button in customization dialogs.
    pub fn display_label<L: LabelSource + ?Sized>(&self, button: &HostButton, labels: &L) -> String {
        if button.is_separator {
            return String::new();
        }
        match self.category(button.command) {
            CommandCategory::BuiltIn | CommandCategory::PluginMenu => {
                labels.menu_label(button.command)
            }
            CommandCategory::PluginDynamic | CommandCategory::Custom => {
                labels.toolbar_label(button)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Labels {
        menu: HashMap<u32, (String, String)>,
        toolbar: HashMap<u32, String>,
    }

    impl LabelSource for Labels {
        fn menu_label(&self, command: u32) -> String {
            self.menu.get(&command).map(|m| m.0.clone()).unwrap_or_default()
        }

        fn parent_menu_label(&self, command: u32) -> String {
            self.menu.get(&command).map(|m| m.1.clone()).unwrap_or_default()
        }

        fn toolbar_label(&self, button: &HostButton) -> String {
            self.toolbar.get(&button.command).cloned().unwrap_or_default()
        }
    }

    #[test]
    fn raw_round_trip_keeps_variant() {
        assert_eq!(Identity::from_raw(100), Identity::CommandId(100));
        let h = Identity::content_hash(555);
        assert_eq!(h.to_raw(), HASHFLAG | 555);
        assert_eq!(Identity::from_raw(h.to_raw()), h);
    }

    #[test]
    fn hand_built_identities_compare_by_persisted_value() {
        assert_eq!(Identity::ContentHash(555), Identity::content_hash(555));
        assert_eq!(Identity::CommandId(HASHFLAG | 7), Identity::from_raw(HASHFLAG | 7));
        assert!(Identity::CommandId(HASHFLAG | 7).is_content_hash());
        assert_ne!(Identity::CommandId(7), Identity::content_hash(7));

        let set: std::collections::HashSet<Identity> =
            [Identity::ContentHash(9), Identity::content_hash(9)].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_eq!(Identity::ContentHash(3).to_string(), "hash:80000003");
    }

    #[test]
    fn command_with_high_bit_is_rejected() {
        assert_eq!(
            Identity::command(HASHFLAG | 1),
            Err(IdentityError::ReservedBit(HASHFLAG | 1))
        );
    }

    #[test]
    fn plugin_limit_depends_on_host_version() {
        assert_eq!(
            HostVersion { major: 8, minor: 12 }.plugin_command_limit(),
            PLUGIN_CMD_LIMIT_OLD
        );
        assert_eq!(
            HostVersion { major: 7, minor: 95 }.plugin_command_limit(),
            PLUGIN_CMD_LIMIT_OLD
        );
        assert_eq!(
            HostVersion { major: 9, minor: 0 }.plugin_command_limit(),
            PLUGIN_CMD_LIMIT_NEW
        );

        let old = IdentityResolver::new(HostVersion { major: 8, minor: 0 });
        assert_eq!(old.category(22600), CommandCategory::BuiltIn);
        let new = IdentityResolver::new(HostVersion::default());
        assert_eq!(new.category(22600), CommandCategory::PluginMenu);
    }

    #[test]
    fn categories_follow_id_ranges() {
        let resolver = IdentityResolver::new(HostVersion::default());
        assert_eq!(resolver.category(42001), CommandCategory::BuiltIn);
        assert_eq!(resolver.category(0), CommandCategory::BuiltIn);
        assert_eq!(resolver.category(22000), CommandCategory::PluginMenu);
        assert_eq!(resolver.category(23000), CommandCategory::PluginDynamic);
        assert_eq!(resolver.category(24999), CommandCategory::PluginDynamic);
        assert_eq!(resolver.category(25000), CommandCategory::BuiltIn);
        assert_eq!(resolver.category(26099), CommandCategory::Custom);
        assert_eq!(resolver.category(26100), CommandCategory::BuiltIn);
    }

    #[test]
    fn plugin_identity_survives_id_churn() {
        let resolver = IdentityResolver::new(HostVersion::default());

        let mut first = Labels::default();
        first
            .menu
            .insert(22010, ("Settings...".into(), "Compare".into()));
        let mut second = Labels::default();
        second
            .menu
            .insert(22044, ("Settings...".into(), "Compare".into()));

        let a = resolver
            .resolve(&HostButton::command(22010), &first)
            .expect("resolve");
        let b = resolver
            .resolve(&HostButton::command(22044), &second)
            .expect("resolve");
        assert_eq!(a, b);
        assert_eq!(a, Identity::ContentHash(hash_pair("Settings...", "Compare")));
    }

    #[test]
    fn dynamic_and_custom_use_toolbar_string() {
        let resolver = IdentityResolver::new(HostVersion::default());
        let mut labels = Labels::default();
        labels.toolbar.insert(23001, "Python Script 1".into());
        labels.toolbar.insert(26003, "Custom Button Error: Edit,Nope,,".into());

        assert_eq!(
            resolver.resolve(&HostButton::command(23001), &labels),
            Ok(Identity::ContentHash(hash("Python Script 1")))
        );
        assert_eq!(
            resolver.resolve(&HostButton::command(26003), &labels),
            Ok(Identity::ContentHash(hash("Custom Button Error: Edit,Nope,,")))
        );
    }

    #[test]
    fn built_ins_and_separators_keep_raw_id() {
        let resolver = IdentityResolver::new(HostVersion::default());
        let labels = Labels::default();
        assert_eq!(
            resolver.resolve(&HostButton::command(41001), &labels),
            Ok(Identity::CommandId(41001))
        );
        assert_eq!(
            resolver.resolve(&HostButton::separator(), &labels),
            Ok(Identity::CommandId(0))
        );
    }

    #[test]
    fn display_formats_hashes_in_hex() {
        assert_eq!(Identity::CommandId(7).to_string(), "7");
        assert_eq!(Identity::content_hash(0x2b).to_string(), "hash:8000002b");
    }
}
