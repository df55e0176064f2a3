//! Per-session state: the snapshot of available buttons, the two menu flags
//! and the collaborators they are read from and written to.

use crate::custom_buttons::{self, CustomButtons, MAX_CUSTOM_BUTTONS};
use crate::host::{HostButton, ToolbarHost};
use crate::identity::{
    CommandCategory, Identity, IdentityResolver, LabelSource, PLUGIN_CMD_FIRST,
};
use crate::layout::{
    bootstrap, reconcile, store, AvailableButton, LayoutError, LayoutFormat, LayoutRecord,
    LayoutStorage, MAX_BUTTONS,
};
use crate::settings::Settings;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum RestoreOutcome {
    /// A saved layout was found and reconciled.
    Restored,
    /// No layout was saved yet; the first-run layout was installed and saved.
    Bootstrapped,
    /// The saved layout could not be read. The first-run layout replaced it
    /// and the error is kept for the caller.
    Recovered(LayoutError),
}

impl RestoreOutcome {
    /// True when the first-run layout was installed, for whatever reason.
    pub fn used_defaults(&self) -> bool {
        !matches!(self, RestoreOutcome::Restored)
    }
}

const SCRIPT_LABEL_PREFIX: &str = "Python Script ";
const CUSTOM_ERROR_PREFIX: &str = "Custom Button Error: ";

/// Host labels with the session's own toolbar strings laid over them.
struct SessionLabels<'a, H> {
    host: &'a H,
    toolbar: &'a HashMap<u32, String>,
}

impl<H: LabelSource> LabelSource for SessionLabels<'_, H> {
    fn menu_label(&self, command: u32) -> String {
        self.host.menu_label(command)
    }

    fn parent_menu_label(&self, command: u32) -> String {
        self.host.parent_menu_label(command)
    }

    fn toolbar_label(&self, button: &HostButton) -> String {
        match self.toolbar.get(&button.command) {
            Some(label) => label.clone(),
            None => self.host.toolbar_label(button),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceUsage {
    pub buttons_available: usize,
    pub custom_buttons: usize,
    pub plugin_commands_used: u32,
    pub plugin_commands_limit: u32,
}

impl fmt::Display for ResourceUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Buttons:  {} / {MAX_BUTTONS}", self.buttons_available)?;
        writeln!(f, "Custom Buttons:  {} / {MAX_CUSTOM_BUTTONS}", self.custom_buttons)?;
        write!(
            f,
            "Plugin Menu Commands:  {} / {}",
            self.plugin_commands_used, self.plugin_commands_limit
        )
    }
}

pub struct Session<H, S> {
    host: H,
    storage: S,
    resolver: IdentityResolver,
    format: LayoutFormat,
    hidden: Vec<u32>,
    buttons_path: Option<PathBuf>,
    custom: CustomButtons,
    snapshot: Vec<AvailableButton>,
    /// Toolbar strings assigned at capture to buttons without menu text.
    toolbar_labels: HashMap<u32, String>,
    custom_buttons_enabled: bool,
    wrap_enabled: bool,
}

impl<H: ToolbarHost, S: LayoutStorage> Session<H, S> {
    pub fn new(host: H, storage: S, settings: &Settings) -> Self {
        Self {
            host,
            storage,
            resolver: IdentityResolver::new(settings.host_version),
            format: LayoutFormat::Current,
            hidden: settings.bootstrap_hidden_commands.clone(),
            buttons_path: Some(settings.buttons_path()),
            custom: CustomButtons::default(),
            snapshot: Vec::new(),
            toolbar_labels: HashMap::new(),
            custom_buttons_enabled: false,
            wrap_enabled: false,
        }
    }

    /// Read the next layout in `format`. Saving always writes the current
    /// format, so an old file is migrated by the first save.
    pub fn with_format(mut self, format: LayoutFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_custom_buttons(mut self, custom: CustomButtons) -> Self {
        self.custom = custom;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn snapshot(&self) -> &[AvailableButton] {
        &self.snapshot
    }

    pub fn custom_buttons(&self) -> &CustomButtons {
        &self.custom
    }

    pub fn custom_buttons_enabled(&self) -> bool {
        self.custom_buttons_enabled
    }

    pub fn wrap_enabled(&self) -> bool {
        self.wrap_enabled
    }

    /// Pick up the menu flags from the saved layout before the toolbar is
    /// built, so the host knows whether to register custom buttons.
    pub fn load_flags(&mut self) -> bool {
        match store::load(&self.storage, self.format) {
            Ok(record) => {
                self.custom_buttons_enabled = record.custom_buttons_enabled;
                self.wrap_enabled = record.wrap_enabled;
                true
            }
            Err(LayoutError::NotFound) => false,
            Err(err) => {
                tracing::warn!(%err, "could not read toolbar flags");
                false
            }
        }
    }

    /// Point custom buttons at the commands their menu paths name, replacing
    /// any button that already carried that command.
    fn replace_temporary_commands(&mut self) {
        if self.custom.definitions.is_empty() {
            return;
        }
        let host = &self.host;
        let pairs = self
            .custom
            .resolve_commands(|path| host.command_for_menu_path(path));
        let present: Vec<u32> = self
            .host
            .enumerate_buttons()
            .iter()
            .map(|b| b.command)
            .collect();
        for (temporary, command) in pairs {
            if present.contains(&temporary) {
                tracing::debug!(temporary, command, "custom button matched menu command");
                self.host.reassign_command(temporary, command);
            }
        }
    }

    fn labels(&self) -> SessionLabels<'_, H> {
        SessionLabels {
            host: &self.host,
            toolbar: &self.toolbar_labels,
        }
    }

    /// Give buttons that have no menu text a toolbar string to be known by.
    /// Custom buttons whose menu path did not resolve are named after that
    /// path; menu-less dynamic plugin commands are numbered in toolbar order.
    fn assign_toolbar_labels(&mut self, buttons: &[HostButton]) {
        self.toolbar_labels.clear();
        let mut script_count = 1;
        for button in buttons.iter().filter(|b| !b.is_separator) {
            let label = match self.resolver.category(button.command) {
                CommandCategory::Custom => match self.custom.definition_for(button.command) {
                    Some(def) => format!("{CUSTOM_ERROR_PREFIX}{}", def.describe()),
                    None => continue,
                },
                CommandCategory::PluginDynamic
                    if self.host.menu_label(button.command).is_empty() =>
                {
                    let label = format!("{SCRIPT_LABEL_PREFIX}{script_count}");
                    script_count += 1;
                    label
                }
                _ => continue,
            };
            self.host.set_toolbar_label(button.command, &label);
            self.toolbar_labels.insert(button.command, label);
        }
    }

    /// Record every button the host offers right now. Call once the host
    /// has finished registering buttons.
    pub fn capture(&mut self) -> usize {
        self.replace_temporary_commands();

        let mut buttons = self.host.enumerate_buttons();
        if buttons.len() > MAX_BUTTONS {
            tracing::warn!(
                found = buttons.len(),
                "toolbar offers more than {MAX_BUTTONS} buttons; ignoring the rest"
            );
            buttons.truncate(MAX_BUTTONS);
        }

        self.assign_toolbar_labels(&buttons);

        self.snapshot.clear();
        for button in buttons {
            let labels = self.labels();
            let identity = match self.resolver.resolve(&button, &labels) {
                Ok(identity) => identity,
                Err(err) => {
                    tracing::warn!(%err, "skipping button");
                    continue;
                }
            };
            let label = self.resolver.display_label(&button, &labels);
            tracing::debug!(command = button.command, %identity, %label, "available button");
            self.snapshot.push(AvailableButton {
                identity,
                ordinal: self.snapshot.len(),
                label,
                button,
            });
        }
        tracing::info!(buttons = self.snapshot.len(), "captured available toolbar buttons");
        self.snapshot.len()
    }

    fn install(&mut self, buttons: &[AvailableButton]) {
        let host_buttons: Vec<HostButton> = buttons.iter().map(|b| b.button).collect();
        self.host.remove_all_buttons();
        self.host.install_buttons(&host_buttons);
    }

    /// Rebuild the toolbar from the saved layout. With `apply_flags` unset
    /// the menu flags kept in the session are left alone.
    ///
    /// A missing layout yields [`RestoreOutcome::Bootstrapped`]; an unreadable
    /// one is replaced by the defaults and reported through
    /// [`RestoreOutcome::Recovered`].
    pub fn restore(&mut self, apply_flags: bool) -> RestoreOutcome {
        let outcome = match store::load(&self.storage, self.format) {
            Ok(record) => {
                if apply_flags {
                    self.custom_buttons_enabled = record.custom_buttons_enabled;
                    self.wrap_enabled = record.wrap_enabled;
                }
                let buttons = reconcile(&record.on_toolbar, &record.available, &self.snapshot);
                self.install(&buttons);
                RestoreOutcome::Restored
            }
            Err(LayoutError::NotFound) => {
                tracing::info!("no saved toolbar layout; using defaults");
                self.install_defaults();
                RestoreOutcome::Bootstrapped
            }
            Err(err) => {
                tracing::warn!(%err, "saved toolbar layout unusable; using defaults");
                self.install_defaults();
                RestoreOutcome::Recovered(err)
            }
        };

        if apply_flags {
            self.host.apply_wrap(self.wrap_enabled);
        }
        outcome
    }

    fn install_defaults(&mut self) {
        self.reset();
        if let Err(err) = self.save() {
            tracing::warn!(%err, "failed to save default toolbar layout");
        }
    }

    /// Install the first-run layout.
    pub fn reset(&mut self) {
        let buttons = bootstrap(&self.snapshot, &self.hidden);
        self.install(&buttons);
    }

    fn identity_on_toolbar(&self, button: &HostButton) -> Option<Identity> {
        let known = self.snapshot.iter().find(|a| {
            a.button.command == button.command && a.button.is_separator == button.is_separator
        });
        match known {
            Some(known) => Some(known.identity),
            None => self.resolver.resolve(button, &self.labels()).ok(),
        }
    }

    /// Current toolbar contents plus the startup snapshot, ready to persist.
    pub fn current_record(&self) -> LayoutRecord {
        let on_toolbar = self
            .host
            .enumerate_buttons()
            .iter()
            .filter_map(|b| self.identity_on_toolbar(b))
            .collect();
        LayoutRecord {
            custom_buttons_enabled: self.custom_buttons_enabled,
            wrap_enabled: self.wrap_enabled,
            on_toolbar,
            available: self.snapshot.iter().map(|a| a.identity).collect(),
        }
    }

    pub fn save(&mut self) -> Result<(), LayoutError> {
        let record = self.current_record();
        store::save(&mut self.storage, &record)?;
        self.format = LayoutFormat::Current;
        tracing::debug!(
            on_toolbar = record.on_toolbar.len(),
            available = record.available.len(),
            "saved toolbar layout"
        );
        Ok(())
    }

    pub fn apply_wrap(&mut self) {
        self.host.apply_wrap(self.wrap_enabled);
    }

    pub fn sync_button_states(&mut self) {
        self.host.sync_button_states();
    }

    pub fn toggle_wrap(&mut self) -> bool {
        self.wrap_enabled = !self.wrap_enabled;
        self.host.apply_wrap(self.wrap_enabled);
        if let Err(err) = self.save() {
            tracing::warn!(%err, "failed to save toolbar layout");
        }
        self.wrap_enabled
    }

    /// Flip the custom buttons feature. The change takes effect on the next
    /// start of the host; enabling it writes an example definition file.
    pub fn toggle_custom_buttons(&mut self) -> bool {
        self.custom_buttons_enabled = !self.custom_buttons_enabled;
        if self.custom_buttons_enabled {
            if let Some(path) = &self.buttons_path {
                match custom_buttons::ensure_template(path) {
                    Ok(true) => tracing::info!(path = %path.display(), "created custom buttons file"),
                    Ok(false) => {}
                    Err(err) => tracing::warn!(%err, "failed to create custom buttons file"),
                }
            }
        }
        tracing::info!(
            enabled = self.custom_buttons_enabled,
            "custom buttons change applies after restart"
        );
        if let Err(err) = self.save() {
            tracing::warn!(%err, "failed to save toolbar layout");
        }
        self.custom_buttons_enabled
    }

    /// `last_plugin_command` is the highest plugin command id handed out so
    /// far.
    pub fn resource_usage(&self, last_plugin_command: u32) -> ResourceUsage {
        let limit = *self.resolver.plugin_menu_range().end();
        let custom_buttons = self
            .snapshot
            .iter()
            .filter(|a| {
                !a.is_separator()
                    && self.resolver.category(a.button.command) == CommandCategory::Custom
            })
            .count()
            .max(self.custom.definitions.len().min(MAX_CUSTOM_BUTTONS));
        ResourceUsage {
            buttons_available: self.snapshot.len(),
            custom_buttons,
            plugin_commands_used: last_plugin_command.saturating_sub(PLUGIN_CMD_FIRST) + 1,
            plugin_commands_limit: limit - PLUGIN_CMD_FIRST + 1,
        }
    }
}
