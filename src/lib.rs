pub mod custom_buttons;
pub mod host;
pub mod identity;
pub mod layout;
pub mod logging;
pub mod menu;
pub mod service;
pub mod session;
pub mod settings;

pub use host::{HostButton, ToolbarHost};
pub use identity::{Identity, IdentityResolver};
pub use layout::{FileStorage, LayoutError, LayoutRecord};
pub use service::{LayoutService, LayoutTrigger};
pub use session::Session;
pub use settings::Settings;
