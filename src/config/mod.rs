//! Configuration and credential loading.
//!
//! Run configuration comes from a JSON file (`config.json` by default) and
//! account credentials from the environment. Both are loaded once at process
//! start and passed by reference into the orchestrator; there is no ambient
//! global state.

mod credentials;
mod settings;

pub use credentials::{Credentials, CredentialsError};
pub use settings::{Instructions, Settings, SettingsError};
