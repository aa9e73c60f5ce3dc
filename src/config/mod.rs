//! Console configuration file.
//!
//! The file is INI with a `[NIOS]` section:
//!
//! ```ini
//! [NIOS]
//! gm = 192.168.1.10
//! api_version = v2.12
//! valid_cert = false
//! user = admin
//! pass = infoblox
//! ```
//!
//! Values may be wrapped in `'` or `"`. Missing keys fall back to an empty
//! string with a warning.

use crate::console::Credentials;
use crate::result::ConsoleError;
use ini::{Ini, ParseOption, Properties};
use std::fmt;
use std::path::Path;
use tracing::{debug, error, warn};

/// Name of the section holding console settings
pub const SECTION: &str = "NIOS";

/// Settings read from the `[NIOS]` section.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Grid master host
    pub gm: String,
    /// WAPI version
    pub api_version: String,
    /// Whether to verify TLS certificates
    pub valid_cert: String,
    /// Administrator user
    pub user: String,
    /// Administrator password
    pub pass: String,
}

impl fmt::Debug for ConsoleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleConfig")
            .field("gm", &self.gm)
            .field("api_version", &self.api_version)
            .field("valid_cert", &self.valid_cert)
            .field("user", &self.user)
            .field("pass", &"<redacted>")
            .finish()
    }
}

impl ConsoleConfig {
    /// Read and parse a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConsoleError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConsoleError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;

        let config = Self::parse(&content)?;
        debug!(path = %path.display(), ?config, "configuration loaded");
        Ok(config)
    }

    /// Read a configuration file, logging problems and falling back to empty
    /// settings instead of failing
    pub fn load(path: impl AsRef<Path>) -> Self {
        Self::from_file(path).unwrap_or_else(|e| {
            error!("{e}");
            Self::default()
        })
    }

    /// Parse configuration text
    pub fn parse(content: &str) -> Result<Self, ConsoleError> {
        // Passwords may contain backslashes and quotes, so take values verbatim
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(content, options)
            .map_err(|e| ConsoleError::Config(format!("Failed to parse config: {e}")))?;

        let Some(section) = ini.section(Some(SECTION)) else {
            warn!("No {SECTION} Section in config file");
            return Ok(Self::default());
        };

        Ok(Self {
            gm: value(section, "gm"),
            api_version: value(section, "api_version"),
            valid_cert: value(section, "valid_cert"),
            user: value(section, "user"),
            pass: value(section, "pass"),
        })
    }

    /// Login for the console
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.user.clone(), self.pass.clone())
    }
}

fn value(section: &Properties, key: &str) -> String {
    match section.get(key) {
        Some(value) => value.trim_matches(|c| c == '\'' || c == '"').to_string(),
        None => {
            warn!("Key {key} not found in {SECTION} section.");
            String::new()
        }
    }
}
