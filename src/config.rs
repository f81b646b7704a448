//! Runtime configuration.
//!
//! [`Settings`] is read from the environment once per invocation and turned
//! into a [`Layout`]; [`CommandOptions`] carries the per-command flags.
use std::ffi::OsString;
use std::path::PathBuf;

use crate::error::{LnkError, Result};
use crate::paths::{self, Host, Layout};

/// Environment-derived settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Home directory.
    pub home: PathBuf,
    /// Value of `XDG_CONFIG_HOME`, if set.
    pub xdg_config_home: Option<OsString>,
}

impl Settings {
    /// Read `HOME` and `XDG_CONFIG_HOME`.
    ///
    /// # Errors
    ///
    /// Returns [`LnkError::HomeNotFound`] if the home directory cannot be
    /// determined.
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir().ok_or(LnkError::HomeNotFound)?;
        Ok(Self {
            home,
            xdg_config_home: std::env::var_os("XDG_CONFIG_HOME"),
        })
    }

    /// Repository root: `$XDG_CONFIG_HOME/lnk`, or `~/.config/lnk`.
    #[must_use]
    pub fn repo_root(&self) -> PathBuf {
        paths::repo_root_for(&self.home, self.xdg_config_home.as_deref())
    }

    /// Resolved layout for this invocation.
    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout::new(&self.home, self.repo_root())
    }
}

/// Flags accepted by the commands, gathered in one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOptions {
    /// Host label; `None` selects the common configuration.
    pub host: Option<String>,
    /// Expand directories into their files.
    pub recursive: bool,
    /// Report what would happen without changing anything.
    pub dry_run: bool,
    /// Override safety checks.
    pub force: bool,
    /// Skip the bootstrap script after cloning.
    pub no_bootstrap: bool,
    /// Remote to clone from during init.
    pub remote_url: Option<String>,
    /// Commit message for push.
    pub message: Option<String>,
}

impl CommandOptions {
    /// Parsed host.
    ///
    /// # Errors
    ///
    /// Returns [`LnkError::InvalidHost`] for an unusable label.
    pub fn host(&self) -> Result<Host> {
        Host::parse(self.host.as_deref())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn repo_root_defaults_under_home() {
        let settings = Settings {
            home: PathBuf::from("/home/u"),
            xdg_config_home: None,
        };
        assert_eq!(settings.repo_root(), PathBuf::from("/home/u/.config/lnk"));
    }

    #[test]
    fn repo_root_follows_xdg() {
        let settings = Settings {
            home: PathBuf::from("/home/u"),
            xdg_config_home: Some(OsString::from("/cfg")),
        };
        assert_eq!(settings.repo_root(), PathBuf::from("/cfg/lnk"));
    }

    #[test]
    fn options_parse_host() {
        let opts = CommandOptions {
            host: Some("work".to_string()),
            ..CommandOptions::default()
        };
        assert_eq!(opts.host().unwrap(), Host::Named("work".to_string()));
        assert_eq!(CommandOptions::default().host().unwrap(), Host::Common);

        let bad = CommandOptions {
            host: Some("a/b".to_string()),
            ..CommandOptions::default()
        };
        assert!(matches!(bad.host(), Err(LnkError::InvalidHost { .. })));
    }
}
