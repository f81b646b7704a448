//! Git-native dotfiles manager.
//!
//! `lnk` moves files from the home directory into a Git repository at
//! `$XDG_CONFIG_HOME/lnk` (default `~/.config/lnk`) and leaves relative
//! symlinks behind.  Files are tracked per host: a common configuration
//! listed in `.lnk`, and per-host configurations listed in `.lnk.<host>`
//! whose payloads live under `<host>.lnk/`.
//!
//! The public API is organised into layers:
//!
//! - **[`paths`]**, **[`fs`]**, **[`manifest`]**: path translation, filesystem
//!   primitives and the manifest store
//! - **[`git`]**: the version control backend
//! - **[`engine`]**: transactional adopt, release and init, plus the
//!   [`sync`], [`doctor`] and [`bootstrap`] operations
//! - **[`commands`]**: top-level subcommand orchestration
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;
pub mod doctor;
pub mod engine;
pub mod error;
pub mod exec;
pub mod fs;
pub mod git;
pub mod logging;
pub mod manifest;
pub mod paths;
pub mod sync;
