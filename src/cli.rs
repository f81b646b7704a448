//! Command-line definitions.
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::config::CommandOptions;

/// Top-level CLI entry point for lnk.
#[derive(Parser, Debug)]
#[command(
    name = "lnk",
    about = "Git-native dotfiles manager: adopt files into a repository and symlink them back",
    version = option_env!("LNK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the lnk repository, or clone it from a remote
    Init(InitOpts),
    /// Move files into the repository and replace them with symlinks
    Add(AddOpts),
    /// Stop managing a file and move it back into place
    Rm(RmOpts),
    /// List managed files
    List(ListOpts),
    /// Show how the repository compares with its remote
    Status,
    /// Commit pending changes and push to the remote
    Push(PushOpts),
    /// Pull from the remote and restore symlinks
    Pull(PullOpts),
    /// Check managed files and repair what is broken
    Doctor(DoctorOpts),
    /// Run the repository's bootstrap script
    Bootstrap,
    /// Print shell completions to stdout
    Completions(CompletionsOpts),
}

impl Command {
    /// Name used for the per-command log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Add(_) => "add",
            Self::Rm(_) => "rm",
            Self::List(_) => "list",
            Self::Status => "status",
            Self::Push(_) => "push",
            Self::Pull(_) => "pull",
            Self::Doctor(_) => "doctor",
            Self::Bootstrap => "bootstrap",
            Self::Completions(_) => "completions",
        }
    }
}

/// Host selection shared by the per-host commands.
#[derive(Args, Debug, Clone, Default)]
pub struct HostOpts {
    /// Manage files for this host instead of the common configuration
    #[arg(long = "host", short = 'H', value_name = "HOST")]
    pub host: Option<String>,
}

/// Options for the `init` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InitOpts {
    /// Clone an existing dotfiles repository
    #[arg(short, long, value_name = "URL")]
    pub remote: Option<String>,

    /// Do not run bootstrap.sh after cloning
    #[arg(long)]
    pub no_bootstrap: bool,

    /// Replace an existing repository even if it manages files
    #[arg(short, long)]
    pub force: bool,
}

/// Options for the `add` subcommand.
#[derive(Args, Debug, Clone)]
pub struct AddOpts {
    /// Host selection.
    #[command(flatten)]
    pub host: HostOpts,

    /// Add the files inside directories one by one
    #[arg(short, long)]
    pub recursive: bool,

    /// Show what would be added without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Files or directories to add
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<std::path::PathBuf>,
}

/// Options for the `rm` subcommand.
#[derive(Args, Debug, Clone)]
pub struct RmOpts {
    /// Host selection.
    #[command(flatten)]
    pub host: HostOpts,

    /// Remove even if the file is not listed in the manifest
    #[arg(short, long)]
    pub force: bool,

    /// Managed symlink to remove
    #[arg(value_name = "PATH")]
    pub path: std::path::PathBuf,
}

/// Options for the `list` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ListOpts {
    /// Host selection.
    #[command(flatten)]
    pub host: HostOpts,

    /// List the common configuration and every host
    #[arg(short, long, conflicts_with = "host")]
    pub all: bool,
}

/// Options for the `push` subcommand.
#[derive(Args, Debug, Clone)]
pub struct PushOpts {
    /// Commit message for pending changes
    #[arg(value_name = "MESSAGE")]
    pub message: Option<String>,
}

/// Options for the `pull` subcommand.
#[derive(Args, Debug, Clone)]
pub struct PullOpts {
    /// Host selection.
    #[command(flatten)]
    pub host: HostOpts,
}

/// Options for the `doctor` subcommand.
#[derive(Args, Debug, Clone)]
pub struct DoctorOpts {
    /// Host selection.
    #[command(flatten)]
    pub host: HostOpts,

    /// Report problems without repairing them
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Options for the `completions` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CompletionsOpts {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl From<&InitOpts> for CommandOptions {
    fn from(opts: &InitOpts) -> Self {
        Self {
            force: opts.force,
            no_bootstrap: opts.no_bootstrap,
            remote_url: opts.remote.clone(),
            ..Self::default()
        }
    }
}

impl From<&AddOpts> for CommandOptions {
    fn from(opts: &AddOpts) -> Self {
        Self {
            host: opts.host.host.clone(),
            recursive: opts.recursive,
            dry_run: opts.dry_run,
            ..Self::default()
        }
    }
}

impl From<&RmOpts> for CommandOptions {
    fn from(opts: &RmOpts) -> Self {
        Self {
            host: opts.host.host.clone(),
            force: opts.force,
            ..Self::default()
        }
    }
}

impl From<&ListOpts> for CommandOptions {
    fn from(opts: &ListOpts) -> Self {
        Self {
            host: opts.host.host.clone(),
            ..Self::default()
        }
    }
}

impl From<&PushOpts> for CommandOptions {
    fn from(opts: &PushOpts) -> Self {
        Self {
            message: opts.message.clone(),
            ..Self::default()
        }
    }
}

impl From<&PullOpts> for CommandOptions {
    fn from(opts: &PullOpts) -> Self {
        Self {
            host: opts.host.host.clone(),
            ..Self::default()
        }
    }
}

impl From<&DoctorOpts> for CommandOptions {
    fn from(opts: &DoctorOpts) -> Self {
        Self {
            host: opts.host.host.clone(),
            dry_run: opts.dry_run,
            ..Self::default()
        }
    }
}
