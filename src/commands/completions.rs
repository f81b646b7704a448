//! Completions command implementation.
use std::io::{self, Write};

use clap::CommandFactory as _;
use clap_complete::Shell;

use crate::cli::{Cli, CompletionsOpts};

/// Print completions for the requested shell to stdout.
pub fn run(opts: &CompletionsOpts) {
    write(opts.shell, &mut io::stdout());
}

fn write(shell: Shell, out: &mut dyn Write) {
    let mut command = Cli::command();
    clap_complete::generate(shell, &mut command, "lnk", out);
}
