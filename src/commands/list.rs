//! List command implementation.
use std::io::{self, Write};

use anyhow::Result;

use crate::cli::ListOpts;
use crate::config::CommandOptions;
use crate::logging::Logger;
use crate::paths::Host;

/// Print managed files, one per line.
///
/// With `--all` every host is printed under its own heading.
///
/// # Errors
///
/// Returns an error if the repository is not initialized, a manifest
/// cannot be read, or stdout is closed.
pub fn run(opts: &ListOpts, log: &Logger) -> Result<()> {
    let options = CommandOptions::from(opts);
    let lnk = super::open(&options)?;
    let mut out = io::stdout().lock();

    if opts.all {
        let all = lnk.list_all()?;
        if all.is_empty() {
            log.info("no files managed");
        }
        for (host, entries) in &all {
            write_section(&mut out, host, entries)?;
        }
        return Ok(());
    }

    let entries = lnk.list()?;
    if entries.is_empty() {
        log.info(&format!("no files managed for {}", lnk.host()));
    }
    write_entries(&mut out, &entries)?;
    Ok(())
}

fn write_entries(out: &mut dyn Write, entries: &[String]) -> io::Result<()> {
    for rel in entries {
        writeln!(out, "{rel}")?;
    }
    Ok(())
}

fn write_section(out: &mut dyn Write, host: &Host, entries: &[String]) -> io::Result<()> {
    writeln!(out, "{host} ({}):", super::files(entries.len()))?;
    for rel in entries {
        writeln!(out, "  {rel}")?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn section(host: &Host, entries: &[String]) -> String {
        let mut buf = Vec::new();
        write_section(&mut buf, host, entries).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn section_lists_entries_under_host() {
        let entries = vec![".bashrc".to_string(), ".config/git".to_string()];
        insta::assert_snapshot!(section(&Host::Named("work".into()), &entries), @r"
        work (2 files):
          .bashrc
          .config/git
        ");
    }

    #[test]
    fn empty_common_section() {
        assert_eq!(section(&Host::Common, &[]), "common (0 files):\n");
    }

    #[test]
    fn entries_one_per_line() {
        let mut buf = Vec::new();
        write_entries(&mut buf, &[".bashrc".to_string(), ".vimrc".to_string()]).unwrap();
        assert_eq!(buf, b".bashrc\n.vimrc\n");
    }
}
