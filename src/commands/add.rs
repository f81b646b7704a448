//! Add command implementation.
use anyhow::Result;

use super::{files, tilde};
use crate::cli::AddOpts;
use crate::config::CommandOptions;
use crate::engine::Candidate;
use crate::fs::EntryKind;
use crate::logging::Logger;

/// Run the add command.
///
/// One path without `--recursive` is adopted as a single entry (a directory
/// stays one entry); anything else goes through the batch path so that the
/// whole set is committed, or rolled back, together.
///
/// # Errors
///
/// Returns an error if any path cannot be adopted.  Nothing is left half
/// adopted in that case.
pub fn run(opts: &AddOpts, log: &Logger) -> Result<()> {
    let options = CommandOptions::from(opts);
    let lnk = super::open(&options)?;

    if options.dry_run {
        let candidates = lnk.preview(&opts.paths, options.recursive)?;
        log.stage(&format!("Would add {} to {}", files(candidates.len()), lnk.host()));
        for candidate in &candidates {
            log.dry_run(&describe(candidate));
        }
        return Ok(());
    }

    log.stage(&format!("Adding to {}", lnk.host()));
    let added = match opts.paths.as_slice() {
        [single] if !options.recursive => vec![lnk.add(single)?],
        paths => lnk.add_batch(paths, options.recursive)?,
    };
    for candidate in &added {
        log.info(&describe(candidate));
    }
    log.info(&format!("added {}", files(added.len())));
    Ok(())
}

fn describe(candidate: &Candidate) -> String {
    match candidate.kind {
        EntryKind::File => tilde(&candidate.rel),
        EntryKind::Directory => format!("{}/", tilde(&candidate.rel)),
    }
}
