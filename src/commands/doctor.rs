//! Doctor command implementation.
use anyhow::Result;

use super::tilde;
use crate::cli::DoctorOpts;
use crate::config::CommandOptions;
use crate::doctor::DoctorReport;
use crate::logging::Logger;

/// Scan the selected host and, unless `--dry-run`, repair it.
///
/// # Errors
///
/// Returns an error if the repository is not initialized or a repair step
/// fails.
pub fn run(opts: &DoctorOpts, log: &Logger) -> Result<()> {
    let options = CommandOptions::from(opts);
    let lnk = super::open(&options)?;
    log.stage(&format!("Checking {}", lnk.host()));

    if options.dry_run {
        let report = lnk.diagnose()?;
        if report.is_healthy() {
            log.info("no problems found");
        }
        for line in problems(&report) {
            log.dry_run(&format!("would fix {line}"));
        }
        return Ok(());
    }

    let repair = lnk.repair()?;
    if repair.report.is_healthy() {
        log.info("no problems found");
        return Ok(());
    }
    for line in problems(&repair.report) {
        log.warn(&line);
    }
    for rel in &repair.restored {
        log.info(&format!("restored symlink {}", tilde(rel)));
    }
    for rel in &repair.cleaned {
        log.info(&format!("dropped {rel} from the manifest"));
    }
    Ok(())
}

fn problems(report: &DoctorReport) -> Vec<String> {
    let invalid = report
        .invalid_entries
        .iter()
        .map(|rel| format!("{rel}: missing from the repository"));
    let broken = report
        .broken_symlinks
        .iter()
        .map(|rel| format!("{}: symlink missing or wrong", tilde(rel)));
    invalid.chain(broken).collect()
}
