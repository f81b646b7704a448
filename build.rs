//! Embeds the version reported by `lnk --version`.
#![allow(clippy::print_stdout)]
use std::process::Command;

fn main() {
    // LNK_VERSION from the environment wins; local builds use git describe.
    if let Ok(version) = std::env::var("LNK_VERSION") {
        println!("cargo:rustc-env=LNK_VERSION={version}");
    } else if let Some(version) = describe() {
        println!("cargo:rustc-env=LNK_VERSION={version}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-env-changed=LNK_VERSION");
}

fn describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}
