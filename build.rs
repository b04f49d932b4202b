// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=FRAMEGRAB_VERSION");

    // Packagers can pin the version string
    let version = std::env::var("FRAMEGRAB_VERSION").unwrap_or_else(|_| describe_version());
    println!("cargo::rustc-env=GIT_VERSION={}", version);
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// `0.1.0` at a tag becomes `0.1.0-abcdef1`, `0.1.0-5-gabcdef1` becomes
/// `0.1.0-dirty-abcdef1`; outside a git checkout the crate version is used.
fn describe_version() -> String {
    let Some(described) = git(&["describe", "--tags", "--always", "--match", "v*"]) else {
        return env!("CARGO_PKG_VERSION").to_string();
    };
    let described = described.strip_prefix('v').unwrap_or(&described);

    let parts: Vec<&str> = described.rsplitn(3, '-').collect();
    if let [hash, _commits, base] = parts.as_slice() {
        let hash = hash.strip_prefix('g').unwrap_or(hash);
        return format!("{}-dirty-{}", base, hash);
    }

    match git(&["rev-parse", "--short", "HEAD"]) {
        Some(hash) if hash != described => format!("{}-{}", described, hash),
        _ => described.to_string(),
    }
}
