// Injects ERRGOTRACE_VERSION from `git describe`, falling back to the
// package version when git is unavailable.

use std::process::Command;

fn main() {
    let version = git_describe()
        .map(|described| version_from_describe(&described))
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo:rustc-env=ERRGOTRACE_VERSION={}", version);
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");
}

fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let described = String::from_utf8(output.stdout).ok()?;
    let described = described.trim();
    (!described.is_empty()).then(|| described.to_string())
}

/// `v1.2.0` and `v1.2.0-3-gabc123` → `1.2.0`; a bare hash is appended to
/// the package version
fn version_from_describe(described: &str) -> String {
    match described.strip_prefix('v') {
        Some(tagged) => tagged.split('-').next().unwrap_or(tagged).to_string(),
        None => format!("{}-{}", env!("CARGO_PKG_VERSION"), described),
    }
}
