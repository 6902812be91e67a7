//! Stamps build provenance into the binary for `/api/health`.
//!
//! Packagers building outside a git checkout can pin the values with
//! `AUDITDESK_COMMIT` and `AUDITDESK_BUILT_AT`.

use std::env;
use std::process::Command;

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=10", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn pinned(var: &str) -> Option<String> {
    println!("cargo:rerun-if-env-changed={var}");
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn main() {
    let commit = pinned("AUDITDESK_COMMIT")
        .or_else(git_short_hash)
        .unwrap_or_else(|| "untracked".into());
    let built_at = pinned("AUDITDESK_BUILT_AT")
        .unwrap_or_else(|| chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true));

    println!("cargo:rustc-env=GIT_COMMIT_SHORT={commit}");
    println!("cargo:rustc-env=BUILD_TIMESTAMP={built_at}");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
