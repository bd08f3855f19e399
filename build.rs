use std::path::Path;
use std::process::Command;

/// Source revision for the startup log: an explicit `MAPSET_BUILD_REV`
/// override, else `git describe`, else "unknown" (e.g. a source tarball).
fn build_rev() -> String {
    if let Ok(rev) = std::env::var("MAPSET_BUILD_REV") {
        return rev;
    }
    Command::new("git")
        .args(["describe", "--always", "--dirty", "--tags"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_owned())
        .filter(|rev| !rev.is_empty())
        .unwrap_or_else(|| "unknown".to_owned())
}

fn main() {
    println!("cargo:rustc-env=MAPSET_BUILD_REV={}", build_rev());
    println!("cargo:rerun-if-env-changed=MAPSET_BUILD_REV");

    let git = Path::new(".git");
    if git.exists() {
        for watched in ["HEAD", "index", "refs"] {
            println!("cargo:rerun-if-changed={}", git.join(watched).display());
        }
    }
}
