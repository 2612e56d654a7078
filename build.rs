//! Stamps the binary with the git revision it was built from.
//!
//! Packagers building outside a checkout can set `TASKPLAN_BUILD_REV`.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-env-changed=TASKPLAN_BUILD_REV");
    for path in [".git/HEAD", ".git/index", ".git/packed-refs", ".git/refs/heads/"] {
        println!("cargo:rerun-if-changed={path}");
    }

    let rev = std::env::var("TASKPLAN_BUILD_REV")
        .ok()
        .filter(|r| !r.trim().is_empty())
        .or_else(|| {
            let hash = git(&["rev-parse", "--short=7", "HEAD"]).filter(|h| !h.is_empty())?;
            let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
                .is_some_and(|s| !s.is_empty());
            Some(if dirty { format!("{hash}+dirty") } else { hash })
        })
        .unwrap_or_else(|| "unknown".to_string());

    println!("cargo:rustc-env=TASKPLAN_BUILD_REV={rev}");
}
