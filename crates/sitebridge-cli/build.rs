//! Stamps the binary version with the commit it was built from.
//!
//! `SITEBRIDGE_VERSION` is the package version plus semver build metadata,
//! e.g. `0.1.0+3f2a9c1` or `0.1.0+3f2a9c1.dirty`. Outside a git checkout it
//! is the bare package version.

use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let git_dir = manifest_dir
        .ancestors()
        .map(|dir| dir.join(".git"))
        .find(|candidate| candidate.exists());

    if let Some(git_dir) = &git_dir {
        println!("cargo:rerun-if-changed={}", git_dir.join("HEAD").display());
        println!("cargo:rerun-if-changed={}", git_dir.join("index").display());
    }

    let package = env!("CARGO_PKG_VERSION");
    let version = match git_dir.as_deref().and_then(build_metadata) {
        Some(metadata) => format!("{package}+{metadata}"),
        None => package.to_string(),
    };

    println!("cargo:rustc-env=SITEBRIDGE_VERSION={version}");
}

fn build_metadata(git_dir: &Path) -> Option<String> {
    let worktree = git_dir.parent()?;
    let commit = git(worktree, &["rev-parse", "--short", "HEAD"])?;
    if commit.is_empty() {
        return None;
    }

    let dirty = git(worktree, &["status", "--porcelain", "--untracked-files=no"])
        .is_some_and(|status| !status.is_empty());

    Some(if dirty { format!("{commit}.dirty") } else { commit })
}

fn git(worktree: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(worktree)
        .args(args)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|out| out.trim().to_string())
}
