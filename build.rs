//! Generates `build_info.rs` for `raid_insurance::utils::build_info`.
//!
//! Release pipelines pin the values through `RAID_INSURANCE_COMMIT` and
//! `RAID_INSURANCE_BUILD_DATE`; otherwise git and the clock fill them in.

use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

const COMMIT_VAR: &str = "RAID_INSURANCE_COMMIT";
const DATE_VAR: &str = "RAID_INSURANCE_BUILD_DATE";
const SHORT_HASH_LEN: usize = 7;

fn short_hash(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let hex = raw.len() >= SHORT_HASH_LEN && raw.chars().all(|c| c.is_ascii_hexdigit());
    hex.then(|| raw[..SHORT_HASH_LEN].to_string())
}

fn git_head() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    short_hash(&String::from_utf8(output.stdout).ok()?)
}

fn commit() -> String {
    env::var(COMMIT_VAR)
        .ok()
        .and_then(|pinned| short_hash(&pinned))
        .or_else(git_head)
        .unwrap_or_else(|| "unknown".to_string())
}

fn build_date() -> String {
    env::var(DATE_VAR).unwrap_or_else(|_| chrono::Utc::now().format("%Y-%m-%d").to_string())
}

fn main() {
    let Some(out_dir) = env::var_os("OUT_DIR").map(PathBuf::from) else {
        panic!("OUT_DIR is not set; build.rs must run under cargo");
    };

    let generated = format!(
        "pub const BUILD_COMMIT: &str = {:?};\npub const BUILD_DATE: &str = {:?};\n",
        commit(),
        build_date()
    );
    if let Err(e) = fs::write(out_dir.join("build_info.rs"), generated) {
        panic!("writing build_info.rs: {e}");
    }

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-env-changed={COMMIT_VAR}");
    println!("cargo:rerun-if-env-changed={DATE_VAR}");
}
