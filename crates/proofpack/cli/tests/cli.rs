//! End-to-end tests for the `proofpack` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const PASSPHRASE: &str = "correct horse battery";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir_all(tree.join("src")).unwrap();
        fs::write(tree.join("a.txt"), b"x").unwrap();
        fs::write(tree.join("b.key"), b"secret").unwrap();
        fs::write(tree.join("results.json"), br#"{"h0":67.96}"#).unwrap();
        fs::write(tree.join("src/fit.py"), b"def fit(x):\n    return x\n").unwrap();
        fs::write(
            dir.path().join("proofpack.toml"),
            "[run]\nresults_path = \"results.json\"\n\n[seal.kdf]\nmemory_kib = 64\niterations = 1\nlanes = 1\n",
        )
        .unwrap();
        Self { dir }
    }

    fn tree(&self) -> PathBuf {
        self.dir.path().join("tree")
    }

    fn pkg(&self) -> PathBuf {
        self.dir.path().join("pkg")
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("proofpack.toml")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("proofpack").unwrap();
        cmd.env_remove("PROOFPACK_CONFIG")
            .env_remove("SOURCE_DATE_EPOCH")
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(self.config());
        cmd
    }

    fn build(&self) -> assert_cmd::assert::Assert {
        self.cmd()
            .env("PROOFPACK_PASSPHRASE", PASSPHRASE)
            .args(["build", "--anchor", "TRGB-2025", "--revision", "4f2c1a9"])
            .args(["--timestamp", "2025-03-01T12:00:00Z"])
            .arg("--root")
            .arg(self.tree())
            .arg("--out")
            .arg(self.pkg())
            .assert()
    }

    fn verify(&self, extra: &[&str], passphrase: Option<&str>) -> assert_cmd::assert::Assert {
        let mut cmd = self.cmd();
        match passphrase {
            Some(p) => cmd.env("PROOFPACK_PASSPHRASE", p),
            None => cmd.env_remove("PROOFPACK_PASSPHRASE"),
        };
        cmd.arg("verify").arg("--package").arg(self.pkg()).args(extra).assert()
    }
}

fn path_arg(p: &Path) -> &str {
    p.to_str().unwrap()
}

#[test]
fn build_then_verify_against_root() {
    let ws = Workspace::new();
    ws.build()
        .success()
        .stdout(predicate::str::contains("proof package written"));
    assert!(ws.pkg().join("proof.json").is_file());
    assert!(ws.pkg().join("sealed.bundle").is_file());

    let tree = ws.tree();
    ws.verify(&["--root", path_arg(&tree)], None)
        .code(0)
        .stdout(predicate::str::contains("verified"));
}

#[test]
fn edited_artifact_exits_one() {
    let ws = Workspace::new();
    ws.build().success();
    fs::write(ws.tree().join("b.key"), b"secreT").unwrap();

    let tree = ws.tree();
    ws.verify(&["--root", path_arg(&tree), "--json"], None)
        .code(1)
        .stdout(predicate::str::contains("\"verdict\": \"mismatch_found\""))
        .stdout(predicate::str::contains("b.key"));
}

#[test]
fn bundle_mode_round_trips() {
    let ws = Workspace::new();
    ws.build().success();
    ws.verify(&["--bundle"], Some(PASSPHRASE)).code(0);
}

#[test]
fn wrong_passphrase_exits_two() {
    let ws = Workspace::new();
    ws.build().success();
    ws.verify(&["--bundle", "--json"], Some("wrong"))
        .code(2)
        .stdout(predicate::str::contains("decryption_failure"));
}

#[test]
fn passphrase_from_file() {
    let ws = Workspace::new();
    ws.build().success();
    let file = ws.dir.path().join("pass.txt");
    fs::write(&file, format!("{PASSPHRASE}\n")).unwrap();
    ws.verify(&["--bundle", "--passphrase-file", path_arg(&file)], None)
        .code(0);
}

#[test]
fn existing_package_is_refused() {
    let ws = Workspace::new();
    ws.build().success();
    ws.build()
        .code(3)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn sealing_without_passphrase_fails() {
    let ws = Workspace::new();
    ws.cmd()
        .env_remove("PROOFPACK_PASSPHRASE")
        .args(["build", "--anchor", "TRGB-2025", "--revision", "r1"])
        .arg("--root")
        .arg(ws.tree())
        .arg("--out")
        .arg(ws.pkg())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("no passphrase"));
    assert!(!ws.pkg().exists());
}

#[test]
fn missing_anchor_is_a_usage_error() {
    let ws = Workspace::new();
    ws.cmd()
        .env("PROOFPACK_PASSPHRASE", PASSPHRASE)
        .args(["build", "--revision", "r1"])
        .arg("--root")
        .arg(ws.tree())
        .arg("--out")
        .arg(ws.pkg())
        .assert()
        .code(64)
        .stderr(predicate::str::contains("anchor"));
}

#[test]
fn config_carrying_a_passphrase_is_refused() {
    let ws = Workspace::new();
    fs::write(ws.config(), "[seal]\npassphrase = \"hunter2\"\n").unwrap();
    ws.cmd()
        .args(["classify", "a.txt"])
        .assert()
        .code(64)
        .stderr(predicate::str::contains("seal.passphrase"))
        .stderr(predicate::str::contains("hunter2").not());
}

#[test]
fn environment_overrides_config() {
    let ws = Workspace::new();
    ws.cmd()
        .env("PROOFPACK__USE_DEFAULT_RULES", "false")
        .args(["classify", "notes.md", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tier\": \"private\""))
        .stdout(predicate::str::contains("\"rule\": null"));
}

#[test]
fn classify_reports_tiers() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["classify", "a.txt", "b.key", "api/model.pyi", "src/fit.py", "raw/ccd.fits"])
        .assert()
        .success()
        .stdout(predicate::str::contains("public-signature"))
        .stdout(predicate::str::contains("restricted"))
        .stdout(predicate::str::contains("private"));
}

#[test]
fn inspect_prints_summary() {
    let ws = Workspace::new();
    ws.build().success();
    ws.cmd()
        .arg("inspect")
        .arg("--package")
        .arg(ws.pkg())
        .assert()
        .success()
        .stdout(predicate::str::contains("TRGB-2025"))
        .stdout(predicate::str::contains("4f2c1a9"))
        .stdout(predicate::str::contains(PASSPHRASE).not());
}

#[test]
fn source_date_epoch_fixes_the_timestamp() {
    let ws = Workspace::new();
    ws.cmd()
        .env("PROOFPACK_PASSPHRASE", PASSPHRASE)
        .env("SOURCE_DATE_EPOCH", "1740830400")
        .args(["build", "--anchor", "TRGB-2025", "--revision", "r1"])
        .arg("--root")
        .arg(ws.tree())
        .arg("--out")
        .arg(ws.pkg())
        .assert()
        .success();
    let proof: serde_json::Value =
        serde_json::from_slice(&fs::read(ws.pkg().join("proof.json")).unwrap()).unwrap();
    assert_eq!(proof["timestamp"], "2025-03-01T12:00:00Z");
}

#[test]
fn usage_errors_do_not_look_like_verdicts() {
    Command::cargo_bin("proofpack")
        .unwrap()
        .args(["verify", "--no-such-flag"])
        .assert()
        .code(64);
}

#[test]
fn nonexistent_root_is_unavailable_not_a_usage_error() {
    let ws = Workspace::new();
    ws.build().success();
    let gone = ws.dir.path().join("no-such-tree");
    ws.verify(&["--root", path_arg(&gone), "--json"], None)
        .code(2)
        .stdout(predicate::str::contains("root_unavailable"));
}

#[test]
fn bundle_mode_without_a_bundle_is_unavailable() {
    let ws = Workspace::new();
    ws.build().success();
    fs::remove_file(ws.pkg().join("sealed.bundle")).unwrap();
    ws.verify(&["--bundle", "--json"], Some(PASSPHRASE))
        .code(2)
        .stdout(predicate::str::contains("package_file_unavailable"))
        .stdout(predicate::str::contains("sealed.bundle"));
}

#[test]
fn missing_proof_is_unavailable() {
    let ws = Workspace::new();
    ws.build().success();
    fs::remove_file(ws.pkg().join("proof.json")).unwrap();
    let tree = ws.tree();
    ws.verify(&["--root", path_arg(&tree), "--json"], None)
        .code(2)
        .stdout(predicate::str::contains("\"verdict\": \"inputs_unavailable\""))
        .stdout(predicate::str::contains("proof.json"));
}

#[test]
fn missing_package_is_unavailable() {
    let ws = Workspace::new();
    ws.verify(&[], None)
        .code(2)
        .stdout(predicate::str::contains("inputs unavailable"));
}

#[test]
fn package_carries_audit_trail_and_verification_descriptor() {
    let ws = Workspace::new();
    ws.build().success();

    let audit = fs::read_to_string(ws.pkg().join("audit.jsonl")).unwrap();
    let stages: Vec<String> = audit
        .lines()
        .map(|l| serde_json::from_str::<serde_json::Value>(l).unwrap()["stage"].to_string())
        .collect();
    assert_eq!(stages.first().map(String::as_str), Some("\"started\""));
    assert_eq!(stages.last().map(String::as_str), Some("\"emitted\""));
    assert!(!audit.contains(PASSPHRASE));

    let proof: serde_json::Value =
        serde_json::from_slice(&fs::read(ws.pkg().join("proof.json")).unwrap()).unwrap();
    assert_eq!(proof["verification"]["expected_digest"], proof["combined_digest"]);

    ws.cmd()
        .args(["inspect", "--json", "--package"])
        .arg(ws.pkg())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"intact\""))
        .stdout(predicate::str::contains("proofpack verify"));
}

#[test]
fn inspect_flags_an_edited_audit_trail() {
    let ws = Workspace::new();
    ws.build().success();
    let path = ws.pkg().join("audit.jsonl");
    let edited = fs::read_to_string(&path).unwrap().replace("TRGB-2025", "TRGB-2026");
    fs::write(&path, edited).unwrap();

    ws.cmd()
        .arg("inspect")
        .arg("--package")
        .arg(ws.pkg())
        .assert()
        .success()
        .stdout(predicate::str::contains("audit trail:"))
        .stdout(predicate::str::contains("modified"));
}
