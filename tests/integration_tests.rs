use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn virtbuilder() -> Command {
    let mut cmd = Command::cargo_bin("virtbuilder").unwrap();
    cmd.env_remove("VIRTBUILDER_WORKDIR").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_command() {
    virtbuilder()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Build and install libvirt VMs from a YAML definition",
        ));
}

#[test]
fn test_completions_command() {
    virtbuilder()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_virtbuilder"));
}

#[test]
fn test_man_page_command() {
    virtbuilder()
        .arg("man-page")
        .assert()
        .success()
        .stdout(predicate::str::contains(".TH"));
}

#[test]
fn test_validate_ok() {
    for name in ["valid.yml", "minimum.yml"] {
        virtbuilder()
            .arg("validate")
            .arg(fixture(name))
            .assert()
            .success()
            .stdout(predicate::str::contains("OK!"));
    }
}

#[test]
fn test_validate_reports_every_problem() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.yml");
    let text = fs::read_to_string(fixture("minimum.yml"))
        .unwrap()
        .replace("  pool: default\n", "")
        .replace("format: qcow2", "format: vmdk")
        + "extra: true\n";
    fs::write(&path, text).unwrap();

    virtbuilder()
        .arg("validate")
        .arg(&path)
        .assert()
        .failure()
        .stdout(predicate::str::contains("OK!").not())
        .stderr(predicate::str::contains("invalid definition (3 problem(s))"))
        .stderr(predicate::str::contains("unknown key 'extra'"))
        .stderr(predicate::str::contains("missing mandatory key 'pool'"))
        .stderr(predicate::str::contains("'vmdk' is not one of: qcow2, raw"));
}

#[test]
fn test_validate_missing_file() {
    virtbuilder()
        .args(["validate", "/nonexistent/vm.yml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read definition"));
}

#[test]
fn test_create_image_stage_preview() {
    let temp = TempDir::new().unwrap();
    virtbuilder()
        .arg("--workdir")
        .arg(temp.path())
        .arg("create")
        .arg(fixture("minimum.yml"))
        .args(["--stage", "image", "--preview"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "virt-builder \\\n  ubuntu-18.04 \\\n  --format qcow2 \\\n  --output kmaster.qcow2 \\\n  --hostname kmaster \\\n  --size \"12G\"\n",
        ))
        .stdout(predicate::str::contains("virsh").not());
}

#[test]
fn test_create_volume_stage_uses_image_size() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("kmaster.qcow2"), vec![0u8; 1536]).unwrap();

    virtbuilder()
        .env("VIRTBUILDER_WORKDIR", temp.path())
        .arg("create")
        .arg(fixture("minimum.yml"))
        .args(["--stage", "volume", "--preview"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--capacity 1536"));
}

#[test]
fn test_create_full_preview_lists_every_stage() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("kmaster.qcow2"), b"disk").unwrap();
    let image = temp.path().canonicalize().unwrap().join("kmaster.qcow2");

    let output = virtbuilder()
        .current_dir(temp.path())
        .arg("create")
        .arg(fixture("valid.yml"))
        .arg("--preview")
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    let order = [
        "virt-builder \\",
        "vol-create-as",
        "vol-upload",
        "rm \\",
        "virt-install \\",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|needle| stdout.find(needle).unwrap_or_else(|| panic!("{needle} missing")))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{stdout}");
    assert!(stdout.contains("--capacity 4"));
    assert!(stdout.contains(&format!("--file {}", image.display())));
}

#[test]
fn test_create_volume_without_image_fails() {
    let temp = TempDir::new().unwrap();
    virtbuilder()
        .arg("--workdir")
        .arg(temp.path())
        .arg("create")
        .arg(fixture("minimum.yml"))
        .args(["--stage", "volume", "--preview"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot stat image"));
}

#[test]
fn test_create_rejects_unknown_stage() {
    virtbuilder()
        .arg("create")
        .arg(fixture("minimum.yml"))
        .args(["--stage", "deploy", "--preview"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'deploy'"));
}

#[test]
fn test_create_refuses_invalid_definition() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("vm.yml");
    fs::write(&path, "general: {}\n").unwrap();

    virtbuilder()
        .arg("create")
        .arg(&path)
        .arg("--preview")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("missing mandatory key 'image'"));
}

#[test]
fn test_remove_preview() {
    virtbuilder()
        .arg("remove")
        .arg(fixture("minimum.yml"))
        .arg("--preview")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "virsh \\\n  --connect qemu:///system \\\n  destroy \\\n  --domain kmaster",
        ))
        .stdout(predicate::str::contains("--remove-all-storage"));
}

#[test]
fn test_interactive_abort() {
    virtbuilder()
        .arg("remove")
        .arg(fixture("minimum.yml"))
        .write_stdin("q\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Press Enter to continue"))
        .stdout(predicate::str::contains("Aborted after 0 command(s)."));
}

#[test]
fn test_missing_tool_is_reported() {
    let temp = TempDir::new().unwrap();
    virtbuilder()
        .env("PATH", temp.path())
        .arg("remove")
        .arg(fixture("minimum.yml"))
        .arg("--no-interactive")
        .assert()
        .failure()
        .stderr(predicate::str::contains("'virsh' not found on PATH"));
}
