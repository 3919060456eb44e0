use assert_cmd::Command;
use assert_cmd::cargo;
use flate2::Compression;
use flate2::write::GzEncoder;
use mockito::Server;
use predicates::prelude::*;
use std::path::Path;
use tar::Builder;
use tempfile::tempdir;

fn create_tar_gz(root: &str, files: &[(&str, &str, u32)]) -> Vec<u8> {
    let mut tar_builder = Builder::new(Vec::new());

    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Directory);
    header.set_path(format!("{}/", root)).unwrap();
    header.set_mode(0o755);
    header.set_size(0);
    header.set_cksum();
    tar_builder.append(&header, std::io::empty()).unwrap();

    for (name, content, mode) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_path(format!("{}/{}", root, name)).unwrap();
        header.set_mode(*mode);
        header.set_cksum();
        tar_builder.append(&header, content.as_bytes()).unwrap();
    }
    let tar = tar_builder.into_inner().unwrap();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    std::io::Write::write_all(&mut encoder, &tar).unwrap();
    encoder.finish().unwrap()
}

/// Release file stem for the host, e.g. `node-v20.11.0-linux-x64`.
fn dist_stem(version: &str) -> String {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        _ => "linux",
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "x86",
        other => other,
    };
    format!("node-v{}-{}-{}", version, os, arch)
}

fn nym(root: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("nym"));
    cmd.arg("--root").arg(root).env_remove("NYM_MIRROR");
    cmd
}

#[cfg(unix)]
#[test]
fn test_end_to_end_install_and_use() {
    let mut server = Server::new();
    let version = "20.11.0";
    let stem = dist_stem(version);

    let _mock_index = server
        .mock("GET", "/index.json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"version":"v21.0.0"},{"version":"v20.11.0"},{"version":"v18.17.1"}]"#)
        .create();

    let archive = create_tar_gz(
        &stem,
        &[
            ("bin/node", "#!/bin/sh\necho v20.11.0\n", 0o755),
            ("lib/node_modules/npm/package.json", "{}", 0o644),
        ],
    );
    let mock_download = server
        .mock("GET", format!("/v{}/{}.tar.gz", version, stem).as_str())
        .with_status(200)
        .with_body(&archive)
        .create();

    let root_dir = tempdir().unwrap();
    let root = root_dir.path();

    nym(root)
        .arg("install")
        .arg(format!("v{}", version))
        .arg("--mirror")
        .arg(server.url())
        .assert()
        .success()
        .stdout(predicate::str::contains("nym use 20.11.0"));
    mock_download.assert();

    let version_dir = root.join("versions").join("v20.11.0");
    assert_eq!(
        std::fs::read_to_string(version_dir.join("bin/node")).unwrap(),
        "#!/bin/sh\necho v20.11.0\n"
    );
    assert!(version_dir.join("lib/node_modules/npm/package.json").exists());
    assert!(!version_dir.join(&stem).exists());

    nym(root).arg("use").arg(version).assert().success();
    assert_eq!(std::fs::read_link(root.join("current")).unwrap(), version_dir);

    nym(root)
        .arg("current")
        .assert()
        .success()
        .stdout(predicate::str::contains("v20.11.0"));

    nym(root)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("=> v20.11.0 (current)"));

    nym(root)
        .args(["ls-remote", "--limit", "2", "--mirror"])
        .arg(server.url())
        .assert()
        .success()
        .stdout(predicate::str::contains("v21.0.0"))
        .stdout(predicate::str::contains("v20.11.0 (installed)"))
        .stdout(predicate::str::contains("v18.17.1").not());
}

#[test]
fn test_install_unknown_version_fails() {
    let mut server = Server::new();
    let _mock_index = server
        .mock("GET", "/index.json")
        .with_status(200)
        .with_body(r#"[{"version":"v21.0.0"},{"version":"v20.11.0"}]"#)
        .create();

    let root_dir = tempdir().unwrap();

    nym(root_dir.path())
        .args(["install", "99.0.0", "--mirror"])
        .arg(server.url())
        .assert()
        .failure()
        .stderr(predicate::str::contains("v99.0.0 is not available"))
        .stderr(predicate::str::contains("21.0.0"));

    assert!(!root_dir.path().join("versions").join("v99.0.0").exists());
}

#[test]
fn test_use_missing_version_fails() {
    let root_dir = tempdir().unwrap();
    std::fs::create_dir_all(root_dir.path().join("versions")).unwrap();

    nym(root_dir.path())
        .args(["use", "18.17.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Version v18.17.1 is not installed"));

    assert!(!root_dir.path().join("current").exists());
}

#[test]
fn test_list_empty_root() {
    let root_dir = tempdir().unwrap();

    nym(root_dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No versions installed."));
}

#[test]
fn test_use_rejects_version_with_path_segments() {
    let root_dir = tempdir().unwrap();
    std::fs::create_dir_all(root_dir.path().join("versions")).unwrap();

    nym(root_dir.path())
        .args(["use", "../../etc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid version"));

    assert!(!root_dir.path().join("current").exists());
}
