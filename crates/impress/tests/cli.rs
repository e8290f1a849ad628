use assert_cmd::Command; // Bring Command into scope
use predicates::prelude::*; // Bring predicate traits into scope
use tempfile::tempdir;

fn impress() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("impress")?;
    cmd.env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn test_ping_command() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = impress()?;
    cmd.arg("--ping");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("pong"));

    Ok(())
}

#[test]
fn test_no_args_mounts_root_view() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let mut cmd = impress()?;
    cmd.arg("--store-dir").arg(temp_dir.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Mounted AppView at #app"))
        .stdout(predicate::str::contains("<a-menu> [menu]"))
        .stdout(predicate::str::contains("<a-upload> [upload]"))
        .stdout(predicate::str::contains("<a-table> [table]"))
        .stdout(predicate::str::contains("pong").not());

    assert!(temp_dir.path().join("impress.sqlite3").exists());
    Ok(())
}

#[test]
fn test_missing_mount_target_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let mut cmd = impress()?;
    cmd.arg("--store-dir")
        .arg(temp_dir.path())
        .arg("--mount-target")
        .arg("#main");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Fatal"))
        .stderr(predicate::str::contains("main"))
        .stdout(predicate::str::contains("Mounted").not());

    Ok(())
}

#[test]
fn test_declared_attachment_point_can_be_targeted() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let mut cmd = impress()?;
    cmd.arg("--store-dir")
        .arg(temp_dir.path())
        .args(["--attach", "app", "--attach", "main", "--mount-target", "#main"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Mounted AppView at #main"));

    Ok(())
}

#[test]
fn test_schema_command() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = impress()?;
    cmd.arg("schema");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("impress (version 1)"))
        .stdout(predicate::str::contains(
            "data: url_crc,domain,source_type,click_count,comments_count,impress",
        ))
        .stdout(predicate::str::contains("dpt: url_crc"));

    Ok(())
}

#[test]
fn test_capabilities_command() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = impress()?;
    cmd.arg("capabilities");

    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output)?;
    assert_eq!(stdout.lines().count(), 8);
    assert!(stdout.contains("spin (ui-kit-spin v0.1.0): a-spin"));
    assert!(stdout.contains("a-upload, a-upload-dragger"));

    Ok(())
}

#[test]
fn test_put_then_get_record() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;

    impress()?
        .arg("--store-dir")
        .arg(temp_dir.path())
        .args(["put", "data", r#"{"url_crc":"abc123","domain":"example.com","source_type":"web"}"#])
        .assert()
        .success()
        .stdout(predicate::str::contains("stored \"abc123\""));

    impress()?
        .arg("--store-dir")
        .arg(temp_dir.path())
        .args(["get", "data", "abc123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("example.com"));

    impress()?
        .arg("--store-dir")
        .arg(temp_dir.path())
        .args(["get", "data", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no record"));

    Ok(())
}

#[test]
fn test_config_file_is_applied() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    let store_dir = temp_dir.path().join("from-config");
    let config_path = temp_dir.path().join("impress.json");
    std::fs::write(
        &config_path,
        format!(
            r#"{{"store": {{"dir": {:?}}}, "mount_target": "app"}}"#,
            store_dir.to_string_lossy()
        ),
    )?;

    impress()?
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Mounted AppView"));

    assert!(store_dir.join("impress.sqlite3").exists());
    Ok(())
}

#[test]
fn test_unknown_table_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = tempdir()?;
    impress()?
        .arg("--store-dir")
        .arg(temp_dir.path())
        .args(["get", "nope", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));

    Ok(())
}
