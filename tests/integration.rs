use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn psync_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("psync");
    path
}

fn write_config(dir: &Path, targets: &[String]) -> PathBuf {
    let rendered: Vec<String> = targets.iter().map(|t| format!("{:?}", t)).collect();
    let config_path = dir.join("psync.toml");
    fs::write(
        &config_path,
        format!(
            r#"
preamble = "Test preamble for the assistant."

[assistant]
id = "asst_test"

[watch]
targets = [{}]
"#,
            rendered.join(", ")
        ),
    )
    .unwrap();
    config_path
}

fn run_snapshot(config_path: &Path) -> String {
    let output = Command::new(psync_binary())
        .args(["snapshot", "--config"])
        .arg(config_path)
        .output()
        .expect("failed to run psync");
    assert!(
        output.status.success(),
        "snapshot failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn test_init_creates_config_and_refuses_overwrite() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("psync.toml");

    let output = Command::new(psync_binary())
        .args(["init", "--config"])
        .arg(&config_path)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(config_path.exists());

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("[assistant]"));
    assert!(content.contains("[watch]"));

    // Second init must not clobber the existing file.
    let output = Command::new(psync_binary())
        .args(["init", "--config"])
        .arg(&config_path)
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_snapshot_renders_files_in_target_order() {
    let tmp = TempDir::new().unwrap();
    let dir_a = tmp.path().join("dir_a");
    let dir_b = tmp.path().join("dir_b");
    fs::create_dir_all(&dir_a).unwrap();
    fs::create_dir_all(&dir_b).unwrap();
    fs::write(dir_a.join("a.txt"), "alpha content").unwrap();
    fs::write(dir_b.join("b.txt"), "beta content").unwrap();

    let config_path = write_config(
        tmp.path(),
        &[dir_a.display().to_string(), dir_b.display().to_string()],
    );
    let stdout = run_snapshot(&config_path);

    assert!(stdout.starts_with("Test preamble for the assistant.\n\n"));
    let a = stdout.find("alpha content").unwrap();
    let b = stdout.find("beta content").unwrap();
    assert!(a < b, "dir_a's block must precede dir_b's");
    assert!(stdout.contains("//"));
    assert!(stdout.contains("a.txt\nalpha content"));
}

#[test]
fn test_snapshot_skips_missing_target() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("a.txt");
    fs::write(&file, "present").unwrap();

    let config_path = write_config(
        tmp.path(),
        &[
            file.display().to_string(),
            tmp.path().join("missing.txt").display().to_string(),
        ],
    );
    let stdout = run_snapshot(&config_path);

    assert!(stdout.contains("present"));
    assert!(!stdout.contains("missing.txt"));
}

#[test]
fn test_snapshot_is_deterministic() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("z.rs"), "mod z;").unwrap();
    fs::write(tmp.path().join("a.rs"), "mod a;").unwrap();
    let sub = tmp.path().join("sub");
    fs::create_dir_all(&sub).unwrap();
    fs::write(sub.join("m.rs"), "mod m;").unwrap();

    let config_path = write_config(tmp.path(), &[tmp.path().display().to_string()]);

    let first = run_snapshot(&config_path);
    let second = run_snapshot(&config_path);
    assert_eq!(first, second);
}

#[test]
fn test_glob_target_expansion() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("keep.md"), "markdown here").unwrap();
    fs::write(tmp.path().join("skip.rs"), "rust here").unwrap();

    let config_path = write_config(tmp.path(), &[format!("{}/*.md", tmp.path().display())]);
    let stdout = run_snapshot(&config_path);

    assert!(stdout.contains("markdown here"));
    assert!(!stdout.contains("rust here"));
}

#[test]
fn test_unsupported_database_scheme_is_fatal_at_startup() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.txt"), "x").unwrap();

    let config_path = tmp.path().join("psync.toml");
    fs::write(
        &config_path,
        format!(
            r#"
[assistant]
id = "asst_test"

[watch]
targets = [{:?}]

[database]
url = "redis://localhost/0"
"#,
            tmp.path().display().to_string()
        ),
    )
    .unwrap();

    let output = Command::new(psync_binary())
        .args(["snapshot", "--config"])
        .arg(&config_path)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mysql") || stderr.contains("postgres"));
}

#[test]
fn test_missing_config_fails_cleanly() {
    let tmp = TempDir::new().unwrap();
    let output = Command::new(psync_binary())
        .args(["snapshot", "--config"])
        .arg(tmp.path().join("nope.toml"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read config file"));
}
