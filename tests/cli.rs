//! End-to-end tests driving the compiled binary.
//!
//! Sources are static lists or point at local closed ports, so no test
//! touches the public network.

use sha2::{Digest, Sha256};
use std::fs;
use std::net::TcpListener;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_blocklister(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blocklister"))
        .args(args)
        .output()
        .expect("Failed to execute blocklister")
}

fn write_config(dir: &Path, yaml: &str) -> String {
    let path = dir.join("config.yml");
    fs::write(&path, yaml).unwrap();
    path.to_string_lossy().to_string()
}

/// A loopback port with nothing listening on it
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

const STATIC_CONFIG: &str = r#"
sources:
  bogons:
    ipv4:
      - 0.0.0.0/8
      - 240.0.0.0/4
    ipv6:
      - 2001:db8::/32
  private:
    ipv4:
      - 10.0.0.0/8
    ipv6: []
"#;

#[test]
fn test_version_command() {
    let output = run_blocklister(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("blocklister"));
}

#[test]
fn test_help_command() {
    let output = run_blocklister(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("build"));
    assert!(stdout.contains("check"));
}

#[test]
fn test_check_lists_sources_in_order() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), STATIC_CONFIG);

    let output = run_blocklister(&["check", "-c", &config]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let bogons = stdout.find("bogons").unwrap();
    let private = stdout.find("private").unwrap();
    assert!(bogons < private);
    assert!(stdout.contains("2 sources"));
}

#[test]
fn test_check_rejects_invalid_config() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(
        tmp.path(),
        "sources:\n  radb:\n    whois: whois.radb.net\n",
    );

    let output = run_blocklister(&["check", "-c", &config]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("query"), "stderr: {}", stderr);
}

#[test]
fn test_check_missing_config() {
    let output = run_blocklister(&["check", "-c", "/nonexistent/blocklister.yml"]);
    assert!(!output.status.success());
}

#[test]
fn test_build_static_sources() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), STATIC_CONFIG);
    let dist = tmp.path().join("dist");

    let output = run_blocklister(&["build", "-c", &config, "-o", dist.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert_eq!(
        fs::read_to_string(dist.join("bogons.v4.blocklist")).unwrap(),
        "0.0.0.0/8\n240.0.0.0/4\n"
    );
    assert_eq!(
        fs::read_to_string(dist.join("bogons.v6.blocklist")).unwrap(),
        "2001:db8::/32\n"
    );
    assert_eq!(
        fs::read_to_string(dist.join("private.v4.blocklist")).unwrap(),
        "10.0.0.0/8\n"
    );
    // No IPv6 data for this source means no file, not an empty one
    assert!(!dist.join("private.v6.blocklist").exists());

    assert_eq!(
        fs::read_to_string(dist.join("combined.v4.blocklist")).unwrap(),
        "0.0.0.0/8\n240.0.0.0/4\n10.0.0.0/8\n"
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("bogons: 2 IPv4 - | 1 IPv6"), "stdout: {}", stdout);
    assert!(stdout.contains("private: 1 IPv4 - | 0 IPv6"), "stdout: {}", stdout);

    // checksums.txt lists every blocklist with its own digest
    let checksums = fs::read_to_string(dist.join("checksums.txt")).unwrap();
    let lines: Vec<&str> = checksums.lines().collect();
    assert_eq!(lines.len(), 5);
    for line in lines {
        let (digest, filename) = line.split_once(' ').unwrap();
        let content = fs::read(dist.join(filename)).unwrap();
        assert_eq!(digest, hex::encode(Sha256::digest(&content)), "{}", filename);
    }

    assert!(dist.join("checksums.json").is_file());
    assert!(dist.join("blocklists.tar.gz").is_file());
    let index = fs::read_to_string(dist.join("index.html")).unwrap();
    assert!(index.contains("combined.v6.blocklist"));

    for name in [
        "bogons.v4.blocklist",
        "combined.v4.blocklist",
        "checksums.json",
        "checksums.txt",
        "blocklists.tar.gz",
        "index.html",
    ] {
        let mode = fs::metadata(dist.join(name)).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644, "{}", name);
    }
}

#[test]
fn test_build_removes_stale_blocklists() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), STATIC_CONFIG);
    let dist = tmp.path().join("dist");
    fs::create_dir_all(&dist).unwrap();
    fs::write(dist.join("retired.v4.blocklist"), "192.0.2.0/24\n").unwrap();

    let output = run_blocklister(&["build", "-c", &config, "-o", dist.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(!dist.join("retired.v4.blocklist").exists());
    assert!(!fs::read_to_string(dist.join("combined.v4.blocklist"))
        .unwrap()
        .contains("192.0.2.0/24"));
}

#[test]
fn test_build_aborts_on_failing_source() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(
        tmp.path(),
        &format!(
            r#"
fetch:
  whois_port: {}
  whois_timeout_secs: 5
sources:
  good:
    ipv4: ["10.0.0.0/8"]
  unreachable:
    whois: 127.0.0.1
    query: "-i origin AS64500"
"#,
            closed_port()
        ),
    );
    let dist = tmp.path().join("dist");

    let output = run_blocklister(&["build", "-c", &config, "-o", dist.to_str().unwrap()]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unreachable"), "stderr: {}", stderr);
    assert!(stderr.contains("connect"), "stderr: {}", stderr);
    assert!(!dist.join("index.html").exists());
}

#[test]
fn test_aborted_build_keeps_previous_set() {
    let tmp = TempDir::new().unwrap();
    let dist = tmp.path().join("dist");
    let dist_arg = dist.to_str().unwrap().to_string();

    let config = write_config(
        tmp.path(),
        r#"
sources:
  a:
    ipv4: ["10.0.0.0/8"]
  b:
    ipv4: ["192.0.2.0/24"]
    ipv6: ["2001:db8::/32"]
"#,
    );
    let output = run_blocklister(&["build", "-c", &config, "-o", &dist_arg]);
    assert!(output.status.success());
    let published = fs::read_to_string(dist.join("checksums.txt")).unwrap();

    // Same sources, but b now also needs an unreachable WHOIS server
    let config = write_config(
        tmp.path(),
        &format!(
            r#"
fetch:
  whois_port: {}
  whois_timeout_secs: 5
sources:
  a:
    ipv4: ["172.16.0.0/12"]
  b:
    ipv4: ["192.0.2.0/24"]
    whois: 127.0.0.1
    query: "-i origin AS64500"
"#,
            closed_port()
        ),
    );
    let output = run_blocklister(&["build", "-c", &config, "-o", &dist_arg]);
    assert!(!output.status.success());

    assert_eq!(fs::read_to_string(dist.join("checksums.txt")).unwrap(), published);
    for line in published.lines() {
        let (digest, filename) = line.split_once(' ').unwrap();
        let content = fs::read(dist.join(filename)).unwrap();
        assert_eq!(digest, hex::encode(Sha256::digest(&content)), "{}", filename);
    }
    assert_eq!(
        fs::read_to_string(dist.join("a.v4.blocklist")).unwrap(),
        "10.0.0.0/8\n"
    );

    let staging_left = fs::read_dir(&dist)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().starts_with(".staging"))
        .count();
    assert_eq!(staging_left, 0);
}

#[test]
fn test_build_keep_going_skips_failing_source() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(
        tmp.path(),
        &format!(
            r#"
fetch:
  whois_port: {}
  whois_timeout_secs: 5
sources:
  unreachable:
    whois: 127.0.0.1
    query: "-i origin AS64500"
  good:
    ipv4: ["10.0.0.0/8"]
"#,
            closed_port()
        ),
    );
    let dist = tmp.path().join("dist");

    let output = run_blocklister(&[
        "build",
        "-c",
        &config,
        "-o",
        dist.to_str().unwrap(),
        "--keep-going",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("[SKIPPED]"), "stdout: {}", stdout);
    assert!(dist.join("good.v4.blocklist").is_file());
    assert!(!dist.join("unreachable.v4.blocklist").exists());
}

#[test]
fn test_fetch_prints_routes() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), STATIC_CONFIG);

    let output = run_blocklister(&["fetch", "bogons", "-c", &config, "-q"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# bogons IPv4 (2 entries)"));
    assert!(stdout.contains("240.0.0.0/4"));
    assert!(stdout.contains("2001:db8::/32"));
}

#[test]
fn test_fetch_unknown_source() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), STATIC_CONFIG);

    let output = run_blocklister(&["fetch", "nope", "-c", &config]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown source"));
}
