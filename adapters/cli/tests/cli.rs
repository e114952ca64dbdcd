use std::process::Command;

#[test]
fn runs_first_level_to_an_outcome() {
    let output = Command::new(env!("CARGO_BIN_EXE_bastion"))
        .args(["--level", "1", "--seed", "7", "--log-level", "warn"])
        .output()
        .expect("failed to launch the bastion binary");

    assert!(output.status.success(), "bastion exited with {:?}", output.status);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("level: Level 1"), "unexpected output: {stdout}");
    assert!(
        stdout.contains("outcome: won") || stdout.contains("outcome: lost"),
        "unexpected output: {stdout}"
    );
}

#[test]
fn rejects_missing_level_file() {
    let output = Command::new(env!("CARGO_BIN_EXE_bastion"))
        .args(["--level-file", "does/not/exist.toml"])
        .output()
        .expect("failed to launch the bastion binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read level file"), "unexpected error: {stderr}");
}
