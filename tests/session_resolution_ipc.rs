use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_campusd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn campusd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn destination(result: &serde_json::Value) -> &str {
    result
        .get("destination")
        .and_then(|v| v.as_str())
        .expect("destination")
}

#[test]
fn launch_resolution_follows_account_lifecycle() {
    let workspace = temp_dir("campus-session-resolution");

    // First launch: nobody signed in.
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let resolved = request_ok(&mut stdin, &mut reader, "2", "session.resolve", json!({}));
    assert_eq!(destination(&resolved), "welcome");

    // Student signs up and is held at the pending screen.
    let signed_up = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.signUp",
        json!({
            "email": "asha@college.edu",
            "password": "secret1",
            "role": "student",
            "fullName": "Asha Rao",
            "enrollmentId": "EN-2031"
        }),
    );
    assert_eq!(signed_up.get("status").and_then(|v| v.as_str()), Some("pending"));
    let uid = signed_up
        .get("uid")
        .and_then(|v| v.as_str())
        .expect("uid")
        .to_string();

    let resolved = request_ok(&mut stdin, &mut reader, "4", "session.resolve", json!({}));
    assert_eq!(destination(&resolved), "pending");

    // An admin approves the account.
    let approved = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "admin.setStatus",
        json!({ "uid": uid, "status": "approved" }),
    );
    assert_eq!(approved.get("status").and_then(|v| v.as_str()), Some("approved"));

    // Within the same launch the resolution stays memoized.
    let resolved = request_ok(&mut stdin, &mut reader, "6", "session.resolve", json!({}));
    assert_eq!(destination(&resolved), "pending");
    drop(stdin);

    // Relaunch: the persisted session is restored and the approved role
    // lands on its home screen, with the navigator rooted there.
    let (_child2, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let resolved = request_ok(&mut stdin, &mut reader, "8", "session.resolve", json!({}));
    assert_eq!(destination(&resolved), "student_home");
    let stack = request_ok(&mut stdin, &mut reader, "9", "nav.stack", json!({}));
    assert_eq!(
        stack.get("stack"),
        Some(&json!(["student_home"])),
        "navigator initialized at the resolved destination"
    );
}

#[test]
fn admin_accounts_resolve_to_the_approval_console() {
    let workspace = temp_dir("campus-session-admin");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "admin.createUser",
        json!({ "email": "dean@college.edu", "password": "secret1", "role": "admin" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "auth.signIn",
        json!({ "email": "dean@college.edu", "password": "secret1" }),
    );
    let resolved = request_ok(&mut stdin, &mut reader, "4", "session.resolve", json!({}));
    assert_eq!(destination(&resolved), "admin_approval");
}

#[test]
fn resolve_requires_a_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let resp = request(&mut stdin, &mut reader, "1", "session.resolve", json!({}));
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        resp.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("no_workspace")
    );
}
