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

fn select_workspace(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &PathBuf,
) {
    let _ = request_ok(
        stdin,
        reader,
        "ws",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "subj",
        "subjects.add",
        json!({ "code": "CS101", "name": "Data Structures", "semester": 3, "facultyId": "F-12" }),
    );
}

#[test]
fn submissions_track_lateness_and_resubmission() {
    let workspace = temp_dir("campus-assignments");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let open_ended = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "assignments.post",
        json!({
            "subjectCode": "CS101",
            "title": "AVL rotations",
            "dueDate": "9999-12-31",
            "fileUrl": "blob://assignments/avl.pdf"
        }),
    );
    let on_time_id = open_ended
        .get("assignmentId")
        .and_then(|v| v.as_str())
        .expect("assignmentId")
        .to_string();

    let overdue = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "assignments.post",
        json!({ "subjectCode": "CS101", "title": "Heaps", "dueDate": "2020-01-01" }),
    );
    let late_id = overdue
        .get("assignmentId")
        .and_then(|v| v.as_str())
        .expect("assignmentId")
        .to_string();

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "assignments.list",
        json!({ "subjectCode": "CS101" }),
    );
    assert_eq!(
        listed.get("assignments").and_then(|v| v.as_array()).map(Vec::len),
        Some(2)
    );

    let on_time = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "assignments.submit",
        json!({
            "assignmentId": on_time_id,
            "enrollmentId": "EN-1",
            "fileUrl": "blob://submissions/en1-avl.pdf"
        }),
    );
    assert_eq!(on_time.get("late"), Some(&json!(false)));

    let late = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "assignments.submit",
        json!({
            "assignmentId": late_id,
            "enrollmentId": "EN-1",
            "fileUrl": "blob://submissions/en1-heaps.pdf"
        }),
    );
    assert_eq!(late.get("late"), Some(&json!(true)));

    // Resubmission replaces the earlier upload.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "assignments.submit",
        json!({
            "assignmentId": on_time_id,
            "enrollmentId": "EN-1",
            "fileUrl": "blob://submissions/en1-avl-v2.pdf"
        }),
    );
    let submissions = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "assignments.submissions",
        json!({ "assignmentId": on_time_id }),
    );
    let submissions = submissions
        .get("submissions")
        .and_then(|v| v.as_array())
        .expect("submissions");
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        submissions[0].get("fileUrl").and_then(|v| v.as_str()),
        Some("blob://submissions/en1-avl-v2.pdf")
    );

    let missing = request(
        &mut stdin,
        &mut reader,
        "8",
        "assignments.submit",
        json!({
            "assignmentId": "no-such-assignment",
            "enrollmentId": "EN-1",
            "fileUrl": "blob://submissions/lost.pdf"
        }),
    );
    assert_eq!(
        missing
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_found")
    );
}

#[test]
fn notes_upload_and_list_per_subject() {
    let workspace = temp_dir("campus-notes");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "notes.upload",
        json!({
            "subjectCode": "CS101",
            "title": "Week 1: arrays and lists",
            "fileUrl": "blob://notes/week1.pdf",
            "uploadedBy": "F-12"
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "notes.upload",
        json!({
            "subjectCode": "CS101",
            "title": "Week 2: trees",
            "fileUrl": "blob://notes/week2.pdf"
        }),
    );

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "notes.list",
        json!({ "subjectCode": "CS101" }),
    );
    let notes = listed.get("notes").and_then(|v| v.as_array()).expect("notes");
    assert_eq!(notes.len(), 2);
    assert!(notes
        .iter()
        .all(|n| n.get("subjectCode").and_then(|v| v.as_str()) == Some("CS101")));

    let unknown_subject = request(
        &mut stdin,
        &mut reader,
        "4",
        "notes.upload",
        json!({
            "subjectCode": "NOPE",
            "title": "Ghost notes",
            "fileUrl": "blob://notes/ghost.pdf"
        }),
    );
    assert_eq!(
        unknown_subject
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_found")
    );
}
