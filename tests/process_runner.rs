//! End-to-end runner tests against real child processes.

#![cfg(unix)]

use std::io::Write;
use std::os::unix::fs::PermissionsExt;

use trace_workbench::model::ExitReason;
use trace_workbench::runner::ProcessRunner;

const LINES_PER_STREAM: usize = 10_000;

/// Script that fills stderr completely before writing a byte to stdout. A
/// runner that drains the streams one at a time deadlocks here: the child
/// blocks on a full stderr pipe while the parent blocks reading stdout.
fn write_chatty_script(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("chatty.sh");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "#!/bin/sh").unwrap();
    writeln!(file, "i=0").unwrap();
    writeln!(file, "while [ $i -lt {LINES_PER_STREAM} ]; do").unwrap();
    writeln!(file, "  echo \"err line $i\" >&2").unwrap();
    writeln!(file, "  i=$((i + 1))").unwrap();
    writeln!(file, "done").unwrap();
    writeln!(file, "i=0").unwrap();
    writeln!(file, "while [ $i -lt {LINES_PER_STREAM} ]; do").unwrap();
    writeln!(file, "  echo \"out line $i\"").unwrap();
    writeln!(file, "  i=$((i + 1))").unwrap();
    writeln!(file, "done").unwrap();
    drop(file);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[tokio::test]
async fn drains_both_streams_past_pipe_buffer_capacity() {
    let tmp = tempfile::tempdir().unwrap();
    let script = write_chatty_script(tmp.path());

    let result = ProcessRunner::new()
        .run(&script.to_string_lossy())
        .await;

    assert_eq!(result.exit_reason, ExitReason::Completed);
    assert_eq!(result.stdout.lines().count(), LINES_PER_STREAM);
    assert_eq!(result.stderr.lines().count(), LINES_PER_STREAM);
    assert_eq!(result.stdout.lines().next(), Some("out line 0"));
    assert_eq!(result.stderr.lines().next(), Some("err line 0"));

    // Combined output keeps stdout ahead of stderr regardless of the order
    // the child produced them in.
    let combined = result.combined_output();
    let first_err = combined.find("err line 0").unwrap();
    let last_out = combined.rfind("out line").unwrap();
    assert!(last_out < first_err);
}

#[tokio::test]
async fn resolves_pid_of_a_live_process() {
    // `ps <name>` on Linux procps treats the argument as a PID list, so feed
    // it our own PID; the listing's second line then describes this process.
    let result = ProcessRunner::new()
        .resolve_process_id(&std::process::id().to_string())
        .await;
    assert_eq!(result, Ok(std::process::id()));
}

#[tokio::test]
async fn arguments_are_tokenized_on_whitespace() {
    let result = ProcessRunner::new().run("printf %s:%s a b").await;
    assert_eq!(result.exit_reason, ExitReason::Completed);
    assert_eq!(result.stdout, "a:b");
}
