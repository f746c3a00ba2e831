// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn run_request() -> CommandRequest {
    CommandRequest::run("/bin/tool", vec![])
}

#[test]
fn successful_run_prints_both_streams() {
    let report = report(&run_request(), CommandResponse::completed(0, "out\n".into(), "warn\n".into()));
    assert_eq!(
        report,
        Report { stdout: "out\n".into(), stderr: "warn\n".into(), exit: None }
    );
}

#[test]
fn failed_run_exits_with_child_code() {
    let report = report(&run_request(), CommandResponse::completed(3, String::new(), "boom".into()));
    assert_eq!(report.stderr, "boom");
    assert_eq!(report.exit, Some(ExitError::silent(3)));
}

#[test]
fn run_that_never_started_is_a_failure() {
    let report = report(&run_request(), CommandResponse::failure("executable not found: /bin/tool"));
    assert_eq!(report.exit, Some(ExitError::new(EXIT_FAILURE, "executable not found: /bin/tool")));
    assert!(report.stdout.is_empty());
}

#[yare::parameterized(
    ping      = { CommandRequest::Ping,                 CommandResponse::ok(),           "agent is running\n" },
    workload  = { CommandRequest::GetActiveWorkloadId,  CommandResponse::value("620"),   "620\n" },
    identity  = { CommandRequest::GetPrimaryIdentityPath, CommandResponse::value("/s"),  "/s\n" },
    sweep     = { CommandRequest::TerminateUnderDirectory { directory: "/g".into() }, CommandResponse::value("2"), "2\n" },
    open      = { CommandRequest::LaunchByUrl { url: "steam://x".into() }, CommandResponse::ok(), "" },
)]
fn successful_queries_print_their_value(request: CommandRequest, response: CommandResponse, stdout: &str) {
    let report = report(&request, response);
    assert_eq!(report.stdout, stdout);
    assert_eq!(report.exit, None);
}

#[test]
fn business_failure_exits_one_with_message() {
    let report = report(
        &CommandRequest::GetActiveWorkloadId,
        CommandResponse::failure("no Steam title is running"),
    );
    assert_eq!(report.exit, Some(ExitError::new(EXIT_FAILURE, "no Steam title is running")));
}

#[test]
fn run_arguments_keep_leading_hyphens() {
    let command = Command::Run {
        timeout_ms: 250,
        executable: "/bin/sh".into(),
        args: vec!["-c".into(), "exit 3".into()],
    };
    assert_eq!(
        command.into_request(),
        CommandRequest::RunCommand {
            executable: "/bin/sh".into(),
            arguments: vec!["-c".into(), "exit 3".into()],
            timeout: Duration::from_millis(250),
        }
    );
}
