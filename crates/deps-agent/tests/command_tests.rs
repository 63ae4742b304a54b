//! Runs real subprocesses through `sh`.
#![cfg(unix)]

use deps_agent::{AgentConfig, CommandService};
use deps_core::{Dependency, DependencyService, Error};
use pretty_assertions::assert_eq;

fn sh(script: &str) -> Vec<String> {
    vec!["-c".to_string(), script.to_string(), "agent".to_string()]
}

fn service(check: &str, install: &str) -> CommandService {
    CommandService::new(
        AgentConfig::new("sh")
            .check_args(sh(check))
            .install_args(sh(install)),
    )
}

#[tokio::test]
async fn test_check_parses_stdout() {
    let service = service(
        r#"cat > /dev/null; printf '[{"name":"readr","version":"1.1.0","available_version":"1.3.1","version_satisfied":true}]'"#,
        "exit 0",
    );

    let unsatisfied = service
        .check_unsatisfied(&[Dependency::remote("readr", "1.1.0")], false)
        .await
        .unwrap();

    assert_eq!(
        unsatisfied,
        vec![Dependency::remote("readr", "1.1.0").with_available(Some("1.3.1"), true)]
    );
}

#[tokio::test]
async fn test_check_receives_request_on_stdin() {
    // answer with an empty list only if the request names readr
    let service = service(
        r#"if grep -q '"name":"readr"'; then echo '[]'; else exit 5; fi"#,
        "exit 0",
    );

    let unsatisfied = service
        .check_unsatisfied(&[Dependency::remote("readr", "1.1.0")], false)
        .await
        .unwrap();
    assert!(unsatisfied.is_empty());
}

#[tokio::test]
async fn test_silent_update_flag_in_environment() {
    let service = service(
        r#"cat > /dev/null; [ "$DEPS_SILENT_EMBEDDED_UPDATE" = true ] && echo '[]' || exit 4"#,
        "exit 0",
    );
    let deps = [Dependency::embedded("renv", "", true)];

    assert!(service.check_unsatisfied(&deps, true).await.is_ok());
    assert!(service.check_unsatisfied(&deps, false).await.is_err());
}

#[tokio::test]
async fn test_configured_environment_is_passed() {
    let service = CommandService::new(
        AgentConfig::new("sh")
            .check_args(sh(r#"cat > /dev/null; printf '%s' "$AGENT_ANSWER""#))
            .env("AGENT_ANSWER", "[]"),
    );

    let result = service
        .check_unsatisfied(&[Dependency::remote("DBI", "0.8")], false)
        .await;
    assert_eq!(result, Ok(Vec::new()));
}

#[tokio::test]
async fn test_failed_check_is_a_service_error() {
    let service = service("cat > /dev/null; echo 'no repository' >&2; exit 2", "exit 0");

    let err = service
        .check_unsatisfied(&[Dependency::remote("readr", "1.1.0")], false)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        Error::service("Agent failed (exit code 2): no repository")
    );
}

#[tokio::test]
async fn test_unparseable_check_output_is_a_service_error() {
    let service = service("cat > /dev/null; echo 'not json'", "exit 0");

    let err = service
        .check_unsatisfied(&[Dependency::remote("readr", "1.1.0")], false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Service { .. }));
}

#[tokio::test]
async fn test_install_streams_output_and_exit_code() {
    let service = service(
        "exit 0",
        r#"for p in "$@"; do echo "installing $p"; done; echo 'warning: slow mirror' >&2; exit 3"#,
    );

    let handle = service
        .install(
            &[
                Dependency::remote("readr", "1.1.0"),
                Dependency::remote("Rcpp", "0.11.5"),
            ],
            false,
        )
        .await
        .unwrap();
    assert!(handle.id().starts_with("sh:"));

    let mut lines = Vec::new();
    let code = handle
        .wait_with_output(|line| lines.push(line.to_string()))
        .await;

    assert_eq!(code, Some(3));
    lines.sort();
    assert_eq!(
        lines,
        vec!["installing Rcpp", "installing readr", "warning: slow mirror"]
    );
}

#[tokio::test]
async fn test_missing_program_is_a_launch_error() {
    let service = CommandService::new(AgentConfig::new("/nonexistent/deps-agent"));

    let err = service
        .install(&[Dependency::remote("readr", "1.1.0")], false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Launch { .. }));

    let err = service
        .check_unsatisfied(&[Dependency::remote("readr", "1.1.0")], false)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Launch { .. }));
}

#[tokio::test]
async fn test_working_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("answer.json"), "[]").unwrap();
    let service = CommandService::new(
        AgentConfig::new("sh")
            .check_args(sh("cat > /dev/null; cat answer.json"))
            .working_dir(dir.path()),
    );

    let result = service
        .check_unsatisfied(&[Dependency::remote("readr", "1.1.0")], false)
        .await;
    assert_eq!(result, Ok(Vec::new()));
}

#[tokio::test]
async fn test_install_receives_full_request_on_stdin() {
    let service = service("exit 0", r#"cat; echo; echo "argv: $*""#);
    let deps = [
        Dependency::embedded("renv", "0.17.0", true),
        Dependency::remote("knitr", "1.22"),
    ];

    let handle = service.install(&deps, true).await.unwrap();
    let mut lines = Vec::new();
    let code = handle
        .wait_with_output(|line| lines.push(line.to_string()))
        .await;

    assert_eq!(code, Some(0));
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], "argv: renv knitr");

    let request: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
    assert_eq!(request["silent_embedded_update"], true);
    assert_eq!(request["dependencies"][0]["name"], "renv");
    assert_eq!(request["dependencies"][0]["kind"], "embedded");
    assert_eq!(request["dependencies"][0]["version"], "0.17.0");
    assert_eq!(request["dependencies"][0]["update_if_embedded"], true);
    assert_eq!(request["dependencies"][1]["kind"], "remote");
    assert_eq!(request["dependencies"][1]["version"], "1.22");
}

#[tokio::test]
async fn test_agent_that_writes_before_reading_does_not_block() {
    // more output than a pipe buffer holds, before the request is read
    let service = service(
        "head -c 200000 /dev/zero | tr '\\0' ' '; cat > /dev/null; echo '[]'",
        "exit 0",
    );
    let deps: Vec<Dependency> = (0..5000)
        .map(|i| Dependency::remote(format!("pkg{}", i), "1.0"))
        .collect();

    let result = tokio::time::timeout(
        std::time::Duration::from_secs(30),
        service.check_unsatisfied(&deps, false),
    )
    .await
    .expect("agent check deadlocked");

    assert_eq!(result, Ok(Vec::new()));
}
