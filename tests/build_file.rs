// tests/build_file.rs

use std::io::Write;

use tempfile::{NamedTempFile, TempDir};

use parbuild::cli::CliArgs;
use parbuild::config::{load_and_validate, SchedulerSettings};
use parbuild::errors::ParbuildError;
use parbuild::project::Project;
use parbuild_test_utils::init_tracing;

fn write_build_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn args(file: &NamedTempFile, targets: &[&str]) -> CliArgs {
    CliArgs {
        targets: targets.iter().map(|s| s.to_string()).collect(),
        file: file.path().to_string_lossy().into_owned(),
        defines: Vec::new(),
        threads: None,
        timeout: None,
        debug: false,
        log_level: None,
        dry_run: false,
    }
}

#[test]
fn dag_cycle_returns_structured_error() {
    let file = write_build_file(
        r#"
[target.A]
cmd = "echo A"
depends = ["B"]

[target.B]
cmd = "echo B"
depends = ["A"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(ParbuildError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('A') || msg.contains('B'));
        }
        Err(e) => panic!("Expected DagCycle error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn unknown_dependency_returns_config_error() {
    let file = write_build_file(
        r#"
[target.A]
cmd = "echo A"
depends = ["NonExistent"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(ParbuildError::ConfigError(msg)) => {
            assert!(msg.contains("unknown dependency"));
            assert!(msg.contains("NonExistent"));
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn malformed_toml_returns_toml_error() {
    let file = write_build_file("[target.A\ncmd = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(ParbuildError::TomlError(_))
    ));
}

#[test]
fn properties_of_any_scalar_type_become_settings() {
    let file = write_build_file(
        r#"
[project]
name = "demo"
default = "all"

[properties]
"parbuild.numthreads" = 3
"parbuild.debug" = true
"parbuild.timeout" = "45"

[target.all]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let project = Project::from_config(&cfg);
    assert_eq!(project.name(), "demo");
    assert_eq!(project.default_target(), Some("all"));
    assert_eq!(project.property("parbuild.numthreads"), Some("3"));

    let settings = SchedulerSettings::from_project(&project).unwrap();
    assert_eq!(settings.num_threads, 3);
    assert!(settings.debug);
    assert_eq!(settings.timeout.as_secs(), 45);
}

#[cfg(unix)]
#[tokio::test]
async fn runs_commands_from_build_file_in_dependency_order() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.txt");
    let out = out.display();

    let file = write_build_file(&format!(
        r#"
[project]
default = "package"

[target.init]
cmd = "echo init >> '{out}'"

[target.compile]
cmd = "echo compile >> '{out}'"
depends = ["init"]

[target.package]
cmd = "echo package >> '{out}'"
depends = ["compile"]
"#
    ));

    parbuild::run(args(&file, &[])).await.unwrap();

    let written = std::fs::read_to_string(dir.path().join("out.txt")).unwrap();
    assert_eq!(written.lines().collect::<Vec<_>>(), vec!["init", "compile", "package"]);
}

#[cfg(unix)]
#[tokio::test]
async fn failing_command_surfaces_target_name() {
    init_tracing();
    let file = write_build_file(
        r#"
[target.ok]
cmd = "true"

[target.broken]
cmd = "exit 7"
depends = ["ok"]
"#,
    );

    let mut cli = args(&file, &["broken"]);
    cli.threads = Some(2);

    match parbuild::run(cli).await {
        Err(ParbuildError::TargetFailed { target, source }) => {
            assert_eq!(target, "broken");
            assert!(source.to_string().contains("status 7"));
        }
        other => panic!("expected TargetFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn no_targets_and_no_default_is_an_error() {
    let file = write_build_file(
        r#"
[target.a]
"#,
    );

    assert!(matches!(
        parbuild::run(args(&file, &[])).await,
        Err(ParbuildError::ConfigError(_))
    ));
}

#[tokio::test]
async fn dry_run_does_not_execute() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("ran");

    let file = write_build_file(&format!(
        r#"
[target.touch]
cmd = "touch '{}'"
"#,
        marker.display()
    ));

    let mut cli = args(&file, &["touch"]);
    cli.dry_run = true;
    parbuild::run(cli).await.unwrap();

    assert!(!marker.exists());
}

#[tokio::test]
async fn cli_shorthands_override_build_file_properties() {
    let file = write_build_file(
        r#"
[properties]
"parbuild.numthreads" = "nonsense"

[target.a]
"#,
    );

    // The build file value alone is rejected...
    assert!(matches!(
        parbuild::run(args(&file, &["a"])).await,
        Err(ParbuildError::ConfigError(_))
    ));

    // ...but `-j` replaces it.
    let mut cli = args(&file, &["a"]);
    cli.threads = Some(2);
    cli.defines.push(("parbuild.timeout".to_string(), "5".to_string()));
    parbuild::run(cli).await.unwrap();
}
