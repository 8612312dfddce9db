//! End-to-end orchestration tests against in-memory fakes.

use std::sync::Arc;
use std::time::Duration;

use downstream_core::fakes::{MapEnv, PagedSearchApi, RecordingReporter, ScriptedBuildApi};
use downstream_core::{
    BuildRecord, BuildStatus, ConfigError, OrchestrationError, Orchestrator, PluginConfig,
    RemoteError,
};

fn config() -> PluginConfig {
    PluginConfig::new("org:acme topic:downstream", "https://drone.example.com", "t0ken")
}

fn success(n: u64) -> Result<BuildRecord, RemoteError> {
    Ok(BuildRecord::new(n, BuildStatus::Success, "main"))
}

struct Harness {
    search: Arc<PagedSearchApi>,
    builds: Arc<ScriptedBuildApi>,
    reporter: Arc<RecordingReporter>,
    orchestrator: Orchestrator,
}

fn harness(search: PagedSearchApi, builds: ScriptedBuildApi, env: MapEnv) -> Harness {
    let search = Arc::new(search);
    let builds = Arc::new(builds);
    let reporter = Arc::new(RecordingReporter::new());
    let orchestrator = Orchestrator::new(search.clone(), builds.clone())
        .with_reporter(reporter.clone())
        .with_env(Arc::new(env));
    Harness {
        search,
        builds,
        reporter,
        orchestrator,
    }
}

/// Test: 150 results over two pages keep their order and count
#[tokio::test]
async fn test_discovery_across_two_pages() {
    let first: Vec<String> = (0..100).map(|i| format!("acme/svc-{i:03}")).collect();
    let second: Vec<String> = (100..150).map(|i| format!("acme/svc-{i:03}")).collect();
    let h = harness(
        PagedSearchApi::new(vec![first, second]),
        ScriptedBuildApi::new(),
        MapEnv::default(),
    );

    let repos = h.orchestrator.discover(&config()).await.expect("discover");

    assert_eq!(repos.len(), 150);
    assert_eq!(repos[0].to_string(), "acme/svc-000");
    assert_eq!(repos[99].to_string(), "acme/svc-099");
    assert_eq!(repos[149].to_string(), "acme/svc-149");
    assert_eq!(h.search.requested_pages(), vec![1, 2]);
    assert_eq!(h.reporter.lines()[0], "Added acme/svc-000 to the downstream list.");
}

/// Test: a repository listed on both pages is processed twice
#[tokio::test(start_paused = true)]
async fn test_duplicates_are_processed_twice() {
    let h = harness(
        PagedSearchApi::new(vec![vec!["acme/a".into()], vec!["acme/a".into()]]),
        ScriptedBuildApi::new().latest("acme/a", success(4)),
        MapEnv::default(),
    );

    let summary = h.orchestrator.run(&config()).await.expect("run");

    assert_eq!(summary.triggered, vec!["acme/a", "acme/a"]);
    assert_eq!(h.builds.forks().len(), 2);
}

/// Test: conflicting modes are rejected before any network call
#[tokio::test]
async fn test_wait_and_last_successful_rejected_before_network() {
    let h = harness(
        PagedSearchApi::new(vec![vec!["acme/a".into()]]),
        ScriptedBuildApi::new(),
        MapEnv::default(),
    );
    let cfg = PluginConfig {
        wait: true,
        last_successful: true,
        ..config()
    };

    let err = h.orchestrator.run(&cfg).await.unwrap_err();

    assert!(matches!(
        err,
        OrchestrationError::Config(ConfigError::ConflictingModes)
    ));
    assert!(h.search.requested_pages().is_empty());
}

/// Test: a missing env param is a configuration error before discovery
#[tokio::test]
async fn test_missing_env_param_rejected_before_network() {
    let h = harness(
        PagedSearchApi::new(vec![vec!["acme/a".into()]]),
        ScriptedBuildApi::new(),
        MapEnv::default(),
    );
    let cfg = PluginConfig {
        params_from_env: vec!["DEPLOY_KEY".into()],
        ..config()
    };

    let err = h.orchestrator.run(&cfg).await.unwrap_err();

    assert!(matches!(
        err,
        OrchestrationError::Config(ConfigError::MissingEnvParam(_))
    ));
    assert!(h.search.requested_pages().is_empty());
}

/// Test: the first fatal error stops the run; later repositories are untouched
#[tokio::test(start_paused = true)]
async fn test_first_fatal_error_stops_run() {
    let h = harness(
        PagedSearchApi::new(vec![vec![
            "acme/a".into(),
            "acme/missing".into(),
            "acme/c".into(),
        ]]),
        ScriptedBuildApi::new()
            .latest("acme/a", success(1))
            .latest("acme/c", success(3)),
        MapEnv::default(),
    );

    let err = h.orchestrator.run(&config()).await.unwrap_err();

    assert_eq!(err.to_string(), "unable to get latest build for acme/missing.");
    assert_eq!(h.builds.forks().len(), 1);
    assert_eq!(h.builds.latest_calls("acme/c"), 0);
}

/// Test: ignore_missing skips the repository and continues
#[tokio::test(start_paused = true)]
async fn test_ignore_missing_continues_with_next_repository() {
    let h = harness(
        PagedSearchApi::new(vec![vec![
            "acme/a".into(),
            "acme/missing".into(),
            "acme/c".into(),
        ]]),
        ScriptedBuildApi::new()
            .latest("acme/a", success(1))
            .latest("acme/c", success(3)),
        MapEnv::default(),
    );
    let cfg = PluginConfig {
        ignore_missing: true,
        ..config()
    };

    let summary = h.orchestrator.run(&cfg).await.expect("run");

    assert_eq!(summary.triggered, vec!["acme/a", "acme/c"]);
    assert_eq!(summary.skipped, vec!["acme/missing"]);
    assert!(h
        .reporter
        .lines()
        .contains(&"Error: unable to get latest build for acme/missing, skipping".to_string()));
}

/// Test: timeout on one repository fails the whole run
#[tokio::test(start_paused = true)]
async fn test_timeout_is_fatal_to_run() {
    let h = harness(
        PagedSearchApi::new(vec![vec!["acme/slow".into(), "acme/b".into()]]),
        ScriptedBuildApi::new()
            .latest(
                "acme/slow",
                Ok(BuildRecord::new(9, BuildStatus::Running, "main")),
            )
            .latest("acme/b", success(2)),
        MapEnv::default(),
    );
    let cfg = PluginConfig {
        wait: true,
        timeout: Duration::from_secs(3),
        ..config()
    };

    let err = h.orchestrator.run(&cfg).await.unwrap_err();

    assert!(matches!(err, OrchestrationError::Timeout { ref repository } if repository == "acme/slow"));
    assert_eq!(h.builds.latest_calls("acme/b"), 0);
}

/// Test: params reach every fork and env-sourced values are masked in output
#[tokio::test(start_paused = true)]
async fn test_params_passed_to_forks_and_masked() {
    let h = harness(
        PagedSearchApi::new(vec![vec!["acme/a".into(), "acme/b".into()]]),
        ScriptedBuildApi::new()
            .latest("acme/a", success(1))
            .latest("acme/b", success(2)),
        MapEnv::from_pairs(&[("DEPLOY_KEY", "s3cr3t")]),
    );
    let cfg = PluginConfig {
        branch: Some("release".into()),
        params: vec!["TARGET=staging".into()],
        params_from_env: vec!["DEPLOY_KEY".into()],
        ..config()
    };

    h.orchestrator.run(&cfg).await.expect("run");

    let forks = h.builds.forks();
    assert_eq!(forks.len(), 2);
    for fork in &forks {
        assert_eq!(fork.params.get("TARGET"), Some("staging"));
        assert_eq!(fork.params.get("DEPLOY_KEY"), Some("s3cr3t"));
    }

    let lines = h.reporter.lines();
    assert!(lines.contains(&"Added acme/a@release to the downstream list.".to_string()));
    assert!(lines.contains(&"Starting new build 2 for acme/b@release.".to_string()));
    assert!(lines.contains(&"  - DEPLOY_KEY: [from-environment]".to_string()));
    assert!(lines.contains(&"  - TARGET: staging".to_string()));
    assert!(!lines.iter().any(|l| l.contains("s3cr3t")));
}

/// Test: discovery failure aborts before any build lookup
#[tokio::test]
async fn test_discovery_failure_is_fatal() {
    let h = harness(
        PagedSearchApi::new(vec![vec!["acme/a".into()], vec!["acme/b".into()]]).failing_on(2),
        ScriptedBuildApi::new().latest("acme/a", success(1)),
        MapEnv::default(),
    );

    let err = h.orchestrator.run(&config()).await.unwrap_err();

    assert!(matches!(err, OrchestrationError::Discovery(_)));
    assert_eq!(h.builds.latest_calls("acme/a"), 0);
}

/// Test: repositories from pages fetched before a failing page are still reported
#[tokio::test]
async fn test_repositories_reported_per_page_before_failure() {
    let h = harness(
        PagedSearchApi::new(vec![
            vec!["acme/a".into(), "acme/b".into()],
            vec!["acme/c".into()],
        ])
        .failing_on(2),
        ScriptedBuildApi::new(),
        MapEnv::default(),
    );

    let err = h.orchestrator.run(&config()).await.unwrap_err();

    assert!(matches!(err, OrchestrationError::Discovery(_)));
    assert_eq!(
        h.reporter.lines(),
        vec![
            "Added acme/a to the downstream list.",
            "Added acme/b to the downstream list.",
        ]
    );
}
