#[path = "../support/lifecycle/fakes.rs"]
mod fakes;

use authboot::bootstrap::ScopeDefinition;
use authboot::{
    GateDecision, InitError, InitState, ScopeRepository, SeedDefaults, StoreError,
    TransactionError,
};
use fakes::{config, FlakyStore, Harness};

#[tokio::test]
async fn seeding_run_walks_the_expected_states() {
    let harness = Harness::new(FlakyStore::new());
    let mut initializer = harness.initializer(config("1.4.0"));
    assert_eq!(initializer.state(), InitState::Start);

    let report = initializer.run().await.expect("bootstrap");
    assert_eq!(
        report.trace,
        vec![
            InitState::Start,
            InitState::Probing,
            InitState::Deciding,
            InitState::Seeding,
            InitState::Ready,
        ]
    );
    assert_eq!(initializer.state(), InitState::Ready);
    assert!(initializer.state().is_terminal());
    let seeded = report.seeded.expect("seed report");
    assert_eq!(seeded.roles.len(), 2);
    assert_eq!(seeded.permissions, 2);
}

#[tokio::test]
async fn migrate_and_continue_paths_are_traced() {
    let harness = Harness::new(FlakyStore::with_entries(&[("authboot:version", "1.0")]));

    let report = harness
        .initializer(config("1.1"))
        .run()
        .await
        .expect("migrate");
    assert!(report.trace.contains(&InitState::Migrating));
    assert!(!report.trace.contains(&InitState::Seeding));

    let report = harness
        .initializer(config("1.1"))
        .run()
        .await
        .expect("continue");
    assert!(report.trace.contains(&InitState::Continuing));
    assert_eq!(report.probe.current_version.as_deref(), Some("1.1"));
}

#[tokio::test]
async fn unreachable_store_fails_at_probe() {
    let harness = Harness::new(FlakyStore::new());
    harness.store.fail_transactions();
    let mut initializer = harness.initializer(config("2.0"));

    let err = initializer.run().await.expect_err("probe must fail");
    assert!(matches!(
        err,
        InitError::Transaction(TransactionError::Store(StoreError::Unavailable(_)))
    ));
    assert_eq!(err.stage(), "probe");
    assert_eq!(
        initializer.trace(),
        &[InitState::Start, InitState::Probing, InitState::Fatal]
    );
    assert_eq!(harness.store.writes(), 0);
}

#[tokio::test]
async fn migrate_write_failure_is_fatal() {
    let harness = Harness::new(FlakyStore::with_entries(&[("version", "0.9")]));
    harness.store.fail_sets();
    let mut initializer = harness.initializer(config("2.0"));

    let err = initializer.run().await.expect_err("write must fail");
    assert!(matches!(err, InitError::VersionWrite(ref write) if write.key == "authboot:version"));
    assert_eq!(err.stage(), "version marker write");
    assert_eq!(initializer.state(), InitState::Fatal);
    assert_eq!(harness.collaborator_writes(), 0);
}

#[tokio::test]
async fn post_seed_marker_failure_is_reported_as_version_write() {
    let harness = Harness::new(FlakyStore::new());
    harness.store.fail_sets();

    let err = harness
        .initializer(config("2.0"))
        .run()
        .await
        .expect_err("marker write must fail");
    assert!(matches!(err, InitError::VersionWrite(_)));
    assert_eq!(harness.scopes.list().await.unwrap().len(), 4);
}

#[tokio::test]
async fn inspect_reports_plan_without_writing() {
    let harness = Harness::new(FlakyStore::new());
    let inspection = harness
        .initializer(config("2.0"))
        .inspect()
        .await
        .expect("inspect");
    assert_eq!(inspection.decision, Some(GateDecision::Seed { to: "2.0".into() }));
    assert!(inspection.blocked.is_none());
    assert_eq!(harness.store.writes(), 0);

    let foreign = Harness::new(FlakyStore::with_foreign_keys(3));
    let inspection = foreign
        .initializer(config("2.0"))
        .inspect()
        .await
        .expect("inspect");
    assert!(inspection.decision.is_none());
    assert!(inspection
        .blocked
        .as_deref()
        .is_some_and(|reason| reason.contains("3 keys")));
}

#[tokio::test]
async fn custom_defaults_are_seeded() {
    let harness = Harness::new(FlakyStore::new());
    let defaults = SeedDefaults {
        roles: vec!["operator".into()],
        scopes: vec![ScopeDefinition::new("audit", "Read the audit trail")],
        permissions: vec![],
    };
    let report = harness
        .initializer(config("2.0"))
        .with_defaults(defaults)
        .run()
        .await
        .expect("bootstrap");

    let seeded = report.seeded.expect("seeded");
    assert_eq!(seeded.roles[0].name, "operator");
    assert_eq!(seeded.roles[0].id, 1);
    assert_eq!(
        harness.scopes.get("audit").await.unwrap().map(|s| s.description),
        Some("Read the audit trail".to_string())
    );
}
