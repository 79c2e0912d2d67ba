// tests/release_lifecycle_test.rs
use voyager::concourse::MockPipeline;
use voyager::coordinator::{
    DeleteCoordinator, ReleaseCoordinator, ReleaseHistory, RollbackCoordinator,
};
use voyager::domain::{PipelineTrigger, ReleaseRecord, Step, Version, VersionBump};
use voyager::git::MockTagStore;
use voyager::github::{MockRecordStore, RecordStore};
use voyager::resolver::VersionResolver;
use voyager::{Backend, ReleaseRepository, VoyagerError};

type MockRepository = ReleaseRepository<MockTagStore, MockRecordStore, MockPipeline>;

fn repository() -> MockRepository {
    ReleaseRepository::new(
        MockTagStore::new(),
        MockRecordStore::new(),
        MockPipeline::new(),
    )
}

fn tags_of(records: &[ReleaseRecord]) -> Vec<&str> {
    records.iter().map(|r| r.tag.as_str()).collect()
}

#[test]
fn test_latest_skips_malformed_tags() {
    let tags = MockTagStore::new();
    for tag in ["v1.0.0", "v1.2.3", "v2.0.0-bad", "not-a-version"] {
        tags.add_tag(tag, "abc");
    }
    assert_eq!(
        VersionResolver::new(&tags).latest().unwrap(),
        Version::new(1, 2, 3)
    );

    let only_bad = MockTagStore::new();
    only_bad.add_tag("v2.0.0-bad", "abc");
    only_bad.add_tag("not-a-version", "abc");
    assert!(VersionResolver::new(&only_bad).latest().unwrap_err().is_not_found());
}

#[test]
fn test_bump_from_existing_release() {
    let from = Some(Version::new(1, 4, 7));
    type Resolver<'a> = VersionResolver<'a, MockTagStore>;
    assert_eq!(Resolver::next_from(from, VersionBump::Major).unwrap(), Version::new(2, 0, 0));
    assert_eq!(Resolver::next_from(from, VersionBump::Minor).unwrap(), Version::new(1, 5, 0));
    assert_eq!(Resolver::next_from(from, VersionBump::Patch).unwrap(), Version::new(1, 4, 8));
    assert_eq!(Resolver::next_from(None, VersionBump::Patch).unwrap(), Version::new(0, 0, 1));
}

#[test]
fn test_release_never_wraps_to_a_lower_version() {
    let repo = repository();
    repo.tags().add_tag("v18446744073709551615.0.0", "cmax");

    let err = ReleaseCoordinator::new(&repo)
        .create_release(VersionBump::Major, "x")
        .unwrap_err();

    assert!(matches!(err, VoyagerError::Validation(_)));
    assert_eq!(repo.tags().tag_names(), vec!["v18446744073709551615.0.0"]);
    assert!(repo.records().tags().is_empty());
    assert!(repo.pipeline().triggers().is_empty());
}

#[test]
fn test_conflicting_tag_writes_nothing_else() {
    let repo = repository();
    repo.tags().add_tag("v1.0.0", "c100");

    let coordinator = ReleaseCoordinator::new(&repo);
    let plan = coordinator.plan(VersionBump::Minor).unwrap();
    // another operator claims v1.1.0 between plan and execute
    repo.tags().add_tag("v1.1.0", "other");

    let err = coordinator.execute(plan, "notes").unwrap_err();
    assert!(matches!(
        err,
        VoyagerError::Conflict {
            backend: Backend::TagStore,
            ..
        }
    ));
    assert_eq!(repo.records().calls("create_record"), 0);
    assert_eq!(repo.pipeline().calls(), 0);
}

#[test]
fn test_trigger_failure_reports_partial_release() {
    let repo = repository();
    repo.pipeline().fail_next(1);

    let err = ReleaseCoordinator::new(&repo)
        .create_release(VersionBump::Major, "big one")
        .unwrap_err();
    let VoyagerError::PartialFailure(report) = err else {
        panic!("expected a partial failure");
    };
    assert_eq!(report.completed, vec![Step::CreateTag, Step::CreateRecord]);
    assert_eq!(report.failed, Step::TriggerPipeline);
    assert_eq!(report.target, "v1.0.0");
    let state = report.state();
    assert!(state.tag_exists && state.release_record_exists && !state.pipeline_triggered);

    // nothing was rolled back
    assert_eq!(repo.tags().tag_names(), vec!["v1.0.0"]);
    assert_eq!(repo.records().tags(), vec!["v1.0.0"]);
}

#[test]
fn test_network_failure_is_not_retried() {
    let repo = repository();
    repo.tags().fail_next("create_tag", 1);

    let err = ReleaseCoordinator::new(&repo)
        .create_release(VersionBump::Patch, "")
        .unwrap_err();
    assert!(matches!(err, VoyagerError::Network { .. }));
    assert_eq!(repo.tags().calls("create_tag"), 1);
    assert!(repo.tags().tag_names().is_empty());
}

#[test]
fn test_delete_twice_is_idempotent() {
    let repo = repository();
    ReleaseCoordinator::new(&repo)
        .create_release(VersionBump::Patch, "")
        .unwrap();

    let coordinator = DeleteCoordinator::new(&repo);
    let first = coordinator.delete("v0.0.1").unwrap();
    assert!(first.record_deleted && first.tag_deleted);

    let second = coordinator.delete("v0.0.1").unwrap();
    assert!(!second.record_deleted && !second.tag_deleted);
}

#[test]
fn test_history_truncates_by_version() {
    let repo = repository();
    for minor in [3, 0, 4, 1, 2] {
        let tag = format!("v1.{}.0", minor);
        repo.records().create_record(&tag, "abc", &tag, "").unwrap();
    }

    let releases = ReleaseHistory::new(repo.records()).list(3).unwrap();
    assert_eq!(tags_of(&releases), vec!["v1.4.0", "v1.3.0", "v1.2.0"]);
}

#[test]
fn test_rollback_to_missing_tag() {
    let repo = repository();
    repo.tags().add_tag("v1.0.0", "c100");

    let err = RollbackCoordinator::new(&repo).rollback("v3.0.0").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(repo.pipeline().calls(), 0);
}

#[test]
fn test_rollback_leaves_latest_alone() {
    let repo = repository();
    let releases = ReleaseCoordinator::new(&repo);
    releases.create_release(VersionBump::Minor, "one").unwrap();
    releases.create_release(VersionBump::Minor, "two").unwrap();

    let outcome = RollbackCoordinator::new(&repo).rollback("v0.1.0").unwrap();
    assert_eq!(outcome.version, Version::new(0, 1, 0));

    let last = repo.pipeline().triggers().pop().unwrap();
    assert_eq!(last, PipelineTrigger::rollback(&Version::new(0, 1, 0)));
    assert_eq!(
        VersionResolver::new(repo.tags()).latest().unwrap(),
        Version::new(0, 2, 0)
    );
}

#[test]
fn test_rollback_trigger_failure_changes_nothing() {
    let repo = repository();
    let releases = ReleaseCoordinator::new(&repo);
    releases.create_release(VersionBump::Minor, "one").unwrap();
    releases.create_release(VersionBump::Minor, "two").unwrap();
    repo.pipeline().fail_next(1);

    let err = RollbackCoordinator::new(&repo).rollback("v0.1.0").unwrap_err();

    assert!(matches!(
        err,
        VoyagerError::Network {
            backend: Backend::Pipeline,
            ..
        }
    ));
    assert_eq!(repo.pipeline().calls(), 3);
    assert_eq!(repo.pipeline().triggers().len(), 2);
    assert_eq!(repo.tags().tag_names(), vec!["v0.1.0", "v0.2.0"]);
    assert_eq!(repo.records().tags(), vec!["v0.2.0", "v0.1.0"]);
    assert_eq!(repo.tags().calls("delete_tag"), 0);
    assert_eq!(repo.records().calls("delete_record"), 0);
}

#[test]
fn test_create_list_delete_scenario() {
    let repo = repository();
    repo.tags().add_tag("v0.9.0", "old");
    repo.tags().set_head("c100");

    let outcome = ReleaseCoordinator::new(&repo)
        .create_release(VersionBump::Major, "Release 1.0.0")
        .unwrap();
    assert_eq!(outcome.tag, "v1.0.0");
    assert_eq!(outcome.commit, "c100");
    assert_eq!(outcome.acknowledgement.build_id, Some(1));

    let history = ReleaseHistory::new(repo.records());
    assert_eq!(tags_of(&history.list(1).unwrap()), vec!["v1.0.0"]);

    DeleteCoordinator::new(&repo).delete("v1.0.0").unwrap();
    assert!(history.list(1).unwrap().is_empty());
    assert_eq!(repo.tags().tag_names(), vec!["v0.9.0"]);
}
