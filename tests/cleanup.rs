mod common;

use common::{torrent, Call, MockClient};
use transmission_scripts::cleanup::{Cleaner, RemovalReasonKind};
use transmission_scripts::config::rules::RuleRegistry;
use transmission_scripts::config::CleanupSettings;
use transmission_scripts::error::RemoteError;
use transmission_scripts::{ErrorStatus, Status, Torrent};
use url::Url;

fn unregistered(id: i64, status: Status) -> Torrent {
    Torrent {
        status,
        error: ErrorStatus::TrackerError,
        error_string: "Unregistered torrent".to_string(),
        ..torrent(id, "gone from tracker")
    }
}

#[test_log::test(tokio::test)]
async fn removes_unregistered_torrents() {
    let mut client = MockClient::new(vec![
        unregistered(1, Status::Seeding),
        torrent(2, "healthy"),
        Torrent {
            error: ErrorStatus::TrackerError,
            error_string: "Timed out".to_string(),
            ..torrent(3, "flaky tracker")
        },
    ]);
    let rules = RuleRegistry::default();
    let settings = CleanupSettings::default();
    let report = Cleaner::new(&rules, &settings)
        .remove_unknown(&mut client)
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.removed.len(), 1);
    assert_eq!(
        RemovalReasonKind::from(&report.removed[0].reason),
        RemovalReasonKind::Unregistered
    );
    assert_eq!(
        client.calls,
        vec![
            Call::Stop(vec![1]),
            Call::Remove {
                id: 1,
                delete_data: false
            }
        ]
    );
}

#[test_log::test(tokio::test)]
async fn stopped_torrents_are_not_stopped_again() {
    let mut client = MockClient::new(vec![unregistered(4, Status::Stopped)]);
    let rules = RuleRegistry::default();
    let settings = CleanupSettings::default();
    Cleaner::new(&rules, &settings)
        .remove_unknown(&mut client)
        .await
        .unwrap();
    assert_eq!(
        client.calls,
        vec![Call::Remove {
            id: 4,
            delete_data: false
        }]
    );
}

#[test_log::test(tokio::test)]
async fn removes_torrents_with_missing_data() {
    let mut client = MockClient::new(vec![
        Torrent {
            status: Status::Stopped,
            error: ErrorStatus::LocalError,
            error_string: "No data found! Ensure your drives are connected".to_string(),
            ..torrent(1, "unplugged")
        },
        Torrent {
            status: Status::Stopped,
            error: ErrorStatus::LocalError,
            error_string: "Permission denied".to_string(),
            ..torrent(2, "wrong owner")
        },
    ]);
    let rules = RuleRegistry::default();
    let settings = CleanupSettings::default();
    let report = Cleaner::new(&rules, &settings)
        .remove_local_errors(&mut client)
        .await
        .unwrap();
    assert_eq!(report.removed.len(), 1);
    assert_eq!(client.removed(), vec![1]);
}

#[test_log::test(tokio::test)]
async fn sweeps_seed_limits_per_tracker() {
    let apollo = |id, ratio, seconds_seeding| Torrent {
        trackers: vec![Url::parse("https://flacsfor.me.apollo.rip/abc/announce").unwrap()],
        ratio,
        seconds_seeding,
        ..torrent(id, "album")
    };
    let mut client = MockClient::new(vec![
        // Past the ratio limit, however briefly it seeded.
        apollo(1, 2.5, 60),
        // Seeded past 30 days plus the buffer.
        apollo(2, 0.5, 2_900_000),
        // Past 30 days but still inside the buffer.
        apollo(3, 0.5, 2_700_000),
        // Enough time for the default rule, but this is apollo.
        apollo(4, 0.5, 1_000_000),
        Torrent {
            ratio: 0.5,
            seconds_seeding: 1_000_000,
            ..torrent(5, "default rule")
        },
    ]);
    let rules = RuleRegistry::default();
    let settings = CleanupSettings::default();
    let report = Cleaner::new(&rules, &settings)
        .sweep_seed_limits(&mut client)
        .await
        .unwrap();
    assert_eq!(client.removed(), vec![1, 2, 5]);
    assert_eq!(report.removed.len(), 3);
}

#[test_log::test(tokio::test)]
async fn dry_run_changes_nothing() {
    let mut client = MockClient::new(vec![
        unregistered(1, Status::Seeding),
        Torrent {
            ratio: 3.0,
            ..torrent(2, "seeded")
        },
    ]);
    let rules = RuleRegistry::default();
    let settings = CleanupSettings::default();
    let report = Cleaner::new(&rules, &settings)
        .dry_run(true)
        .run_all(&mut client)
        .await
        .unwrap();
    assert_eq!(report.removed.len(), 2);
    assert!(client.calls.is_empty());
    assert_eq!(client.fetches, 3);
}

#[test_log::test(tokio::test)]
async fn one_failure_does_not_stop_the_sweep() {
    let mut client = MockClient::new(vec![
        unregistered(1, Status::Stopped),
        unregistered(2, Status::Stopped),
        unregistered(3, Status::Stopped),
    ]);
    client.broken.insert(2);
    let rules = RuleRegistry::default();
    let settings = CleanupSettings::default();
    let report = Cleaner::new(&rules, &settings)
        .remove_unknown(&mut client)
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(client.removed(), vec![1, 3]);
    assert_eq!(report.removed.len(), 2);
    assert_eq!(report.failed.len(), 1);
    let (removal, err) = &report.failed[0];
    assert_eq!(removal.id, 2);
    assert!(matches!(err, RemoteError::Rejected { .. }));
}

#[test_log::test(tokio::test)]
async fn failed_fetch_ends_the_sweep() {
    let mut client = MockClient::new(vec![unregistered(1, Status::Seeding)]);
    client.offline = true;
    let rules = RuleRegistry::default();
    let settings = CleanupSettings::default();
    let result = Cleaner::new(&rules, &settings).run_all(&mut client).await;
    assert!(matches!(result, Err(RemoteError::Rpc { .. })));
    assert!(client.calls.is_empty());
}
