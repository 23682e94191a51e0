mod common;

use chrono::{Duration, Utc};
use common::{torrent, Call, MockClient};
use transmission_scripts::config::rules::RuleRegistry;
use transmission_scripts::error::CommandError;
use transmission_scripts::pipeline::{Pipeline, Session};
use transmission_scripts::{Status, Torrent};
use url::Url;

/// Ten torrents; the even ids are stopped.
fn library() -> Vec<Torrent> {
    let names = [
        "zeta", "eta", "alpha", "theta", "Mu", "nu", "omicron", "pi", "rho", "sigma",
    ];
    names
        .iter()
        .zip(1..)
        .map(|(name, id)| Torrent {
            status: if id % 2 == 0 {
                Status::Stopped
            } else {
                Status::Seeding
            },
            ..torrent(id, name)
        })
        .collect()
}

struct Run {
    result: Result<Vec<Torrent>, CommandError>,
    output: String,
}

impl Run {
    fn ids(&self) -> Vec<i64> {
        self.result
            .as_ref()
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect()
    }

    fn lines(&self) -> Vec<&str> {
        self.output.lines().collect()
    }
}

async fn run(client: &mut MockClient, command: &str) -> Run {
    let rules = RuleRegistry::default();
    let pipeline: Pipeline = command.parse().unwrap();
    let torrents = client.torrents.clone();
    let mut out = Vec::new();
    let result = {
        let mut session = Session::new(&mut *client, &rules, &mut out);
        pipeline.apply(torrents, &mut session).await
    };
    Run {
        result,
        output: String::from_utf8(out).unwrap(),
    }
}

#[test_log::test(tokio::test)]
async fn limit_filter_sort() {
    let mut client = MockClient::new(library());
    let run = run(&mut client, "5|seeding|name").await;
    assert_eq!(run.ids(), vec![3, 5, 1]);
    let lines = run.lines();
    assert_eq!(lines.len(), 3, "printed once: {:?}", lines);
    assert!(lines[0].starts_with("[   3]"));
    assert!(lines[0].ends_with("alpha"));
    assert!(client.calls.is_empty());
}

#[test_log::test(tokio::test)]
async fn empty_pipeline_prints_everything() {
    let mut client = MockClient::new(library());
    let run = run(&mut client, "").await;
    assert_eq!(run.ids().len(), 10);
    assert_eq!(run.lines().len(), 10);
}

#[test_log::test(tokio::test)]
async fn count_ends_the_pipeline() {
    let mut client = MockClient::new(library());
    let run = run(&mut client, "seeding|count|start").await;
    assert_eq!(run.output, "5\n");
    assert!(run.ids().is_empty());
    assert!(client.calls.is_empty());
}

#[test_log::test(tokio::test)]
async fn limit_must_be_positive() {
    let mut client = MockClient::new(library());
    let run = run(&mut client, "0|print").await;
    assert_eq!(run.output, "Limit too low, must be positive integer: 0\n");
    assert!(run.ids().is_empty());
}

#[test_log::test(tokio::test)]
async fn print_stage_prints_in_the_middle() {
    let mut client = MockClient::new(library());
    let run = run(&mut client, "3|p|rev|p").await;
    let lines = run.lines();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("[   1]"));
    assert!(lines[3].starts_with("[   3]"));
    assert_eq!(run.ids(), vec![3, 2, 1]);
}

#[test_log::test(tokio::test)]
async fn trailing_reverse_does_not_print() {
    let mut client = MockClient::new(library());
    let run = run(&mut client, "3|rev").await;
    assert_eq!(run.output, "");
    assert_eq!(run.ids(), vec![3, 2, 1]);
}

#[test_log::test(tokio::test)]
async fn sorts_by_queue_position() {
    let mut client = MockClient::new(vec![
        Torrent {
            queue_position: Some(2),
            ..torrent(1, "last")
        },
        Torrent {
            queue_position: None,
            ..torrent(2, "unknown")
        },
        Torrent {
            queue_position: Some(0),
            ..torrent(3, "first")
        },
    ]);
    let run = run(&mut client, "queue").await;
    assert_eq!(run.ids(), vec![2, 3, 1]);
}

#[test_log::test(tokio::test)]
async fn start_and_stop_act_on_the_list() {
    let mut client = MockClient::new(library());
    let run_start = run(&mut client, "stopped|2|start").await;
    assert_eq!(run_start.output, ">>> Starting 2 torrents.\n");
    assert_eq!(run_start.ids(), vec![2, 4]);

    let run_stop = run(&mut client, "seeding|pause").await;
    assert_eq!(run_stop.output, ">>> Stopping 5 torrents.\n");

    assert_eq!(
        client.calls,
        vec![Call::Start(vec![2, 4]), Call::Stop(vec![1, 3, 5, 7, 9])]
    );
}

#[test_log::test(tokio::test)]
async fn actions_see_the_client_fail() {
    let mut client = MockClient::new(library());
    client.offline = true;
    let run = run(&mut client, "verify").await;
    assert!(matches!(run.result, Err(CommandError::Remote(_))));
}

#[test_log::test(tokio::test)]
async fn name_filter_is_a_prefix() {
    let mut client = MockClient::new(vec![
        torrent(1, "Ubuntu 24.04"),
        torrent(2, "debian-ubuntu-compat"),
        torrent(3, "ubuntu-server"),
    ]);
    let run = run(&mut client, "name=UBU").await;
    assert_eq!(run.ids(), vec![1, 3]);
    assert_eq!(run.lines().len(), 2);
}

#[test_log::test(tokio::test)]
async fn tracker_filter_uses_rule_names() {
    let mut client = MockClient::new(vec![
        Torrent {
            trackers: vec![Url::parse("https://flacsfor.me.apollo.rip/abc/announce").unwrap()],
            ..torrent(1, "album")
        },
        torrent(2, "elsewhere"),
    ]);
    let apollo = run(&mut client, "t=apollo").await;
    assert_eq!(apollo.ids(), vec![1]);

    let default = run(&mut client, "t=default").await;
    assert_eq!(default.ids(), vec![2]);
}

#[test]
fn absurd_windows_are_rejected() {
    match "a=>1000000Y".parse::<Pipeline>() {
        Err(CommandError::InvalidArgument(msg)) => assert_eq!(msg, "Invalid duration: >1000000Y"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test_log::test(tokio::test)]
async fn time_filter_uses_date_added() {
    let now = Utc::now();
    let mut client = MockClient::new(vec![
        Torrent {
            date_added: Some(now - Duration::days(30)),
            ..torrent(1, "old")
        },
        Torrent {
            date_added: Some(now - Duration::hours(2)),
            ..torrent(2, "new")
        },
        torrent(3, "undated"),
    ]);
    let older = run(&mut client, "a=>1w").await;
    assert_eq!(older.ids(), vec![1]);

    let newer = run(&mut client, "a=<1d").await;
    assert_eq!(newer.ids(), vec![2]);
}
