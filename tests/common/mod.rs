#![allow(dead_code)]

use std::collections::HashSet;

use transmission_scripts::client::TorrentClient;
use transmission_scripts::error::RemoteError;
use transmission_scripts::{ErrorStatus, Status, Torrent};
use url::Url;

/// A mutation the mock client was asked to perform.
#[derive(PartialEq, Eq, Debug, Clone)]
pub enum Call {
    Stop(Vec<i64>),
    Start(Vec<i64>),
    Verify(Vec<i64>),
    Remove { id: i64, delete_data: bool },
}

/// A [`TorrentClient`] serving a fixed list of torrents and recording
/// every mutation.
#[derive(Default)]
pub struct MockClient {
    pub torrents: Vec<Torrent>,
    pub calls: Vec<Call>,
    pub fetches: usize,
    /// Torrents whose removal fails.
    pub broken: HashSet<i64>,
    pub offline: bool,
}

impl MockClient {
    pub fn new(torrents: Vec<Torrent>) -> Self {
        MockClient {
            torrents,
            ..Default::default()
        }
    }

    pub fn removed(&self) -> Vec<i64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Remove { id, .. } => Some(*id),
                _ => None,
            })
            .collect()
    }

    fn check_online(&self, action: &'static str) -> Result<(), RemoteError> {
        if self.offline {
            return Err(RemoteError::Rpc {
                action,
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

impl TorrentClient for MockClient {
    async fn get_torrents(&mut self) -> Result<Vec<Torrent>, RemoteError> {
        self.check_online("retrieve list of torrents")?;
        self.fetches += 1;
        Ok(self.torrents.clone())
    }

    async fn stop_torrents(&mut self, ids: &[i64]) -> Result<(), RemoteError> {
        self.check_online("stop")?;
        self.calls.push(Call::Stop(ids.to_vec()));
        Ok(())
    }

    async fn start_torrents(&mut self, ids: &[i64]) -> Result<(), RemoteError> {
        self.check_online("start")?;
        self.calls.push(Call::Start(ids.to_vec()));
        Ok(())
    }

    async fn verify_torrents(&mut self, ids: &[i64]) -> Result<(), RemoteError> {
        self.check_online("verify")?;
        self.calls.push(Call::Verify(ids.to_vec()));
        Ok(())
    }

    async fn remove_torrent(&mut self, id: i64, delete_data: bool) -> Result<(), RemoteError> {
        self.check_online("remove")?;
        if self.broken.contains(&id) {
            return Err(RemoteError::Rejected {
                action: "remove",
                result: format!("torrent {} not found", id),
            });
        }
        self.calls.push(Call::Remove { id, delete_data });
        Ok(())
    }
}

/// A healthy, seeding torrent announcing to `https://tracker.example`.
pub fn torrent(id: i64, name: &str) -> Torrent {
    Torrent {
        id,
        hash: format!("{id:040x}"),
        name: name.to_string(),
        status: Status::Seeding,
        is_finished: false,
        error: ErrorStatus::Ok,
        error_string: "".to_string(),
        ratio: 0.0,
        seconds_seeding: 0,
        trackers: vec![Url::parse("https://tracker.example:8080/announce").unwrap()],
        rate_upload: 0,
        rate_download: 0,
        total_size: 30000,
        percent_done: 1.0,
        date_added: None,
        date_active: None,
        queue_position: Some(id),
    }
}
