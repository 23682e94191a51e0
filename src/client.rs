//! The operations the tools need from a transmission daemon.

mod queue;

use std::convert::TryFrom;

use tracing::debug;
use transmission_rpc::{
    types::{BasicAuth, Id, TorrentAction},
    TransClient,
};

use crate::config::connection::Connection;
use crate::error::RemoteError;
use crate::Torrent;
use queue::{fill_positions, QueueReader};

/// A session with a torrent daemon.
///
/// Every call is one round trip. Nothing is cached: a mutation is only
/// visible through the next [`get_torrents`](TorrentClient::get_torrents).
#[allow(async_fn_in_trait)]
pub trait TorrentClient {
    /// Fetches a snapshot of every torrent.
    async fn get_torrents(&mut self) -> Result<Vec<Torrent>, RemoteError>;

    async fn stop_torrents(&mut self, ids: &[i64]) -> Result<(), RemoteError>;

    async fn start_torrents(&mut self, ids: &[i64]) -> Result<(), RemoteError>;

    /// Asks the daemon to re-check the local data of these torrents.
    async fn verify_torrents(&mut self, ids: &[i64]) -> Result<(), RemoteError>;

    /// Forgets about a torrent. Only touches files on disk if
    /// `delete_data` is set.
    async fn remove_torrent(&mut self, id: i64, delete_data: bool) -> Result<(), RemoteError>;
}

/// A [`TorrentClient`] talking to transmission over its RPC interface.
pub struct TransmissionClient {
    client: TransClient,
    queue: QueueReader,
    connection: Connection,
}

impl TransmissionClient {
    pub fn new(connection: &Connection) -> Result<Self, RemoteError> {
        let url = connection.rpc_url().map_err(|e| RemoteError::Rpc {
            action: "build RPC URL",
            message: e.to_string(),
        })?;
        let queue = QueueReader::new(url.clone(), connection);
        let client = match &connection.user {
            Some(user) => TransClient::with_auth(
                url,
                BasicAuth {
                    user: user.clone(),
                    password: connection.password.clone().unwrap_or_default(),
                },
            ),
            None => TransClient::new(url),
        };
        Ok(TransmissionClient {
            client,
            queue,
            connection: connection.clone(),
        })
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    async fn act(
        &mut self,
        action: TorrentAction,
        verb: &'static str,
        ids: &[i64],
    ) -> Result<(), RemoteError> {
        if ids.is_empty() {
            return Ok(());
        }
        debug!("{} torrents {:?}", verb, ids);
        let response = self
            .client
            .torrent_action(action, ids.iter().copied().map(Id::Id).collect())
            .await
            .map_err(|e| RemoteError::Rpc {
                action: verb,
                message: e.to_string(),
            })?;
        check_result(verb, response.result)
    }
}

fn check_result(action: &'static str, result: String) -> Result<(), RemoteError> {
    if result == "success" {
        Ok(())
    } else {
        Err(RemoteError::Rejected { action, result })
    }
}

impl TorrentClient for TransmissionClient {
    async fn get_torrents(&mut self) -> Result<Vec<Torrent>, RemoteError> {
        let action = "retrieve list of torrents";
        let response = self
            .client
            .torrent_get(Torrent::request_fields(), None)
            .await
            .map_err(|e| RemoteError::Rpc {
                action,
                message: e.to_string(),
            })?;
        if response.result != "success" {
            return Err(RemoteError::Rejected {
                action,
                result: response.result,
            });
        }
        let mut torrents = response
            .arguments
            .torrents
            .into_iter()
            .map(Torrent::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let positions = self.queue.fetch().await?;
        fill_positions(&mut torrents, &positions);
        Ok(torrents)
    }

    async fn stop_torrents(&mut self, ids: &[i64]) -> Result<(), RemoteError> {
        self.act(TorrentAction::Stop, "stop", ids).await
    }

    async fn start_torrents(&mut self, ids: &[i64]) -> Result<(), RemoteError> {
        self.act(TorrentAction::Start, "start", ids).await
    }

    async fn verify_torrents(&mut self, ids: &[i64]) -> Result<(), RemoteError> {
        self.act(TorrentAction::Verify, "verify", ids).await
    }

    async fn remove_torrent(&mut self, id: i64, delete_data: bool) -> Result<(), RemoteError> {
        let action = "remove";
        let response = self
            .client
            .torrent_remove(vec![Id::Id(id)], delete_data)
            .await
            .map_err(|e| RemoteError::Rpc {
                action,
                message: e.to_string(),
            })?;
        check_result(action, response.result)
    }
}
