//! Queue positions, read with a raw `torrent-get`.
//!
//! transmission-rpc's torrent record has no `queuePosition` field, so
//! this asks for just `id` and `queuePosition` and merges the answer
//! into the snapshots by id.

use std::collections::HashMap;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::config::connection::Connection;
use crate::error::RemoteError;
use crate::Torrent;

const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// The daemon answers the first request of a session with 409 and a
/// session id; one retry is all it takes.
const MAX_ATTEMPTS: usize = 2;

const ACTION: &str = "read queue positions";

#[derive(Deserialize, Debug)]
struct QueueResponse {
    result: String,
    arguments: Option<QueueArguments>,
}

#[derive(Deserialize, Debug)]
struct QueueArguments {
    torrents: Vec<QueueEntry>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct QueueEntry {
    id: i64,
    queue_position: i64,
}

pub(crate) struct QueueReader {
    http: reqwest::Client,
    url: Url,
    user: Option<String>,
    password: Option<String>,
    session_id: Option<String>,
}

fn rpc_error(e: reqwest::Error) -> RemoteError {
    RemoteError::Rpc {
        action: ACTION,
        message: e.to_string(),
    }
}

impl QueueReader {
    pub(crate) fn new(url: Url, connection: &Connection) -> Self {
        QueueReader {
            http: reqwest::Client::new(),
            url,
            user: connection.user.clone(),
            password: connection.password.clone(),
            session_id: None,
        }
    }

    /// Queue position by torrent id.
    pub(crate) async fn fetch(&mut self) -> Result<HashMap<i64, i64>, RemoteError> {
        let body = json!({
            "method": "torrent-get",
            "arguments": {"fields": ["id", "queuePosition"]},
        });
        for _ in 0..MAX_ATTEMPTS {
            let mut request = self.http.post(self.url.clone()).json(&body);
            if let Some(user) = &self.user {
                request = request.basic_auth(user, self.password.as_ref());
            }
            if let Some(id) = &self.session_id {
                request = request.header(SESSION_ID_HEADER, id);
            }
            let response = request.send().await.map_err(rpc_error)?;
            if response.status() == StatusCode::CONFLICT {
                self.session_id = response
                    .headers()
                    .get(SESSION_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                debug!("Got new session id {:?}", self.session_id);
                continue;
            }
            let parsed: QueueResponse = response
                .error_for_status()
                .map_err(rpc_error)?
                .json()
                .await
                .map_err(rpc_error)?;
            return positions(parsed);
        }
        Err(RemoteError::Rpc {
            action: ACTION,
            message: "transmission kept rejecting the session id".to_string(),
        })
    }
}

fn positions(response: QueueResponse) -> Result<HashMap<i64, i64>, RemoteError> {
    if response.result != "success" {
        return Err(RemoteError::Rejected {
            action: ACTION,
            result: response.result,
        });
    }
    Ok(response
        .arguments
        .map(|args| args.torrents)
        .unwrap_or_default()
        .into_iter()
        .map(|entry| (entry.id, entry.queue_position))
        .collect())
}

/// Torrents the daemon didn't report a position for keep `None`.
pub(crate) fn fill_positions(torrents: &mut [Torrent], positions: &HashMap<i64, i64>) {
    for t in torrents {
        t.queue_position = positions.get(&t.id).copied();
    }
}
