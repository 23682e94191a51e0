pub mod catalog;
pub mod cleanup;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod shell;
mod util;

use std::convert::TryFrom;
use std::fmt;

use chrono::{DateTime, Utc};
use tracing::warn;
use transmission_rpc::types::TorrentGetField;
use url::Url;

use crate::error::RemoteError;

/// Status of a torrent in transmission, from the RPC
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Status {
    Stopped = 0,
    QueuedToCheckFiles = 1,
    CheckingFiles = 2,
    QueuedToDownload = 3,
    Downloading = 4,
    QueuedToSeed = 5,
    Seeding = 6,
}

impl Status {
    /// The label transmission clients show for this status.
    pub fn label(&self) -> &'static str {
        use Status::*;
        match self {
            Stopped => "stopped",
            QueuedToCheckFiles => "check pending",
            CheckingFiles => "checking",
            QueuedToDownload => "download pending",
            Downloading => "downloading",
            QueuedToSeed => "seed pending",
            Seeding => "seeding",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

impl TryFrom<i64> for Status {
    type Error = RemoteError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        use Status::*;
        Ok(match value {
            0 => Stopped,
            1 => QueuedToCheckFiles,
            2 => CheckingFiles,
            3 => QueuedToDownload,
            4 => Downloading,
            5 => QueuedToSeed,
            6 => Seeding,
            other => return Err(RemoteError::UnknownCode { field: "status", code: other }),
        })
    }
}

/// What is this torrent doing right now?
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy)]
pub enum ErrorStatus {
    /// everything's fine
    Ok = 0,
    /// when we anounced to the tracker, we got a warning in the response
    TrackerWarning = 1,
    /// when we anounced to the tracker, we got an error in the response
    TrackerError = 2,
    /// local trouble, such as disk full or permissions error
    LocalError = 3,
}

impl TryFrom<i64> for ErrorStatus {
    type Error = RemoteError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => ErrorStatus::Ok,
            1 => ErrorStatus::TrackerWarning,
            2 => ErrorStatus::TrackerError,
            3 => ErrorStatus::LocalError,
            other => return Err(RemoteError::UnknownCode { field: "error", code: other }),
        })
    }
}

/// A point-in-time representation of a torrent on a transmission instance.
///
/// Nothing in here changes after a fetch: mutations go through a
/// [`client::TorrentClient`], and their effects only show up in the
/// next snapshot.
#[derive(PartialEq, Clone)]
pub struct Torrent {
    pub id: i64,
    pub hash: String,
    pub name: String,
    pub status: Status,
    pub is_finished: bool,
    pub error: ErrorStatus,
    pub error_string: String,
    pub ratio: f64,
    pub seconds_seeding: u64,
    pub trackers: Vec<Url>,
    pub rate_upload: u64,
    pub rate_download: u64,
    pub total_size: u64,
    pub percent_done: f64,
    pub date_added: Option<DateTime<Utc>>,
    pub date_active: Option<DateTime<Utc>>,
    /// Not part of the RPC crate's torrent record; the client fills it in
    /// from a separate request.
    pub queue_position: Option<i64>,
}

impl std::fmt::Debug for Torrent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let trackers: Vec<String> = self.trackers.iter().map(Url::to_string).collect();
        f.debug_struct("Torrent")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("status", &self.status)
            .field("error", &self.error)
            .field("error_string", &self.error_string)
            .field("ratio", &self.ratio)
            .field("seconds_seeding", &self.seconds_seeding)
            .field("total_size", &self.total_size)
            .field("trackers", &trackers)
            .finish()
    }
}

impl Torrent {
    /// The fields [`Torrent::try_from`] reads.
    pub fn request_fields() -> Option<Vec<TorrentGetField>> {
        use TorrentGetField::*;
        Some(vec![
            Id,
            HashString,
            Name,
            Status,
            IsFinished,
            Error,
            ErrorString,
            UploadRatio,
            SecondsSeeding,
            Trackers,
            RateUpload,
            RateDownload,
            TotalSize,
            PercentDone,
            AddedDate,
            ActivityDate,
        ])
    }

    /// Returns true of the torrent has no error status
    pub fn is_ok(&self) -> bool {
        self.error == ErrorStatus::Ok
    }

    pub fn is_stopped(&self) -> bool {
        self.status == Status::Stopped
    }

    /// Combined upload and download rate, in bytes/sec.
    pub fn rate_total(&self) -> u64 {
        self.rate_upload + self.rate_download
    }
}

fn ensure_field<T>(field: Option<T>, name: &'static str) -> Result<T, RemoteError> {
    field.ok_or(RemoteError::MissingField(name))
}

/// Transmission reports dates as seconds since the epoch, with 0
/// meaning "never".
fn timestamp(field: Option<i64>) -> Option<DateTime<Utc>> {
    field
        .filter(|epoch| *epoch > 0)
        .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
}

impl TryFrom<transmission_rpc::types::Torrent> for Torrent {
    type Error = RemoteError;

    fn try_from(t: transmission_rpc::types::Torrent) -> Result<Self, Self::Error> {
        let name = ensure_field(t.name, "name")?;
        let trackers = ensure_field(t.trackers, "trackers")?
            .into_iter()
            .filter_map(|tracker| match Url::parse(&tracker.announce) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(torrent = %name, announce = %tracker.announce, "Skipping tracker: {}", e);
                    None
                }
            })
            .collect();
        Ok(Torrent {
            id: ensure_field(t.id, "id")?,
            hash: ensure_field(t.hash_string, "hash_string")?,
            status: Status::try_from(ensure_field(t.status, "status")? as i64)?,
            is_finished: t.is_finished.unwrap_or(false),
            error: ErrorStatus::try_from(ensure_field(t.error, "error")? as i64)?,
            error_string: ensure_field(t.error_string, "error_string")?,
            ratio: ensure_field(t.upload_ratio, "upload_ratio")? as f64,
            seconds_seeding: t.seconds_seeding.unwrap_or(0).max(0) as u64,
            trackers,
            rate_upload: t.rate_upload.unwrap_or(0).max(0) as u64,
            rate_download: t.rate_download.unwrap_or(0).max(0) as u64,
            total_size: ensure_field(t.total_size, "total_size")?.max(0) as u64,
            percent_done: t.percent_done.unwrap_or(0.0) as f64,
            date_added: timestamp(t.added_date),
            date_active: timestamp(t.activity_date),
            queue_position: None,
            name,
        })
    }
}
