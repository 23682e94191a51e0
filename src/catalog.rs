//! Named filters and sort orders over torrent snapshots.
//!
//! Both are looked up by name once, when a command is parsed; an unknown
//! name is a [`CommandError::UnknownOperand`].

use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::CommandError;
use crate::{Status, Torrent};

/// A predicate that picks torrents out of a list.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Filter {
    All,
    /// Moving data in either direction.
    Active,
    Downloading,
    Seeding,
    Stopped,
    /// Reached its seeding limit.
    Finished,
    /// Stopped before it was finished.
    Paused,
}

impl Filter {
    pub const NAMES: &'static [&'static str] = &[
        "all",
        "active",
        "downloading",
        "seeding",
        "stopped",
        "finished",
        "paused",
    ];

    pub fn matches(&self, t: &Torrent) -> bool {
        use Filter::*;
        match self {
            All => true,
            Active => t.rate_upload > 0 || t.rate_download > 0,
            Downloading => t.status == Status::Downloading,
            Seeding => t.status == Status::Seeding,
            Stopped => t.status == Status::Stopped,
            Finished => t.is_finished,
            Paused => t.status == Status::Stopped && !t.is_finished,
        }
    }
}

impl FromStr for Filter {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Filter::*;
        Ok(match s.to_lowercase().as_str() {
            "all" => All,
            "active" => Active,
            "downloading" => Downloading,
            "seeding" => Seeding,
            "stopped" => Stopped,
            "finished" => Finished,
            "paused" => Paused,
            _ => return Err(CommandError::UnknownOperand(s.to_string())),
        })
    }
}

/// Keeps the torrents matching `predicate`, in their original order.
pub fn filter_by<P>(torrents: &[Torrent], predicate: P) -> Vec<Torrent>
where
    P: Fn(&Torrent) -> bool,
{
    torrents.iter().filter(|t| predicate(*t)).cloned().collect()
}

/// An order that torrents can be listed in.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum SortKey {
    Id,
    /// Case-insensitive.
    Name,
    /// Largest first.
    Size,
    Ratio,
    /// Upload and download rate combined.
    Speed,
    SpeedUp,
    SpeedDown,
    Status,
    Queue,
    /// Oldest first.
    Age,
    /// Least recently active first.
    Activity,
    Progress,
}

impl SortKey {
    pub const NAMES: &'static [&'static str] = &[
        "id",
        "name",
        "size",
        "ratio",
        "speed",
        "speed_up",
        "speed_down",
        "status",
        "queue",
        "age",
        "activity",
        "progress",
    ];

    pub fn compare(&self, a: &Torrent, b: &Torrent) -> Ordering {
        use SortKey::*;
        match self {
            Id => a.id.cmp(&b.id),
            Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Size => b.total_size.cmp(&a.total_size),
            Ratio => a.ratio.total_cmp(&b.ratio),
            Speed => a.rate_total().cmp(&b.rate_total()),
            SpeedUp => a.rate_upload.cmp(&b.rate_upload),
            SpeedDown => a.rate_download.cmp(&b.rate_download),
            Self::Status => a.status.label().cmp(b.status.label()),
            Queue => a.queue_position.cmp(&b.queue_position),
            Age => a.date_added.cmp(&b.date_added),
            Activity => a.date_active.cmp(&b.date_active),
            Progress => a.percent_done.total_cmp(&b.percent_done),
        }
    }
}

impl FromStr for SortKey {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use SortKey::*;
        Ok(match s.to_lowercase().as_str() {
            "id" => Id,
            "name" => Name,
            "size" => Size,
            "ratio" => Ratio,
            "speed" => Speed,
            "speed_up" => SpeedUp,
            "speed_down" => SpeedDown,
            "status" => Self::Status,
            "queue" => Queue,
            "age" => Age,
            "activity" => Activity,
            "progress" => Progress,
            _ => return Err(CommandError::UnknownOperand(s.to_string())),
        })
    }
}

/// Sorts a copy of `torrents`. The sort is stable: torrents that compare
/// equal keep their input order, with or without `reverse`.
pub fn sort_by(torrents: &[Torrent], key: SortKey, reverse: bool) -> Vec<Torrent> {
    let mut sorted = torrents.to_vec();
    if reverse {
        sorted.sort_by(|a, b| key.compare(b, a));
    } else {
        sorted.sort_by(|a, b| key.compare(a, b));
    }
    sorted
}
