//! Pipe-delimited listing commands, like `5|seeding|name`.
//!
//! A command is parsed in full before anything runs, so a typo in the
//! last stage doesn't leave the first stages half-applied.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::catalog::{filter_by, sort_by, Filter, SortKey};
use crate::client::TorrentClient;
use crate::config::rules::RuleRegistry;
use crate::error::CommandError;
use crate::format::write_torrents;
use crate::Torrent;

/// Which side of the cutoff a [`TimeWindow`] keeps.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum Direction {
    /// `>`: added longer ago than the window.
    OlderThan,
    /// `<`: added within the window.
    NewerThan,
}

/// A relative time window, written `<dir><number><unit>`: `>2w` means
/// "added more than two weeks ago", `<36h` "added in the last 36 hours".
///
/// Units are `m` (minute), `h`, `d`, `w`, `M` (month of 30.5 days) and
/// `Y` (year of 365 days); the case matters for `m` and `M`.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct TimeWindow {
    pub direction: Direction,
    pub duration: Duration,
}

impl TimeWindow {
    pub fn matches(&self, t: &Torrent, now: DateTime<Utc>) -> bool {
        let Some(added) = t.date_added else {
            return false;
        };
        match (self.direction, now.checked_sub_signed(self.duration)) {
            (Direction::OlderThan, Some(cutoff)) => added < cutoff,
            (Direction::NewerThan, Some(cutoff)) => added > cutoff,
            // The cutoff lies before any representable date.
            (Direction::OlderThan, None) => false,
            (Direction::NewerThan, None) => true,
        }
    }
}

/// Windows reaching back further than this are rejected.
const MAX_WINDOW_DAYS: i64 = 365 * 10_000;

fn unit_seconds(unit: char) -> Option<f64> {
    const DAY: f64 = 86400.0;
    Some(match unit {
        'm' => 60.0,
        'h' => 3600.0,
        'd' => DAY,
        'w' => 7.0 * DAY,
        'M' => 30.5 * DAY,
        'Y' | 'y' => 365.0 * DAY,
        _ => return None,
    })
}

impl FromStr for TimeWindow {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CommandError::InvalidArgument(format!("Invalid duration: {}", s));
        let s = s.trim();
        let direction = match s.chars().next() {
            Some('>') => Direction::OlderThan,
            Some('<') => Direction::NewerThan,
            _ => return Err(invalid()),
        };
        let rest = &s[1..];
        let unit = rest.chars().last().ok_or_else(invalid)?;
        let seconds = unit_seconds(unit).ok_or_else(invalid)?;
        let amount: f64 = rest[..rest.len() - unit.len_utf8()]
            .trim()
            .parse()
            .map_err(|_| invalid())?;
        let millis = amount * seconds * 1000.0;
        if !millis.is_finite() || millis < 0.0 || millis > i64::MAX as f64 {
            return Err(invalid());
        }
        let duration = Duration::try_milliseconds(millis as i64)
            .filter(|d| d.num_days() <= MAX_WINDOW_DAYS)
            .ok_or_else(invalid)?;
        Ok(TimeWindow {
            direction,
            duration,
        })
    }
}

/// One step of a [`Pipeline`].
#[derive(PartialEq, Debug, Clone)]
pub enum Stage {
    Limit(i64),
    Filter(Filter),
    Sort(SortKey),
    Print,
    Count,
    Reverse,
    Start,
    Stop,
    Verify,
    /// Lowercased name prefix.
    NameFilter(String),
    /// Lowercased substring of the tracker rule name.
    TrackerFilter(String),
    TimeFilter(TimeWindow),
}

impl FromStr for Stage {
    type Err = CommandError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        let lower = token.to_lowercase();
        if let Ok(n) = lower.parse::<i64>() {
            return Ok(Stage::Limit(n));
        }
        match lower.as_str() {
            "p" | "print" => return Ok(Stage::Print),
            "c" | "cnt" | "count" => return Ok(Stage::Count),
            "r" | "rev" | "reverse" => return Ok(Stage::Reverse),
            "start" => return Ok(Stage::Start),
            "stop" | "pause" => return Ok(Stage::Stop),
            "verify" => return Ok(Stage::Verify),
            _ => {}
        }
        if let Some((key, value)) = token.split_once('=') {
            let value = value.trim();
            return match key.trim().to_lowercase().as_str() {
                "n" | "name" => Ok(Stage::NameFilter(value.to_lowercase())),
                "t" | "tracker" => Ok(Stage::TrackerFilter(value.to_lowercase())),
                "a" | "age" => Ok(Stage::TimeFilter(value.parse()?)),
                _ => Err(CommandError::UnknownOperand(token.to_string())),
            };
        }
        if let Ok(filter) = lower.parse::<Filter>() {
            return Ok(Stage::Filter(filter));
        }
        if let Ok(key) = lower.parse::<SortKey>() {
            return Ok(Stage::Sort(key));
        }
        Err(CommandError::UnknownOperand(token.to_string()))
    }
}

/// What a pipeline runs against.
pub struct Session<'a, C, W> {
    pub client: &'a mut C,
    pub rules: &'a RuleRegistry,
    pub out: &'a mut W,
    /// The reference point for time filters.
    pub now: DateTime<Utc>,
}

impl<'a, C, W> Session<'a, C, W> {
    pub fn new(client: &'a mut C, rules: &'a RuleRegistry, out: &'a mut W) -> Self {
        Session {
            client,
            rules,
            out,
            now: Utc::now(),
        }
    }
}

/// A parsed listing command.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl FromStr for Pipeline {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let stages = line
            .split('|')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::parse::<Stage>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Pipeline { stages })
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipeline({} stages)", self.stages.len())
    }
}

impl Pipeline {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Runs the stages left to right over `torrents`. Limits, filters
    /// and sorts print the list when they come last; an empty pipeline
    /// just prints everything.
    #[tracing::instrument(skip_all, fields(stages = self.stages.len()))]
    pub async fn apply<C, W>(
        &self,
        mut torrents: Vec<Torrent>,
        session: &mut Session<'_, C, W>,
    ) -> Result<Vec<Torrent>, CommandError>
    where
        C: TorrentClient,
        W: Write,
    {
        if self.stages.is_empty() {
            write_torrents(session.out, &torrents)?;
            return Ok(torrents);
        }
        let last = self.stages.len() - 1;
        for (i, stage) in self.stages.iter().enumerate() {
            debug!("Applying {:?} to {} torrents", stage, torrents.len());
            let autoprint = match stage {
                Stage::Limit(n) => {
                    if *n <= 0 {
                        writeln!(session.out, "Limit too low, must be positive integer: {}", n)?;
                        return Ok(vec![]);
                    }
                    torrents.truncate(*n as usize);
                    true
                }
                Stage::Filter(filter) => {
                    torrents = filter_by(&torrents, |t| filter.matches(t));
                    true
                }
                Stage::Sort(key) => {
                    torrents = sort_by(&torrents, *key, false);
                    true
                }
                Stage::Print => {
                    write_torrents(session.out, &torrents)?;
                    false
                }
                Stage::Count => {
                    writeln!(session.out, "{}", torrents.len())?;
                    return Ok(vec![]);
                }
                Stage::Reverse => {
                    torrents.reverse();
                    false
                }
                Stage::Start => {
                    let ids = ids(&torrents);
                    session.client.start_torrents(&ids).await?;
                    info!("Started {} torrents", ids.len());
                    writeln!(session.out, ">>> Starting {} torrents.", ids.len())?;
                    false
                }
                Stage::Stop => {
                    let ids = ids(&torrents);
                    session.client.stop_torrents(&ids).await?;
                    info!("Stopped {} torrents", ids.len());
                    writeln!(session.out, ">>> Stopping {} torrents.", ids.len())?;
                    false
                }
                Stage::Verify => {
                    let ids = ids(&torrents);
                    session.client.verify_torrents(&ids).await?;
                    info!("Verifying {} torrents", ids.len());
                    writeln!(session.out, ">>> Verifying {} torrents.", ids.len())?;
                    false
                }
                Stage::NameFilter(prefix) => {
                    torrents = filter_by(&torrents, |t| t.name.to_lowercase().starts_with(prefix));
                    true
                }
                Stage::TrackerFilter(substr) => {
                    let rules = session.rules;
                    torrents = filter_by(&torrents, |t| {
                        rules.label(t).to_lowercase().contains(substr.as_str())
                    });
                    true
                }
                Stage::TimeFilter(window) => {
                    let now = session.now;
                    torrents = filter_by(&torrents, |t| window.matches(t, now));
                    true
                }
            };
            if autoprint && i == last {
                write_torrents(session.out, &torrents)?;
            }
        }
        Ok(torrents)
    }
}

fn ids(torrents: &[Torrent]) -> Vec<i64> {
    torrents.iter().map(|t| t.id).collect()
}
