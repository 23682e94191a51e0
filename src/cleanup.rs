//! Sweeps that remove torrents which no longer need to be in the client.
//!
//! Each sweep fetches the torrent list once and walks it. A torrent that
//! can't be removed is recorded in the [`SweepReport`] and the sweep
//! moves on; only a failed fetch ends a sweep early. Removal never
//! deletes downloaded data.

use std::fmt;

use enum_kinds::EnumKind;
use tracing::{debug, info, warn};

use crate::client::TorrentClient;
use crate::config::rules::{ConditionMatch, RuleRegistry};
use crate::config::CleanupSettings;
use crate::error::RemoteError;
use crate::{ErrorStatus, Status, Torrent};

/// Why a torrent is being removed.
#[allow(clippy::extra_unused_lifetimes)]
#[derive(PartialEq, Clone, Debug, EnumKind)]
#[enum_kind(RemovalReasonKind)]
pub enum RemovalReason {
    /// The tracker no longer knows the torrent.
    Unregistered(String),

    /// The data went missing underneath transmission.
    LocalError(String),

    /// The torrent has seeded enough under the named rule.
    SeedLimit { rule: String, matched: ConditionMatch },
}

impl fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RemovalReason::*;
        match self {
            Unregistered(msg) => write!(f, "tracker error: {}", msg),
            LocalError(msg) => write!(f, "local error: {}", msg),
            SeedLimit { rule, matched } => write!(f, "{} on {}", matched, rule),
        }
    }
}

/// A torrent picked for removal.
#[derive(PartialEq, Clone, Debug)]
pub struct Removal {
    pub id: i64,
    pub name: String,
    pub reason: RemovalReason,
}

impl fmt::Display for Removal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.name, self.id, self.reason)
    }
}

/// What a sweep did.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub removed: Vec<Removal>,
    pub failed: Vec<(Removal, RemoteError)>,
}

impl SweepReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn merge(&mut self, other: SweepReport) {
        self.removed.extend(other.removed);
        self.failed.extend(other.failed);
    }
}

/// Stops a torrent unless it already is, then removes it while leaving
/// its data on disk.
pub async fn remove_torrent<C: TorrentClient>(
    client: &mut C,
    t: &Torrent,
) -> Result<(), RemoteError> {
    if !t.is_stopped() {
        client.stop_torrents(&[t.id]).await?;
    }
    client.remove_torrent(t.id, false).await
}

/// Decides which torrents go, and removes them.
pub struct Cleaner<'a> {
    rules: &'a RuleRegistry,
    settings: &'a CleanupSettings,
    dry_run: bool,
}

impl<'a> Cleaner<'a> {
    pub fn new(rules: &'a RuleRegistry, settings: &'a CleanupSettings) -> Self {
        Cleaner {
            rules,
            settings,
            dry_run: false,
        }
    }

    /// Only log what would be removed.
    pub fn dry_run(self, dry_run: bool) -> Self {
        Cleaner { dry_run, ..self }
    }

    /// The tracker reported the torrent as unregistered.
    pub fn unregistered(&self, t: &Torrent) -> Option<RemovalReason> {
        if t.error < ErrorStatus::TrackerError {
            return None;
        }
        let message = t.error_string.to_lowercase();
        self.settings
            .remote_messages
            .iter()
            .any(|known| known.to_lowercase() == message)
            .then(|| RemovalReason::Unregistered(t.error_string.clone()))
    }

    /// Transmission can't find the torrent's data any more.
    pub fn local_error(&self, t: &Torrent) -> Option<RemovalReason> {
        if t.error != ErrorStatus::LocalError {
            return None;
        }
        let message = t.error_string.to_lowercase();
        self.settings
            .local_errors
            .iter()
            .any(|known| message.contains(&known.to_lowercase()))
            .then(|| RemovalReason::LocalError(t.error_string.clone()))
    }

    /// A healthy seeding torrent went past its rule's ratio or seed time.
    pub fn seed_limit(&self, t: &Torrent) -> Option<RemovalReason> {
        if !t.is_ok() || t.status != Status::Seeding {
            return None;
        }
        let rule = self.rules.resolve(t);
        let matched = rule.exceeded_by(t);
        matched.is_match().then(|| RemovalReason::SeedLimit {
            rule: rule.tracker.clone(),
            matched,
        })
    }

    /// Removes torrents their tracker has unregistered.
    pub async fn remove_unknown<C: TorrentClient>(
        &self,
        client: &mut C,
    ) -> Result<SweepReport, RemoteError> {
        self.sweep(client, "remove_unknown", Self::unregistered).await
    }

    /// Removes torrents whose data disappeared from the local filesystem.
    pub async fn remove_local_errors<C: TorrentClient>(
        &self,
        client: &mut C,
    ) -> Result<SweepReport, RemoteError> {
        self.sweep(client, "remove_local_errors", Self::local_error)
            .await
    }

    /// Removes seeding torrents that met their tracker's requirements.
    pub async fn sweep_seed_limits<C: TorrentClient>(
        &self,
        client: &mut C,
    ) -> Result<SweepReport, RemoteError> {
        self.sweep(client, "sweep_seed_limits", Self::seed_limit)
            .await
    }

    /// Runs all three sweeps, one after the other.
    pub async fn run_all<C: TorrentClient>(
        &self,
        client: &mut C,
    ) -> Result<SweepReport, RemoteError> {
        let mut report = self.remove_unknown(client).await?;
        report.merge(self.remove_local_errors(client).await?);
        report.merge(self.sweep_seed_limits(client).await?);
        Ok(report)
    }

    #[tracing::instrument(skip(self, client, check))]
    async fn sweep<C, F>(
        &self,
        client: &mut C,
        sweep: &'static str,
        check: F,
    ) -> Result<SweepReport, RemoteError>
    where
        C: TorrentClient,
        F: Fn(&Self, &Torrent) -> Option<RemovalReason>,
    {
        let torrents = client.get_torrents().await?;
        debug!("Checking {} torrents", torrents.len());
        let mut report = SweepReport::default();
        for t in torrents {
            let Some(reason) = check(self, &t) else {
                continue;
            };
            let removal = Removal {
                id: t.id,
                name: t.name.clone(),
                reason,
            };
            if self.dry_run {
                info!(name = %removal.name, id = removal.id, reason = %removal.reason, "Would remove");
                report.removed.push(removal);
                continue;
            }
            match remove_torrent(client, &t).await {
                Ok(()) => {
                    info!(name = %removal.name, id = removal.id, reason = %removal.reason, "Removed");
                    report.removed.push(removal);
                }
                Err(e) => {
                    warn!(name = %removal.name, id = removal.id, reason = %removal.reason, "Could not remove: {}", e);
                    report.failed.push((removal, e));
                }
            }
        }
        Ok(report)
    }
}
