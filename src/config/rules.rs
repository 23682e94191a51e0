use std::{convert::TryFrom, fmt};

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::util::chrono_duration;
use crate::Torrent;

/// The key of the rule that applies when no tracker matches.
pub const RULES_DEFAULT: &str = "DEFAULT";

/// Seed a bit longer than required to account for any weirdness.
pub const SEED_TIME_BUFFER: f64 = 1.1;

/// Seeding requirements for torrents announced to a particular tracker.
#[derive(PartialEq, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// Substring of the announce URL that this rule applies to, or
    /// [`RULES_DEFAULT`].
    pub tracker: String,

    /// The seed time after which a torrent qualifies for removal.
    #[serde(with = "chrono_duration")]
    pub min_seed_time: Duration,

    /// The ratio above which a torrent qualifies for removal, no
    /// matter how long it has been seeding.
    pub max_ratio: f64,
}

impl Rule {
    pub fn new(tracker: &str, min_seed_time: Duration, max_ratio: f64) -> Self {
        Rule {
            tracker: tracker.to_string(),
            min_seed_time,
            max_ratio,
        }
    }

    /// A rule whose required seed time gets padded by [`SEED_TIME_BUFFER`].
    fn buffered(tracker: &str, required: Duration, max_ratio: f64) -> Self {
        let seconds = (required.num_seconds() as f64 * SEED_TIME_BUFFER) as i64;
        Self::new(tracker, Duration::seconds(seconds), max_ratio)
    }

    pub fn is_default(&self) -> bool {
        self.tracker == RULES_DEFAULT
    }

    fn governs(&self, t: &Torrent) -> bool {
        let key = self.tracker.to_lowercase();
        t.trackers
            .iter()
            .any(|announce| announce.as_str().to_lowercase().contains(&key))
    }

    /// Checks whether a torrent has done its duty under this rule.
    /// Either limit on its own is enough.
    #[tracing::instrument]
    pub fn exceeded_by(&self, t: &Torrent) -> ConditionMatch {
        if t.ratio > self.max_ratio {
            debug!("Torrent {:?} has a ratio that qualifies it for removal", t);
            return ConditionMatch::Ratio(t.ratio);
        }
        let seed_time = Duration::seconds(t.seconds_seeding as i64);
        if seed_time > self.min_seed_time {
            debug!("Torrent {:?} matches seed time requirements", t);
            return ConditionMatch::SeedTime(seed_time);
        }
        ConditionMatch::None
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use hhmmss::Hhmmss;
        write!(
            f,
            "Rule:[{} t>{} r>{}]",
            self.tracker,
            self.min_seed_time.hhmmss(),
            self.max_ratio
        )
    }
}

mod condition_match {
    #![allow(clippy::extra_unused_lifetimes)]

    use chrono::Duration;
    use enum_kinds::EnumKind;

    #[derive(PartialEq, Copy, Clone, Debug, EnumKind)]
    #[enum_kind(ConditionMatchKind)]
    pub enum ConditionMatch {
        /// Still has seeding left to do.
        None,

        /// Matches based on ratio
        Ratio(f64),

        /// Matches based on seed time
        SeedTime(Duration),
    }
}
pub use condition_match::*;

impl fmt::Display for ConditionMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use hhmmss::Hhmmss;
        use ConditionMatch::*;
        match self {
            None => write!(f, "None"),
            Ratio(r) => write!(f, "max_ratio threshold passed ({:.2})", r),
            SeedTime(d) => write!(f, "min_time threshold passed ({})", d.hhmmss()),
        }
    }
}

impl ConditionMatch {
    pub fn is_match(&self) -> bool {
        self != &ConditionMatch::None
    }
}

/// The ordered table of per-tracker rules.
///
/// Lookup walks the table in the order it was configured and the first
/// tracker key that matches wins, so more specific keys have to come
/// before keys that are substrings of them. The [`RULES_DEFAULT`] entry
/// is kept apart and only consulted when nothing else matches.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "Vec<Rule>", into = "Vec<Rule>")]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    default: Rule,
}

impl RuleRegistry {
    /// Returns the rule governing a torrent.
    #[tracing::instrument(skip(self))]
    pub fn resolve(&self, t: &Torrent) -> &Rule {
        self.rules
            .iter()
            .find(|rule| rule.governs(t))
            .unwrap_or_else(|| {
                debug!("No tracker rule for {:?}, using {}", t.name, RULES_DEFAULT);
                &self.default
            })
    }

    /// The name of the rule governing a torrent.
    pub fn label(&self, t: &Torrent) -> &str {
        &self.resolve(t).tracker
    }

    /// All rules in lookup order, ending with the default.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().chain(std::iter::once(&self.default))
    }
}

impl TryFrom<Vec<Rule>> for RuleRegistry {
    type Error = ConfigError;

    fn try_from(all: Vec<Rule>) -> Result<Self, Self::Error> {
        if let Some(bad) = all.iter().find(|r| !(r.max_ratio >= 0.0)) {
            return Err(ConfigError::InvalidRatio {
                tracker: bad.tracker.clone(),
                max_ratio: bad.max_ratio,
            });
        }
        let (mut defaults, rules): (Vec<Rule>, Vec<Rule>) =
            all.into_iter().partition(Rule::is_default);
        if defaults.len() > 1 {
            return Err(ConfigError::DuplicateDefaultRule {
                name: RULES_DEFAULT,
                count: defaults.len(),
            });
        }
        let default = defaults
            .pop()
            .ok_or(ConfigError::MissingDefaultRule(RULES_DEFAULT))?;
        Ok(RuleRegistry { rules, default })
    }
}

impl From<RuleRegistry> for Vec<Rule> {
    fn from(registry: RuleRegistry) -> Self {
        let mut all = registry.rules;
        all.push(registry.default);
        all
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        RuleRegistry {
            rules: vec![
                Rule::buffered("apollo.rip/", Duration::days(30), 2.0),
                Rule::buffered("landof.tv/", Duration::hours(120), 1.0),
            ],
            default: Rule::buffered(RULES_DEFAULT, Duration::hours(240), 2.0),
        }
    }
}
