/// Parses and serializes a chrono duration as a human-readable string.
///
/// Anything [`parse_duration`] understands is accepted ("33 days",
/// "120h", "950400"); durations are written back as whole seconds so
/// that they survive a round trip.
pub mod chrono_duration {
    use chrono::Duration;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Duration::from_std(parse_duration::parse(&s).map_err(serde::de::Error::custom)?)
            .map_err(serde::de::Error::custom)
    }

    pub fn serialize<S>(dur: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = format!("{}s", dur.num_seconds());
        serializer.serialize_str(&s)
    }
}
