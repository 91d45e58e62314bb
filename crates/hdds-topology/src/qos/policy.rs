// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Policy values carried by a discovered endpoint.
//!
//! Every policy exposes `is_compatible_with(&requested)`, called on the
//! writer-side (offered) value with the reader-side (requested) value.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Duration used for "infinite" periods and leases.
pub const DURATION_INFINITE: Duration = Duration::from_secs(u64::MAX);

/// DURABILITY kind, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    #[default]
    Volatile,
    TransientLocal,
    Transient,
    Persistent,
}

impl Durability {
    /// Offered durability must be at least as durable as requested.
    pub fn is_compatible_with(&self, requested: &Durability) -> bool {
        self >= requested
    }
}

/// PRESENTATION access scope, ordered INSTANCE < TOPIC < GROUP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationAccessScope {
    #[default]
    Instance,
    Topic,
    Group,
}

/// PRESENTATION QoS policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Presentation {
    pub access_scope: PresentationAccessScope,
    pub coherent_access: bool,
    pub ordered_access: bool,
}

impl Presentation {
    pub fn is_compatible_with(&self, requested: &Presentation) -> bool {
        if self.access_scope < requested.access_scope {
            return false;
        }
        if requested.coherent_access && !self.coherent_access {
            return false;
        }
        !(requested.ordered_access && !self.ordered_access)
    }
}

/// DEADLINE QoS policy. Default: infinite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Deadline {
    #[serde(with = "serde_duration")]
    pub period: Duration,
}

impl Default for Deadline {
    fn default() -> Self {
        Self {
            period: DURATION_INFINITE,
        }
    }
}

impl Deadline {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            period: Duration::from_millis(ms),
        }
    }

    /// Writer must promise updates at least as often as the reader expects.
    pub fn is_compatible_with(&self, requested: &Deadline) -> bool {
        self.period <= requested.period
    }
}

/// LATENCY_BUDGET QoS policy. Default: zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LatencyBudget {
    #[serde(with = "serde_duration")]
    pub duration: Duration,
}

impl LatencyBudget {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            duration: Duration::from_millis(ms),
        }
    }

    pub fn is_compatible_with(&self, requested: &LatencyBudget) -> bool {
        self.duration <= requested.duration
    }
}

/// OWNERSHIP kind. Must match exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    #[default]
    Shared,
    Exclusive,
}

impl Ownership {
    pub fn is_compatible_with(&self, requested: &Ownership) -> bool {
        self == requested
    }
}

/// LIVELINESS kind, ordered AUTOMATIC < MANUAL_BY_PARTICIPANT < MANUAL_BY_TOPIC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivelinessKind {
    #[default]
    Automatic,
    ManualByParticipant,
    ManualByTopic,
}

/// LIVELINESS QoS policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Liveliness {
    pub kind: LivelinessKind,
    #[serde(with = "serde_duration")]
    pub lease_duration: Duration,
}

impl Default for Liveliness {
    fn default() -> Self {
        Self {
            kind: LivelinessKind::Automatic,
            lease_duration: DURATION_INFINITE,
        }
    }
}

impl Liveliness {
    pub fn new(kind: LivelinessKind, lease_duration: Duration) -> Self {
        Self {
            kind,
            lease_duration,
        }
    }

    pub fn automatic_secs(secs: u64) -> Self {
        Self::new(LivelinessKind::Automatic, Duration::from_secs(secs))
    }

    /// Offered kind at least as strict and offered lease no longer than requested.
    pub fn is_compatible_with(&self, requested: &Liveliness) -> bool {
        self.kind >= requested.kind && self.lease_duration <= requested.lease_duration
    }
}

/// PARTITION QoS policy. An empty name list is the default partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition {
    pub names: Vec<String>,
}

impl Partition {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn single(name: &str) -> Self {
        Self {
            names: vec![name.to_string()],
        }
    }

    /// Empty list, or only the empty-string partition.
    pub fn is_default(&self) -> bool {
        self.names.iter().all(String::is_empty)
    }

    /// Partitions match when both are default or when at least one pair of
    /// names matches; a name may carry `*`/`?` wildcards, two wildcarded
    /// names never match each other.
    pub fn is_compatible_with(&self, requested: &Partition) -> bool {
        if self.is_default() && requested.is_default() {
            return true;
        }
        if self.is_default() || requested.is_default() {
            return false;
        }

        self.names.iter().any(|offered| {
            requested
                .names
                .iter()
                .any(|wanted| partition_names_match(offered, wanted))
        })
    }
}

fn is_wildcard(name: &str) -> bool {
    name.contains('*') || name.contains('?')
}

fn partition_names_match(offered: &str, requested: &str) -> bool {
    match (is_wildcard(offered), is_wildcard(requested)) {
        (false, false) => offered == requested,
        (true, false) => glob_match(offered, requested),
        (false, true) => glob_match(requested, offered),
        (true, true) => false,
    }
}

/// Simple glob matching (supports `*` and `?`).
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    glob_match_at(&pattern, &text, 0, 0)
}

fn glob_match_at(pattern: &[char], text: &[char], pi: usize, ti: usize) -> bool {
    if pi == pattern.len() {
        return ti == text.len();
    }

    match pattern[pi] {
        '*' => (ti..=text.len()).any(|i| glob_match_at(pattern, text, pi + 1, i)),
        '?' => ti < text.len() && glob_match_at(pattern, text, pi + 1, ti + 1),
        c => ti < text.len() && text[ti] == c && glob_match_at(pattern, text, pi + 1, ti + 1),
    }
}

/// RELIABILITY kind, ordered BEST_EFFORT < RELIABLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reliability {
    #[default]
    BestEffort,
    Reliable,
}

impl Reliability {
    pub fn is_compatible_with(&self, requested: &Reliability) -> bool {
        self >= requested
    }
}

/// DESTINATION_ORDER kind, ordered BY_RECEPTION < BY_SOURCE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationOrder {
    #[default]
    ByReceptionTimestamp,
    BySourceTimestamp,
}

impl DestinationOrder {
    pub fn is_compatible_with(&self, requested: &DestinationOrder) -> bool {
        self >= requested
    }
}

/// HISTORY QoS policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum History {
    KeepLast(u32),
    KeepAll,
}

impl Default for History {
    fn default() -> Self {
        Self::KeepLast(1)
    }
}

impl History {
    /// Writer must keep at least as many samples as the reader asks for.
    pub fn is_compatible_with(&self, requested: &History) -> bool {
        match (requested, self) {
            (History::KeepLast(wanted), History::KeepLast(kept)) => kept >= wanted,
            (History::KeepLast(_), History::KeepAll) => true,
            (History::KeepAll, History::KeepAll) => true,
            (History::KeepAll, History::KeepLast(_)) => false,
        }
    }
}

/// Wire data representation identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataRepresentationId {
    #[default]
    Xcdr1,
    Xml,
    Xcdr2,
}

/// DATA_REPRESENTATION QoS policy. An empty list means XCDR1.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataRepresentation {
    pub ids: Vec<DataRepresentationId>,
}

impl DataRepresentation {
    pub fn new(ids: Vec<DataRepresentationId>) -> Self {
        Self { ids }
    }

    /// Representation a writer actually uses: the first one it lists.
    pub fn offered(&self) -> DataRepresentationId {
        self.ids.first().copied().unwrap_or_default()
    }

    /// The writer's representation must be among the ones the reader accepts.
    pub fn is_compatible_with(&self, requested: &DataRepresentation) -> bool {
        let offered = self.offered();
        if requested.ids.is_empty() {
            return offered == DataRepresentationId::Xcdr1;
        }
        requested.ids.contains(&offered)
    }
}

/// Durations as milliseconds, or the string `"infinite"`.
pub(crate) mod serde_duration {
    use super::DURATION_INFINITE;
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Millis(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        if *value >= DURATION_INFINITE {
            serializer.serialize_str("infinite")
        } else {
            serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Millis(ms) => Ok(Duration::from_millis(ms)),
            Repr::Text(text) if text.eq_ignore_ascii_case("infinite") => Ok(DURATION_INFINITE),
            Repr::Text(text) => Err(serde::de::Error::custom(format!(
                "expected milliseconds or \"infinite\", got '{}'",
                text
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durability_ordering() {
        assert!(Durability::TransientLocal.is_compatible_with(&Durability::Volatile));
        assert!(Durability::Persistent.is_compatible_with(&Durability::Transient));
        assert!(!Durability::Volatile.is_compatible_with(&Durability::TransientLocal));
    }

    #[test]
    fn test_presentation_scope_and_flags() {
        let group = Presentation {
            access_scope: PresentationAccessScope::Group,
            coherent_access: true,
            ordered_access: false,
        };
        let topic_ordered = Presentation {
            access_scope: PresentationAccessScope::Topic,
            coherent_access: false,
            ordered_access: true,
        };
        assert!(group.is_compatible_with(&Presentation::default()));
        assert!(!Presentation::default().is_compatible_with(&group));
        // Offered scope is wider but ordering is not offered.
        assert!(!group.is_compatible_with(&topic_ordered));
    }

    #[test]
    fn test_liveliness_kind_and_lease() {
        let manual = Liveliness::new(LivelinessKind::ManualByTopic, Duration::from_secs(1));
        let auto_long = Liveliness::automatic_secs(10);
        assert!(manual.is_compatible_with(&auto_long));
        assert!(!auto_long.is_compatible_with(&manual));
        assert!(!Liveliness::automatic_secs(20).is_compatible_with(&auto_long));
    }

    #[test]
    fn test_partition_default_and_intersection() {
        assert!(Partition::default().is_compatible_with(&Partition::new(vec![String::new()])));
        assert!(!Partition::default().is_compatible_with(&Partition::single("a")));
        assert!(Partition::new(vec!["a".into(), "b".into()])
            .is_compatible_with(&Partition::single("b")));
        assert!(!Partition::single("a").is_compatible_with(&Partition::single("b")));
    }

    #[test]
    fn test_partition_wildcards() {
        assert!(Partition::single("sensor/*").is_compatible_with(&Partition::single("sensor/imu")));
        assert!(Partition::single("imu").is_compatible_with(&Partition::single("i?u")));
        assert!(!Partition::single("a*").is_compatible_with(&Partition::single("a*")));
    }

    #[test]
    fn test_history_depth() {
        assert!(History::KeepLast(10).is_compatible_with(&History::KeepLast(5)));
        assert!(!History::KeepLast(5).is_compatible_with(&History::KeepLast(10)));
        assert!(History::KeepAll.is_compatible_with(&History::KeepLast(100)));
        assert!(!History::KeepLast(100).is_compatible_with(&History::KeepAll));
    }

    #[test]
    fn test_data_representation_defaults_to_xcdr1() {
        let default = DataRepresentation::default();
        let xcdr2 = DataRepresentation::new(vec![DataRepresentationId::Xcdr2]);
        let both = DataRepresentation::new(vec![
            DataRepresentationId::Xcdr1,
            DataRepresentationId::Xcdr2,
        ]);
        assert!(default.is_compatible_with(&default));
        assert!(!xcdr2.is_compatible_with(&default));
        assert!(xcdr2.is_compatible_with(&both));
    }

    #[test]
    fn test_duration_serde_infinite_and_millis() {
        let json = serde_json::to_string(&Deadline::default()).expect("serialize");
        assert_eq!(json, r#"{"period":"infinite"}"#);

        let deadline: Deadline = serde_json::from_str(r#"{"period":250}"#).expect("millis");
        assert_eq!(deadline.period, Duration::from_millis(250));

        assert!(serde_json::from_str::<Deadline>(r#"{"period":"soon"}"#).is_err());
    }
}
