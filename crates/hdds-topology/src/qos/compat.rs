// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! QoS compatibility checking (RxO - Request vs Offered).
//!
//! The writer offers, the reader requests. Each rule is evaluated
//! independently and the result lists every failing policy.
//!
//! # Compatibility Rules
//!
//! | Policy             | Rule                                                  |
//! |--------------------|-------------------------------------------------------|
//! | Durability         | Writer >= Reader (Persistent > ... > Volatile)        |
//! | Presentation       | Writer scope >= Reader scope, flags offered if asked  |
//! | Deadline           | Writer period <= Reader period                        |
//! | LatencyBudget      | Writer budget <= Reader budget                        |
//! | Ownership          | Must match exactly                                    |
//! | Liveliness         | Writer kind >= Reader kind, writer lease <= reader    |
//! | Partition          | Both default, or at least one name matches            |
//! | Reliability        | Writer >= Reader (Reliable > BestEffort)              |
//! | DestinationOrder   | Writer >= Reader (BySource > ByReception)             |
//! | History            | Writer depth >= Reader depth, KeepAll needs KeepAll   |
//! | DataRepresentation | Writer's representation accepted by Reader            |

use super::{EndpointQos, PolicyKind};

type Rule = fn(&EndpointQos, &EndpointQos) -> bool;

/// Fixed checking table: (kind, predicate(reader, writer)).
const RULES: [(PolicyKind, Rule); 11] = [
    (PolicyKind::Durability, |r, w| {
        w.durability.is_compatible_with(&r.durability)
    }),
    (PolicyKind::Presentation, |r, w| {
        w.presentation.is_compatible_with(&r.presentation)
    }),
    (PolicyKind::Deadline, |r, w| {
        w.deadline.is_compatible_with(&r.deadline)
    }),
    (PolicyKind::LatencyBudget, |r, w| {
        w.latency_budget.is_compatible_with(&r.latency_budget)
    }),
    (PolicyKind::Ownership, |r, w| {
        w.ownership.is_compatible_with(&r.ownership)
    }),
    (PolicyKind::Liveliness, |r, w| {
        w.liveliness.is_compatible_with(&r.liveliness)
    }),
    (PolicyKind::Partition, |r, w| {
        w.partition.is_compatible_with(&r.partition)
    }),
    (PolicyKind::Reliability, |r, w| {
        w.reliability.is_compatible_with(&r.reliability)
    }),
    (PolicyKind::DestinationOrder, |r, w| {
        w.destination_order.is_compatible_with(&r.destination_order)
    }),
    (PolicyKind::History, |r, w| {
        w.history.is_compatible_with(&r.history)
    }),
    (PolicyKind::DataRepresentation, |r, w| {
        w.data_representation
            .is_compatible_with(&r.data_representation)
    }),
];

/// Check QoS compatibility between a reader (requested) and a writer (offered).
///
/// Returns the incompatible policy kinds in DDS policy-id order. Identical
/// inputs always produce an identical list; an empty list means the pair
/// can communicate.
pub fn check_compatibility(reader: &EndpointQos, writer: &EndpointQos) -> Vec<PolicyKind> {
    RULES
        .iter()
        .filter(|(_, compatible)| !compatible(reader, writer))
        .map(|(kind, _)| *kind)
        .collect()
}

/// `true` when no policy is incompatible.
pub fn is_compatible(reader: &EndpointQos, writer: &EndpointQos) -> bool {
    RULES.iter().all(|(_, compatible)| compatible(reader, writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qos::{
        DataRepresentationId, Durability, Liveliness, LivelinessKind, Ownership, Partition,
    };
    use std::time::Duration;

    #[test]
    fn test_defaults_are_compatible() {
        let qos = EndpointQos::default();
        assert!(check_compatibility(&qos, &qos).is_empty());
        assert!(is_compatible(&qos, &qos));
    }

    #[test]
    fn test_durability_transient_local_request() {
        let reader = EndpointQos::default().transient_local();
        let volatile_writer = EndpointQos::default().durability(Durability::Volatile);
        let tl_writer = EndpointQos::default().transient_local();

        assert_eq!(
            check_compatibility(&reader, &volatile_writer),
            vec![PolicyKind::Durability]
        );
        assert!(!check_compatibility(&reader, &tl_writer).contains(&PolicyKind::Durability));
    }

    #[test]
    fn test_reliability_is_asymmetric() {
        let reliable = EndpointQos::reliable();
        let best_effort = EndpointQos::best_effort();

        // Reliable reader, best-effort writer: writer too weak.
        assert_eq!(
            check_compatibility(&reliable, &best_effort),
            vec![PolicyKind::Reliability]
        );
        // Best-effort reader, reliable writer: writer stronger than needed.
        assert!(check_compatibility(&best_effort, &reliable).is_empty());
    }

    #[test]
    fn test_multiple_mismatches_keep_fixed_order() {
        let reader = EndpointQos::reliable()
            .keep_all()
            .transient_local()
            .deadline_millis(100)
            .partition(Partition::single("a"))
            .data_representation(vec![DataRepresentationId::Xcdr2]);
        let writer = EndpointQos::best_effort()
            .keep_last(1)
            .deadline_millis(500)
            .ownership(Ownership::Exclusive)
            .liveliness(Liveliness::new(
                LivelinessKind::Automatic,
                Duration::from_secs(5),
            ))
            .partition(Partition::single("b"));

        let first = check_compatibility(&reader, &writer);
        assert_eq!(
            first,
            vec![
                PolicyKind::Durability,
                PolicyKind::Deadline,
                PolicyKind::Ownership,
                PolicyKind::Partition,
                PolicyKind::Reliability,
                PolicyKind::History,
                PolicyKind::DataRepresentation,
            ]
        );
        assert_eq!(first, check_compatibility(&reader, &writer));
        assert!(!is_compatible(&reader, &writer));
    }

    #[test]
    fn test_latency_budget_and_destination_order() {
        let reader = EndpointQos::default()
            .latency_budget_millis(10)
            .destination_order(crate::qos::DestinationOrder::BySourceTimestamp);
        let writer = EndpointQos::default().latency_budget_millis(50);
        assert_eq!(
            check_compatibility(&reader, &writer),
            vec![PolicyKind::LatencyBudget, PolicyKind::DestinationOrder]
        );
    }
}
