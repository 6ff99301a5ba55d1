//! Tests for the composed V1 event registry
//!
//! Covers topic naming, cross-area uniqueness, request classification and
//! the configurable guild deletion flow.

use frolf_events_domain::events::{
    self, auth, guild, guild::DeletionFlow, is_request_event, leaderboard, round, score,
    topic_domain, user, validate_topic, EventRegistry, FunctionalArea, Service,
};
use frolf_events_domain::{resource_state_is_empty, DeletionResult, ResourceState};
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

// ============================================================================
// Registry composition
// ============================================================================

#[test]
fn test_every_area_registry_uses_valid_topics() {
    for area in FunctionalArea::ALL {
        let registry = area.v1_registry().unwrap();
        assert!(!registry.is_empty(), "{area} registry is empty");
        for (topic, info) in registry.iter() {
            assert!(validate_topic(topic).is_ok(), "{topic} breaks the naming convention");
            assert_eq!(topic_domain(topic), area.as_str(), "{topic} is filed under {area}");
            assert!(!info.summary.is_empty(), "{topic} has no summary");
            assert!(!info.payload.type_name().is_empty());
        }
    }
}

#[test]
fn test_union_has_no_duplicates() {
    let total: usize = events::all_v1_registries().unwrap().iter().map(EventRegistry::len).sum();
    let merged = events::v1_registry().unwrap();
    assert_eq!(merged.len(), total);

    let unique: HashSet<_> = merged.topics().collect();
    assert_eq!(unique.len(), merged.len());
}

#[test]
fn test_payload_short_names_are_unique_per_type() {
    let merged = events::v1_registry().unwrap();
    let mut owners: HashMap<&str, &str> = HashMap::new();
    for (topic, info) in merged.iter().filter(|(_, info)| !info.payload.is_opaque()) {
        let owner = owners
            .entry(info.payload.short_name())
            .or_insert_with(|| info.payload.type_name());
        assert_eq!(*owner, info.payload.type_name(), "{topic} reuses the name {}", info.payload.short_name());
    }
}

#[test]
fn test_union_is_sorted_by_topic() {
    let merged = events::v1_registry().unwrap();
    let topics: Vec<_> = merged.topics().collect();
    let mut sorted = topics.clone();
    sorted.sort_unstable();
    assert_eq!(topics, sorted);
}

#[test]
fn test_only_traced_channel_is_opaque() {
    let merged = events::v1_registry().unwrap();
    let opaque: Vec<_> = merged
        .iter()
        .filter(|(_, info)| info.payload.is_opaque())
        .map(|(topic, _)| topic)
        .collect();
    assert_eq!(opaque, vec![round::ROUND_TRACED_V1]);
}

// ============================================================================
// Request classification
// ============================================================================

#[test]
fn test_producer_follows_request_classification() {
    let merged = events::v1_registry().unwrap();
    for (topic, info) in merged.iter() {
        let expected = if is_request_event(topic) {
            Service::Discord
        } else {
            Service::Backend
        };
        assert_eq!(info.producer.service, expected, "{topic}");
    }
}

#[test]
fn test_area_registries_match_their_topic_lists() {
    let lists: [(FunctionalArea, &[&str]); 6] = [
        (FunctionalArea::Round, &round::ALL_TOPICS),
        (FunctionalArea::Score, &score::ALL_TOPICS),
        (FunctionalArea::User, &user::ALL_TOPICS),
        (FunctionalArea::Leaderboard, &leaderboard::ALL_TOPICS),
        (FunctionalArea::Guild, &guild::ALL_TOPICS),
        (FunctionalArea::Auth, &auth::ALL_TOPICS),
    ];
    for (area, topics) in lists {
        let registry = area.v1_registry().unwrap();
        assert_eq!(registry.len(), topics.len(), "{area}");
        let unique: HashSet<_> = topics.iter().collect();
        assert_eq!(unique.len(), topics.len(), "{area} lists a topic twice");
    }
}

#[test]
fn test_round_created_is_a_notification() {
    let merged = events::v1_registry().unwrap();
    let info = merged.get(round::ROUND_CREATED_V1).unwrap();
    assert!(!is_request_event(round::ROUND_CREATED_V1));
    assert_eq!(info.producer.service, Service::Backend);
    assert_eq!(info.payload.short_name(), "RoundCreatedPayloadV1");
}

// ============================================================================
// Guild deletion flow
// ============================================================================

#[test]
fn test_deletion_results_direction_is_configurable() {
    let default = guild::v1_registry().unwrap();
    let info = default.get(guild::GUILD_CONFIG_DELETION_RESULTS_V1).unwrap();
    assert_eq!(info.producer.service, Service::Backend);
    assert!(info.consumers.iter().all(|c| c.service == Service::Discord));

    let inverted = guild::v1_registry_with(DeletionFlow::DiscordReportsResults).unwrap();
    let info = inverted.get(guild::GUILD_CONFIG_DELETION_RESULTS_V1).unwrap();
    assert_eq!(info.producer.service, Service::Discord);
    assert!(info.consumers.iter().all(|c| c.service == Service::Backend));
}

#[test]
fn test_resource_state_absence_is_empty() {
    assert!(resource_state_is_empty(None));

    let mut state = ResourceState::default();
    assert!(state.is_empty());
    state.record_result("admin_role", DeletionResult::failed("missing permissions"));
    assert!(!state.is_empty());
    assert_eq!(state.failed_kinds(), vec!["admin_role"]);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_request_classification_matches_substring(topic in "[a-zA-Z._]{0,40}") {
        let expected = topic.to_lowercase().contains("request");
        prop_assert_eq!(is_request_event(&topic), expected);
    }

    #[test]
    fn prop_well_formed_topics_validate(
        domain in "[a-z][a-z_]{0,10}",
        segments in proptest::collection::vec("[a-z_]{1,10}", 1..4),
    ) {
        let topic = format!("{}.{}.v1", domain, segments.join("."));
        prop_assert!(validate_topic(&topic).is_ok());
        prop_assert_eq!(topic_domain(&topic), domain.as_str());
    }

    #[test]
    fn prop_uppercase_topics_rejected(topic in "[A-Z][a-z]{1,8}\\.[a-z]{1,8}\\.v1") {
        prop_assert!(validate_topic(&topic).is_err());
    }
}
