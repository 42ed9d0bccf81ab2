//! Ranked "restore this next" suggestions from stored snapshots and the
//! event log.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{ContextSnapshot, EventType, TimeBucket, UserEvent};

pub const MAX_SUGGESTIONS: usize = 5;
/// Events the time-of-day signal looks at.
pub const TIME_WINDOW_EVENTS: usize = 100;
/// Events the sequence signal looks at.
pub const SEQUENCE_WINDOW_EVENTS: usize = 50;

const MIN_TIME_MATCHES: usize = 3;
const MIN_SEQUENCE_REPEATS: usize = 2;
const RECENCY_CONFIDENCE: f64 = 0.6;
const FILL_CONFIDENCE: f64 = 0.5;
const FILL_COUNT: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContextSuggestion {
    pub context_id: String,
    pub label: String,
    pub emoji: String,
    pub priority: f64,
    pub confidence: f64,
    pub reason: String,
    pub auto_execute: bool,
}

impl ContextSuggestion {
    fn for_context(context: &ContextSnapshot, confidence: f64, priority: f64, reason: String) -> Self {
        Self {
            context_id: context.id.clone(),
            label: context.name.clone(),
            emoji: context.emoji.clone(),
            priority,
            confidence,
            reason,
            auto_execute: false,
        }
    }
}

/// Most frequent id; ties go to the id seen first in `ids`.
fn most_common<'a>(ids: impl Iterator<Item = &'a str>) -> Option<(&'a str, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for id in ids {
        let count = counts.entry(id).or_insert(0);
        if *count == 0 {
            order.push(id);
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for id in order {
        let count = counts[id];
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((id, count));
        }
    }
    best
}

fn find<'a>(contexts: &'a [ContextSnapshot], id: &str) -> Option<&'a ContextSnapshot> {
    contexts.iter().find(|context| context.id == id)
}

fn by_time<Tz: TimeZone>(
    contexts: &[ContextSnapshot],
    events: &[UserEvent],
    now: &DateTime<Tz>,
    threshold: f64,
) -> Option<ContextSuggestion> {
    let local = now.naive_local();
    let bucket = TimeBucket::from_hour(local.hour());
    let day = local.weekday().num_days_from_sunday() as u8;

    let matching: Vec<&str> = events
        .iter()
        .take(TIME_WINDOW_EVENTS)
        .filter(|event| event.event_type == EventType::Restore)
        .filter(|event| event.time_bucket == bucket && event.day_of_week == day)
        .filter_map(|event| event.context_id.as_deref())
        .collect();
    if matching.len() < MIN_TIME_MATCHES {
        return None;
    }

    let (id, count) = most_common(matching.into_iter())?;
    let context = find(contexts, id)?;
    let confidence = (count as f64 / 10.0).min(0.95);

    let mut suggestion = ContextSuggestion::for_context(
        context,
        confidence,
        confidence,
        format!("You usually work on this in the {}", bucket.as_str()),
    );
    suggestion.auto_execute = confidence > threshold;
    Some(suggestion)
}

fn by_recency(contexts: &[ContextSnapshot], now: DateTime<Utc>) -> Option<ContextSuggestion> {
    let recent = contexts
        .iter()
        .filter_map(|context| context.last_restored.map(|at| (context, at)))
        .max_by_key(|(_, at)| *at)?;

    if recent.1 > now - Duration::minutes(10) {
        return None;
    }

    Some(ContextSuggestion::for_context(
        recent.0,
        RECENCY_CONFIDENCE,
        RECENCY_CONFIDENCE,
        "Recently used".into(),
    ))
}

fn by_sequence(contexts: &[ContextSnapshot], events: &[UserEvent]) -> Option<ContextSuggestion> {
    // `events` is newest first; walk the window oldest to newest.
    let restores: Vec<&str> = events
        .iter()
        .take(SEQUENCE_WINDOW_EVENTS)
        .rev()
        .filter(|event| event.event_type == EventType::Restore)
        .filter_map(|event| event.context_id.as_deref())
        .collect();

    let current = *restores.last()?;
    let followers = restores
        .windows(2)
        .filter(|pair| pair[0] == current && pair[1] != current)
        .map(|pair| pair[1]);

    let (id, count) = most_common(followers)?;
    if count < MIN_SEQUENCE_REPEATS {
        return None;
    }

    let context = find(contexts, id)?;
    let confidence = (count as f64 / 5.0).min(0.9);
    Some(ContextSuggestion::for_context(
        context,
        confidence,
        confidence * 0.9,
        "Often follows your current context".into(),
    ))
}

/// `events` must be newest first, as the store returns them.
pub fn generate_suggestions<Tz: TimeZone>(
    contexts: &[ContextSnapshot],
    events: &[UserEvent],
    now: DateTime<Tz>,
    auto_execute_threshold: f64,
) -> Vec<ContextSuggestion> {
    if contexts.is_empty() {
        return Vec::new();
    }

    let mut suggestions: Vec<ContextSuggestion> = Vec::new();
    let signals = [
        by_time(contexts, events, &now, auto_execute_threshold),
        by_recency(contexts, now.with_timezone(&Utc)),
        by_sequence(contexts, events),
    ];
    for suggestion in signals.into_iter().flatten() {
        if !suggestions.iter().any(|s| s.context_id == suggestion.context_id) {
            suggestions.push(suggestion);
        }
    }

    let mut frequent: Vec<&ContextSnapshot> = contexts
        .iter()
        .filter(|context| !suggestions.iter().any(|s| s.context_id == context.id))
        .collect();
    // Stable sort keeps store order among equal counts.
    frequent.sort_by(|a, b| b.restore_count.cmp(&a.restore_count));
    for context in frequent.into_iter().take(FILL_COUNT) {
        suggestions.push(ContextSuggestion::for_context(
            context,
            FILL_CONFIDENCE,
            FILL_CONFIDENCE,
            "Frequently used".into(),
        ));
    }

    suggestions.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ContextMetadata;
    use crate::models::AppStates;
    use chrono::{Local, Utc};

    fn context(id: &str, restore_count: u32, last_restored: Option<DateTime<Utc>>) -> ContextSnapshot {
        let now = Utc::now();
        ContextSnapshot {
            id: id.into(),
            name: format!("{id} Morning"),
            emoji: "📁".into(),
            created_at: now,
            updated_at: now,
            last_restored,
            restore_count,
            windows: Vec::new(),
            app_states: AppStates::new(),
            metadata: ContextMetadata::default(),
        }
    }

    fn restore(id: &str, when: DateTime<Local>) -> UserEvent {
        UserEvent::at(EventType::Restore, Some(id.into()), when)
    }

    #[test]
    fn no_contexts_means_no_suggestions() {
        let events = vec![restore("a", Local::now())];
        assert!(generate_suggestions(&[], &events, Local::now(), 0.8).is_empty());
    }

    #[test]
    fn time_signal_needs_three_matches_and_can_auto_execute() {
        let now = Local::now();
        let contexts = vec![context("a", 0, None), context("b", 0, None)];

        let two: Vec<UserEvent> = (0..2).map(|_| restore("a", now)).collect();
        let suggestions = generate_suggestions(&contexts, &two, now, 0.8);
        assert!(suggestions.iter().all(|s| s.reason == "Frequently used"));

        let many: Vec<UserEvent> = (0..10).map(|_| restore("a", now)).collect();
        let suggestions = generate_suggestions(&contexts, &many, now, 0.8);
        assert_eq!(suggestions[0].context_id, "a");
        assert!((suggestions[0].confidence - 0.95).abs() < 1e-9);
        assert!(suggestions[0].auto_execute);
    }

    #[test]
    fn recency_skips_contexts_restored_in_the_last_ten_minutes() {
        let now = Utc::now();
        let fresh = vec![context("a", 1, Some(now - Duration::minutes(2)))];
        let suggestions = generate_suggestions(&fresh, &[], now, 0.8);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].reason, "Frequently used");

        let stale = vec![context("a", 1, Some(now - Duration::hours(2)))];
        let suggestions = generate_suggestions(&stale, &[], now, 0.8);
        assert_eq!(suggestions[0].reason, "Recently used");
        assert!((suggestions[0].priority - 0.6).abs() < 1e-9);
    }

    #[test]
    fn sequence_signal_follows_repeated_transitions() {
        // Oldest to newest: a b a b a ; newest restore is "a", which was
        // followed by "b" twice.
        let base = Local::now() - Duration::days(3);
        let order = ["a", "b", "a", "b", "a"];
        let mut events: Vec<UserEvent> = order
            .iter()
            .enumerate()
            .map(|(i, id)| restore(id, base + Duration::minutes(i as i64)))
            .collect();
        events.reverse();

        let contexts = vec![context("a", 0, None), context("b", 0, None), context("c", 0, None)];
        let suggestions = generate_suggestions(&contexts, &events, Local::now(), 0.8);

        let sequence = suggestions
            .iter()
            .find(|s| s.reason == "Often follows your current context")
            .expect("sequence suggestion");
        assert_eq!(sequence.context_id, "b");
        assert!((sequence.confidence - 0.4).abs() < 1e-9);
        assert!((sequence.priority - 0.36).abs() < 1e-9);
    }

    #[test]
    fn results_are_unique_sorted_and_capped() {
        let now = Utc::now();
        let contexts: Vec<ContextSnapshot> = (0..8)
            .map(|i| context(&format!("c{i}"), i, Some(now - Duration::hours(i as i64 + 1))))
            .collect();
        let suggestions = generate_suggestions(&contexts, &[], now, 0.8);

        assert!(suggestions.len() <= MAX_SUGGESTIONS);
        let mut ids: Vec<&str> = suggestions.iter().map(|s| s.context_id.as_str()).collect();
        ids.dedup();
        assert_eq!(ids.len(), suggestions.len());
        assert!(suggestions.windows(2).all(|w| w[0].priority >= w[1].priority));
    }
}
