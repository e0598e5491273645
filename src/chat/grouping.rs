//! Calendar-day grouping of chat messages.
//!
//! A pure derivation over the loaded message collection, recomputed from
//! scratch on every change. Collections are tens to low hundreds of messages,
//! so there is no incremental bookkeeping to get wrong.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, TimeZone};

use super::message::Message;

/// One calendar day of a conversation: the date, its display label, and the
/// day's messages in ascending timestamp order. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateGroup {
    pub date: NaiveDate,
    pub label: String,
    pub messages: Vec<Message>,
}

/// Groups messages by the local calendar day of their timestamp.
pub fn group_messages(messages: &[Message]) -> Vec<DateGroup> {
    group_messages_in(messages, &Local, Local::now().date_naive())
}

/// Groups messages by calendar day in an explicit timezone, labeling against
/// an explicit "today".
///
/// Messages are partitioned by date, ordered ascending by timestamp within a
/// partition (ties keep their insertion order), and partitions are ordered
/// ascending by date. Same input always yields identical output.
pub fn group_messages_in<Tz: TimeZone>(
    messages: &[Message],
    tz: &Tz,
    today: NaiveDate,
) -> Vec<DateGroup> {
    let mut by_date: BTreeMap<NaiveDate, Vec<Message>> = BTreeMap::new();
    for message in messages {
        let date = message.timestamp.with_timezone(tz).date_naive();
        by_date.entry(date).or_default().push(message.clone());
    }

    by_date
        .into_iter()
        .map(|(date, mut day_messages)| {
            // Vec::sort_by_key is stable, preserving insertion order on ties
            day_messages.sort_by_key(|m| m.timestamp);
            DateGroup {
                date,
                label: date_label(date, today),
                messages: day_messages,
            }
        })
        .collect()
}

/// Three-tier label: `Today`, `Yesterday`, else a formatted date.
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if Some(date) == today.pred_opt() {
        "Yesterday".to_string()
    } else {
        date.format("%d.%m.%Y").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::{MessageContent, Sender};
    use chrono::{DateTime, Duration, Utc};

    fn text_message(id: &str, timestamp: DateTime<Utc>) -> Message {
        Message {
            id: id.to_string(),
            sender: Sender::Me,
            timestamp,
            content: MessageContent::Text {
                text: format!("message {}", id),
            },
        }
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_empty_collection_yields_empty_sequence() {
        let groups = group_messages_in(&[], &Utc, Utc::now().date_naive());
        assert!(groups.is_empty());
    }

    #[test]
    fn test_grouping_partitions_exactly() {
        let messages = vec![
            text_message("a", at("2026-08-04T23:59:00Z")),
            text_message("b", at("2026-08-05T00:01:00Z")),
            text_message("c", at("2026-08-04T08:00:00Z")),
            text_message("d", at("2026-08-06T12:00:00Z")),
        ];
        let today = at("2026-08-06T12:00:00Z").date_naive();
        let groups = group_messages_in(&messages, &Utc, today);

        // Every message appears exactly once, across all groups
        let total: usize = groups.iter().map(|g| g.messages.len()).sum();
        assert_eq!(total, messages.len());
        for message in &messages {
            let occurrences = groups
                .iter()
                .flat_map(|g| &g.messages)
                .filter(|m| m.id == message.id)
                .count();
            assert_eq!(occurrences, 1, "message {} duplicated or lost", message.id);
        }

        // Partitions ascend by date
        let dates: Vec<_> = groups.iter().map(|g| g.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);

        // Every message landed in its own day's partition
        for group in &groups {
            for message in &group.messages {
                assert_eq!(message.timestamp.date_naive(), group.date);
            }
        }
    }

    #[test]
    fn test_within_group_order_non_decreasing() {
        let messages = vec![
            text_message("late", at("2026-08-04T20:00:00Z")),
            text_message("early", at("2026-08-04T08:00:00Z")),
            text_message("middle", at("2026-08-04T12:00:00Z")),
        ];
        let groups = group_messages_in(&messages, &Utc, at("2026-08-06T00:00:00Z").date_naive());

        assert_eq!(groups.len(), 1);
        let timestamps: Vec<_> = groups[0].messages.iter().map(|m| m.timestamp).collect();
        assert!(timestamps.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(groups[0].messages[0].id, "early");
    }

    #[test]
    fn test_identical_timestamps_keep_insertion_order() {
        let ts = at("2026-08-04T12:00:00Z");
        let messages = vec![
            text_message("first", ts),
            text_message("second", ts),
            text_message("third", ts),
        ];
        let groups = group_messages_in(&messages, &Utc, ts.date_naive());

        let ids: Vec<_> = groups[0].messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_today_and_yesterday_labels() {
        let now = Utc::now();
        let messages = vec![
            text_message("today", now),
            text_message("yesterday", now - Duration::hours(24)),
        ];
        let groups = group_messages_in(&messages, &Utc, now.date_naive());

        let today_group = groups
            .iter()
            .find(|g| g.messages.iter().any(|m| m.id == "today"))
            .unwrap();
        assert_eq!(today_group.label, "Today");

        // Exactly 24h before now always falls on the previous calendar day
        let yesterday_group = groups
            .iter()
            .find(|g| g.messages.iter().any(|m| m.id == "yesterday"))
            .unwrap();
        assert_eq!(yesterday_group.label, "Yesterday");
    }

    #[test]
    fn test_older_dates_get_formatted_label() {
        let today = at("2026-08-06T00:00:00Z").date_naive();
        let label = date_label(at("2026-07-20T00:00:00Z").date_naive(), today);
        assert_eq!(label, "20.07.2026");
    }

    #[test]
    fn test_grouping_is_idempotent() {
        let messages = vec![
            text_message("a", at("2026-08-04T10:00:00Z")),
            text_message("b", at("2026-08-05T10:00:00Z")),
            text_message("c", at("2026-08-04T09:00:00Z")),
        ];
        let today = at("2026-08-06T00:00:00Z").date_naive();

        let first = group_messages_in(&messages, &Utc, today);
        let second = group_messages_in(&messages, &Utc, today);
        assert_eq!(first, second);
    }
}
