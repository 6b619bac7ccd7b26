use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{MessageKind, StoredMessage};

/// Message counts for a single calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_messages: i64,
    pub text_messages: i64,
    pub image_messages: i64,
    pub processed_messages: i64,
    pub auto_responses: i64,
    pub unique_users: i64,
    pub unique_conversations: i64,
}

/// Totals over a stats window. Unique counts are the busiest day's count,
/// not a distinct count over the whole window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsTotals {
    pub total_messages: i64,
    pub text_messages: i64,
    pub image_messages: i64,
    pub processed_messages: i64,
    pub auto_responses: i64,
    pub unique_users: i64,
    pub unique_conversations: i64,
}

impl DailyStats {
    /// Group messages with `timestamp >= since` by day, newest day first.
    pub fn from_messages<'a>(
        messages: impl IntoIterator<Item = &'a StoredMessage>,
        since: DateTime<Utc>,
    ) -> Vec<DailyStats> {
        #[derive(Default)]
        struct Bucket<'m> {
            stats: Option<DailyStats>,
            users: HashSet<&'m str>,
            conversations: HashSet<&'m str>,
        }

        let mut days: BTreeMap<NaiveDate, Bucket<'a>> = BTreeMap::new();
        for message in messages.into_iter().filter(|m| m.timestamp >= since) {
            let date = message.timestamp.date_naive();
            let bucket = days.entry(date).or_default();
            let stats = bucket.stats.get_or_insert_with(|| DailyStats::empty(date));

            stats.total_messages += 1;
            match message.kind {
                MessageKind::Text => stats.text_messages += 1,
                MessageKind::Image => stats.image_messages += 1,
                MessageKind::Other(_) => {}
            }
            if message.processed {
                stats.processed_messages += 1;
            }
            if message.auto_response_sent {
                stats.auto_responses += 1;
            }
            bucket.users.insert(&message.from_number);
            bucket.conversations.insert(&message.conversation_id);
        }

        days.into_values()
            .rev()
            .filter_map(|bucket| {
                bucket.stats.map(|mut stats| {
                    stats.unique_users = bucket.users.len() as i64;
                    stats.unique_conversations = bucket.conversations.len() as i64;
                    stats
                })
            })
            .collect()
    }

    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_messages: 0,
            text_messages: 0,
            image_messages: 0,
            processed_messages: 0,
            auto_responses: 0,
            unique_users: 0,
            unique_conversations: 0,
        }
    }
}

impl StatsTotals {
    pub fn from_days(days: &[DailyStats]) -> Self {
        days.iter().fold(Self::default(), |mut acc, day| {
            acc.total_messages += day.total_messages;
            acc.text_messages += day.text_messages;
            acc.image_messages += day.image_messages;
            acc.processed_messages += day.processed_messages;
            acc.auto_responses += day.auto_responses;
            acc.unique_users = acc.unique_users.max(day.unique_users);
            acc.unique_conversations = acc.unique_conversations.max(day.unique_conversations);
            acc
        })
    }

    /// Share of messages that got an automatic reply, e.g. `"42.9%"`.
    pub fn automation_rate(&self) -> String {
        if self.total_messages == 0 {
            return "0%".to_string();
        }
        let rate = self.auto_responses as f64 / self.total_messages as f64 * 100.0;
        format!("{:.1}%", rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::InboundMessage;
    use chrono::{Duration, TimeZone};

    fn stored(id: &str, from: &str, kind: MessageKind, at: DateTime<Utc>) -> StoredMessage {
        let inbound = InboundMessage {
            message_id: id.to_string(),
            from_number: from.to_string(),
            to_number: "569".to_string(),
            kind,
            content: String::new(),
            media_url: None,
            caption: String::new(),
            sender_name: "Usuario".to_string(),
            sender_phone: from.to_string(),
            country_code: "56".to_string(),
            conversation_id: format!("conv_{}", from),
            session_id: None,
            timestamp: at,
            received_at: at,
            metadata: serde_json::Value::Null,
        };
        StoredMessage::from_inbound(id, inbound, at)
    }

    #[test]
    fn test_groups_by_day_newest_first() {
        let day1 = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let day2 = day1 + Duration::days(1);
        let mut answered = stored("c", "b", MessageKind::Text, day2);
        answered.auto_response_sent = true;
        answered.processed = true;

        let messages = vec![
            stored("a", "a", MessageKind::Text, day1),
            stored("b", "a", MessageKind::Image, day1),
            answered,
            stored("old", "z", MessageKind::Text, day1 - Duration::days(40)),
        ];

        let days = DailyStats::from_messages(&messages, day1 - Duration::days(30));
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, day2.date_naive());
        assert_eq!(days[0].auto_responses, 1);
        assert_eq!(days[1].total_messages, 2);
        assert_eq!(days[1].image_messages, 1);
        assert_eq!(days[1].unique_users, 1);

        let totals = StatsTotals::from_days(&days);
        assert_eq!(totals.total_messages, 3);
        assert_eq!(totals.unique_users, 1);
        assert_eq!(totals.automation_rate(), "33.3%");
    }

    #[test]
    fn test_automation_rate_without_messages() {
        assert_eq!(StatsTotals::default().automation_rate(), "0%");
    }
}
