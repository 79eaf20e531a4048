//! Pending-change tracking.
//!
//! Pending changes are never stored. They are derived on every read from the
//! status marker carried by each [`StringItem`], so the view cannot drift from
//! the string table.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{ChangeLabel, Notification, StringId, StringItem};

/// One unpublished change as shown to editors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    pub id: StringId,
    pub label: ChangeLabel,
    /// 1-based position of the string in the full, unfiltered table.
    pub positional_index: u64,
    pub key: String,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Derive the pending changes of an app from its ordered string table.
#[must_use]
pub fn pending_changes(strings: &[StringItem]) -> Vec<PendingChange> {
    (1_u64..)
        .zip(strings)
        .filter_map(|(position, item)| {
            item.status.map(|status| PendingChange {
                id: item.id,
                label: status.into(),
                positional_index: position,
                key: item.key.as_str().to_owned(),
                modified_at: item.modified_at,
            })
        })
        .collect()
}

/// Number shown for a string in change notifications.
///
/// Keys with a leading integer (after optional whitespace and sign) use that
/// integer. Anything else, including a key that reads as zero, falls back to
/// `fallback`.
#[must_use]
pub fn string_number(key: &str, fallback: i64) -> i64 {
    let trimmed = key.trim_start();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();
    match digits.parse::<i64>() {
        Ok(0) | Err(_) => fallback,
        Ok(value) if negative => -value,
        Ok(value) => value,
    }
}

/// Build the notification list for a publish.
///
/// `strings` is the full ordered table. Only pending items produce entries;
/// their fallback number is their 1-based position among the pending items.
#[must_use]
pub fn notifications(strings: &[StringItem], published_at: DateTime<Utc>) -> Vec<Notification> {
    let millis = published_at.timestamp_millis();
    strings
        .iter()
        .filter_map(|item| item.status.map(|status| (item, status)))
        .zip(0_i64..)
        .map(|((item, status), index)| Notification {
            id: format!("{}-{millis}-{index}", item.id),
            status: status.into(),
            string_number: string_number(item.key.as_str(), index + 1),
            string_id: item.id,
            modified_at: item.modified_at.unwrap_or(published_at),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AdditionalColumns, AppId, StringKey, StringStatus, StringValue};
    use chrono::TimeZone;
    use rstest::rstest;

    fn item(id: i64, key: &str, status: Option<StringStatus>) -> StringItem {
        StringItem {
            id: StringId::new(id),
            app_id: AppId::new(1),
            key: StringKey::new(key).expect("key"),
            value: StringValue::new("text").expect("value"),
            additional_columns: AdditionalColumns::new(),
            status,
            modified_at: None,
            modified_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn positional_index_counts_the_full_table() {
        let strings = [
            item(10, "a", None),
            item(11, "b", Some(StringStatus::Modified)),
            item(12, "c", None),
            item(13, "d", Some(StringStatus::New)),
        ];
        let pending = pending_changes(&strings);
        let positions: Vec<u64> = pending.iter().map(|c| c.positional_index).collect();
        assert_eq!(positions, vec![2, 4]);
        assert_eq!(pending[0].label, ChangeLabel::Modified);
        assert_eq!(pending[1].label, ChangeLabel::New);
    }

    #[test]
    fn no_pending_strings_yield_empty_view() {
        assert!(pending_changes(&[item(1, "1", None)]).is_empty());
    }

    #[rstest]
    #[case("42", 7, 42)]
    #[case("  12", 7, 12)]
    #[case("15abc", 7, 15)]
    #[case("-3", 7, -3)]
    #[case("welcome_message", 7, 7)]
    #[case("0", 7, 7)]
    #[case("", 7, 7)]
    fn string_number_parses_leading_integers(
        #[case] key: &str,
        #[case] fallback: i64,
        #[case] expected: i64,
    ) {
        assert_eq!(string_number(key, fallback), expected);
    }

    #[test]
    fn notification_fallback_uses_position_within_pending_subset() {
        let strings = [
            item(1, "alpha", None),
            item(2, "beta", Some(StringStatus::New)),
            item(3, "gamma", Some(StringStatus::Modified)),
        ];
        let published_at = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .expect("valid date");
        let notes = notifications(&strings, published_at);
        let numbers: Vec<i64> = notes.iter().map(|n| n.string_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(notes[0].id, format!("2-{}-0", published_at.timestamp_millis()));
        assert_eq!(notes[1].modified_at, published_at);
    }

    #[test]
    fn numeric_keys_win_over_position() {
        let strings = [item(5, "42", Some(StringStatus::New))];
        let notes = notifications(&strings, Utc::now());
        assert_eq!(notes[0].string_number, 42);
        assert_eq!(notes[0].status, ChangeLabel::New);
    }
}
