//! Counting journals and their lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocktake_core::{DomainError, DomainResult, InventTransId, ItemId, JournalId};

/// Journal header as read from the ERP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountingJournal {
    pub journal_id: JournalId,
    pub journal_name_id: String,
    pub description: String,
    pub invent_site_id: String,
    pub invent_location_id: String,
    pub wms_location_id: String,
    pub num_of_lines: u32,
    pub posted: bool,
    pub posted_user_id: String,
    pub created_by: String,
    pub created_date_time: DateTime<Utc>,
    pub modified_by: String,
    pub modified_date_time: DateTime<Utc>,
    /// User holding the edit lock, empty when unlocked.
    pub block_user_id: String,
    /// ERP session holding the edit lock; empty or `"0"` when unlocked.
    pub journal_session_id: String,
}

impl CountingJournal {
    pub fn is_locked(&self) -> bool {
        let session = self.journal_session_id.trim();
        !(session.is_empty() || session == "0")
    }
}

/// Journal line (an inventory transaction being counted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalLine {
    pub invent_trans_id: InventTransId,
    pub journal_id: JournalId,
    pub item_id: ItemId,
    pub item_name: String,
    pub trans_date: DateTime<Utc>,
    pub invent_site_id: String,
    pub invent_location_id: String,
    pub wms_location_id: String,
    pub invent_batch_id: String,
    pub invent_on_hand: f64,
    pub counted: f64,
    /// Adjustment the journal will post (`counted - invent_on_hand`).
    pub qty: f64,
    pub unit_id: String,
    pub created_by: String,
    pub created_date_time: DateTime<Utc>,
    pub modified_by: String,
    /// Set once the line has been counted.
    pub modified_date_time: Option<DateTime<Utc>>,
}

impl JournalLine {
    pub fn is_counted(&self) -> bool {
        self.modified_date_time.is_some()
    }

    pub fn variance(&self) -> f64 {
        self.counted - self.invent_on_hand
    }

    /// Dimensions identifying the stock this line counts.
    pub fn dimensions(&self) -> LineDimensions {
        LineDimensions {
            item_id: self.item_id.as_str().to_string(),
            invent_site_id: self.invent_site_id.clone(),
            invent_location_id: self.invent_location_id.clone(),
            wms_location_id: self.wms_location_id.clone(),
            invent_batch_id: self.invent_batch_id.clone(),
        }
    }
}

/// Body of `POST /api/CountingJournals`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCountingJournal {
    pub invent_site_id: String,
    pub invent_location_id: String,
    pub wms_location_id: String,
    pub description: String,
}

impl CreateCountingJournal {
    pub fn validate(&self) -> DomainResult<()> {
        require("inventSiteId", &self.invent_site_id)?;
        require("inventLocationId", &self.invent_location_id)
    }
}

/// Body of `POST /api/CountingJournals/:journalId/lines`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateJournalLine {
    pub journal_id: String,
    pub item_id: String,
    pub invent_site_id: String,
    pub invent_location_id: String,
    pub wms_location_id: String,
    pub invent_batch_id: String,
    pub counted: f64,
    pub qty: f64,
    pub trans_date: Option<DateTime<Utc>>,
}

impl CreateJournalLine {
    pub fn validate(&self) -> DomainResult<()> {
        require("journalId", &self.journal_id)?;
        require("itemId", &self.item_id)?;
        require("inventLocationId", &self.invent_location_id)?;
        non_negative("counted", self.counted)
    }
}

/// Body of `PUT /api/CountingJournals/:journalId/lines/:inventTransId`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateJournalLine {
    pub invent_trans_id: String,
    pub counted: f64,
}

impl UpdateJournalLine {
    pub fn validate(&self) -> DomainResult<()> {
        require("inventTransId", &self.invent_trans_id)?;
        non_negative("counted", self.counted)
    }
}

/// Optional filters of the line list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineFilter {
    pub item_id: Option<String>,
    pub invent_batch_id: Option<String>,
}

impl LineFilter {
    pub fn matches(&self, line: &JournalLine) -> bool {
        self.item_id
            .as_deref()
            .is_none_or(|item| line.item_id.matches(item))
            && self
                .invent_batch_id
                .as_deref()
                .is_none_or(|batch| line.invent_batch_id.eq_ignore_ascii_case(batch))
    }
}

/// Stock dimensions used to look a line up by batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineDimensions {
    pub item_id: String,
    pub invent_site_id: String,
    pub invent_location_id: String,
    pub wms_location_id: String,
    pub invent_batch_id: String,
}

impl LineDimensions {
    pub fn matches(&self, other: &LineDimensions) -> bool {
        [
            (&self.item_id, &other.item_id),
            (&self.invent_site_id, &other.invent_site_id),
            (&self.invent_location_id, &other.invent_location_id),
            (&self.wms_location_id, &other.wms_location_id),
            (&self.invent_batch_id, &other.invent_batch_id),
        ]
        .iter()
        .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

/// Progress of a counting journal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalSummary {
    pub total_lines: u32,
    pub counted_lines: u32,
    pub pending_lines: u32,
    /// Counted lines whose count differs from on-hand.
    pub variance_lines: u32,
    /// Net variance quantity over counted lines.
    pub variance_qty: f64,
    /// Absolute variance quantity over counted lines.
    pub variance_amount: f64,
}

impl JournalSummary {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a JournalLine>) -> Self {
        let mut summary = JournalSummary::default();
        for line in lines {
            summary.total_lines += 1;
            if !line.is_counted() {
                summary.pending_lines += 1;
                continue;
            }
            summary.counted_lines += 1;
            let variance = line.variance();
            if variance != 0.0 {
                summary.variance_lines += 1;
            }
            summary.variance_qty += variance;
            summary.variance_amount += variance.abs();
        }
        summary
    }
}

fn require(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> DomainResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(DomainError::validation(format!("{field} must be a non-negative number")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;

    fn line(on_hand: f64, counted: Option<f64>) -> JournalLine {
        JournalLine {
            invent_trans_id: InventTransId::new("T1").unwrap(),
            journal_id: JournalId::new("J100").unwrap(),
            item_id: ItemId::new("ITEM-1").unwrap(),
            item_name: "Widget".into(),
            trans_date: DateTime::<Utc>::UNIX_EPOCH,
            invent_site_id: "S1".into(),
            invent_location_id: "WH001".into(),
            wms_location_id: "A-01".into(),
            invent_batch_id: "B1".into(),
            invent_on_hand: on_hand,
            counted: counted.unwrap_or_default(),
            qty: counted.map(|c| c - on_hand).unwrap_or_default(),
            unit_id: "pcs".into(),
            created_by: "axservices".into(),
            created_date_time: DateTime::<Utc>::UNIX_EPOCH,
            modified_by: String::new(),
            modified_date_time: counted.map(|_| DateTime::<Utc>::UNIX_EPOCH),
        }
    }

    #[test]
    fn create_line_reads_camel_case_and_tolerates_missing_fields() {
        let body: CreateJournalLine = serde_json::from_value(json!({
            "journalId": "J100",
            "itemId": "ITEM-1",
            "inventLocationId": "WH001",
            "wmsLocationId": "A-01",
            "counted": 4
        }))
        .unwrap();
        assert_eq!(body.wms_location_id, "A-01");
        assert_eq!(body.trans_date, None);
        assert!(body.validate().is_ok());
    }

    #[test]
    fn validation_rejects_missing_keys_and_negative_counts() {
        let body = CreateJournalLine {
            journal_id: "J100".into(),
            item_id: " ".into(),
            ..Default::default()
        };
        assert_eq!(
            body.validate(),
            Err(DomainError::validation("itemId is required"))
        );

        let update = UpdateJournalLine {
            invent_trans_id: "T1".into(),
            counted: -1.0,
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn filter_matches_item_and_batch_case_insensitively() {
        let l = line(5.0, None);
        assert!(LineFilter::default().matches(&l));
        assert!(LineFilter { item_id: Some("item-1".into()), invent_batch_id: Some("b1".into()) }.matches(&l));
        assert!(!LineFilter { item_id: Some("ITEM-2".into()), invent_batch_id: None }.matches(&l));
    }

    #[test]
    fn summary_counts_variance_only_on_counted_lines() {
        let lines = [line(5.0, None), line(5.0, Some(5.0)), line(5.0, Some(3.0)), line(2.0, Some(4.0))];
        let summary = JournalSummary::from_lines(&lines);
        assert_eq!(summary.total_lines, 4);
        assert_eq!(summary.counted_lines, 3);
        assert_eq!(summary.pending_lines, 1);
        assert_eq!(summary.variance_lines, 2);
        assert_eq!(summary.variance_qty, 0.0);
        assert_eq!(summary.variance_amount, 4.0);
    }

    proptest! {
        #[test]
        fn summary_partitions_lines(counts in proptest::collection::vec(proptest::option::of(0u16..100), 0..40)) {
            let lines: Vec<_> = counts.iter().map(|c| line(10.0, c.map(f64::from))).collect();
            let summary = JournalSummary::from_lines(&lines);
            prop_assert_eq!(summary.total_lines as usize, lines.len());
            prop_assert_eq!(summary.counted_lines + summary.pending_lines, summary.total_lines);
            prop_assert!(summary.variance_lines <= summary.counted_lines);
            prop_assert!(summary.variance_amount >= summary.variance_qty.abs());
        }
    }
}
