//! Locally stored complaint-desk records: complaints, feedback, activity logs
//! and the user's profile. Each list is an independent JSON array under its
//! own key; records are keyed by a millisecond-timestamp id.

use chrono::{DateTime, Datelike, Months, NaiveDate, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use super::local_store::{keys, read_json, read_json_list, write_json, LocalStore, LocalStoreError};
use crate::identity::Clock;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Storage(#[from] LocalStoreError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    #[default]
    Pending,
    Resolved,
}

impl ComplaintStatus {
    pub fn toggled(self) -> Self {
        match self {
            ComplaintStatus::Pending => ComplaintStatus::Resolved,
            ComplaintStatus::Resolved => ComplaintStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Complaint {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub address: String,
    pub category: String,
    pub priority: String,
    pub subject: String,
    pub description: String,
    pub attachments: Vec<String>,
    pub status: ComplaintStatus,
    pub date_filed: String,
    pub timestamp: String,
}

/// Form input for a new complaint.
#[derive(Debug, Clone, Default)]
pub struct NewComplaint {
    pub name: String,
    pub email: String,
    pub contact: String,
    pub address: String,
    pub category: String,
    pub priority: Option<String>,
    pub subject: Option<String>,
    pub description: String,
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Feedback {
    pub rating: u8,
    pub feedback: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityLog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: String,
    pub address: String,
    pub profile_picture: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub pending: usize,
    pub resolved: usize,
    /// Mean rating scaled to percent (rating × 20), one decimal place.
    pub satisfaction_rate: f64,
}

/// Complaints filed in one calendar month, for the dashboard trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTally {
    /// Short month name, e.g. `Apr`.
    pub label: String,
    pub year: i32,
    pub month: u32,
    pub new: usize,
    pub resolved: usize,
}

/// How many entries each dashboard feed shows.
pub const RECENT_LIMIT: usize = 5;

/// Months covered by [`Records::monthly_trend`].
pub const TREND_MONTHS: u32 = 6;

pub struct Records {
    store: Arc<dyn LocalStore>,
    clock: Arc<dyn Clock>,
}

fn rfc3339(t: DateTime<Utc>) -> String { t.to_rfc3339_opts(SecondsFormat::Millis, true) }

fn latest<T>(mut items: Vec<T>, n: usize) -> Vec<T> {
    let keep = items.len().saturating_sub(n);
    items.drain(..keep);
    items.reverse();
    items
}

/// Filing month of a complaint: `dateFiled` (`m/d/yyyy`), else the RFC 3339 timestamp.
fn filed_on(c: &Complaint) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(c.date_filed.trim(), "%m/%d/%Y")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(&c.timestamp).ok().map(|t| t.date_naive()))
}

fn required(field: &str, value: &str) -> Result<(), RecordError> {
    if value.trim().is_empty() {
        return Err(RecordError::Invalid(format!("{} is required", field)));
    }
    Ok(())
}

impl Records {
    pub fn new(store: Arc<dyn LocalStore>, clock: Arc<dyn Clock>) -> Self { Self { store, clock } }

    pub fn complaints(&self) -> Vec<Complaint> {
        read_json_list(self.store.as_ref(), keys::COMPLAINTS)
    }

    pub fn complaint(&self, id: i64) -> Option<Complaint> {
        self.complaints().into_iter().find(|c| c.id == id)
    }

    pub fn activity_logs(&self) -> Vec<ActivityLog> {
        read_json_list(self.store.as_ref(), keys::ACTIVITY_LOGS)
    }

    pub fn feedback(&self) -> Vec<Feedback> {
        read_json_list(self.store.as_ref(), keys::USER_FEEDBACK)
    }

    /// Newest first, at most [`RECENT_LIMIT`].
    pub fn recent_complaints(&self) -> Vec<Complaint> { latest(self.complaints(), RECENT_LIMIT) }

    pub fn recent_activity(&self) -> Vec<ActivityLog> { latest(self.activity_logs(), RECENT_LIMIT) }

    pub fn recent_feedback(&self) -> Vec<Feedback> { latest(self.feedback(), RECENT_LIMIT) }

    /// Raw stored list for a rewrite. Entries this build cannot decode are kept
    /// as-is; a value that is not a list at all is refused rather than replaced.
    fn stored_list(&self, key: &str) -> Result<Vec<Value>, RecordError> {
        let Some(raw) = self.store.get_item(key) else { return Ok(Vec::new()) };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(Value::Null) => Ok(Vec::new()),
            _ => Err(RecordError::Invalid(format!("stored {} is unreadable; not overwriting it", key))),
        }
    }

    fn push_record<T: Serialize>(&self, key: &str, record: &T) -> Result<(), RecordError> {
        let mut items = self.stored_list(key)?;
        items.push(serde_json::to_value(record).map_err(LocalStoreError::from)?);
        write_json(self.store.as_ref(), key, &items)?;
        Ok(())
    }

    pub fn profile(&self) -> Option<UserProfile> {
        read_json(self.store.as_ref(), keys::USER_DATA)
    }

    fn append_log(&self, mut log: ActivityLog) -> Result<(), RecordError> {
        log.timestamp = rfc3339(self.clock.now());
        self.push_record(keys::ACTIVITY_LOGS, &log)
    }

    /// Validate and file a complaint, then log it.
    pub fn add_complaint(&self, input: NewComplaint) -> Result<Complaint, RecordError> {
        required("name", &input.name)?;
        required("email", &input.email)?;
        required("contact", &input.contact)?;
        required("address", &input.address)?;
        required("category", &input.category)?;
        required("description", &input.description)?;
        if !EMAIL_RE.is_match(input.email.trim()) {
            return Err(RecordError::Invalid("email is not a valid address".into()));
        }

        let now = self.clock.now();
        // Two filings in the same millisecond must not share an id.
        let last = self.complaints().iter().map(|c| c.id).max().unwrap_or(i64::MIN);
        let id = now.timestamp_millis().max(last.saturating_add(1));
        let complaint = Complaint {
            id,
            name: input.name,
            email: input.email,
            contact: input.contact,
            address: input.address,
            category: input.category,
            priority: input.priority.filter(|p| !p.trim().is_empty()).unwrap_or_else(|| "medium".to_string()),
            subject: input.subject.unwrap_or_default(),
            description: input.description,
            attachments: input.attachments,
            status: ComplaintStatus::Pending,
            date_filed: now.format("%-m/%-d/%Y").to_string(),
            timestamp: rfc3339(now),
        };
        self.push_record(keys::COMPLAINTS, &complaint)?;
        self.append_log(ActivityLog {
            action: Some("New Complaint Filed".into()),
            details: Some(format!("Complaint #{} filed under {} category", complaint.id, complaint.category)),
            ..Default::default()
        })?;
        debug!(id = complaint.id, "complaint filed");
        Ok(complaint)
    }

    /// Flip pending/resolved. Returns the new status, or `None` for an unknown id.
    pub fn toggle_status(&self, id: i64) -> Result<Option<ComplaintStatus>, RecordError> {
        let mut items = self.stored_list(keys::COMPLAINTS)?;
        let found = items.iter_mut().find_map(|v| {
            let c: Complaint = serde_json::from_value(v.clone()).ok()?;
            (c.id == id).then_some((v, c.status))
        });
        let Some((entry, current)) = found else { return Ok(None) };
        let status = current.toggled();
        if let Some(obj) = entry.as_object_mut() {
            obj.insert("status".into(), Value::String(status.as_str().into()));
        }
        write_json(self.store.as_ref(), keys::COMPLAINTS, &items)?;
        let resolved = status == ComplaintStatus::Resolved;
        self.append_log(ActivityLog {
            message: Some(format!("Complaint #{} status updated to {}", id, status.as_str())),
            kind: Some(if resolved { "success" } else { "warning" }.into()),
            icon: Some(if resolved { "fa-check-circle" } else { "fa-clock" }.into()),
            ..Default::default()
        })?;
        Ok(Some(status))
    }

    pub fn add_feedback(&self, rating: u8, text: &str) -> Result<Feedback, RecordError> {
        if !(1..=5).contains(&rating) {
            return Err(RecordError::Invalid("rating must be between 1 and 5".into()));
        }
        let fb = Feedback { rating, feedback: text.to_string(), timestamp: rfc3339(self.clock.now()) };
        self.push_record(keys::USER_FEEDBACK, &fb)?;
        Ok(fb)
    }

    pub fn save_profile(&self, mut profile: UserProfile) -> Result<UserProfile, RecordError> {
        required("name", &profile.name)?;
        required("email", &profile.email)?;
        profile.created_at = rfc3339(self.clock.now());
        write_json(self.store.as_ref(), keys::USER_DATA, &profile)?;
        Ok(profile)
    }

    pub fn stats(&self) -> DashboardStats {
        let complaints = self.complaints();
        let pending = complaints.iter().filter(|c| c.status == ComplaintStatus::Pending).count();
        let resolved = complaints.iter().filter(|c| c.status == ComplaintStatus::Resolved).count();
        let feedback = self.feedback();
        let satisfaction_rate = if feedback.is_empty() {
            0.0
        } else {
            let sum: u32 = feedback.iter().map(|f| f.rating as u32).sum();
            let pct = sum as f64 / feedback.len() as f64 * 20.0;
            (pct * 10.0).round() / 10.0
        };
        DashboardStats { total: complaints.len(), pending, resolved, satisfaction_rate }
    }

    /// Complaint count per category, in order of first appearance.
    pub fn category_breakdown(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for c in self.complaints() {
            match counts.iter_mut().find(|(cat, _)| *cat == c.category) {
                Some((_, n)) => *n += 1,
                None => counts.push((c.category, 1)),
            }
        }
        counts
    }

    /// New and resolved complaints for each of the last [`TREND_MONTHS`] months,
    /// oldest first and ending with the current month.
    pub fn monthly_trend(&self) -> Vec<MonthTally> {
        let today = self.clock.now().date_naive();
        let Some(this_month) = today.with_day(1) else { return Vec::new() };
        let complaints: Vec<(NaiveDate, ComplaintStatus)> =
            self.complaints().iter().filter_map(|c| Some((filed_on(c)?, c.status))).collect();
        (0..TREND_MONTHS)
            .rev()
            .filter_map(|back| this_month.checked_sub_months(Months::new(back)))
            .map(|start| {
                let in_month: Vec<ComplaintStatus> = complaints
                    .iter()
                    .filter(|(d, _)| d.year() == start.year() && d.month() == start.month())
                    .map(|(_, s)| *s)
                    .collect();
                MonthTally {
                    label: start.format("%b").to_string(),
                    year: start.year(),
                    month: start.month(),
                    new: in_month.len(),
                    resolved: in_month.iter().filter(|s| **s == ComplaintStatus::Resolved).count(),
                }
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod tests;
