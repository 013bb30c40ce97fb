//! Audit log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AuditAction, AuditEntryId, AuditModule};

/// Default number of entries returned by `GET /audit-logs`.
pub const DEFAULT_AUDIT_LIMIT: i64 = 100;

/// Upper bound on `limit`.
pub const MAX_AUDIT_LIMIT: i64 = 1000;

const fn default_limit() -> i64 {
    DEFAULT_AUDIT_LIMIT
}

/// A recorded change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditEntryId,
    #[serde(rename = "tarih")]
    pub recorded_at: DateTime<Utc>,
    #[serde(rename = "kullanici")]
    pub user: String,
    #[serde(rename = "islem")]
    pub action: AuditAction,
    #[serde(rename = "modul")]
    pub module: AuditModule,
    #[serde(rename = "kayit_id", default)]
    pub record_id: String,
    #[serde(rename = "eski_deger", default)]
    pub old_value: String,
    #[serde(rename = "yeni_deger", default)]
    pub new_value: String,
    #[serde(rename = "detay", default)]
    pub detail: String,
}

/// An entry about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub user: String,
    pub action: AuditAction,
    pub module: AuditModule,
    pub record_id: String,
    pub old_value: String,
    pub new_value: String,
    pub detail: String,
}

impl NewAuditEntry {
    #[must_use]
    pub fn new(
        user: impl Into<String>,
        action: AuditAction,
        module: AuditModule,
        record_id: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            action,
            module,
            record_id: record_id.into(),
            old_value: String::new(),
            new_value: String::new(),
            detail: String::new(),
        }
    }

    #[must_use]
    pub fn change(mut self, old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        self.old_value = old_value.into();
        self.new_value = new_value.into();
        self
    }

    #[must_use]
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// Query parameters of `GET /audit-logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFilter {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(rename = "modul", default, skip_serializing_if = "Option::is_none")]
    pub module: Option<AuditModule>,
    #[serde(rename = "kullanici", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Default for AuditFilter {
    fn default() -> Self {
        Self {
            limit: DEFAULT_AUDIT_LIMIT,
            module: None,
            user: None,
        }
    }
}

impl AuditFilter {
    /// The limit clamped to `1..=MAX_AUDIT_LIMIT`.
    #[must_use]
    pub fn effective_limit(&self) -> i64 {
        self.limit.clamp(1, MAX_AUDIT_LIMIT)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults() {
        let filter: AuditFilter = serde_json::from_str("{}").unwrap();
        assert_eq!(filter, AuditFilter::default());
        assert_eq!(filter.effective_limit(), 100);
    }

    #[test]
    fn test_limit_is_clamped() {
        let filter = AuditFilter {
            limit: 0,
            ..AuditFilter::default()
        };
        assert_eq!(filter.effective_limit(), 1);
        let filter = AuditFilter {
            limit: 50_000,
            ..AuditFilter::default()
        };
        assert_eq!(filter.effective_limit(), MAX_AUDIT_LIMIT);
    }

    #[test]
    fn test_builder() {
        let entry = NewAuditEntry::new("admin", AuditAction::Update, AuditModule::Material, "MLZ001")
            .change("10", "12")
            .detail("min_seviye");
        assert_eq!(entry.old_value, "10");
        assert_eq!(entry.new_value, "12");
        assert_eq!(entry.detail, "min_seviye");
    }
}
