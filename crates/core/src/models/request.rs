//! Material replenishment requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::Quantity;
use crate::types::{MaterialCode, Priority, RequestNo, RequestStatus};
use crate::validation::{Validate, ValidationError, bounded_text};

/// A request for a material, reviewed by an Admin or Manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialRequest {
    #[serde(rename = "talep_no")]
    pub number: RequestNo,
    #[serde(rename = "tarih")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "malzeme_kodu")]
    pub material_code: MaterialCode,
    #[serde(rename = "malzeme_adi", default)]
    pub material_name: String,
    #[serde(rename = "miktar")]
    pub quantity: Quantity,
    #[serde(rename = "oncelik")]
    pub priority: Priority,
    #[serde(rename = "aciklama", default)]
    pub note: String,
    #[serde(rename = "talep_eden")]
    pub requester: String,
    #[serde(rename = "departman")]
    pub department: String,
    #[serde(rename = "durum")]
    pub status: RequestStatus,
    #[serde(rename = "onaylayan", default)]
    pub reviewed_by: String,
    #[serde(rename = "onay_tarihi", default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(rename = "red_nedeni", default)]
    pub rejection_reason: String,
}

impl Validate for MaterialRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.status == RequestStatus::Rejected && self.rejection_reason.trim().is_empty() {
            return Err(ValidationError::Required { field: "red_nedeni" });
        }
        if self.status.is_terminal() && self.reviewed_at.is_none() {
            return Err(ValidationError::Required {
                field: "onay_tarihi",
            });
        }
        Ok(())
    }
}

/// Body of `POST /requests`.
///
/// A blank requester is filled in with the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaterialRequest {
    #[serde(rename = "malzeme_kodu")]
    pub material_code: MaterialCode,
    #[serde(rename = "malzeme_adi", default)]
    pub material_name: String,
    #[serde(rename = "miktar")]
    pub quantity: Quantity,
    #[serde(rename = "oncelik", default)]
    pub priority: Priority,
    #[serde(rename = "aciklama", default)]
    pub note: String,
    #[serde(rename = "talep_eden", default)]
    pub requester: String,
    #[serde(rename = "departman", default)]
    pub department: String,
}

impl Validate for NewMaterialRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        bounded_text("malzeme_adi", &self.material_name)?;
        bounded_text("aciklama", &self.note)?;
        bounded_text("talep_eden", &self.requester)?;
        bounded_text("departman", &self.department)
    }
}

/// Query parameters of `GET /requests`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFilter {
    #[serde(rename = "durum", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RequestStatus>,
    #[serde(rename = "departman", default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// Query parameters of the approve and reject endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewQuery {
    #[serde(rename = "onaylayan", default)]
    pub reviewer: String,
    #[serde(rename = "red_nedeni", default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_defaults_to_normal_priority() {
        let json = r#"{"malzeme_kodu":"MLZ002","miktar":3,"talep_eden":"Ayşe","departman":"IK"}"#;
        let request: NewMaterialRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.priority, Priority::Normal);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_rejected_request_needs_reason() {
        let json = r#"{
            "talep_no":"TLP000004","tarih":"2026-03-02T09:00:00Z","malzeme_kodu":"MLZ002",
            "miktar":3,"oncelik":"Acil","talep_eden":"Ayşe","departman":"IK",
            "durum":"Reddedildi","onay_tarihi":"2026-03-03T09:00:00Z"
        }"#;
        let request: MaterialRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.validate().unwrap_err().field(), "red_nedeni");
    }

    #[test]
    fn test_review_query_omits_empty_reason() {
        let query = ReviewQuery {
            reviewer: "Mehmet".to_owned(),
            reason: String::new(),
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["onaylayan"], "Mehmet");
        assert!(value.get("red_nedeni").is_none());
    }
}
