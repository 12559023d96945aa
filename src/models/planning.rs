use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::PlanningStatus;

/// A patient's treatment-plan record. Anchor entity for stage derivation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientPlanning {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub status: PlanningStatus,
    /// Intake form as submitted for the diagnosis request.
    pub intake: Option<serde_json::Value>,
    pub diagnosis: Option<String>,
    pub selected_option: Option<String>,
    /// Stored phased plan text (markdown-like sections).
    pub ai_response: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
