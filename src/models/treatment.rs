use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::TreatmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub id: Uuid,
    pub planning_id: Uuid,
    pub start_date: NaiveDate,
    pub deadline: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub last_appointment: Option<NaiveDate>,
    pub status: TreatmentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
