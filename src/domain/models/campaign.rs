use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinbackCampaign {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
    pub message_template: String,
    pub min_days_since_last_visit: u32,
    pub max_days_since_last_visit: u32,
}
