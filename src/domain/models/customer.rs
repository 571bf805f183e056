use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: Option<String>,
    pub phone: String,
    pub marketing_opt_in: bool,
}

impl Customer {
    /// First whitespace-separated token of the display name, if any.
    pub fn first_name(&self) -> Option<&str> {
        self.name.as_deref().and_then(|name| name.split_whitespace().next())
    }

    pub fn has_destination(&self) -> bool {
        !self.phone.trim().is_empty()
    }
}

/// A customer together with the checkout time of their most recent
/// completed visit. Input to the winback campaign sweep.
#[derive(Debug, Clone)]
pub struct CustomerLastVisit {
    pub customer: Customer,
    pub last_checkout: DateTime<Utc>,
}
