use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Household,
    Collector,
    Municipality,
    Recycler,
    Admin,
}

/// The logged-in identity. Only read here, as the source of collector and
/// recycler ids.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub name: String,
    pub login_time: DateTime<Utc>,
}
