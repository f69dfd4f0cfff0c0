use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataItem {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Owning principal
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewDataItem {
    pub title: String,
    pub content: String,
    pub user_id: i64,
}

/// Partial update; `None` leaves the field unchanged
#[derive(Debug, Clone, Default)]
pub struct DataItemChanges {
    pub title: Option<String>,
    pub content: Option<String>,
}
