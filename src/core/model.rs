use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ItemId = String;
pub type CategoryName = String;

/// Inventory item as supplied by the inventory source. Read-only input;
/// nothing in the alert subsystem writes back to inventory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub category: CategoryName,
    pub expiration_date: Option<DateTime<Utc>>,
}
