use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A historical event whose recorded magnitude damps or amplifies new impacts
/// classified under the same factor. Seeded once; read-only at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalPrecedent {
    pub event_type: String,
    pub event_name: String,
    pub date_occurred: NaiveDate,
    pub impact_magnitude: f64,
    pub description: String,
}
