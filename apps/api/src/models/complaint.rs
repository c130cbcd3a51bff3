use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Closed set of complaint categories. AI output is coerced against this
/// enumeration; anything unrecognized falls back to the citizen's own choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintCategory {
    #[serde(rename = "Road & Infrastructure")]
    RoadInfrastructure,
    #[serde(rename = "Water Supply")]
    WaterSupply,
    #[serde(rename = "Sanitation")]
    Sanitation,
    #[serde(rename = "Electricity")]
    Electricity,
    #[serde(rename = "Public Safety")]
    PublicSafety,
    #[serde(rename = "Parks & Green Spaces")]
    ParksGreenSpaces,
    #[serde(rename = "Noise Pollution")]
    NoisePollution,
    #[serde(rename = "Other")]
    Other,
}

impl ComplaintCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoadInfrastructure => "Road & Infrastructure",
            Self::WaterSupply => "Water Supply",
            Self::Sanitation => "Sanitation",
            Self::Electricity => "Electricity",
            Self::PublicSafety => "Public Safety",
            Self::ParksGreenSpaces => "Parks & Green Spaces",
            Self::NoisePollution => "Noise Pollution",
            Self::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Road & Infrastructure" => Some(Self::RoadInfrastructure),
            "Water Supply" => Some(Self::WaterSupply),
            "Sanitation" => Some(Self::Sanitation),
            "Electricity" => Some(Self::Electricity),
            "Public Safety" => Some(Self::PublicSafety),
            "Parks & Green Spaces" => Some(Self::ParksGreenSpaces),
            "Noise Pollution" => Some(Self::NoisePollution),
            "Other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }
}

/// Status transitions are forward-only: pending → in_progress → resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
}

impl ComplaintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ComplaintRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub severity: String,
    pub priority_score: f64,
    pub location: String,
    pub status: String,
    pub image_url: Option<String>,
    pub ai_summary: Option<String>,
    pub keywords: Vec<String>,
    pub is_duplicate: bool,
    pub duplicate_of: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A complaint row joined with its derived vote count. The count is never
/// stored on the complaint itself — it is always computed from `votes`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ComplaintWithVotes {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub complaint: ComplaintRow,
    pub vote_count: i64,
}

/// A stored embedding, written once at submission time. The vector itself is
/// kept as a JSON-encoded float array in a text column.
#[derive(Debug, Clone, FromRow)]
pub struct VectorRow {
    pub complaint_id: Uuid,
    pub embedding: String,
}
