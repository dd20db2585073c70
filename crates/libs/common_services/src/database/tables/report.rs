use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Adds `ALL`, `as_str`, `Display` and `FromStr` for enums stored by their display label.
macro_rules! labelled_enum {
    ($name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| format!("'{s}' is not a valid {}", stringify!($name)))
            }
        }
    };
}

/// Maps to the `report_category` Postgres enum.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    sqlx::Type,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    ToSchema,
)]
#[sqlx(type_name = "report_category")]
pub enum ReportCategory {
    #[serde(rename = "Illegal Dumping")]
    #[sqlx(rename = "Illegal Dumping")]
    IllegalDumping,
    #[serde(rename = "Overflowing Bin")]
    #[sqlx(rename = "Overflowing Bin")]
    OverflowingBin,
    Litter,
    #[serde(rename = "Hazardous Waste")]
    #[sqlx(rename = "Hazardous Waste")]
    HazardousWaste,
    #[serde(rename = "Recycling Issue")]
    #[sqlx(rename = "Recycling Issue")]
    RecyclingIssue,
    #[default]
    Other,
}

labelled_enum!(ReportCategory {
    IllegalDumping => "Illegal Dumping",
    OverflowingBin => "Overflowing Bin",
    Litter => "Litter",
    HazardousWaste => "Hazardous Waste",
    RecyclingIssue => "Recycling Issue",
    Other => "Other",
});

/// Maps to the `report_status` Postgres enum.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    sqlx::Type,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    ToSchema,
)]
#[sqlx(type_name = "report_status")]
pub enum ReportStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    Cleaned,
    Rejected,
}

labelled_enum!(ReportStatus {
    Pending => "Pending",
    InProgress => "In Progress",
    Cleaned => "Cleaned",
    Rejected => "Rejected",
});

/// Maps to the `report_priority` Postgres enum.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    Serialize,
    Deserialize,
    sqlx::Type,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    ToSchema,
)]
#[sqlx(type_name = "report_priority")]
pub enum ReportPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

labelled_enum!(ReportPriority {
    Low => "Low",
    Medium => "Medium",
    High => "High",
    Critical => "Critical",
});

/// A WGS84 position. Construct through [`Coordinates::new`] to keep it in range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Returns `None` unless both values are finite and inside [-90, 90] / [-180, 180].
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lng_ok = lng.is_finite() && (-180.0..=180.0).contains(&lng);
        (lat_ok && lng_ok).then_some(Self { lat, lng })
    }
}

/// A single row of the `report` table.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct Report {
    pub id: String,
    pub user_id: i32,
    pub description: String,
    pub category: ReportCategory,
    /// File name of the image inside the upload folder.
    pub image: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub status: ReportStatus,
    pub priority: ReportPriority,
    pub admin_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolved_by: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Report {
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }
}

/// A report row together with its great-circle distance from a search center.
#[derive(Debug, Clone, FromRow)]
pub struct ReportWithDistance {
    #[sqlx(flatten)]
    pub report: Report,
    pub distance: f64,
}
