use crate::api::reports::error::ReportError;
use crate::database::report::{Report, ReportCategory, ReportStatus};
use app_state::ReportConstants;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, Default, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum ReportSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Status,
    Priority,
    Category,
}

impl ReportSortField {
    /// Column name in the `report` table.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Status => "status",
            Self::Priority => "priority",
            Self::Category => "category",
        }
    }
}

impl FromStr for ReportSortField {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "updatedAt" => Ok(Self::UpdatedAt),
            "status" => Ok(Self::Status),
            "priority" => Ok(Self::Priority),
            "category" => Ok(Self::Category),
            other => Err(ReportError::Validation(format!(
                "Cannot sort reports by '{other}'"
            ))),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, Default, ToSchema, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Raw query string of `GET /reports`. Empty values count as absent.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ListReportsParams {
    /// Only reports with this status.
    pub status: Option<String>,
    /// Only reports in this category.
    pub category: Option<String>,
    /// 1-based page number, defaults to 1.
    pub page: Option<String>,
    /// Page size, defaults to 10.
    pub limit: Option<String>,
    /// `createdAt` (default), `updatedAt`, `status`, `priority` or `category`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

/// A validated, scope-restricted listing request handed to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportListQuery {
    /// Set for non-admin callers, restricts the listing to their own reports.
    pub owner_id: Option<i32>,
    pub status: Option<ReportStatus>,
    pub category: Option<ReportCategory>,
    pub sort_field: ReportSortField,
    pub sort_direction: SortDirection,
    pub page: u32,
    pub limit: u32,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_positive(value: Option<&String>, name: &str, default: u32) -> Result<u32, ReportError> {
    let Some(raw) = non_empty(value) else {
        return Ok(default);
    };
    match raw.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ReportError::Validation(format!(
            "{name} must be a positive integer"
        ))),
    }
}

impl ReportListQuery {
    pub fn from_params(
        params: &ListReportsParams,
        owner_id: Option<i32>,
        constants: &ReportConstants,
    ) -> Result<Self, ReportError> {
        let status = non_empty(params.status.as_ref())
            .map(ReportStatus::from_str)
            .transpose()
            .map_err(ReportError::Validation)?;
        let category = non_empty(params.category.as_ref())
            .map(ReportCategory::from_str)
            .transpose()
            .map_err(ReportError::Validation)?;
        let page = parse_positive(params.page.as_ref(), "page", 1)?;
        let limit = parse_positive(params.limit.as_ref(), "limit", constants.default_page_size)?
            .min(constants.max_page_size);
        let sort_field = non_empty(params.sort_by.as_ref())
            .map(ReportSortField::from_str)
            .transpose()?
            .unwrap_or_default();
        let sort_direction = match non_empty(params.sort_order.as_ref()) {
            None | Some("desc") => SortDirection::Desc,
            Some("asc") => SortDirection::Asc,
            Some(other) => {
                return Err(ReportError::Validation(format!(
                    "sortOrder must be 'asc' or 'desc', got '{other}'"
                )));
            }
        };

        Ok(Self {
            owner_id,
            status,
            category,
            sort_field,
            sort_direction,
            page,
            limit,
        })
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.limit)
    }

    /// Whether `report` passes the owner, status and category filters.
    #[must_use]
    pub fn matches(&self, report: &Report) -> bool {
        self.owner_id.is_none_or(|owner| report.user_id == owner)
            && self.status.is_none_or(|status| report.status == status)
            && self.category.is_none_or(|category| report.category == category)
    }
}

/// One page of a listing plus the unpaginated match count.
#[derive(Debug, Clone)]
pub struct ReportPage {
    pub reports: Vec<Report>,
    pub total: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit_i64 = i64::from(limit.max(1));
        Self {
            page,
            limit,
            total,
            pages: (total + limit_i64 - 1) / limit_i64,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, FromRow, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusOverview {
    pub total: i64,
    pub pending: i64,
    pub in_progress: i64,
    pub cleaned: i64,
    pub rejected: i64,
}

impl StatusOverview {
    pub fn record(&mut self, status: ReportStatus) {
        self.total += 1;
        match status {
            ReportStatus::Pending => self.pending += 1,
            ReportStatus::InProgress => self.in_progress += 1,
            ReportStatus::Cleaned => self.cleaned += 1,
            ReportStatus::Rejected => self.rejected += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, FromRow, ToSchema, PartialEq, Eq)]
pub struct CategoryCount {
    #[serde(rename = "_id")]
    pub category: ReportCategory,
    pub count: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub overview: StatusOverview,
    /// Sorted by count, highest first.
    pub by_category: Vec<CategoryCount>,
}
