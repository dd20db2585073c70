use crate::api_state::ApiContext;
use crate::reports::multipart::read_report_form;
use crate::routes::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::routes::response::ApiResponse;
use axum::Extension;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use common_services::api::reports::error::ReportError;
use common_services::api::reports::interfaces::{
    CreateReportMultipart, NearbyParams, NearbyReport, ReportResponse, UpdateReportRequest,
};
use common_services::api::reports::query::{ListReportsParams, ReportStats};
use common_services::database::app_user::User;
use tracing::instrument;

/// Submit a new report with a photo.
///
/// # Errors
///
/// Returns `ReportError` for invalid input, or when the image or record cannot be stored.
#[utoipa::path(
    post,
    path = "/reports",
    tag = "Reports",
    request_body(content = CreateReportMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Report created.", body = ReportResponse),
        (status = 400, description = "Missing description, coordinates or image, or invalid coordinates."),
        (status = 413, description = "Image too large."),
        (status = 500, description = "The report could not be stored, the upload was removed."),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context, user, multipart), fields(user_id = user.id), err(Debug))]
pub async fn create_report(
    State(context): State<ApiContext>,
    Extension(user): Extension<User>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, ApiResponse<ReportResponse>), ReportError> {
    let form = read_report_form(multipart, context.settings.storage.max_upload_bytes).await?;
    let report = context.reports.create_report(&user, form).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::data(report).with_message("Report created successfully"),
    ))
}

/// List reports. Admins see every report, other users only their own.
///
/// # Errors
///
/// Returns `ReportError` for invalid query parameters or if the database query fails.
#[utoipa::path(
    get,
    path = "/reports",
    tag = "Reports",
    params(ListReportsParams),
    responses(
        (status = 200, description = "A page of reports with pagination info.", body = Vec<ReportResponse>),
        (status = 400, description = "Invalid filter, paging or sort parameter."),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context, user), fields(user_id = user.id), err(Debug))]
pub async fn list_reports(
    State(context): State<ApiContext>,
    Extension(user): Extension<User>,
    ApiQuery(params): ApiQuery<ListReportsParams>,
) -> Result<ApiResponse<Vec<ReportResponse>>, ReportError> {
    let (reports, pagination) = context.reports.list_reports(&user, &params).await?;
    let count = reports.len();
    Ok(ApiResponse::data(reports)
        .with_pagination(pagination)
        .with_count(count))
}

/// Get a single report.
///
/// # Errors
///
/// Returns `ReportError::NotFound` or `ReportError::Forbidden` when the report is absent or
/// belongs to someone else.
#[utoipa::path(
    get,
    path = "/reports/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "Report id")),
    responses(
        (status = 200, description = "The report.", body = ReportResponse),
        (status = 403, description = "The report belongs to another user."),
        (status = 404, description = "Report not found."),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context, user), fields(user_id = user.id), err(Debug))]
pub async fn get_report(
    State(context): State<ApiContext>,
    Extension(user): Extension<User>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<ReportResponse>, ReportError> {
    let report = context.reports.get_report(&user, &id).await?;
    Ok(ApiResponse::data(report))
}

/// Change status, priority or admin notes of a report. Admin only.
///
/// # Errors
///
/// Returns `ReportError` when the report is absent, the caller is not an admin, or the
/// body is invalid.
#[utoipa::path(
    patch,
    path = "/reports/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "Report id")),
    request_body = UpdateReportRequest,
    responses(
        (status = 200, description = "The updated report.", body = ReportResponse),
        (status = 400, description = "Invalid status, priority or notes."),
        (status = 403, description = "Caller is not an admin."),
        (status = 404, description = "Report not found."),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context, user, payload), fields(user_id = user.id), err(Debug))]
pub async fn update_report(
    State(context): State<ApiContext>,
    Extension(user): Extension<User>,
    ApiPath(id): ApiPath<String>,
    ApiJson(payload): ApiJson<UpdateReportRequest>,
) -> Result<ApiResponse<ReportResponse>, ReportError> {
    let report = context.reports.update_report(&user, &id, payload).await?;
    Ok(ApiResponse::data(report).with_message("Report updated successfully"))
}

/// Delete a report and its image. Admin only.
///
/// # Errors
///
/// Returns `ReportError` when the report is absent or the caller is not an admin.
#[utoipa::path(
    delete,
    path = "/reports/{id}",
    tag = "Reports",
    params(("id" = String, Path, description = "Report id")),
    responses(
        (status = 200, description = "Report deleted."),
        (status = 403, description = "Caller is not an admin."),
        (status = 404, description = "Report not found."),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context, user), fields(user_id = user.id), err(Debug))]
pub async fn delete_report(
    State(context): State<ApiContext>,
    Extension(user): Extension<User>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<()>, ReportError> {
    context.reports.delete_report(&user, &id).await?;
    Ok(ApiResponse::message("Report deleted successfully"))
}

/// Reports around a point for the map view, nearest first.
///
/// # Errors
///
/// Returns `ReportError::Validation` when latitude or longitude are missing or malformed.
#[utoipa::path(
    get,
    path = "/reports/nearby",
    tag = "Reports",
    params(NearbyParams),
    responses(
        (status = 200, description = "Reports within the radius.", body = Vec<NearbyReport>),
        (status = 400, description = "Missing or malformed coordinates or radius."),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context), err(Debug))]
pub async fn nearby_reports(
    State(context): State<ApiContext>,
    ApiQuery(params): ApiQuery<NearbyParams>,
) -> Result<ApiResponse<Vec<NearbyReport>>, ReportError> {
    let reports = context.reports.nearby_reports(&params).await?;
    let count = reports.len();
    Ok(ApiResponse::data(reports).with_count(count))
}

/// Status and category counts. Scoped to the caller unless they are an admin.
///
/// # Errors
///
/// Returns `ReportError` if the database query fails.
#[utoipa::path(
    get,
    path = "/reports/stats",
    tag = "Reports",
    responses(
        (status = 200, description = "Aggregated counts.", body = ReportStats),
    ),
    security(("bearer_auth" = []))
)]
#[instrument(skip(context, user), fields(user_id = user.id), err(Debug))]
pub async fn report_stats(
    State(context): State<ApiContext>,
    Extension(user): Extension<User>,
) -> Result<ApiResponse<ReportStats>, ReportError> {
    let stats = context.reports.report_stats(&user).await?;
    Ok(ApiResponse::data(stats))
}
