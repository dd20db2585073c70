use crate::api_state::ApiContext;
use crate::reports::handlers::{
    create_report, delete_report, get_report, list_reports, nearby_reports, report_stats,
    update_report,
};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;

/// Multipart framing allowance on top of the image size limit.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn reports_protected_router(max_upload_bytes: usize) -> Router<ApiContext> {
    Router::new()
        .route(
            "/reports",
            get(list_reports)
                .post(create_report)
                .layer(DefaultBodyLimit::max(
                    max_upload_bytes + MULTIPART_OVERHEAD_BYTES,
                )),
        )
        .route("/reports/nearby", get(nearby_reports))
        .route("/reports/stats", get(report_stats))
        .route(
            "/reports/{id}",
            get(get_report).patch(update_report).delete(delete_report),
        )
}
