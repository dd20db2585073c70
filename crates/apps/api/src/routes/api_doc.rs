use crate::routes::{auth, reports, root};
use common_services::api::auth::interfaces::{AuthSession, LoginUser, RegisterUser, UpdateProfile};
use common_services::api::reports::interfaces::{
    CreateReportMultipart, NearbyReport, ReportResponse, ReportUser, UpdateReportRequest,
};
use common_services::api::reports::query::{
    CategoryCount, Pagination, ReportStats, StatusOverview,
};
use common_services::database::app_user::{User, UserRole};
use common_services::database::report::{
    Coordinates, ReportCategory, ReportPriority, ReportStatus,
};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        root::handlers::root,
        root::handlers::health_check,
        root::handlers::openapi_document,
        // Auth handlers
        auth::handlers::login,
        auth::handlers::register,
        auth::handlers::get_me,
        auth::handlers::update_profile,
        // Report handlers
        reports::handlers::create_report,
        reports::handlers::list_reports,
        reports::handlers::get_report,
        reports::handlers::update_report,
        reports::handlers::delete_report,
        reports::handlers::nearby_reports,
        reports::handlers::report_stats,
    ),
    components(
        schemas(
            User,
            UserRole,
            AuthSession,
            LoginUser,
            RegisterUser,
            UpdateProfile,
            ReportResponse,
            ReportUser,
            NearbyReport,
            UpdateReportRequest,
            CreateReportMultipart,
            ReportStats,
            StatusOverview,
            CategoryCount,
            Pagination,
            Coordinates,
            ReportCategory,
            ReportStatus,
            ReportPriority,
        ),
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and profile endpoints"),
        (name = "Reports", description = "Submitting, triaging and querying waste reports"),
        (name = "System", description = "Health check and service information"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}
