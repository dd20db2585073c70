use serde::Deserialize;

/// Tunables that rarely change between deployments.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConstants {
    pub database: DatabaseConstants,
    pub auth: AuthConstants,
    pub reports: ReportConstants,
}

/// Database connection and related configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConstants {
    pub max_connections: u32,
    pub min_connection: u32,
    pub max_lifetime: u64,
    pub idle_timeout: u64,
    pub acquire_timeout: u64,
    /// Length of generated `id` to use for a report in the database.
    pub report_id_length: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConstants {
    pub access_token_expiry_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConstants {
    pub default_page_size: u32,
    /// Requested page sizes above this are clamped.
    pub max_page_size: u32,
    pub nearby_default_radius_meters: f64,
    pub nearby_limit: usize,
}

impl Default for ReportConstants {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            nearby_default_radius_meters: 5000.0,
            nearby_limit: 100,
        }
    }
}
