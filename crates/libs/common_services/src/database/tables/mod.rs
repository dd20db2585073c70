pub mod app_user;
pub mod report;
