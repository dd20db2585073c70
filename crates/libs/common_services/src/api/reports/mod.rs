pub mod error;
pub mod geo;
pub mod interfaces;
pub mod lifecycle;
pub mod policy;
pub mod query;
pub mod service;
pub mod upload;
