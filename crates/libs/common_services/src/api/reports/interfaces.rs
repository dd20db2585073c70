use crate::api::reports::error::ReportError;
use crate::database::app_user::User;
use crate::database::report::{
    Coordinates, Report, ReportCategory, ReportPriority, ReportStatus, ReportWithDistance,
};
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// An image received in a multipart body, not yet written anywhere.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// The text fields and file of a `POST /reports` multipart body, as received.
#[derive(Debug, Default, Clone)]
pub struct CreateReportForm {
    pub description: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    /// JSON encoded `{lat, lng}`.
    pub coordinates: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Multipart layout of `POST /reports`, for the OpenAPI document only.
#[derive(ToSchema)]
pub struct CreateReportMultipart {
    pub description: String,
    pub category: Option<ReportCategory>,
    pub location: Option<String>,
    /// JSON string such as `{"lat": 40.7128, "lng": -74.0060}`.
    pub coordinates: Option<String>,
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}

/// Checked report fields, ready to be stored.
#[derive(Debug, Clone, Validate)]
pub struct NewReportInput {
    #[validate(length(max = 500, message = "Description cannot be more than 500 characters"))]
    pub description: String,
    pub category: ReportCategory,
    #[validate(length(max = 200, message = "Location cannot be more than 200 characters"))]
    pub location: Option<String>,
    pub coordinates: Option<Coordinates>,
}

fn trimmed(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

fn invalid_coordinates() -> ReportError {
    ReportError::Validation("Invalid coordinates provided".to_owned())
}

/// Accepts a JSON number or a string holding one.
fn coordinate_value(value: Option<&Value>) -> Result<f64, ReportError> {
    match value {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(invalid_coordinates),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| invalid_coordinates()),
        _ => Err(invalid_coordinates()),
    }
}

/// Parses a `{lat, lng}` JSON document and range checks it.
pub fn parse_coordinates_json(raw: &str) -> Result<Coordinates, ReportError> {
    let value: Value = serde_json::from_str(raw).map_err(|_| invalid_coordinates())?;
    let lat = coordinate_value(value.get("lat"))?;
    let lng = coordinate_value(value.get("lng"))?;
    Coordinates::new(lat, lng).ok_or_else(invalid_coordinates)
}

impl CreateReportForm {
    /// Trims and checks the text fields. The image is returned untouched.
    ///
    /// # Errors
    ///
    /// * `ReportError::Validation` for missing description, coordinates or image, out of range
    ///   coordinates, unknown categories and over-long text.
    pub fn into_input(self) -> Result<(NewReportInput, ImageUpload), ReportError> {
        let description = trimmed(self.description.as_ref());
        let location = trimmed(self.location.as_ref());

        let coordinates = match (
            trimmed(self.coordinates.as_ref()),
            trimmed(self.lat.as_ref()),
            trimmed(self.lng.as_ref()),
        ) {
            (Some(json), _, _) => Some(parse_coordinates_json(&json)?),
            (None, Some(lat), Some(lng)) => {
                let lat = lat.parse().map_err(|_| invalid_coordinates())?;
                let lng = lng.parse().map_err(|_| invalid_coordinates())?;
                Some(Coordinates::new(lat, lng).ok_or_else(invalid_coordinates)?)
            }
            (None, Some(_), None) | (None, None, Some(_)) => return Err(invalid_coordinates()),
            (None, None, None) => None,
        };

        let Some(description) = description else {
            return Err(ReportError::Validation(
                "Please provide description and coordinates".to_owned(),
            ));
        };
        if coordinates.is_none() && location.is_none() {
            return Err(ReportError::Validation(
                "Please provide description and coordinates".to_owned(),
            ));
        }

        let category = match trimmed(self.category.as_ref()) {
            Some(raw) => raw.parse().map_err(ReportError::Validation)?,
            None => ReportCategory::default(),
        };

        let input = NewReportInput {
            description,
            category,
            location,
            coordinates,
        };
        input.validate()?;

        let image = self
            .image
            .ok_or_else(|| ReportError::Validation("Please upload an image".to_owned()))?;
        Ok((input, image))
    }
}

/// Body of `PATCH /reports/{id}`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportRequest {
    pub status: Option<ReportStatus>,
    pub priority: Option<ReportPriority>,
    /// An empty string clears the notes.
    #[validate(length(max = 300, message = "Admin notes cannot be more than 300 characters"))]
    pub admin_notes: Option<String>,
}

/// Query string of `GET /reports/nearby`.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct NearbyParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    /// Search radius in meters, defaults to 5000.
    pub radius: Option<String>,
}

/// A user as embedded in report payloads.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ReportUser {
    pub id: i32,
    pub username: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ReportUser {
    #[must_use]
    pub fn owner(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            email: Some(user.email.clone()),
        }
    }

    #[must_use]
    pub fn resolver(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            name: user.name.clone(),
            email: None,
        }
    }
}

#[must_use]
pub fn image_url(file_name: &str) -> String {
    format!("/uploads/{file_name}")
}

/// A report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: String,
    /// `null` if the owning account no longer exists.
    pub user: Option<ReportUser>,
    pub description: String,
    pub category: ReportCategory,
    pub image: String,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    pub status: ReportStatus,
    pub priority: ReportPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<ReportUser>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportResponse {
    /// Builds the payload, looking owner and resolver up in `users`.
    #[must_use]
    pub fn from_report(report: Report, users: &HashMap<i32, User>) -> Self {
        let coordinates = report.coordinates();
        Self {
            user: users.get(&report.user_id).map(ReportUser::owner),
            resolved_by: report
                .resolved_by
                .and_then(|id| users.get(&id))
                .map(ReportUser::resolver),
            image_url: image_url(&report.image),
            id: report.id,
            description: report.description,
            category: report.category,
            image: report.image,
            location: report.location,
            coordinates,
            status: report.status,
            priority: report.priority,
            admin_notes: report.admin_notes,
            resolved_at: report.resolved_at,
            created_at: report.created_at,
            updated_at: report.updated_at,
        }
    }
}

/// Lightweight projection used by the map view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NearbyReport {
    pub id: String,
    pub description: String,
    pub category: ReportCategory,
    pub coordinates: Option<Coordinates>,
    pub status: ReportStatus,
    pub priority: ReportPriority,
    pub created_at: DateTime<Utc>,
    pub image: String,
    pub image_url: String,
    pub distance_meters: f64,
}

impl From<ReportWithDistance> for NearbyReport {
    fn from(found: ReportWithDistance) -> Self {
        let report = found.report;
        Self {
            coordinates: report.coordinates(),
            image_url: image_url(&report.image),
            id: report.id,
            description: report.description,
            category: report.category,
            status: report.status,
            priority: report.priority,
            created_at: report.created_at,
            image: report.image,
            distance_meters: found.distance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(fields: &[(&str, &str)]) -> CreateReportForm {
        let mut form = CreateReportForm {
            image: Some(ImageUpload {
                file_name: Some("bin.jpg".into()),
                content_type: Some("image/jpeg".into()),
                bytes: Bytes::from_static(b"jpeg"),
            }),
            ..CreateReportForm::default()
        };
        for (key, value) in fields {
            let value = Some((*value).to_owned());
            match *key {
                "description" => form.description = value,
                "category" => form.category = value,
                "location" => form.location = value,
                "coordinates" => form.coordinates = value,
                "lat" => form.lat = value,
                "lng" => form.lng = value,
                _ => unreachable!(),
            }
        }
        form
    }

    fn validation_message(result: Result<(NewReportInput, ImageUpload), ReportError>) -> String {
        match result {
            Err(ReportError::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_numbers_or_numeric_strings() {
        let (input, _) = form(&[
            ("description", "  Overflowing bin on Main St  "),
            ("category", "Overflowing Bin"),
            ("coordinates", r#"{"lat": 40.7128, "lng": "-74.0060"}"#),
        ])
        .into_input()
        .expect("valid");

        assert_eq!(input.description, "Overflowing bin on Main St");
        assert_eq!(input.category, ReportCategory::OverflowingBin);
        assert_eq!(input.coordinates, Coordinates::new(40.7128, -74.0060));
    }

    #[test]
    fn accepts_separate_lat_lng_fields_and_defaults_category() {
        let (input, _) = form(&[("description", "Litter"), ("lat", "10"), ("lng", "20")])
            .into_input()
            .expect("valid");
        assert_eq!(input.coordinates, Coordinates::new(10.0, 20.0));
        assert_eq!(input.category, ReportCategory::Other);
    }

    #[test]
    fn location_may_replace_coordinates() {
        let (input, _) = form(&[("description", "Litter"), ("location", " Central Park ")])
            .into_input()
            .expect("valid");
        assert_eq!(input.location.as_deref(), Some("Central Park"));
        assert_eq!(input.coordinates, None);
    }

    #[test]
    fn rejects_missing_fields() {
        assert_eq!(
            validation_message(form(&[("coordinates", r#"{"lat":1,"lng":1}"#)]).into_input()),
            "Please provide description and coordinates"
        );
        assert_eq!(
            validation_message(form(&[("description", "Litter")]).into_input()),
            "Please provide description and coordinates"
        );

        let mut without_image = form(&[("description", "Litter"), ("lat", "1"), ("lng", "1")]);
        without_image.image = None;
        assert_eq!(
            validation_message(without_image.into_input()),
            "Please upload an image"
        );
    }

    #[test]
    fn rejects_out_of_range_or_malformed_coordinates() {
        for coordinates in [
            r#"{"lat": 91, "lng": 0}"#,
            r#"{"lat": 0, "lng": -180.5}"#,
            r#"{"lat": "north", "lng": 0}"#,
            r#"{"lat": 1}"#,
            "not json",
        ] {
            assert_eq!(
                validation_message(
                    form(&[("description", "Litter"), ("coordinates", coordinates)]).into_input()
                ),
                "Invalid coordinates provided",
                "{coordinates}"
            );
        }
    }

    #[test]
    fn enforces_lengths_and_categories() {
        let long = "x".repeat(501);
        assert_eq!(
            validation_message(
                form(&[("description", &long), ("lat", "1"), ("lng", "1")]).into_input()
            ),
            "Description cannot be more than 500 characters"
        );
        assert!(
            validation_message(
                form(&[("description", "a"), ("category", "Graffiti"), ("lat", "1"), ("lng", "1")])
                    .into_input()
            )
            .contains("Graffiti")
        );
    }

    #[test]
    fn response_embeds_owner_and_image_url() {
        let now = Utc::now();
        let owner = User {
            id: 2,
            username: "user1".into(),
            email: "user1@ecosnap.com".into(),
            name: "Regular User".into(),
            role: crate::database::app_user::UserRole::User,
            created_at: now,
            updated_at: now,
        };
        let report = Report {
            id: "r1".into(),
            user_id: 2,
            description: "Litter".into(),
            category: ReportCategory::Litter,
            image: "report-1-2.jpg".into(),
            location: None,
            latitude: Some(1.0),
            longitude: Some(2.0),
            status: ReportStatus::Pending,
            priority: ReportPriority::Medium,
            admin_notes: None,
            resolved_at: None,
            resolved_by: None,
            created_at: now,
            updated_at: now,
        };
        let users = HashMap::from([(2, owner)]);
        let response = ReportResponse::from_report(report, &users);

        assert_eq!(response.image_url, "/uploads/report-1-2.jpg");
        assert_eq!(
            response.user.as_ref().and_then(|u| u.email.as_deref()),
            Some("user1@ecosnap.com")
        );
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["coordinates"]["lat"], 1.0);
        assert!(json.get("resolvedAt").is_none());
    }
}
