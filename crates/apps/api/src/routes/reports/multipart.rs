use axum::extract::Multipart;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use common_services::api::reports::error::ReportError;
use common_services::api::reports::interfaces::{CreateReportForm, ImageUpload};

fn multipart_error(err: &MultipartError, max_bytes: usize) -> ReportError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ReportError::TooLarge { max_bytes }
    } else {
        ReportError::Validation(err.body_text())
    }
}

/// Reads the whole `POST /reports` body into memory. Nothing is written to disk here.
pub async fn read_report_form(
    multipart: Result<Multipart, MultipartRejection>,
    max_bytes: usize,
) -> Result<CreateReportForm, ReportError> {
    let mut multipart = multipart.map_err(|rejection| {
        ReportError::Validation(format!(
            "Expected a multipart/form-data body: {}",
            rejection.body_text()
        ))
    })?;
    let mut form = CreateReportForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e, max_bytes))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        if name == "image" {
            if form.image.is_some() {
                return Err(ReportError::Validation(
                    "Only one image can be uploaded per report".to_owned(),
                ));
            }
            let file_name = field.file_name().map(ToOwned::to_owned);
            let content_type = field.content_type().map(ToOwned::to_owned);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| multipart_error(&e, max_bytes))?;
            form.image = Some(ImageUpload {
                file_name,
                content_type,
                bytes,
            });
            continue;
        }

        let slot = match name.as_str() {
            "description" => &mut form.description,
            "category" => &mut form.category,
            "location" => &mut form.location,
            "coordinates" => &mut form.coordinates,
            "lat" => &mut form.lat,
            "lng" => &mut form.lng,
            _ => continue,
        };
        let text = field
            .text()
            .await
            .map_err(|e| multipart_error(&e, max_bytes))?;
        *slot = Some(text);
    }

    Ok(form)
}
