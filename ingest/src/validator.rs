//! Submission validation.
//!
//! Pure: no side effects, nothing persisted. Rules run in a fixed order so
//! the first failure reported is deterministic — presence, then coordinate
//! shape, then media type, then size.

use geoproof_store::artifact::sanitized_extension;
use geoproof_types::TimestampMillis;

use crate::IngestError;

/// Maximum accepted photo upload: 10 MiB.
pub const MAX_PHOTO_BYTES: u64 = 10 * 1024 * 1024;

/// MIME types accepted for the photo field.
pub const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/jpg", "image/png"];

/// An uploaded file as received from the HTTP layer.
#[derive(Clone, Debug)]
pub struct PhotoUpload {
    pub bytes: Vec<u8>,
    /// Caller-supplied filename; only its extension is ever used.
    pub original_name: String,
    /// Declared `Content-Type` of the part.
    pub content_type: String,
}

/// A raw inbound submission, fields exactly as the client sent them.
#[derive(Clone, Debug, Default)]
pub struct Submission {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub accuracy: Option<String>,
    pub timestamp: Option<String>,
    pub amount: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_upi: Option<String>,
    pub note: Option<String>,
    pub photo: Option<PhotoUpload>,
}

/// A submission that passed validation, coordinates parsed and the photo
/// normalized. Defaults are not applied here; that is the builder's job.
#[derive(Clone, Debug)]
pub struct ValidSubmission {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub photo_bytes: Vec<u8>,
    pub photo_extension: String,
    /// Caller-supplied capture time, if it parsed.
    pub timestamp: Option<TimestampMillis>,
    pub amount: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_upi: Option<String>,
    pub note: Option<String>,
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Validate a raw submission.
pub fn validate(submission: Submission) -> Result<ValidSubmission, IngestError> {
    let mut missing = Vec::new();
    if !present(&submission.latitude) {
        missing.push("latitude");
    }
    if !present(&submission.longitude) {
        missing.push("longitude");
    }
    match &submission.photo {
        None => missing.push("photo"),
        // A zero-byte upload is no photo at all.
        Some(photo) if photo.bytes.is_empty() => missing.push("photo"),
        Some(_) => {}
    }
    if !missing.is_empty() {
        return Err(IngestError::MissingField(missing.join(", ")));
    }

    let latitude = parse_coordinate(submission.latitude.as_deref(), -90.0, 90.0)?;
    let longitude = parse_coordinate(submission.longitude.as_deref(), -180.0, 180.0)?;

    let photo = submission.photo.expect("presence checked above");
    let extension = sanitized_extension(&photo.original_name)
        .ok_or(IngestError::UnsupportedMediaType)?;
    if !ALLOWED_MIME_TYPES.contains(&photo.content_type.to_ascii_lowercase().as_str()) {
        return Err(IngestError::UnsupportedMediaType);
    }

    let size = photo.bytes.len() as u64;
    if size > MAX_PHOTO_BYTES {
        return Err(IngestError::PayloadTooLarge {
            size,
            max: MAX_PHOTO_BYTES,
        });
    }

    Ok(ValidSubmission {
        latitude,
        longitude,
        // Unparseable accuracy degrades to "not reported".
        accuracy: submission.accuracy.as_deref().and_then(|s| s.parse().ok()),
        photo_bytes: photo.bytes,
        photo_extension: extension,
        timestamp: submission
            .timestamp
            .as_deref()
            .and_then(|s| s.parse().ok())
            .map(TimestampMillis::new),
        amount: submission.amount,
        recipient_name: submission.recipient_name,
        recipient_upi: submission.recipient_upi,
        note: submission.note,
    })
}

fn parse_coordinate(raw: Option<&str>, min: f64, max: f64) -> Result<f64, IngestError> {
    let value: f64 = raw
        .and_then(|s| s.trim().parse().ok())
        .ok_or(IngestError::InvalidCoordinate)?;
    if value.is_nan() || value < min || value > max {
        return Err(IngestError::InvalidCoordinate);
    }
    Ok(value)
}
