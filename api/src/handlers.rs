//! Request handlers and wire types.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use geoproof_ingest::{validate, PhotoUpload, Submission};
use geoproof_store::effective_limit;
use geoproof_types::{PhotoRef, TimestampMillis, TransactionId, VerificationRecord};

use crate::error::ApiError;
use crate::server::AppState;

// ── Wire types ───────────────────────────────────────────────────────────

/// A verification record as rendered on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordBody {
    pub id: u64,
    pub transaction_id: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    /// Filename, for file-backed photo artifacts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
    /// Base64 blob, for inline photo artifacts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_data: Option<String>,
    pub photo_size: u64,
    /// Capture time, epoch milliseconds.
    pub timestamp: u64,
    pub amount: String,
    pub recipient_name: String,
    pub recipient_upi: String,
    pub note: String,
    pub status: String,
    /// Insertion time, ISO-8601.
    pub created_at: String,
}

impl From<VerificationRecord> for RecordBody {
    fn from(record: VerificationRecord) -> Self {
        let (photo_path, photo_data) = match record.photo {
            PhotoRef::File { filename } => (Some(filename), None),
            PhotoRef::Inline { data } => (None, Some(data)),
        };
        Self {
            id: record.id,
            transaction_id: record.transaction_id.to_string(),
            latitude: record.latitude,
            longitude: record.longitude,
            accuracy: record.accuracy,
            photo_path,
            photo_data,
            photo_size: record.photo_size,
            timestamp: record.timestamp.as_millis(),
            amount: record.amount,
            recipient_name: record.recipient_name,
            recipient_upi: record.recipient_upi,
            note: record.note,
            status: record.status,
            created_at: record.created_at.to_iso8601(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub transaction_id: String,
    pub message: &'static str,
    pub data: SubmitData,
}

#[derive(Serialize)]
pub struct SubmitData {
    pub location: Location,
    pub photo: PhotoMeta,
    pub amount: String,
    /// Capture time, ISO-8601.
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

#[derive(Serialize)]
pub struct PhotoMeta {
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

#[derive(Serialize)]
pub struct GetResponse {
    pub success: bool,
    pub data: RecordBody,
}

#[derive(Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<RecordBody>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub env: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────

/// `POST /api/verify` — multipart verification submission.
pub async fn submit_verification(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SubmitResponse>, ApiError> {
    let submission = read_submission(multipart).await?;
    let valid = validate(submission)?;
    let receipt = state.ingestor.commit(valid)?;

    if let Some(webhook) = &state.webhook {
        // Read-after-write so the webhook carries the committed record.
        match state.store.read_one(&receipt.transaction_id) {
            Ok(record) => webhook.forward(record),
            Err(e) => tracing::warn!("webhook readback failed: {e}"),
        }
    }

    Ok(Json(SubmitResponse {
        success: true,
        transaction_id: receipt.transaction_id.to_string(),
        message: "Verification successful",
        data: SubmitData {
            location: Location {
                latitude: receipt.latitude,
                longitude: receipt.longitude,
                accuracy: receipt.accuracy,
            },
            photo: PhotoMeta {
                size: receipt.photo_size,
                filename: receipt.photo.filename().map(str::to_string),
            },
            amount: receipt.amount,
            timestamp: receipt.timestamp.to_iso8601(),
        },
    }))
}

/// Drain the multipart stream into a raw [`Submission`].
async fn read_submission(mut multipart: Multipart) -> Result<Submission, ApiError> {
    let mut submission = Submission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "photo" {
            let original_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read photo: {e}")))?;
            submission.photo = Some(PhotoUpload {
                bytes: bytes.to_vec(),
                original_name,
                content_type,
            });
            continue;
        }
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read field {name}: {e}")))?;
        match name.as_str() {
            "latitude" => submission.latitude = Some(value),
            "longitude" => submission.longitude = Some(value),
            "accuracy" => submission.accuracy = Some(value),
            "timestamp" => submission.timestamp = Some(value),
            "amount" => submission.amount = Some(value),
            "recipientName" => submission.recipient_name = Some(value),
            "recipientUpi" => submission.recipient_upi = Some(value),
            "note" => submission.note = Some(value),
            other => debug!("ignoring unknown multipart field {other}"),
        }
    }
    Ok(submission)
}

/// `GET /api/verify/:transaction_id` — fetch one verification.
pub async fn get_verification(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<GetResponse>, ApiError> {
    let record = state
        .store
        .read_one(&TransactionId::new(transaction_id))
        .map_err(|e| match e {
            geoproof_store::StoreError::NotFound(_) => ApiError::NotFound("Verification not found"),
            other => other.into(),
        })?;
    Ok(Json(GetResponse {
        success: true,
        data: record.into(),
    }))
}

/// `GET /api/verifications?limit=N` — list recent verifications, newest first.
pub async fn list_verifications(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let records = state.store.read_all(effective_limit(query.limit))?;
    let data: Vec<RecordBody> = records.into_iter().map(RecordBody::from).collect();
    Ok(Json(ListResponse {
        success: true,
        count: data.len(),
        data,
    }))
}

/// `GET /api/photo/:filename` — serve a stored photo artifact.
pub async fn get_photo(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let bytes = state.store.read_photo(&filename).map_err(|e| match e {
        geoproof_store::StoreError::NotFound(_) => ApiError::NotFound("Photo not found"),
        other => other.into(),
    })?;
    let content_type = match filename.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    };
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        bytes,
    )
        .into_response())
}

/// `GET /api/health`.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: TimestampMillis::now().to_iso8601(),
        env: state.env.clone(),
    })
}
