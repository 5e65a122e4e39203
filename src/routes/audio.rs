use std::collections::HashSet;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::config::LabelingPolicy;
use crate::error::{ApiError, ApiResult};
use crate::models::api::{
    LabelItemsResponse, ServedItem, SubmitLabelRequest, SubmitLabelResponse, UploadResponse,
    UploadedFile,
};
use crate::models::item::{blob_key_for, LabelItem, Priority, UploadMeta};
use crate::routes::auth::{AdminUser, AuthUser};
use crate::services::selector;

/// A file pulled out of a multipart upload, held until the priority is known.
struct PendingFile {
    original_name: String,
    mime_type: String,
    data: Vec<u8>,
}

/// POST /api/audio/upload-audio: store clips and register them for labeling.
pub async fn upload_audio(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart?;
    let mut files = Vec::new();
    let mut priority = Priority::default();
    let mut received = 0usize;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") | Some("audio[]") => {
                received += 1;
                let original_name = field.file_name().unwrap_or("audio").to_string();
                let mime_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await?;

                if !mime_type.starts_with("audio/") {
                    tracing::warn!(file = %original_name, mime = %mime_type, "Skipping non-audio upload");
                    continue;
                }
                if data.len() > state.policy.max_file_bytes {
                    return Err(ApiError::Validation(format!(
                        "File {} exceeds the {} byte limit",
                        original_name, state.policy.max_file_bytes
                    )));
                }

                files.push(PendingFile {
                    original_name,
                    mime_type,
                    data: data.to_vec(),
                });
            }
            Some("priority") => {
                let value = field.text().await?;
                let value = value.trim();
                if !value.is_empty() {
                    priority = value.parse().map_err(|_| {
                        ApiError::Validation(format!(
                            "Invalid priority '{}', expected high, medium or low",
                            value
                        ))
                    })?;
                }
            }
            _ => {}
        }
    }

    if received == 0 {
        return Err(ApiError::Validation("No audio files uploaded".to_string()));
    }

    let mut uploaded = Vec::with_capacity(files.len());
    for file in files {
        let now = Utc::now();
        let key = blob_key_for(priority, &file.original_name, now);
        let key = state.blobs.put(&key, &file.data, &file.mime_type).await?;

        let item = LabelItem::register(
            key,
            priority,
            UploadMeta {
                original_name: file.original_name,
                file_size: file.data.len() as i64,
                mime_type: file.mime_type,
            },
            now,
        );
        state.items.insert(&item).await?;

        tracing::info!(
            item_id = %item.id,
            key = %item.blob_key,
            priority = %priority,
            uploaded_by = %admin.email(),
            "Registered audio item"
        );

        uploaded.push(UploadedFile {
            id: item.id.to_string(),
            original_name: item.original_name,
            key: item.blob_key,
            status: item.status,
            priority,
        });
    }

    metrics::counter!("audio_uploads_total").increment(uploaded.len() as u64);

    Ok(Json(UploadResponse {
        success: true,
        message: format!(
            "{} audio file(s) uploaded to {} priority",
            uploaded.len(),
            priority
        ),
        files: uploaded,
    }))
}

/// GET /api/audio/label-items: serve the next clip to label, if any.
pub async fn label_items(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> ApiResult<Json<LabelItemsResponse>> {
    let start = std::time::Instant::now();
    let items = state.items.below_threshold(state.policy.threshold).await?;

    tracing::debug!(candidates = items.len(), "Scanned items needing labels");

    let mut leased = match &state.leases {
        Some(leases) => {
            let ids: Vec<Uuid> = items.iter().map(|i| i.id).collect();
            leases.leased(&ids).await.unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Lease lookup failed, selecting without leases");
                HashSet::new()
            })
        }
        None => HashSet::new(),
    };

    // Each lost race adds one id to `leased`, so this ends within items.len() rounds.
    let chosen = loop {
        let Some(item) = choose_candidate(&items, &state.policy, &leased) else {
            break None;
        };
        let Some(leases) = &state.leases else {
            break Some(item);
        };
        if leased.contains(&item.id) {
            // Every candidate is leased; serve without a lease.
            break Some(item);
        }
        match leases.acquire(item.id).await {
            Ok(true) => break Some(item),
            Ok(false) => {
                metrics::counter!("label_item_lease_conflicts_total").increment(1);
                tracing::debug!(item_id = %item.id, "Lost lease race, selecting again");
                leased.insert(item.id);
            }
            Err(e) => {
                tracing::warn!(
                    item_id = %item.id,
                    error = %e,
                    "Lease acquire failed, serving unleased"
                );
                break Some(item);
            }
        }
    };

    metrics::histogram!("label_selection_seconds").record(start.elapsed().as_secs_f64());

    let Some(item) = chosen else {
        metrics::counter!("label_items_empty_total").increment(1);
        tracing::info!(labeler = %identity.email(), "No items need labeling");
        return Ok(Json(LabelItemsResponse { items: Vec::new() }));
    };

    let audio_url = state
        .blobs
        .presign(&item.blob_key, state.policy.presign_expiry_secs)
        .await?;

    metrics::counter!("label_items_served_total", "priority" => item.priority.to_string())
        .increment(1);
    tracing::info!(
        item_id = %item.id,
        priority = %item.priority,
        label_count = item.label_count,
        labeler = %identity.email(),
        "Selected item for labeling"
    );

    Ok(Json(LabelItemsResponse {
        items: vec![ServedItem::new(&item, audio_url)],
    }))
}

/// POST /api/audio/labeled-items: record one label against an item.
pub async fn submit_label(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    payload: Result<Json<SubmitLabelRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitLabelResponse>> {
    let Json(req) = payload?;

    if req.id.trim().is_empty() {
        return Err(ApiError::Validation("Item id is required".to_string()));
    }
    let label = req
        .resolved_label()
        .ok_or_else(|| ApiError::Validation("A label or a type and severity is required".to_string()))?;

    let not_found = || ApiError::NotFound(format!("Audio item {} not found", req.id));
    let id: Uuid = req.id.trim().parse().map_err(|_| not_found())?;

    let item = state
        .items
        .append_label(id, &label, Utc::now(), state.policy.threshold)
        .await?
        .ok_or_else(not_found)?;

    if let Some(leases) = &state.leases {
        if let Err(e) = leases.release(id).await {
            tracing::warn!(
                item_id = %id,
                error = %e,
                "Lease release failed, leaving it to expire"
            );
        }
    }

    metrics::counter!("labels_submitted_total").increment(1);
    tracing::info!(
        item_id = %item.id,
        label = %label,
        label_count = item.label_count,
        labeler = %identity.email(),
        "Label submitted"
    );

    Ok(Json(SubmitLabelResponse {
        success: true,
        message: "Label submitted successfully".to_string(),
        label_count: item.label_count,
    }))
}

/// Narrow by cooldown and leases, then run the selector.
///
/// Synchronous so the thread RNG never lives across an await.
fn choose_candidate(
    items: &[LabelItem],
    policy: &LabelingPolicy,
    leased: &HashSet<Uuid>,
) -> Option<LabelItem> {
    let candidates =
        selector::outside_cooldown(items.iter().collect(), policy.cooldown, Utc::now());
    let candidates = selector::without_leased(candidates, leased);
    selector::select_next(candidates, &mut rand::rng()).cloned()
}
