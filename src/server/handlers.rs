use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;

use super::{error::ApiError, middleware::AuthUser, AppState};
use crate::checklists::{self, ReconcileResult};
use crate::models::{
    BulkItemsRequest, BulkItemsResponse, Checklist, ChecklistFields, ChecklistPatch,
    ChecklistWithItems, LoginRequest, SessionResponse, SignupRequest, UserProfile,
};

#[derive(Serialize)]
pub struct MessageResponse {
    message: &'static str,
}

pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "TodoList Backend API",
    })
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Accounts
// ============================================================================

pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    Ok(Json(state.auth.signup(request).await?))
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    Ok(Json(state.auth.login(request).await?))
}

pub async fn me(Extension(AuthUser(user)): Extension<AuthUser>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

// ============================================================================
// Checklists
// ============================================================================

pub async fn create_checklist(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(fields): Json<ChecklistFields>,
) -> Result<Json<ChecklistWithItems>, ApiError> {
    let created = checklists::create_checklist(state.store.as_ref(), &user.id, fields).await?;
    Ok(Json(created))
}

pub async fn list_checklists(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> Result<Json<Vec<ChecklistWithItems>>, ApiError> {
    Ok(Json(
        checklists::list_checklists(state.store.as_ref(), &user.id).await?,
    ))
}

pub async fn get_checklist(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(checklist_id): Path<String>,
) -> Result<Json<ChecklistWithItems>, ApiError> {
    Ok(Json(
        checklists::get_checklist(state.store.as_ref(), &checklist_id, &user.id).await?,
    ))
}

pub async fn update_checklist(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(checklist_id): Path<String>,
    Json(patch): Json<ChecklistPatch>,
) -> Result<Json<Checklist>, ApiError> {
    Ok(Json(
        checklists::update_checklist(state.store.as_ref(), &checklist_id, &user.id, &patch)
            .await?,
    ))
}

pub async fn delete_checklist(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(checklist_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    // Deleting items races with a reconciliation of the same checklist.
    let _guard = match &state.locks {
        Some(locks) => Some(locks.acquire(&checklist_id).await),
        None => None,
    };

    checklists::delete_checklist(state.store.as_ref(), &checklist_id, &user.id).await?;
    Ok(Json(MessageResponse {
        message: "Checklist deleted successfully",
    }))
}

/// Replaces a checklist's items with the submitted list.
pub async fn reconcile_items(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(checklist_id): Path<String>,
    Json(request): Json<BulkItemsRequest>,
) -> Result<Json<BulkItemsResponse>, ApiError> {
    let _guard = match &state.locks {
        Some(locks) => Some(locks.acquire(&checklist_id).await),
        None => None,
    };

    let ReconcileResult {
        items,
        created_count,
        updated_count,
        deleted_count,
    } = checklists::reconcile_items(
        state.store.as_ref(),
        &checklist_id,
        &user.id,
        &request.items,
    )
    .await?;

    Ok(Json(BulkItemsResponse {
        message: "Checklist items updated successfully".to_string(),
        items,
        created_count,
        updated_count,
        deleted_count,
    }))
}
