use axum::Extension;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use rolebook_core::identity::RequestIdentity;
use rolebook_store::{NewRole, Page, RoleUpdate};

use crate::dto::{
    CreateRoleRequest, ListParams, RoleCard, RoleListResponse, RoleResponse, UpdateRoleRequest,
    role_summary, to_role_response,
};
use crate::error::ApiError;
use crate::server::AppState;

/// Preview uploads are character sheets, not bulk data.
const MAX_PREVIEW_BYTES: usize = 10 * 1024 * 1024;

pub async fn list_roles(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Query(params): Query<ListParams>,
) -> Result<Json<RoleListResponse>, ApiError> {
    let page = Page::new(params.page, params.page_size);
    let (roles, total) = state.roles.list_roles(&identity.user_id, page).await?;
    Ok(Json(RoleListResponse {
        total,
        list: roles.into_iter().map(|r| to_role_response(r, false)).collect(),
    }))
}

pub async fn get_role(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<RoleResponse>, ApiError> {
    let role = state.roles.get_role(id, &identity.user_id).await?;
    Ok(Json(to_role_response(role, true)))
}

/// Parse an uploaded role-card file and echo the decoded card without
/// persisting anything.
pub async fn preview_role(mut multipart: Multipart) -> Result<Json<RoleCard>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to parse form: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read file: {e}")))?;
        if data.len() > MAX_PREVIEW_BYTES {
            return Err(ApiError::BadRequest("file too large for preview".into()));
        }
        let card: RoleCard = serde_json::from_slice(&data)
            .map_err(|e| ApiError::BadRequest(format!("failed to decode role card: {e}")))?;
        return Ok(Json(card));
    }
    Err(ApiError::BadRequest("no file field named 'file'".into()))
}

pub async fn create_role(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Json(req): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<RoleResponse>), ApiError> {
    let mut card = req.role_data;
    if !req.avatar_url.is_empty() && req.avatar_url != card.basic_info.avatar_url {
        card.basic_info.avatar_url = req.avatar_url.clone();
    }
    let role_data = serde_json::to_value(&card)
        .map_err(|e| ApiError::BadRequest(format!("invalid role card: {e}")))?;

    let role = state
        .roles
        .create_role(NewRole {
            name: card.basic_info.name.clone(),
            wx_user_id: identity.user_id,
            avatar_url: req.avatar_url,
            description: role_summary(&card),
            role_data,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(to_role_response(role, true))))
}

pub async fn update_role(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<StatusCode, ApiError> {
    let mut card = req.role_data;
    if !req.avatar_url.is_empty() && req.avatar_url != card.basic_info.avatar_url {
        card.basic_info.avatar_url = req.avatar_url.clone();
    }
    let role_data = serde_json::to_value(&card)
        .map_err(|e| ApiError::BadRequest(format!("invalid role card: {e}")))?;

    state
        .roles
        .update_role(
            id,
            RoleUpdate {
                name: card.basic_info.name.clone(),
                wx_user_id: identity.user_id,
                avatar_url: req.avatar_url,
                description: role_summary(&card),
                role_data,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_role(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.roles.delete_role(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
