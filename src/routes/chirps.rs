/// Chirp Routes

use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{authorize_ownership, Principal};
use crate::error::{AppError, DatabaseError, ErrorContext};
use crate::logger::RequestId;
use crate::store::{Chirp, Store};
use crate::validators::clean_chirp_body;

#[derive(Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Deserialize)]
pub struct ListChirpsQuery {
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub sort: SortOrder,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChirpResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub body: String,
    pub user_id: Uuid,
}

impl From<Chirp> for ChirpResponse {
    fn from(chirp: Chirp) -> Self {
        Self {
            id: chirp.id,
            created_at: chirp.created_at,
            updated_at: chirp.updated_at,
            body: chirp.body,
            user_id: chirp.user_id,
        }
    }
}

/// POST /api/chirps
///
/// **Requires a valid session token.** The author is always the caller.
///
/// # Errors
/// - 400: Empty body or longer than 140 characters
pub async fn create_chirp(
    request_id: RequestId,
    principal: web::ReqData<Principal>,
    form: web::Json<CreateChirpRequest>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let principal = principal.into_inner();
    let body = clean_chirp_body(&form.body)?;

    let chirp = store.create_chirp(principal.user_id, &body).await?;

    tracing::info!(
        request_id = %request_id,
        user_id = %principal.user_id,
        chirp_id = %chirp.id,
        "Chirp created"
    );

    Ok(HttpResponse::Created().json(ChirpResponse::from(chirp)))
}

/// GET /api/chirps?author_id=<uuid>&sort=asc|desc
pub async fn list_chirps(
    query: web::Query<ListChirpsQuery>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let mut chirps = store.list_chirps(query.author_id).await?;
    if query.sort == SortOrder::Desc {
        chirps.reverse();
    }

    let chirps: Vec<ChirpResponse> = chirps.into_iter().map(ChirpResponse::from).collect();
    Ok(HttpResponse::Ok().json(chirps))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    path: web::Path<Uuid>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let chirp = store
        .get_chirp(path.into_inner())
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Chirp".to_string()))?;

    Ok(HttpResponse::Ok().json(ChirpResponse::from(chirp)))
}

/// DELETE /api/chirps/{chirp_id}
///
/// **Requires a valid session token.** Only the author may delete.
///
/// # Errors
/// - 403: Caller is not the author
/// - 404: No such chirp
pub async fn delete_chirp(
    request_id: RequestId,
    principal: web::ReqData<Principal>,
    path: web::Path<Uuid>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let principal = principal.into_inner();
    let chirp_id = path.into_inner();
    let context = ErrorContext::new(request_id, "chirp_delete").with_user_id(principal.user_id);

    let chirp = store
        .get_chirp(chirp_id)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Chirp".to_string()))?;

    authorize_ownership(&principal, chirp.user_id)?;

    if !store.delete_chirp(chirp.id).await? {
        // Deleted concurrently between lookup and delete
        return Err(DatabaseError::NotFound("Chirp".to_string()).into());
    }

    tracing::info!(request_id = %context.request_id, chirp_id = %chirp.id, "Chirp deleted");

    Ok(HttpResponse::NoContent().finish())
}
