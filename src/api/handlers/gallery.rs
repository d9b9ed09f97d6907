use crate::AppState;
use crate::api::error::AppError;
use crate::services::gallery::GalleryPage;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use serde::Deserialize;
use utoipa::IntoParams;

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GalleryQuery {
    /// Page size (default 10, capped by the server)
    pub limit: Option<usize>,
    /// Index of the first item (default 0)
    pub offset: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/gallery",
    params(GalleryQuery),
    responses(
        (status = 200, description = "Newest media first, with signed URLs", body = GalleryPage),
        (status = 400, description = "Invalid paging parameters"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Listing or signing failure")
    ),
    security(
        ("basic" = [])
    ),
    tag = "media"
)]
pub async fn list_gallery(
    State(state): State<AppState>,
    query: Result<Query<GalleryQuery>, QueryRejection>,
) -> Result<Json<GalleryPage>, AppError> {
    let Query(query) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 {
        return Err(AppError::BadRequest(
            "limit must be greater than zero".to_string(),
        ));
    }
    let limit = limit.min(state.config.max_page_size);
    let offset = query.offset.unwrap_or(0);

    let page = state.gallery.list_page(limit, offset).await?;
    Ok(Json(page))
}
