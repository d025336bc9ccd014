use axum::{Json, extract::State};

use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::extract::{PathParam, QueryParams};
use crate::models::{BlogPost, BlogPostSummary, Pagination};
use crate::state::AppState;

/// Published posts, newest first.
pub async fn index(
    State(state): State<AppState>,
    QueryParams(pagination): QueryParams<Pagination>,
) -> Result<Json<Vec<BlogPostSummary>>> {
    let posts = BlogRepository::new(state.pool())
        .list_published(pagination)
        .await?;
    Ok(Json(posts))
}

pub async fn show(
    State(state): State<AppState>,
    PathParam(slug): PathParam<String>,
) -> Result<Json<BlogPost>> {
    BlogRepository::new(state.pool())
        .get_published(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("post '{slug}'")))
}
