use axum::{Json, extract::State};

use crate::db::CategoryRepository;
use crate::error::Result;
use crate::models::Category;
use crate::state::AppState;

/// Visible categories. Montaje never appears here.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list_visible().await?;
    Ok(Json(categories))
}
