use axum::{Json, extract::State};

use resona_core::InvoiceId;

use crate::db::InvoiceRepository;
use crate::error::{AppError, Result};
use crate::extract::PathParam;
use crate::models::Invoice;
use crate::state::AppState;

pub async fn show(
    State(state): State<AppState>,
    PathParam(id): PathParam<InvoiceId>,
) -> Result<Json<Invoice>> {
    InvoiceRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("invoice {id}")))
}
