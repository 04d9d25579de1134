//! Catalog overview page.

use askama::Template;
use axum::{extract::State, response::Html};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::services::catalog::CatalogOverview;
use crate::state::AppState;

use super::render;

/// Overview page template: every category with its item count.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub title: String,
    pub overview: CatalogOverview,
}

/// Overview handler (`GET /`).
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let overview = state.catalog().overview().await?;
    render(&IndexTemplate {
        title: "Catalog".to_string(),
        overview,
    })
}
