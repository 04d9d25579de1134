//! Item instance route handlers.
//!
//! Instances have no list page or image; they are listed on their item's
//! detail page, and the create form is reached from there with the item
//! preselected (`/iteminstance/create?itemid=N`).

use askama::Template;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use catalog_core::ItemInstanceId;

use crate::error::AppError;
use crate::filters;
use crate::models::{Item, ItemFilter, ItemInstance, ItemInstanceDetail, ItemInstanceForm};
use crate::services::catalog::{FieldError, FormValues};
use crate::state::AppState;

use super::{ChoiceView, after_write, confirm_delete, delete_page, parse_id, render};

/// Query parameters for the create form.
#[derive(Debug, Default, Deserialize)]
pub struct CreateQuery {
    /// Item to preselect.
    pub itemid: Option<String>,
}

/// Item instance detail template.
#[derive(Template)]
#[template(path = "item_instances/detail.html")]
pub struct ItemInstanceDetailTemplate {
    pub title: String,
    pub detail: ItemInstanceDetail,
}

/// Item instance create/update form template.
///
/// `values` are already HTML-escaped.
#[derive(Template)]
#[template(path = "item_instances/form.html")]
pub struct ItemInstanceFormTemplate {
    pub title: String,
    pub action: String,
    pub values: ItemInstanceForm,
    pub errors: Vec<FieldError>,
    pub items: Vec<ChoiceView>,
}

/// Render the instance form with item choices loaded.
async fn render_form(
    state: &AppState,
    title: &str,
    action: String,
    values: ItemInstanceForm,
    errors: Vec<FieldError>,
) -> Result<Response, AppError> {
    let items = state.catalog().list::<Item>(&ItemFilter::default()).await?;
    let selected = [values.item.clone()];
    let template = ItemInstanceFormTemplate {
        title: title.to_string(),
        action,
        items: ChoiceView::from_records(&items, &selected),
        values,
        errors,
    };
    Ok(render(&template)?.into_response())
}

/// Item instance detail handler.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id: ItemInstanceId = parse_id(&id)?;
    let detail = state.catalog().detail::<ItemInstance>(id).await?;
    render(&ItemInstanceDetailTemplate {
        title: format!("Product instance: {}", detail.item.title),
        detail,
    })
}

/// Empty instance form, optionally with the item preselected.
#[instrument(skip(state))]
pub async fn create_form(
    State(state): State<AppState>,
    Query(query): Query<CreateQuery>,
) -> Result<Response, AppError> {
    let values = ItemInstanceForm {
        item: query.itemid.unwrap_or_default(),
        ..ItemInstanceForm::default()
    }
    .escaped();
    render_form(
        &state,
        "Create Product Instance",
        "/iteminstance/create".to_string(),
        values,
        Vec::new(),
    )
    .await
}

/// Create an item instance.
#[instrument(skip(state, form))]
pub async fn create(
    State(state): State<AppState>,
    Form(form): Form<ItemInstanceForm>,
) -> Result<Response, AppError> {
    let outcome = state.catalog().create::<ItemInstance>(form, None).await?;

    match after_write::<ItemInstance>(outcome) {
        Ok(response) => Ok(response),
        Err((errors, values)) => {
            render_form(
                &state,
                "Create Product Instance",
                "/iteminstance/create".to_string(),
                values,
                errors,
            )
            .await
        }
    }
}

/// Instance form pre-filled with the stored values.
#[instrument(skip(state))]
pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: ItemInstanceId = parse_id(&id)?;
    let instance = state.catalog().get::<ItemInstance>(id).await?;
    render_form(
        &state,
        "Update Product Instance",
        format!("{}/update", instance.detail_path()),
        ItemInstanceForm::from(&instance).escaped(),
        Vec::new(),
    )
    .await
}

/// Update an item instance.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<ItemInstanceForm>,
) -> Result<Response, AppError> {
    let id: ItemInstanceId = parse_id(&id)?;
    let outcome = state
        .catalog()
        .update::<ItemInstance>(id, form, None)
        .await?;

    match after_write::<ItemInstance>(outcome) {
        Ok(response) => Ok(response),
        Err((errors, values)) => {
            let path = format!("/iteminstance/{id}/update");
            render_form(&state, "Update Product Instance", path, values, errors).await
        }
    }
}

/// Item instance delete confirmation.
#[instrument(skip(state))]
pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    delete_page::<ItemInstance>(&state, &id).await
}

/// Delete an item instance; the operator returns to the item's page.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    confirm_delete::<ItemInstance>(&state, &id).await
}
