//! Category route handlers.
//!
//! Categories are also listed, with item counts, on the overview page.

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Response},
};
use tracing::instrument;

use catalog_core::CategoryId;

use crate::error::AppError;
use crate::filters;
use crate::models::{Category, CategoryDetail, CategoryFilter, CategoryForm};
use crate::services::catalog::{FieldError, FormValues};
use crate::state::AppState;

use super::upload::Submission;
use super::{after_write, confirm_delete, delete_page, image_of, parse_id, render};

/// Category list template.
#[derive(Template)]
#[template(path = "categories/list.html")]
pub struct CategoryListTemplate {
    pub title: String,
    pub categories: Vec<Category>,
}

/// Category detail template.
#[derive(Template)]
#[template(path = "categories/detail.html")]
pub struct CategoryDetailTemplate {
    pub title: String,
    pub detail: CategoryDetail,
}

/// Category create/update form template.
///
/// `values` are already HTML-escaped.
#[derive(Template)]
#[template(path = "categories/form.html")]
pub struct CategoryFormTemplate {
    pub title: String,
    pub action: String,
    pub values: CategoryForm,
    pub errors: Vec<FieldError>,
    pub current_image: Option<String>,
}

fn form_from(submission: &Submission) -> CategoryForm {
    CategoryForm {
        name: submission.text("name"),
        description: submission.text("description"),
    }
}

fn image_label(category: &Category) -> Option<String> {
    category
        .image
        .as_ref()
        .map(|img| format!("{} ({})", img.file_name, img.size_label()))
}

/// Category list handler.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let categories = state
        .catalog()
        .list::<Category>(&CategoryFilter::default())
        .await?;
    render(&CategoryListTemplate {
        title: "Category List".to_string(),
        categories,
    })
}

/// Category detail handler.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id: CategoryId = parse_id(&id)?;
    let detail = state.catalog().detail::<Category>(id).await?;
    render(&CategoryDetailTemplate {
        title: format!("Category: {}", detail.category.name),
        detail,
    })
}

/// Empty category form.
#[instrument]
pub async fn create_form() -> Result<Html<String>, AppError> {
    render(&CategoryFormTemplate {
        title: "Create Category".to_string(),
        action: "/category/create".to_string(),
        values: CategoryForm::default(),
        errors: Vec::new(),
        current_image: None,
    })
}

/// Create a category from a multipart submission.
#[instrument(skip(state, multipart))]
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut submission = Submission::read(multipart).await?;
    let image = submission.take_image();
    let outcome = state
        .catalog()
        .create::<Category>(form_from(&submission), image)
        .await?;

    match after_write::<Category>(outcome) {
        Ok(response) => Ok(response),
        Err((errors, values)) => Ok(render(&CategoryFormTemplate {
            title: "Create Category".to_string(),
            action: "/category/create".to_string(),
            values,
            errors,
            current_image: None,
        })?
        .into_response()),
    }
}

/// Category form pre-filled with the stored values.
#[instrument(skip(state))]
pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id: CategoryId = parse_id(&id)?;
    let category = state.catalog().get::<Category>(id).await?;
    render(&CategoryFormTemplate {
        title: "Update Category".to_string(),
        action: format!("{}/update", category.detail_path()),
        values: CategoryForm::from(&category).escaped(),
        errors: Vec::new(),
        current_image: image_label(&category),
    })
}

/// Update a category from a multipart submission.
#[instrument(skip(state, multipart))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let id: CategoryId = parse_id(&id)?;
    let mut submission = Submission::read(multipart).await?;
    let image = submission.take_image();
    let outcome = state
        .catalog()
        .update::<Category>(id, form_from(&submission), image)
        .await?;

    match after_write::<Category>(outcome) {
        Ok(response) => Ok(response),
        Err((errors, values)) => {
            let category = state.catalog().get::<Category>(id).await?;
            Ok(render(&CategoryFormTemplate {
                title: "Update Category".to_string(),
                action: format!("{}/update", category.detail_path()),
                values,
                errors,
                current_image: image_label(&category),
            })?
            .into_response())
        }
    }
}

/// Category delete confirmation.
#[instrument(skip(state))]
pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    delete_page::<Category>(&state, &id).await
}

/// Delete a category.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    confirm_delete::<Category>(&state, &id).await
}

/// Category image.
#[instrument(skip(state))]
pub async fn image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    image_of::<Category>(&state, &id).await
}
