//! Brand route handlers.

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Response},
};
use tracing::instrument;

use catalog_core::BrandId;

use crate::error::AppError;
use crate::filters;
use crate::models::{Brand, BrandDetail, BrandFilter, BrandForm};
use crate::services::catalog::{FieldError, FormValues};
use crate::state::AppState;

use super::upload::Submission;
use super::{after_write, confirm_delete, delete_page, image_of, parse_id, render};

/// Brand list template.
#[derive(Template)]
#[template(path = "brands/list.html")]
pub struct BrandListTemplate {
    pub title: String,
    pub brands: Vec<Brand>,
}

/// Brand detail template.
#[derive(Template)]
#[template(path = "brands/detail.html")]
pub struct BrandDetailTemplate {
    pub title: String,
    pub detail: BrandDetail,
}

/// Brand create/update form template.
///
/// `values` are already HTML-escaped.
#[derive(Template)]
#[template(path = "brands/form.html")]
pub struct BrandFormTemplate {
    pub title: String,
    pub action: String,
    pub values: BrandForm,
    pub errors: Vec<FieldError>,
    pub current_image: Option<String>,
}

fn form_from(submission: &Submission) -> BrandForm {
    BrandForm {
        name: submission.text("name"),
        description: submission.text("description"),
        location: submission.text("location"),
    }
}

fn image_label(brand: &Brand) -> Option<String> {
    brand
        .image
        .as_ref()
        .map(|img| format!("{} ({})", img.file_name, img.size_label()))
}

/// Brand list handler.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let brands = state.catalog().list::<Brand>(&BrandFilter).await?;
    render(&BrandListTemplate {
        title: "Brand List".to_string(),
        brands,
    })
}

/// Brand detail handler.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id: BrandId = parse_id(&id)?;
    let detail = state.catalog().detail::<Brand>(id).await?;
    render(&BrandDetailTemplate {
        title: format!("Brand: {}", detail.brand.name),
        detail,
    })
}

/// Empty brand form.
#[instrument]
pub async fn create_form() -> Result<Html<String>, AppError> {
    render(&BrandFormTemplate {
        title: "Create Brand".to_string(),
        action: "/brand/create".to_string(),
        values: BrandForm::default(),
        errors: Vec::new(),
        current_image: None,
    })
}

/// Create a brand from a multipart submission.
#[instrument(skip(state, multipart))]
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut submission = Submission::read(multipart).await?;
    let image = submission.take_image();
    let outcome = state
        .catalog()
        .create::<Brand>(form_from(&submission), image)
        .await?;

    match after_write::<Brand>(outcome) {
        Ok(response) => Ok(response),
        Err((errors, values)) => Ok(render(&BrandFormTemplate {
            title: "Create Brand".to_string(),
            action: "/brand/create".to_string(),
            values,
            errors,
            current_image: None,
        })?
        .into_response()),
    }
}

/// Brand form pre-filled with the stored values.
#[instrument(skip(state))]
pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id: BrandId = parse_id(&id)?;
    let brand = state.catalog().get::<Brand>(id).await?;
    render(&BrandFormTemplate {
        title: "Update Brand".to_string(),
        action: format!("{}/update", brand.detail_path()),
        values: BrandForm::from(&brand).escaped(),
        errors: Vec::new(),
        current_image: image_label(&brand),
    })
}

/// Update a brand from a multipart submission.
#[instrument(skip(state, multipart))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let id: BrandId = parse_id(&id)?;
    let mut submission = Submission::read(multipart).await?;
    let image = submission.take_image();
    let outcome = state
        .catalog()
        .update::<Brand>(id, form_from(&submission), image)
        .await?;

    match after_write::<Brand>(outcome) {
        Ok(response) => Ok(response),
        Err((errors, values)) => {
            let brand = state.catalog().get::<Brand>(id).await?;
            Ok(render(&BrandFormTemplate {
                title: "Update Brand".to_string(),
                action: format!("{}/update", brand.detail_path()),
                values,
                errors,
                current_image: image_label(&brand),
            })?
            .into_response())
        }
    }
}

/// Brand delete confirmation.
#[instrument(skip(state))]
pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    delete_page::<Brand>(&state, &id).await
}

/// Delete a brand.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    confirm_delete::<Brand>(&state, &id).await
}

/// Brand image.
#[instrument(skip(state))]
pub async fn image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    image_of::<Brand>(&state, &id).await
}
