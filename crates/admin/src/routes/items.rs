//! Item (product) route handlers.

use askama::Template;
use axum::{
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse, Response},
};
use tracing::instrument;

use catalog_core::ItemId;

use crate::error::AppError;
use crate::filters;
use crate::models::{
    Brand, BrandFilter, Category, CategoryFilter, Item, ItemDetail, ItemFilter, ItemForm,
};
use crate::services::catalog::{FieldError, FormValues};
use crate::state::AppState;

use super::upload::Submission;
use super::{ChoiceView, after_write, confirm_delete, delete_page, image_of, parse_id, render};

/// Item list template.
#[derive(Template)]
#[template(path = "items/list.html")]
pub struct ItemListTemplate {
    pub title: String,
    pub items: Vec<Item>,
}

/// Item detail template.
#[derive(Template)]
#[template(path = "items/detail.html")]
pub struct ItemDetailTemplate {
    pub title: String,
    pub detail: ItemDetail,
}

/// Item create/update form template.
///
/// `values` are already HTML-escaped.
#[derive(Template)]
#[template(path = "items/form.html")]
pub struct ItemFormTemplate {
    pub title: String,
    pub action: String,
    pub values: ItemForm,
    pub errors: Vec<FieldError>,
    pub brands: Vec<ChoiceView>,
    pub categories: Vec<ChoiceView>,
    pub current_image: Option<String>,
}

/// Everything a form page needs besides the values.
struct FormPage {
    title: &'static str,
    action: String,
    current_image: Option<String>,
}

fn form_from(submission: &Submission) -> ItemForm {
    ItemForm {
        title: submission.text("title"),
        description: submission.text("description"),
        product_id: submission.text("product_id"),
        brand: submission.text("brand"),
        category: submission.all("category"),
    }
}

fn image_label(item: &Item) -> Option<String> {
    item.image
        .as_ref()
        .map(|img| format!("{} ({})", img.file_name, img.size_label()))
}

/// Render the item form with brand and category choices loaded.
async fn render_form(
    state: &AppState,
    page: FormPage,
    values: ItemForm,
    errors: Vec<FieldError>,
) -> Result<Response, AppError> {
    let catalog = state.catalog();
    let category_filter = CategoryFilter::default();
    let (brands, categories) = tokio::try_join!(
        catalog.list::<Brand>(&BrandFilter),
        catalog.list::<Category>(&category_filter),
    )?;

    let selected_brand = [values.brand.clone()];
    let template = ItemFormTemplate {
        title: page.title.to_string(),
        action: page.action,
        brands: ChoiceView::from_records(&brands, &selected_brand),
        categories: ChoiceView::from_records(&categories, &values.category),
        values,
        errors,
        current_image: page.current_image,
    };
    Ok(render(&template)?.into_response())
}

/// Item list handler.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let items = state.catalog().list::<Item>(&ItemFilter::default()).await?;
    render(&ItemListTemplate {
        title: "Product List".to_string(),
        items,
    })
}

/// Item detail handler.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let id: ItemId = parse_id(&id)?;
    let detail = state.catalog().detail::<Item>(id).await?;
    render(&ItemDetailTemplate {
        title: format!("Product: {}", detail.item.title),
        detail,
    })
}

/// Empty item form.
#[instrument(skip(state))]
pub async fn create_form(State(state): State<AppState>) -> Result<Response, AppError> {
    let page = FormPage {
        title: "Create Product",
        action: "/item/create".to_string(),
        current_image: None,
    };
    render_form(&state, page, ItemForm::default(), Vec::new()).await
}

/// Create an item from a multipart submission.
#[instrument(skip(state, multipart))]
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut submission = Submission::read(multipart).await?;
    let image = submission.take_image();
    let outcome = state
        .catalog()
        .create::<Item>(form_from(&submission), image)
        .await?;

    match after_write::<Item>(outcome) {
        Ok(response) => Ok(response),
        Err((errors, values)) => {
            let page = FormPage {
                title: "Create Product",
                action: "/item/create".to_string(),
                current_image: None,
            };
            render_form(&state, page, values, errors).await
        }
    }
}

/// Item form pre-filled with the stored values.
#[instrument(skip(state))]
pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id: ItemId = parse_id(&id)?;
    let item = state.catalog().get::<Item>(id).await?;
    let page = FormPage {
        title: "Update Product",
        action: format!("{}/update", item.detail_path()),
        current_image: image_label(&item),
    };
    render_form(&state, page, ItemForm::from(&item).escaped(), Vec::new()).await
}

/// Update an item from a multipart submission.
#[instrument(skip(state, multipart))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let id: ItemId = parse_id(&id)?;
    let mut submission = Submission::read(multipart).await?;
    let image = submission.take_image();
    let outcome = state
        .catalog()
        .update::<Item>(id, form_from(&submission), image)
        .await?;

    match after_write::<Item>(outcome) {
        Ok(response) => Ok(response),
        Err((errors, values)) => {
            let item = state.catalog().get::<Item>(id).await?;
            let page = FormPage {
                title: "Update Product",
                action: format!("{}/update", item.detail_path()),
                current_image: image_label(&item),
            };
            render_form(&state, page, values, errors).await
        }
    }
}

/// Item delete confirmation.
#[instrument(skip(state))]
pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    delete_page::<Item>(&state, &id).await
}

/// Delete an item.
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    confirm_delete::<Item>(&state, &id).await
}

/// Item image.
#[instrument(skip(state))]
pub async fn image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    image_of::<Item>(&state, &id).await
}
