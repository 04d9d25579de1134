//! HTTP route handlers for the catalog admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//! GET  /health/ready                    - Store readiness check
//!
//! GET  /                                - Catalog overview (categories + counts)
//!
//! GET  /brand                           - Brand list
//! GET  /brand/create                    - Brand form
//! POST /brand/create                    - Create brand
//! GET  /brand/{id}                      - Brand detail with its items
//! GET  /brand/{id}/update               - Brand form, pre-filled
//! POST /brand/{id}/update               - Update brand
//! GET  /brand/{id}/delete               - Delete confirmation
//! POST /brand/{id}/delete               - Delete brand
//! GET  /brand/{id}/image                - Brand image
//!
//! (same shape for /category and /item)
//!
//! GET  /iteminstance/create?itemid=N    - Instance form
//! POST /iteminstance/create             - Create instance
//! GET  /iteminstance/{id}               - Instance detail
//! GET  /iteminstance/{id}/update        - Instance form, pre-filled
//! POST /iteminstance/{id}/update        - Update instance
//! GET  /iteminstance/{id}/delete        - Delete confirmation
//! POST /iteminstance/{id}/delete        - Delete instance
//!
//! GET  /static/*                        - Stylesheet
//! ```
//!
//! Successful writes answer `303 See Other` pointing at the record's detail
//! page. Malformed ids answer `400`, unknown ids `404`.

pub mod brands;
pub mod categories;
pub mod health;
pub mod home;
pub mod item_instances;
pub mod items;
pub mod upload;

use std::str::FromStr;

use askama::Template;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use catalog_core::{IdParseError, StoredImage};

use crate::error::AppError;
use crate::filters;
use crate::services::catalog::{
    BlockReason, CatalogEntity, ConfirmOutcome, DeleteGate, FieldError, WriteOutcome,
};
use crate::state::AppState;

/// Build the catalog routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Overview (also the category list)
        .route("/", get(home::index))
        // Brands
        .route("/brand", get(brands::index))
        .route("/brand/create", get(brands::create_form).post(brands::create))
        .route("/brand/{id}", get(brands::show))
        .route("/brand/{id}/update", get(brands::update_form).post(brands::update))
        .route("/brand/{id}/delete", get(brands::delete_form).post(brands::delete))
        .route("/brand/{id}/image", get(brands::image))
        // Categories
        .route("/category", get(categories::index))
        .route(
            "/category/create",
            get(categories::create_form).post(categories::create),
        )
        .route("/category/{id}", get(categories::show))
        .route(
            "/category/{id}/update",
            get(categories::update_form).post(categories::update),
        )
        .route(
            "/category/{id}/delete",
            get(categories::delete_form).post(categories::delete),
        )
        .route("/category/{id}/image", get(categories::image))
        // Items
        .route("/item", get(items::index))
        .route("/item/create", get(items::create_form).post(items::create))
        .route("/item/{id}", get(items::show))
        .route("/item/{id}/update", get(items::update_form).post(items::update))
        .route("/item/{id}/delete", get(items::delete_form).post(items::delete))
        .route("/item/{id}/image", get(items::image))
        // Item instances
        .route(
            "/iteminstance/create",
            get(item_instances::create_form).post(item_instances::create),
        )
        .route("/iteminstance/{id}", get(item_instances::show))
        .route(
            "/iteminstance/{id}/update",
            get(item_instances::update_form).post(item_instances::update),
        )
        .route(
            "/iteminstance/{id}/delete",
            get(item_instances::delete_form).post(item_instances::delete),
        )
}

/// The complete application: routes, static files, body limit and request
/// tracing, bound to `state`.
pub fn app(state: AppState) -> Router {
    let static_dir = state.config().static_dir.clone();
    let max_upload_bytes = state.config().max_upload_bytes;

    Router::new()
        .merge(routes())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Render a template, mapping failures to a 500.
pub(crate) fn render<T: Template>(template: &T) -> Result<Html<String>, AppError> {
    template.render().map(Html).map_err(|e| {
        tracing::error!("Template render error: {}", e);
        AppError::Internal(format!("template render failed: {e}"))
    })
}

/// Parse an id path segment; garbage is a 400, never a 404.
pub(crate) fn parse_id<I>(raw: &str) -> Result<I, AppError>
where
    I: FromStr<Err = IdParseError>,
{
    Ok(raw.parse()?)
}

/// Serve a stored image with its recorded content type, or 404.
pub(crate) fn serve_image(image: Option<&StoredImage>) -> Result<Response, AppError> {
    let image = image.ok_or_else(|| AppError::NotFound("image".to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type.clone()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        image.data.clone(),
    )
        .into_response())
}

/// See-other redirect to a path.
pub(crate) fn redirect(path: &str) -> Response {
    Redirect::to(path).into_response()
}

/// Where to send the operator after a successful write.
///
/// Returns `Err` with the failed submission when the write was rejected.
pub(crate) fn after_write<T: CatalogEntity>(
    outcome: WriteOutcome<T::Id, T::Form>,
) -> Result<Response, (Vec<FieldError>, T::Form)> {
    match outcome {
        WriteOutcome::Created(id) | WriteOutcome::Updated(id) | WriteOutcome::Existing(id) => {
            Ok(redirect(&T::KIND.detail_path(id)))
        }
        WriteOutcome::Invalid(failed) => Err((failed.errors, failed.values)),
    }
}

/// One `<option>` or checkbox in a form.
#[derive(Debug, Clone)]
pub struct ChoiceView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl ChoiceView {
    /// Build choices from records, marking those whose id is in `selected`.
    pub fn from_records<T: CatalogEntity>(records: &[T], selected: &[String]) -> Vec<Self> {
        records
            .iter()
            .map(|record| {
                let value = record.id().to_string();
                Self {
                    selected: selected.contains(&value),
                    label: record.label().to_string(),
                    value,
                }
            })
            .collect()
    }
}

/// A link to a record.
#[derive(Debug, Clone)]
pub struct LinkView {
    pub label: String,
    pub path: String,
}

impl LinkView {
    pub fn of<T: CatalogEntity>(record: &T) -> Self {
        Self {
            label: record.label().to_string(),
            path: record.detail_path(),
        }
    }
}

/// Delete confirmation page, shared by every kind.
#[derive(Template)]
#[template(path = "delete.html")]
pub struct DeleteTemplate {
    pub title: String,
    pub kind: &'static str,
    pub record: LinkView,
    pub protected: bool,
    pub child_kind: &'static str,
    pub children: Vec<LinkView>,
}

impl DeleteTemplate {
    fn new<T: CatalogEntity>(
        record: &T,
        children: &[T::Child],
        reason: Option<BlockReason>,
    ) -> Self {
        Self {
            title: format!("Delete {}", T::KIND.label()),
            kind: T::KIND.label(),
            record: LinkView::of(record),
            protected: reason == Some(BlockReason::Protected),
            child_kind: <T::Child as CatalogEntity>::KIND.label(),
            children: children.iter().map(LinkView::of).collect(),
        }
    }
}

/// `GET /{kind}/{id}/delete`: show what the delete gate decided.
pub(crate) async fn delete_page<T: CatalogEntity>(
    state: &AppState,
    raw_id: &str,
) -> Result<Response, AppError> {
    let id: T::Id = parse_id(raw_id)?;
    match state.catalog().request_delete::<T>(id).await? {
        DeleteGate::ClearToDelete(record) => {
            Ok(render(&DeleteTemplate::new(&record, &[], None))?.into_response())
        }
        DeleteGate::Blocked(blocked) => Ok(render(&DeleteTemplate::new(
            &blocked.record,
            &blocked.children,
            Some(blocked.reason),
        ))?
        .into_response()),
        DeleteGate::Absent => Ok(redirect(T::KIND.list_path())),
    }
}

/// `POST /{kind}/{id}/delete`: delete if the gate is still clear.
pub(crate) async fn confirm_delete<T: CatalogEntity>(
    state: &AppState,
    raw_id: &str,
) -> Result<Response, AppError> {
    let id: T::Id = parse_id(raw_id)?;
    match state.catalog().confirm_delete::<T>(id).await? {
        ConfirmOutcome::Deleted(record) => Ok(redirect(&record.after_delete_path())),
        ConfirmOutcome::Absent => Ok(redirect(T::KIND.list_path())),
        ConfirmOutcome::Blocked(blocked) => match blocked.redirect_path() {
            Some(path) => Ok(redirect(&path)),
            None => Ok(render(&DeleteTemplate::new(
                &blocked.record,
                &blocked.children,
                Some(blocked.reason),
            ))?
            .into_response()),
        },
    }
}

/// `GET /{kind}/{id}/image`.
pub(crate) async fn image_of<T: CatalogEntity>(
    state: &AppState,
    raw_id: &str,
) -> Result<Response, AppError> {
    let id: T::Id = parse_id(raw_id)?;
    let record = state.catalog().get::<T>(id).await?;
    serve_image(record.image())
}
