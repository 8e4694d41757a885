//! Error types and fragment rendering for failed requests.
//!
//! Handlers return [`AppError`]; its response carries the error in an
//! extension, and [`render_error_fragment`] turns that into the dialog
//! fragment once the renderer is at hand. Recoverable item errors become a
//! dialog with a 404/409 status. Anything else is logged and replaced with
//! the generic server-error fragment.

use std::any::Any;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

use crate::item::ItemError;
use crate::render::{RenderError, Renderer};
use crate::store::StoreError;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl AppError {
    /// The recoverable item error, if this is one.
    pub fn item_error(&self) -> Option<&ItemError> {
        match self {
            AppError::Store(err) => err.as_item_error(),
            AppError::Render(_) => None,
        }
    }

    /// Map error variant to appropriate HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self.item_error() {
            Some(ItemError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Some(ItemError::NotInEditState { .. }) => StatusCode::CONFLICT,
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        if let Some(err) = self.item_error() {
            return err.error_type();
        }
        match self {
            AppError::Store(StoreError::Database(_)) => "database_error",
            AppError::Store(StoreError::CorruptRow { .. }) => "corrupt_row",
            AppError::Store(StoreError::Migration { .. }) => "migration_error",
            AppError::Store(StoreError::Item(_)) => "item_error",
            AppError::Render(_) => "render_error",
        }
    }
}

/// Marker left on the response for [`render_error_fragment`].
#[derive(Clone)]
struct FailedRequest(Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut response = self.status_code().into_response();
        response
            .extensions_mut()
            .insert(FailedRequest(Arc::new(self)));
        response
    }
}

/// Response mapper that fills in the body of failed requests.
pub async fn render_error_fragment(
    State(renderer): State<Arc<Renderer>>,
    mut response: Response,
) -> Response {
    let Some(FailedRequest(err)) = response.extensions_mut().remove::<FailedRequest>() else {
        return response;
    };
    error_fragment(&renderer, &err)
}

fn error_fragment(renderer: &Renderer, err: &AppError) -> Response {
    let status = err.status_code();
    let body = match err.item_error() {
        Some(item_err) => {
            tracing::warn!(
                id = item_err.item_id(),
                error_type = item_err.error_type(),
                "{}",
                item_err
            );
            renderer.item_error(item_err)
        }
        None => {
            tracing::error!(error_type = err.error_type(), "Request failed: {}", err);
            renderer.server_error()
        }
    };

    match body {
        Ok(html) => (status, Html(html)).into_response(),
        Err(render_err) => {
            tracing::error!("Failed to render error fragment: {}", render_err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Handler for `CatchPanicLayer`: a panicking request gets the server-error fragment.
pub fn panic_fragment(
    renderer: Arc<Renderer>,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone + Send + Sync + 'static {
    move |panic: Box<dyn Any + Send + 'static>| {
        let detail = panic
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| panic.downcast_ref::<&str>().copied())
            .unwrap_or("unknown panic");
        tracing::error!("Request handler panicked: {}", detail);

        match renderer.server_error() {
            Ok(html) => (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}
