//! Route table and handlers.

use std::path::Path;
use std::sync::Arc;

use axum::extract::{Path as UrlPath, State};
use axum::middleware;
use axum::response::{Html, Redirect};
use axum::routing::{delete, get, patch, post};
use axum::{Form, Router};
use serde::Deserialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::item::{ItemId, ItemState};
use crate::render::Renderer;
use crate::server::error::{panic_fragment, render_error_fragment, AppError};
use crate::server::health::health;
use crate::store::ItemStore;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ItemStore>,
    pub renderer: Arc<Renderer>,
}

impl AppState {
    pub fn new(store: Arc<dyn ItemStore>, renderer: Arc<Renderer>) -> Self {
        Self { store, renderer }
    }
}

#[derive(Debug, Deserialize)]
pub struct TextForm {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct StateForm {
    pub state: ItemState,
}

const ADMIN_ITEMS: &str = "/admin/items";

type HtmlResult = Result<Html<String>, AppError>;

pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let renderer = state.renderer.clone();

    let mut router = Router::new()
        .route("/", get(get_list))
        .route("/item/", post(create_item))
        .route("/item/{id}", delete(delete_item))
        .route("/item/{id}/edit", get(begin_edit).patch(save_text))
        .route("/item/{id}/done", patch(mark_done))
        .route("/item/{id}/undo", patch(mark_undone))
        .route(ADMIN_ITEMS, get(admin_items))
        .route("/admin/items/{id}/state", post(admin_set_state))
        .route("/admin/items/{id}/delete", post(admin_delete))
        .route("/health", get(health));

    if let Some(dir) = static_dir {
        router = router.nest_service("/static", ServeDir::new(dir));
    }

    router
        .layer(middleware::map_response_with_state(
            renderer.clone(),
            render_error_fragment,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_fragment(renderer)))
        .with_state(state)
}

async fn get_list(State(state): State<AppState>) -> HtmlResult {
    let items = state.store.list_all().await?;
    Ok(Html(state.renderer.page(&items)?))
}

async fn create_item(State(state): State<AppState>, Form(form): Form<TextForm>) -> HtmlResult {
    let item = state.store.create(&form.text).await?;
    tracing::info!(id = item.id, "Item created");
    Ok(Html(state.renderer.item(&item)?))
}

async fn delete_item(State(state): State<AppState>, UrlPath(id): UrlPath<ItemId>) -> HtmlResult {
    state.store.delete(id).await?;
    let items = state.store.list_all().await?;
    Ok(Html(state.renderer.list(&items)?))
}

async fn begin_edit(State(state): State<AppState>, UrlPath(id): UrlPath<ItemId>) -> HtmlResult {
    transition(&state, id, ItemState::Edit).await
}

async fn save_text(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<ItemId>,
    Form(form): Form<TextForm>,
) -> HtmlResult {
    let item = state.store.set_text(id, &form.text).await?;
    Ok(Html(state.renderer.item(&item)?))
}

async fn mark_done(State(state): State<AppState>, UrlPath(id): UrlPath<ItemId>) -> HtmlResult {
    transition(&state, id, ItemState::Done).await
}

async fn mark_undone(State(state): State<AppState>, UrlPath(id): UrlPath<ItemId>) -> HtmlResult {
    transition(&state, id, ItemState::Todo).await
}

async fn transition(state: &AppState, id: ItemId, to: ItemState) -> HtmlResult {
    let item = state.store.set_state(id, to).await?;
    Ok(Html(state.renderer.item(&item)?))
}

async fn admin_items(State(state): State<AppState>) -> HtmlResult {
    let items = state.store.list_all().await?;
    Ok(Html(state.renderer.admin(&items)?))
}

async fn admin_set_state(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<ItemId>,
    Form(form): Form<StateForm>,
) -> Result<Redirect, AppError> {
    state.store.set_state(id, form.state).await?;
    tracing::info!(id, state = %form.state, "Admin changed item state");
    Ok(Redirect::to(ADMIN_ITEMS))
}

async fn admin_delete(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<ItemId>,
) -> Result<Redirect, AppError> {
    state.store.delete(id).await?;
    tracing::info!(id, "Admin deleted item");
    Ok(Redirect::to(ADMIN_ITEMS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ListItem;
    use crate::store::MemoryItemStore;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> (Router, MemoryItemStore) {
        let store = MemoryItemStore::new();
        let state = AppState::new(
            Arc::new(store.clone()),
            Arc::new(Renderer::new().unwrap()),
        );
        (build_router(state, None), store)
    }

    async fn send(app: &Router, method: Method, uri: &str, form: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match form {
            Some(form) => {
                builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn seed(store: &MemoryItemStore, text: &str, state: ItemState) -> ListItem {
        let item = store.create(text).await.unwrap();
        store.set_state(item.id, state).await.unwrap()
    }

    #[tokio::test]
    async fn index_renders_full_page() {
        let (app, store) = app();
        seed(&store, "Buy milk", ItemState::Todo).await;

        let (status, body) = send(&app, Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<!DOCTYPE html>"));
        assert!(body.contains("Buy milk"));
    }

    #[tokio::test]
    async fn post_creates_todo_item() {
        let (app, store) = app();

        let (status, body) = send(&app, Method::POST, "/item/", Some("text=Buy+milk")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("item-todo"));
        assert!(body.contains("Buy milk"));

        let items = store.list_all().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].state, ItemState::Todo);
    }

    #[tokio::test]
    async fn post_without_text_is_rejected() {
        let (app, store) = app();
        let (status, _) = send(&app, Method::POST, "/item/", Some("other=1")).await;
        assert!(status.is_client_error());
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_returns_remaining_list() {
        let (app, store) = app();
        let gone = seed(&store, "Gone", ItemState::Todo).await;
        seed(&store, "Stays", ItemState::Done).await;

        let (status, body) = send(&app, Method::DELETE, &format!("/item/{}", gone.id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<ul id="todo-list">"#));
        assert!(!body.contains("Gone"));
        assert!(body.contains("Stays"));
    }

    #[tokio::test]
    async fn delete_of_missing_item_is_ok() {
        let (app, _store) = app();
        let (status, _) = send(&app, Method::DELETE, "/item/99", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn edit_cycle_through_routes() {
        let (app, store) = app();
        let item = seed(&store, "Buy milk", ItemState::Todo).await;
        let base = format!("/item/{}", item.id);

        let (status, body) = send(&app, Method::GET, &format!("{base}/edit"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("item-edit"));

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("{base}/edit"),
            Some("text=Buy+oat+milk"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("item-todo"));
        assert!(body.contains("Buy oat milk"));

        let (status, body) = send(&app, Method::PATCH, &format!("{base}/done"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("item-done"));

        let (status, body) = send(&app, Method::PATCH, &format!("{base}/undo"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("item-todo"));

        let stored = store.get(item.id).await.unwrap().unwrap();
        assert_eq!(stored.text, "Buy oat milk");
        assert_eq!(stored.state, ItemState::Todo);
    }

    #[tokio::test]
    async fn saving_text_outside_edit_is_conflict() {
        let (app, store) = app();
        let item = seed(&store, "Buy milk", ItemState::Done).await;

        let (status, body) = send(
            &app,
            Method::PATCH,
            &format!("/item/{}/edit", item.id),
            Some("text=changed"),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert!(body.contains(r#"data-error="item_not_in_edit_state""#));

        let stored = store.get(item.id).await.unwrap().unwrap();
        assert_eq!(stored.text, "Buy milk");
        assert_eq!(stored.state, ItemState::Done);
    }

    #[tokio::test]
    async fn unknown_item_renders_not_found_dialog() {
        let (app, _store) = app();
        for (method, uri, form) in [
            (Method::GET, "/item/7/edit", None),
            (Method::PATCH, "/item/7/edit", Some("text=x")),
            (Method::PATCH, "/item/7/done", None),
            (Method::PATCH, "/item/7/undo", None),
        ] {
            let (status, body) = send(&app, method, uri, form).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert!(body.contains(r#"data-error="item_not_found""#), "{uri}");
        }
    }

    #[tokio::test]
    async fn created_text_is_escaped() {
        let (app, _store) = app();
        let (_, body) = send(
            &app,
            Method::POST,
            "/item/",
            Some("text=%3Cscript%3Ealert(1)%3C%2Fscript%3E"),
        )
        .await;
        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn admin_lists_rows() {
        let (app, store) = app();
        seed(&store, "one", ItemState::Todo).await;
        seed(&store, "two", ItemState::Edit).await;

        let (status, body) = send(&app, Method::GET, "/admin/items", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("2 item(s)"));
        assert!(body.contains("<td>edit</td>"));
    }

    #[tokio::test]
    async fn admin_changes_state_and_redirects() {
        let (app, store) = app();
        let item = seed(&store, "one", ItemState::Todo).await;

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/admin/items/{}/state", item.id),
            Some("state=done"),
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert_eq!(
            store.get(item.id).await.unwrap().unwrap().state,
            ItemState::Done
        );

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/admin/items/{}/state", item.id),
            Some("state=archived"),
        )
        .await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn admin_deletes_and_redirects() {
        let (app, store) = app();
        let item = seed(&store, "one", ItemState::Edit).await;

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/admin/items/{}/delete", item.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::SEE_OTHER);
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admin_state_change_of_missing_item_is_not_found() {
        let (app, _store) = app();
        let (status, body) =
            send(&app, Method::POST, "/admin/items/42/state", Some("state=todo")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains(r#"data-error="item_not_found""#));
    }

    #[tokio::test]
    async fn health_reports_service() {
        let (app, _store) = app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "todolist");
    }

    #[tokio::test]
    async fn static_dir_is_served_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body { margin: 0; }").unwrap();

        let state = AppState::new(
            Arc::new(MemoryItemStore::new()),
            Arc::new(Renderer::new().unwrap()),
        );
        let app = build_router(state, Some(dir.path()));

        let (status, body) = send(&app, Method::GET, "/static/style.css", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "body { margin: 0; }");
    }
}
