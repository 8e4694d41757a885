//! HTML rendering for pages and htmx fragments.

mod templates;

use serde::Serialize;
use thiserror::Error;

use crate::item::{ItemError, ItemState, ListItem};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to parse template '{name}': {source}")]
    Parse {
        name: &'static str,
        #[source]
        source: liquid::Error,
    },

    #[error("Failed to render template '{name}': {source}")]
    Render {
        name: &'static str,
        #[source]
        source: liquid::Error,
    },
}

struct NamedTemplate {
    name: &'static str,
    template: liquid::Template,
}

impl NamedTemplate {
    fn parse(
        parser: &liquid::Parser,
        name: &'static str,
        source: &str,
    ) -> Result<Self, RenderError> {
        let template = parser
            .parse(source)
            .map_err(|source| RenderError::Parse { name, source })?;
        Ok(Self { name, template })
    }

    fn render<T: Serialize>(&self, context: &T) -> Result<String, RenderError> {
        let name = self.name;
        let globals =
            liquid::to_object(context).map_err(|source| RenderError::Render { name, source })?;
        self.template
            .render(&globals)
            .map_err(|source| RenderError::Render { name, source })
    }
}

#[derive(Serialize)]
struct ItemContext<'a> {
    item: &'a ListItem,
}

#[derive(Serialize)]
struct AdminContext<'a> {
    items: &'a [ListItem],
    states: Vec<&'static str>,
}

#[derive(Serialize)]
struct ListContext {
    rows_html: Vec<String>,
}

#[derive(Serialize)]
struct PageContext {
    list_html: String,
    stylesheet: bool,
}

#[derive(Serialize)]
struct ItemErrorContext {
    error_type: &'static str,
    message: String,
}

#[derive(Serialize)]
struct EmptyContext {}

/// Parsed templates, shared by all request handlers.
pub struct Renderer {
    page: NamedTemplate,
    list: NamedTemplate,
    todo: NamedTemplate,
    edit: NamedTemplate,
    done: NamedTemplate,
    item_error: NamedTemplate,
    server_error: NamedTemplate,
    admin: NamedTemplate,
    stylesheet: bool,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(|source| RenderError::Parse {
                name: "parser",
                source,
            })?;

        Ok(Self {
            page: NamedTemplate::parse(&parser, "page", templates::PAGE)?,
            list: NamedTemplate::parse(&parser, "list", templates::LIST)?,
            todo: NamedTemplate::parse(&parser, "item_todo", templates::ITEM_TODO)?,
            edit: NamedTemplate::parse(&parser, "item_edit", templates::ITEM_EDIT)?,
            done: NamedTemplate::parse(&parser, "item_done", templates::ITEM_DONE)?,
            item_error: NamedTemplate::parse(&parser, "item_error", templates::ITEM_ERROR)?,
            server_error: NamedTemplate::parse(&parser, "server_error", templates::SERVER_ERROR)?,
            admin: NamedTemplate::parse(&parser, "admin", templates::ADMIN)?,
            stylesheet: false,
        })
    }

    /// Link `/static/style.css` from the page. Only set when `/static` is served.
    pub fn with_stylesheet(mut self, enabled: bool) -> Self {
        self.stylesheet = enabled;
        self
    }

    /// Full page with the list embedded.
    pub fn page(&self, items: &[ListItem]) -> Result<String, RenderError> {
        let list_html = self.list(items)?;
        self.page.render(&PageContext {
            list_html,
            stylesheet: self.stylesheet,
        })
    }

    /// The `#todo-list` fragment.
    pub fn list(&self, items: &[ListItem]) -> Result<String, RenderError> {
        let rows_html = items
            .iter()
            .map(|item| self.item(item))
            .collect::<Result<Vec<_>, _>>()?;
        self.list.render(&ListContext { rows_html })
    }

    /// One item, drawn according to its state.
    pub fn item(&self, item: &ListItem) -> Result<String, RenderError> {
        let template = match item.state {
            ItemState::Todo => &self.todo,
            ItemState::Edit => &self.edit,
            ItemState::Done => &self.done,
        };
        template.render(&ItemContext { item })
    }

    pub fn item_error(&self, err: &ItemError) -> Result<String, RenderError> {
        let message = match err {
            ItemError::NotFound { id } => {
                format!("Item {id} no longer exists. It may have been deleted.")
            }
            ItemError::NotInEditState { id, .. } => {
                format!("Item {id} is not being edited. Open it for editing first.")
            }
        };
        self.item_error.render(&ItemErrorContext {
            error_type: err.error_type(),
            message,
        })
    }

    pub fn server_error(&self) -> Result<String, RenderError> {
        self.server_error.render(&EmptyContext {})
    }

    /// Table of every row, with state and delete controls.
    pub fn admin(&self, items: &[ListItem]) -> Result<String, RenderError> {
        self.admin.render(&AdminContext {
            items,
            states: ItemState::ALL.iter().map(ItemState::as_str).collect(),
        })
    }
}
