//! View models handed to the presentation layer

use jobbank_domain::{
    CatalogEntity, EntityForm, EntityKind, FieldError, PagedResult, PAGE_SIZE_OPTIONS,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView {
    pub id: i64,
    pub name: String,
    pub row_version: i64,
}

impl EntityView {
    pub fn from_entity<E: CatalogEntity>(entity: &E) -> Self {
        Self {
            id: entity.id().value(),
            name: entity.name().to_string(),
            row_version: entity.row_version().value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub kind: &'static str,
    pub items: Vec<EntityView>,
    pub page_index: u32,
    pub total_pages: u32,
    pub total_count: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
    pub page_size: u32,
    pub page_size_options: Vec<u32>,
}

impl ListView {
    pub fn from_page<E: CatalogEntity>(page: PagedResult<E>) -> Self {
        let page = page.map(|entity| EntityView::from_entity(&entity));

        Self {
            kind: E::KIND.display_name(),
            page_index: page.page_index(),
            total_pages: page.total_pages(),
            total_count: page.total_count(),
            has_previous_page: page.has_previous_page(),
            has_next_page: page.has_next_page(),
            page_size: page.page_size().value(),
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
            items: page.into_items(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldErrorView {
    /// `None` for errors about the whole form
    pub field: Option<&'static str>,
    pub message: String,
}

impl From<FieldError> for FieldErrorView {
    fn from(error: FieldError) -> Self {
        Self {
            field: error.field,
            message: error.message,
        }
    }
}

/// Create/edit form, including what the user typed when redisplayed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub kind: &'static str,
    pub id: Option<i64>,
    pub name: String,
    pub row_version: Option<i64>,
    pub errors: Vec<FieldErrorView>,
}

impl FormView {
    pub fn blank(kind: EntityKind) -> Self {
        Self {
            kind: kind.display_name(),
            id: None,
            name: String::new(),
            row_version: None,
            errors: Vec::new(),
        }
    }

    pub fn for_entity<E: CatalogEntity>(entity: &E) -> Self {
        Self {
            kind: E::KIND.display_name(),
            id: Some(entity.id().value()),
            name: entity.name().to_string(),
            row_version: Some(entity.row_version().value()),
            errors: Vec::new(),
        }
    }

    /// Keep the submitted values and attach errors
    pub fn with_submission(mut self, form: &EntityForm, errors: Vec<FieldError>) -> Self {
        self.name = form.name.clone();
        self.errors = errors.into_iter().map(FieldErrorView::from).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteView {
    pub kind: &'static str,
    pub entity: EntityView,
    pub error: Option<String>,
}

impl DeleteView {
    pub fn for_entity<E: CatalogEntity>(entity: &E) -> Self {
        Self {
            kind: E::KIND.display_name(),
            entity: EntityView::from_entity(entity),
            error: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}
