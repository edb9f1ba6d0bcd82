//! Routes and handlers shared by every entity collection
//!
//! ```text
//! GET  /{C}                 list (?page=&pageSizeID=)
//! GET  /{C}/Details/:id
//! GET  /{C}/Create          POST /{C}/Create
//! GET  /{C}/Edit/:id        POST /{C}/Edit/:id
//! GET  /{C}/Delete/:id      POST /{C}/Delete/:id
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use jobbank_domain::{CatalogEntity, EntityForm, EntityId, EntityStore, RowVersion};
use jobbank_usecase::{DeleteOutcome, EntityController, FormOutcome, ListQuery};

use super::extract::{issue_token, AntiForgeryForm, CookiePreferences, RequestCaller};
use super::response::ErrorResponse;
use super::CookieSettings;

type HandlerResult = Result<Response, ErrorResponse>;

/// Per-collection router state
pub struct EntityState<E, S> {
    controller: EntityController<E, S>,
    cookies: CookieSettings,
}

impl<E, S> Clone for EntityState<E, S> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            cookies: self.cookies,
        }
    }
}

/// Routes for one collection, mounted under `/{collection}`
pub fn entity_routes<E, S>(controller: EntityController<E, S>, cookies: CookieSettings) -> Router
where
    E: CatalogEntity,
    S: EntityStore<E> + 'static,
{
    let base = format!("/{}", controller.kind().collection());
    let state = EntityState {
        controller,
        cookies,
    };

    Router::new()
        .route(&base, get(list::<E, S>))
        .route(&format!("{base}/Details"), get(details::<E, S>))
        .route(&format!("{base}/Details/:id"), get(details::<E, S>))
        .route(
            &format!("{base}/Create"),
            get(create_form::<E, S>).post(create::<E, S>),
        )
        .route(&format!("{base}/Edit"), get(edit_form::<E, S>))
        .route(
            &format!("{base}/Edit/:id"),
            get(edit_form::<E, S>).post(edit::<E, S>),
        )
        .route(&format!("{base}/Delete"), get(delete_form::<E, S>))
        .route(
            &format!("{base}/Delete/:id"),
            get(delete_form::<E, S>).post(delete::<E, S>),
        )
        .with_state(state)
}

// ========== Request / response shapes ==========

/// List query string; unparsable numbers are treated as absent
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    page: Option<String>,
    #[serde(rename = "pageSizeID")]
    page_size_id: Option<String>,
}

impl ListParams {
    fn into_query(self) -> ListQuery {
        let number = |raw: Option<String>| raw.and_then(|value| value.trim().parse::<u32>().ok());
        ListQuery {
            page: number(self.page),
            page_size: number(self.page_size_id),
        }
    }
}

/// The only fields a create/edit submission may bind
#[derive(Debug, Default, Deserialize)]
pub struct EntityInput {
    #[serde(rename = "Name", alias = "name", default)]
    name: String,
    #[serde(rename = "RowVersion", alias = "rowVersion", default)]
    row_version: Option<String>,
}

impl EntityInput {
    /// The posted version, if any. A non-numeric version can never match
    /// a stored row (versions start at 1), so it is posted as 0.
    fn version(&self) -> Option<RowVersion> {
        let raw = self.row_version.as_deref().map(str::trim)?;
        if raw.is_empty() {
            return None;
        }
        Some(RowVersion::parse(raw).unwrap_or(RowVersion::new(0)))
    }

    fn into_form(self) -> EntityForm {
        EntityForm::new(self.name)
    }
}

/// A delete confirmation carries nothing but the token
#[derive(Debug, Default, Deserialize)]
pub struct DeleteConfirmation {}

/// A form view plus the token to post back with it
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormPage<V> {
    anti_forgery_token: String,
    #[serde(flatten)]
    view: V,
}

fn entity_id(path: Option<Path<String>>) -> Option<EntityId> {
    path.and_then(|Path(raw)| EntityId::parse(&raw))
}

fn form_page<V: Serialize>(jar: CookieJar, cookies: CookieSettings, view: V) -> Response {
    let (jar, token) = issue_token(jar, cookies);
    (
        jar,
        Json(FormPage {
            anti_forgery_token: token,
            view,
        }),
    )
        .into_response()
}

fn redisplay<V: Serialize>(status: StatusCode, token: String, view: V) -> Response {
    (
        status,
        Json(FormPage {
            anti_forgery_token: token,
            view,
        }),
    )
        .into_response()
}

fn form_outcome(outcome: FormOutcome, token: String) -> Response {
    match outcome {
        FormOutcome::Saved { location } => Redirect::to(&location).into_response(),
        FormOutcome::Invalid(view) => redisplay(StatusCode::UNPROCESSABLE_ENTITY, token, view),
    }
}

// ========== Handlers ==========

async fn list<E, S>(
    State(state): State<EntityState<E, S>>,
    RequestCaller(caller): RequestCaller,
    Query(params): Query<ListParams>,
    jar: CookieJar,
) -> HandlerResult
where
    E: CatalogEntity,
    S: EntityStore<E> + 'static,
{
    let mut prefs = CookiePreferences::new(jar, state.cookies);
    let view = state
        .controller
        .list(&caller, params.into_query(), &mut prefs)
        .await?;
    Ok((prefs.into_jar(), Json(view)).into_response())
}

async fn details<E, S>(
    State(state): State<EntityState<E, S>>,
    RequestCaller(caller): RequestCaller,
    path: Option<Path<String>>,
) -> HandlerResult
where
    E: CatalogEntity,
    S: EntityStore<E> + 'static,
{
    let view = state.controller.details(&caller, entity_id(path)).await?;
    Ok(Json(view).into_response())
}

async fn create_form<E, S>(
    State(state): State<EntityState<E, S>>,
    RequestCaller(caller): RequestCaller,
    jar: CookieJar,
) -> HandlerResult
where
    E: CatalogEntity,
    S: EntityStore<E> + 'static,
{
    let view = state.controller.create_form(&caller)?;
    Ok(form_page(jar, state.cookies, view))
}

async fn create<E, S>(
    State(state): State<EntityState<E, S>>,
    RequestCaller(caller): RequestCaller,
    AntiForgeryForm { token, value }: AntiForgeryForm<EntityInput>,
) -> HandlerResult
where
    E: CatalogEntity,
    S: EntityStore<E> + 'static,
{
    let outcome = state.controller.create(&caller, value.into_form()).await?;
    Ok(form_outcome(outcome, token))
}

async fn edit_form<E, S>(
    State(state): State<EntityState<E, S>>,
    RequestCaller(caller): RequestCaller,
    path: Option<Path<String>>,
    jar: CookieJar,
) -> HandlerResult
where
    E: CatalogEntity,
    S: EntityStore<E> + 'static,
{
    let view = state.controller.edit_form(&caller, entity_id(path)).await?;
    Ok(form_page(jar, state.cookies, view))
}

async fn edit<E, S>(
    State(state): State<EntityState<E, S>>,
    RequestCaller(caller): RequestCaller,
    path: Option<Path<String>>,
    AntiForgeryForm { token, value }: AntiForgeryForm<EntityInput>,
) -> HandlerResult
where
    E: CatalogEntity,
    S: EntityStore<E> + 'static,
{
    let version = value.version();
    let outcome = state
        .controller
        .edit(&caller, entity_id(path), value.into_form(), version)
        .await?;
    Ok(form_outcome(outcome, token))
}

async fn delete_form<E, S>(
    State(state): State<EntityState<E, S>>,
    RequestCaller(caller): RequestCaller,
    path: Option<Path<String>>,
    jar: CookieJar,
) -> HandlerResult
where
    E: CatalogEntity,
    S: EntityStore<E> + 'static,
{
    let view = state.controller.delete_form(&caller, entity_id(path)).await?;
    Ok(form_page(jar, state.cookies, view))
}

async fn delete<E, S>(
    State(state): State<EntityState<E, S>>,
    RequestCaller(caller): RequestCaller,
    path: Option<Path<String>>,
    AntiForgeryForm { token, .. }: AntiForgeryForm<DeleteConfirmation>,
) -> HandlerResult
where
    E: CatalogEntity,
    S: EntityStore<E> + 'static,
{
    match state.controller.delete(&caller, entity_id(path)).await? {
        DeleteOutcome::Deleted { location } => Ok(Redirect::to(&location).into_response()),
        DeleteOutcome::Blocked(view) => Ok(redisplay(StatusCode::CONFLICT, token, view)),
    }
}
