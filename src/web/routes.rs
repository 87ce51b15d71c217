use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use libreforms_common::{
    Document, FormCatalog, FormDefinition, ValidationErrors, ValueKind, parse_form_fields,
};

use crate::config::SiteConfig;
use crate::errors::FormError;
use crate::store::{DocumentStore, StoredDocument};
use crate::views::{self, Figure, Table, line_chart, resolve_y};

use super::render::{self, FormView, Page, Section};

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub catalog: Arc<FormCatalog>,
    pub store: Arc<dyn DocumentStore>,
    pub site: SiteConfig,
    menu: Vec<String>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(catalog: Arc<FormCatalog>, store: Arc<dyn DocumentStore>, site: SiteConfig) -> Self {
        let menu = catalog.names();
        Self {
            catalog,
            store,
            site,
            menu,
        }
    }

    fn page<'a>(&'a self, title: &'a str, section: Section) -> Page<'a> {
        Page {
            site_name: &self.site.name,
            title,
            section,
            menu: &self.menu,
        }
    }

    fn form(&self, name: &str) -> Result<&FormDefinition, FormError> {
        self.catalog.get(name).ok_or_else(|| FormError::unknown(name))
    }

    fn error_page(&self, section: Section, err: FormError) -> ErrorPage {
        let status = if err.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            warn!(error = %err, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let html = render::not_found_page(&self.page(section.title(), section), &err.to_string());
        ErrorPage { status, html }
    }

    async fn records(&self, form: &FormDefinition) -> Result<Vec<Document>, FormError> {
        let documents = self
            .store
            .read_documents_from_collection(&form.name)
            .await
            .map_err(FormError::Store)?;
        Ok(documents
            .into_iter()
            .map(StoredDocument::into_record)
            .collect())
    }
}

// ── Error handling ────────────────────────────────────────────────────

/// An HTML error page with its status.
pub struct ErrorPage {
    status: StatusCode,
    html: String,
}

impl IntoResponse for ErrorPage {
    fn into_response(self) -> Response {
        (self.status, Html(self.html)).into_response()
    }
}

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<FormError> for ApiError {
    fn from(err: FormError) -> Self {
        match err {
            FormError::BadUpload(msg) => ApiError::BadRequest(format!("Invalid upload: {}", msg)),
            e if e.is_not_found() => ApiError::NotFound(e.to_string()),
            e => {
                warn!(error = %e, "API request failed");
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({"error": message}))).into_response()
    }
}

/// `{"field": ["message", ...]}` in field order.
fn errors_json(errors: &ValidationErrors) -> Value {
    let map: serde_json::Map<String, Value> = errors
        .iter()
        .map(|(field, messages)| (field.to_string(), json!(messages)))
        .collect();
    Value::Object(map)
}

// ── Router ────────────────────────────────────────────────────────────

pub fn app_router() -> Router<SharedState> {
    Router::new()
        .route("/", get(home))
        .route("/forms", get(forms_index))
        .route("/forms/", get(forms_index))
        .route("/forms/{name}", get(show_form).post(submit_form))
        .route("/forms/{name}/template.csv", get(csv_template))
        .route("/forms/{name}/upload", post(csv_upload))
        .route("/tables", get(tables_index))
        .route("/tables/", get(tables_index))
        .route("/tables/{name}", get(show_table))
        .route("/dashboards", get(dashboards_index))
        .route("/dashboards/", get(dashboards_index))
        .route("/dashboards/{name}", get(show_dashboard))
        .route("/api/dashboards/{name}", get(api_dashboard))
        .route("/api/forms/{name}/documents", get(api_documents))
        .route("/health", get(health_check))
}

/// Unmatched paths get the site's not-found page.
pub async fn not_found(State(state): State<SharedState>) -> ErrorPage {
    let html = render::not_found_page(
        &state.page("Not Found", Section::Home),
        "The page you requested does not exist.",
    );
    ErrorPage {
        status: StatusCode::NOT_FOUND,
        html,
    }
}

// ── Index pages ───────────────────────────────────────────────────────

async fn home(State(state): State<SharedState>) -> Html<String> {
    Html(render::index_page(
        &state.page("Home", Section::Home),
        &state.site.homepage_msg,
    ))
}

async fn forms_index(State(state): State<SharedState>) -> Html<String> {
    Html(render::index_page(
        &state.page("Form", Section::Forms),
        "Select a form from the left-hand menu.",
    ))
}

async fn tables_index(State(state): State<SharedState>) -> Html<String> {
    Html(render::index_page(
        &state.page("Table", Section::Tables),
        "Select a table from the left-hand menu.",
    ))
}

async fn dashboards_index(State(state): State<SharedState>) -> Html<String> {
    Html(render::index_page(
        &state.page("Dashboard", Section::Dashboards),
        "Select a dashboard from the left-hand menu.",
    ))
}

async fn health_check() -> &'static str {
    "ok"
}

// ── Forms ─────────────────────────────────────────────────────────────

async fn show_form(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Html<String>, ErrorPage> {
    let form = state
        .form(&name)
        .map_err(|e| state.error_page(Section::Forms, e))?;
    let view = FormView {
        show_form: true,
        ..FormView::default()
    };
    Ok(Html(render::form_page(
        &state.page(&form.name, Section::Forms),
        form,
        &view,
    )))
}

async fn submit_form(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, ErrorPage> {
    let form = state
        .form(&name)
        .map_err(|e| state.error_page(Section::Forms, e))?;
    let page = state.page(&form.name, Section::Forms);
    debug!(form = %form.name, pairs = pairs.len(), "Parsing submission");

    match parse_form_fields(form).parse(&pairs) {
        Ok(document) => {
            let stored = state
                .store
                .write_document_to_collection(document, &form.name)
                .await
                .map_err(|e| state.error_page(Section::Forms, FormError::Store(e)))?;
            info!(form = %form.name, id = %stored.id, "Stored submission");

            let notice = serde_json::to_string_pretty(&stored.body)
                .map_err(|e| state.error_page(Section::Forms, FormError::Encode(e)))?;
            let view = FormView {
                notice: Some(&notice),
                show_form: form.options().allow_repeat,
                ..FormView::default()
            };
            Ok(Html(render::form_page(&page, form, &view)).into_response())
        }
        Err(errors) => {
            warn!(form = %form.name, %errors, "Rejected submission");
            let view = FormView {
                submitted: Some(pairs.as_slice()),
                errors: Some(&errors),
                show_form: true,
                ..FormView::default()
            };
            Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render::form_page(&page, form, &view)),
            )
                .into_response())
        }
    }
}

async fn csv_template(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Response, ErrorPage> {
    let form = state
        .form(&name)
        .and_then(|form| {
            if form.options().allow_csv_templates {
                Ok(form)
            } else {
                Err(FormError::OptionDisabled {
                    name: form.name.clone(),
                    option: "_allow_csv_templates",
                })
            }
        })
        .map_err(|e| state.error_page(Section::Forms, e))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.csv\"", form.name),
            ),
        ],
        views::csv::template(form),
    )
        .into_response())
}

/// Bulk insert from a CSV body. Every row must validate or nothing is written.
async fn csv_upload(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    body: String,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let form = state.form(&name)?;
    if !form.options().allow_uploads {
        return Err(FormError::OptionDisabled {
            name: form.name.clone(),
            option: "_allow_uploads",
        }
        .into());
    }

    let schema = parse_form_fields(form);
    let records = views::csv::parse(&body).map_err(FormError::BadUpload)?;
    let rows = views::csv::records_to_pairs(&schema, &records).map_err(FormError::BadUpload)?;

    let mut documents = Vec::with_capacity(rows.len());
    let mut failures = Vec::new();
    for row in &rows {
        match schema.parse(&row.pairs) {
            Ok(document) => documents.push(document),
            Err(errors) => failures.push(json!({
                "line": row.line,
                "errors": errors_json(&errors),
            })),
        }
    }
    if !failures.is_empty() {
        warn!(form = %form.name, rejected = failures.len(), "Rejected upload");
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"inserted": 0, "errors": failures})),
        ));
    }

    let inserted = state
        .store
        .write_documents_to_collection(documents, &form.name)
        .await
        .map_err(FormError::Store)?;
    info!(form = %form.name, inserted, "Stored upload");
    Ok((StatusCode::CREATED, Json(json!({"inserted": inserted}))))
}

// ── Tables ────────────────────────────────────────────────────────────

/// Always renders; failures become a single "Error" row.
async fn show_table(State(state): State<SharedState>, Path(name): Path<String>) -> Html<String> {
    let table = match load_table(&state, &name).await {
        Ok(table) => table,
        Err(e) => {
            warn!(table = %name, error = %e, "Could not load table");
            Table::error(&e.to_string())
        }
    };
    Html(render::table_page(&state.page(&name, Section::Tables), &table))
}

async fn load_table(state: &AppState, name: &str) -> Result<Table, FormError> {
    let form = state.form(name)?;
    let records = state.records(form).await?;
    Ok(Table::from_records(&records, &form.field_names()))
}

// ── Dashboards ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub y: Option<String>,
}

struct Dashboard {
    figure: Figure,
    y: String,
    y_choices: Vec<String>,
}

async fn build_dashboard(
    state: &AppState,
    name: &str,
    y_override: Option<&str>,
) -> Result<Dashboard, FormError> {
    let form = state.form(name)?;
    let config = form
        .options()
        .dashboard
        .as_ref()
        .ok_or_else(|| FormError::NoDashboard {
            name: form.name.clone(),
        })?;
    let y = resolve_y(config, y_override).to_string();
    let records = state.records(form).await?;
    let figure = line_chart(&records, &config.x, &y, config.color.as_deref(), &form.name);

    let y_choices = parse_form_fields(form)
        .rules()
        .iter()
        .filter(|rule| matches!(rule.kind, ValueKind::Int | ValueKind::Float))
        .map(|rule| rule.name.clone())
        .collect();

    Ok(Dashboard {
        figure,
        y,
        y_choices,
    })
}

async fn show_dashboard(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Result<Html<String>, ErrorPage> {
    let dashboard = build_dashboard(&state, &name, query.y.as_deref())
        .await
        .map_err(|e| state.error_page(Section::Dashboards, e))?;
    let figure_json = serde_json::to_string(&dashboard.figure)
        .map_err(|e| state.error_page(Section::Dashboards, FormError::Encode(e)))?;
    Ok(Html(render::dashboard_page(
        &state.page(&name, Section::Dashboards),
        &figure_json,
        &dashboard.y,
        &dashboard.y_choices,
    )))
}

// ── JSON API ──────────────────────────────────────────────────────────

async fn api_dashboard(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Figure>, ApiError> {
    let dashboard = build_dashboard(&state, &name, query.y.as_deref()).await?;
    Ok(Json(dashboard.figure))
}

async fn api_documents(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Document>>, ApiError> {
    let form = state.form(&name)?;
    Ok(Json(state.records(form).await?))
}
