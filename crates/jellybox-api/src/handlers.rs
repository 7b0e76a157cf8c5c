//! REST endpoint handlers.
//!
//! Every box command settles the box to the current time before acting,
//! so each response carries the events that settlement produced.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness probe |
//! | `GET` | `/api/boxes/{platform}/{user_id}` | Settle and show a box |
//! | `POST` | `/api/boxes/{platform}/{user_id}/catch` | Catch jellyfish |
//! | `POST` | `/api/boxes/{platform}/{user_id}/release` | Release jellyfish |
//! | `GET` | `/api/boxes/{platform}/{user_id}/statistics` | Per-group counts |
//! | `PUT` | `/api/boxes/{platform}/{user_id}/style` | Change box style |
//! | `GET` | `/api/catalogue` | Species list (`?platform=&user_id=` for owned counts) |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use jellybox_core::{BoxRepository, Quantity, ReleaseRequest};
use jellybox_types::{
    BoxKey, BoxReport, CatalogueEntry, CatchReport, ReleaseReport, StatisticsReport,
};

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST .../release`.
///
/// Either the raw command tokens as typed in chat, or structured requests.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReleaseBody {
    /// `{"tokens": ["moon_jelly", "3", "great", "all"]}`
    Tokens {
        /// Alternating names and optional quantities.
        tokens: Vec<String>,
    },
    /// `{"requests": [{"name": "moon_jelly", "quantity": 3}]}`
    Requests {
        /// One entry per species or group.
        requests: Vec<ReleaseItem>,
    },
}

/// One structured release request.
#[derive(Debug, Deserialize)]
pub struct ReleaseItem {
    /// Species id, species name or group tag.
    pub name: String,
    /// Count or an "all" synonym. Defaults to one.
    #[serde(default)]
    pub quantity: Option<QuantityInput>,
}

/// A quantity as sent over JSON.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    /// A JSON number.
    Number(serde_json::Number),
    /// A JSON string: a number or an "all" synonym.
    Text(String),
}

impl ReleaseItem {
    fn into_request(self, all_synonyms: &[String]) -> ReleaseRequest {
        let quantity = match self.quantity {
            None => Quantity::Count(1),
            Some(input) => {
                let token = match input {
                    QuantityInput::Number(n) => n.to_string(),
                    QuantityInput::Text(s) => s,
                };
                Quantity::from_token(token.trim(), all_synonyms)
                    .unwrap_or(Quantity::Invalid(token))
            }
        };
        ReleaseRequest::new(self.name, quantity)
    }
}

/// Body of `PUT .../style`.
#[derive(Debug, Deserialize)]
pub struct StyleBody {
    /// Style tag to switch to.
    pub style: String,
}

/// Query parameters for `GET /api/catalogue`.
#[derive(Debug, Deserialize)]
pub struct CatalogueQuery {
    /// Platform of the box whose owned counts to include.
    pub platform: Option<String>,
    /// User of the box whose owned counts to include.
    pub user_id: Option<String>,
}

fn box_key((platform, user_id): (String, String)) -> Result<BoxKey, ApiError> {
    if platform.trim().is_empty() || user_id.trim().is_empty() {
        return Err(ApiError::InvalidRequest(
            "platform and user_id must not be empty".to_owned(),
        ));
    }
    Ok(BoxKey::new(user_id, platform))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Settle a box and return it with the events that occurred.
pub async fn open_box<R: BoxRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(path): Path<(String, String)>,
) -> Result<Json<BoxReport>, ApiError> {
    let key = box_key(path)?;
    Ok(Json(state.service.open(&key, Utc::now()).await?))
}

/// Catch jellyfish into a box.
pub async fn catch<R: BoxRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(path): Path<(String, String)>,
) -> Result<Json<CatchReport>, ApiError> {
    let key = box_key(path)?;
    Ok(Json(state.service.catch(&key, Utc::now()).await?))
}

/// Release jellyfish from a box. All-or-nothing.
pub async fn release<R: BoxRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(path): Path<(String, String)>,
    Json(body): Json<ReleaseBody>,
) -> Result<Json<ReleaseReport>, ApiError> {
    let key = box_key(path)?;
    let now = Utc::now();
    let report = match body {
        ReleaseBody::Tokens { tokens } => {
            state.service.release_tokens(&key, &tokens, now).await?
        }
        ReleaseBody::Requests { requests } => {
            let synonyms = &state.service.config().release.all_synonyms;
            let requests: Vec<ReleaseRequest> = requests
                .into_iter()
                .map(|item| item.into_request(synonyms))
                .collect();
            state.service.release(&key, &requests, now).await?
        }
    };
    Ok(Json(report))
}

/// Settle a box and return per-group and per-species counts.
pub async fn statistics<R: BoxRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(path): Path<(String, String)>,
) -> Result<Json<StatisticsReport>, ApiError> {
    let key = box_key(path)?;
    Ok(Json(state.service.statistics(&key, Utc::now()).await?))
}

/// Change a box's presentation style.
pub async fn set_style<R: BoxRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(path): Path<(String, String)>,
    Json(body): Json<StyleBody>,
) -> Result<Json<BoxReport>, ApiError> {
    let key = box_key(path)?;
    Ok(Json(
        state
            .service
            .set_style(&key, body.style.trim(), Utc::now())
            .await?,
    ))
}

/// List the species catalogue, optionally with a box's owned counts.
pub async fn catalogue<R: BoxRepository + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Query(params): Query<CatalogueQuery>,
) -> Result<Json<Vec<CatalogueEntry>>, ApiError> {
    let key = match (params.platform, params.user_id) {
        (Some(platform), Some(user_id)) => Some(box_key((platform, user_id))?),
        (None, None) => None,
        _ => {
            return Err(ApiError::InvalidRequest(
                "platform and user_id must be given together".to_owned(),
            ));
        }
    };
    Ok(Json(
        state.service.catalogue(key.as_ref(), Utc::now()).await?,
    ))
}
