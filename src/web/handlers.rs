use super::{AppState, Result, WebError};
use crate::core::Result as TrackerResult;
use crate::facade::ProgressTracker;
use crate::stats::{CalendarDay, ChartSeries, ProgressSummary};
use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::response::Redirect;
use serde::{Deserialize, Serialize};
use std::num::ParseIntError;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default, Deserialize)]
pub struct TotalForm {
    #[serde(default)]
    pub total: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GoalForm {
    #[serde(default)]
    pub goal: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub question_number: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

/// Missing or blank fields are absent; anything else must parse.
fn parse_optional_int(raw: Option<&str>) -> std::result::Result<Option<i64>, ParseIntError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<i64>().map(Some),
    }
}

/// Run a tracker call on the blocking pool; the store does synchronous file
/// I/O.
async fn with_tracker<R, F>(state: &AppState, call: F) -> Result<R>
where
    F: FnOnce(&ProgressTracker) -> TrackerResult<R> + Send + 'static,
    R: Send + 'static,
{
    let tracker = Arc::clone(&state.tracker);
    tokio::task::spawn_blocking(move || call(tracker.as_ref()))
        .await
        .map_err(|e| WebError::Internal(format!("tracker task failed: {e}")))?
        .map_err(WebError::from)
}

fn back_to_index() -> Redirect {
    Redirect::to("/")
}

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn index(State(state): State<AppState>) -> Result<Json<ProgressSummary>> {
    let summary = with_tracker(&state, |tracker| tracker.summary()).await?;
    Ok(Json(summary))
}

pub async fn set_total(
    State(state): State<AppState>,
    form: std::result::Result<Form<TotalForm>, FormRejection>,
) -> Result<Redirect> {
    let Some(total) = form.ok().and_then(|Form(form)| parse_int(&form.total)) else {
        debug!("ignoring malformed total");
        return Ok(back_to_index());
    };

    with_tracker(&state, move |tracker| tracker.set_total(total.max(0))).await?;
    Ok(back_to_index())
}

pub async fn set_daily_goal(
    State(state): State<AppState>,
    form: std::result::Result<Form<GoalForm>, FormRejection>,
) -> Result<Redirect> {
    let Some(goal) = form.ok().and_then(|Form(form)| parse_int(&form.goal)) else {
        debug!("ignoring malformed daily goal");
        return Ok(back_to_index());
    };

    with_tracker(&state, move |tracker| tracker.set_daily_goal(goal)).await?;
    Ok(back_to_index())
}

pub async fn add(
    State(state): State<AppState>,
    form: std::result::Result<Form<AddForm>, FormRejection>,
) -> Result<Redirect> {
    // A bare POST with no form body records at the next position.
    let form = form.map(|Form(form)| form).unwrap_or_default();
    let (page, item_number) = match (
        parse_optional_int(form.page.as_deref()),
        parse_optional_int(form.question_number.as_deref()),
    ) {
        (Ok(page), Ok(item_number)) => (page, item_number),
        _ => {
            debug!(?form, "ignoring malformed add");
            return Ok(back_to_index());
        }
    };

    with_tracker(&state, move |tracker| tracker.record_now(page, item_number)).await?;
    Ok(back_to_index())
}

pub async fn reset(State(state): State<AppState>) -> Result<Redirect> {
    with_tracker(&state, |tracker| tracker.reset()).await?;
    Ok(back_to_index())
}

pub async fn chart_data(State(state): State<AppState>) -> Result<Json<ChartSeries>> {
    let series = with_tracker(&state, |tracker| tracker.chart_series()).await?;
    Ok(Json(series))
}

pub async fn calendar(State(state): State<AppState>) -> Result<Json<Vec<CalendarDay>>> {
    let days = with_tracker(&state, |tracker| tracker.calendar_data()).await?;
    Ok(Json(days))
}
