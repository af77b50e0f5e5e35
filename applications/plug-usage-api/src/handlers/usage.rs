use axum::{
    extract::{Query, State},
    response::Json,
};

use super::AppState;
use crate::error::{AppError, Result};
use crate::models::{UsageQueryParams, UsageReportResponse};

pub async fn get_daily(
    State(state): State<AppState>,
    Query(params): Query<UsageQueryParams>,
) -> Result<Json<UsageReportResponse>> {
    let device_id = required("device_id", params.device_id)?;
    let start_date = required("start_date", params.start_date)?;
    let end_date = required("end_date", params.end_date)?;

    let report = state
        .usage
        .daily_usage(&device_id, &start_date, &end_date)
        .await?;
    Ok(Json(UsageReportResponse::from(&report)))
}

fn required(name: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| AppError::MalformedInput(format!("missing query parameter: {}", name)))
}
