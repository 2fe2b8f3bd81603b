use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use services::{AppServices, PracticeServiceError};
use wellness_core::model::{IncrementOutcome, PosePath, PracticeEntry, TimeRange, TimelineSummary};

use crate::error::ApiError;
use crate::extract::AuthUser;

#[derive(Debug, Default, Deserialize)]
pub struct YogaQuery {
    pub view: Option<String>,
    pub range: Option<String>,
}

/// Body of a practice record; ids are checked by `PosePath::parse`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPracticeRequest {
    pub pose_id: Option<String>,
    pub category_id: Option<String>,
    pub sub_category_id: Option<String>,
    pub sub_sub_category_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub success: bool,
    pub practices: Vec<PracticeEntry>,
    pub summary: TimelineSummary,
}

/// `GET /api/yoga`: the sunburst, the full tree, or (by default) the timeline.
pub async fn get_yoga(
    State(services): State<AppServices>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<YogaQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    match query.view.as_deref() {
        Some("sunburst") => {
            let projection = services
                .practice()
                .sunburst(user_id)
                .await
                .map_err(|err| match err {
                    PracticeServiceError::NotFound => {
                        ApiError::NotFound("No sunburst data found".into())
                    }
                    other => other.into(),
                })?;
            Ok(DataResponse::ok(projection).into_response())
        }
        Some("tree") => {
            let tree = services.practice().tree(user_id).await?;
            Ok(DataResponse::ok(tree).into_response())
        }
        None | Some("timeline") => {
            let range = match query.range.as_deref() {
                Some(raw) => raw.parse::<TimeRange>()?,
                None => TimeRange::default(),
            };
            let (practices, summary) = services.timeline().list(user_id, range).await?;
            Ok(Json(TimelineResponse {
                success: true,
                practices,
                summary,
            })
            .into_response())
        }
        Some(other) => Err(ApiError::BadRequest(format!("unknown view: {other}"))),
    }
}

/// `POST /api/yoga`: record one practice of a pose.
pub async fn record_practice(
    State(services): State<AppServices>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<RecordPracticeRequest>, JsonRejection>,
) -> Result<Json<DataResponse<IncrementOutcome>>, ApiError> {
    let Json(request) = payload?;
    let path = PosePath::parse(
        request.category_id.as_deref(),
        request.sub_category_id.as_deref(),
        request.sub_sub_category_id.as_deref(),
        request.pose_id.as_deref(),
    )?;
    let outcome = services.practice().record_practice(user_id, &path).await?;
    Ok(DataResponse::ok(outcome))
}
