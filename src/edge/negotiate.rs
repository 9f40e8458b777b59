use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::edge::{ByteStream, StartOutcome};
use crate::errors::AppError;

pub fn negotiate(outcome: Result<StartOutcome, AppError>) -> Response {
    match outcome {
        Ok(StartOutcome::Response(response)) => response,
        Ok(StartOutcome::Stream(stream)) => event_stream(stream),
        Ok(StartOutcome::Json(value)) if value.is_object() => {
            (StatusCode::OK, Json(value)).into_response()
        }
        Ok(StartOutcome::Json(_)) => AppError::UnexpectedResultShape.into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn event_stream(stream: ByteStream) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}
