//! HTTP handlers for update management.

use super::AppState;
use crate::update::{QueryStatus, StartUpdate, UpdateError, UpdateResult, UpdateStatus};
use actix_web::{error, AsyncResponder, FutureResponse, HttpRequest, HttpResponse, ResponseError};
use futures::prelude::*;

/// Reply body for status queries.
#[derive(Debug, Serialize)]
pub(crate) struct StatusReply {
    pub(crate) status: &'static str,
    pub(crate) result: Option<UpdateResult>,
}

impl<'a> From<&'a UpdateStatus> for StatusReply {
    fn from(status: &'a UpdateStatus) -> Self {
        Self {
            status: status.label(),
            result: status.result().cloned(),
        }
    }
}

/// Reply body for failed requests.
#[derive(Debug, Serialize)]
struct ErrorReply {
    error: &'static str,
    message: String,
}

impl ResponseError for UpdateError {
    fn error_response(&self) -> HttpResponse {
        let body = ErrorReply {
            error: self.kind(),
            message: self.to_string(),
        };
        match self {
            UpdateError::AlreadyInProgress => HttpResponse::Conflict().json(body),
            _ => {
                error!("update request failed: {}", self);
                HttpResponse::InternalServerError().json(body)
            }
        }
    }
}

/// `GET /api/update`: report update status.
pub(crate) fn get_update(req: &HttpRequest<AppState>) -> FutureResponse<HttpResponse> {
    req.state()
        .manager
        .send(QueryStatus {})
        .map_err(error::ErrorInternalServerError)
        .and_then(|res| res.map_err(Into::into))
        .map(|status| HttpResponse::Ok().json(StatusReply::from(&status)))
        .responder()
}

/// `PUT /api/update`: launch a new update.
pub(crate) fn put_update(req: &HttpRequest<AppState>) -> FutureResponse<HttpResponse> {
    req.state()
        .manager
        .send(StartUpdate {})
        .map_err(error::ErrorInternalServerError)
        .and_then(|res| res.map_err(Into::into))
        .map(|_| HttpResponse::Accepted().finish())
        .responder()
}
