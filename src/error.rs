// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Washline

//! API error responses.
//!
//! Handlers return `Result<Json<T>, ApiError>`; the conversion from
//! [`DbError`] decides the HTTP status each storage failure maps to.
//! Internal storage details are never echoed to the client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::DbError;

/// An API error with an HTTP status and a client-facing message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(what) => ApiError::not_found(what),
            DbError::AccountNotFound(id) => ApiError::not_found(format!("account {id} not found")),
            DbError::EmptyBasket => {
                ApiError::unprocessable("basket is empty or was already settled")
            }
            DbError::InsufficientQuota { required, available } => ApiError::unprocessable(format!(
                "insufficient wash quota: need {required}, have {available}"
            )),
            DbError::DomainRejected(email) => {
                ApiError::forbidden(format!("{email} is outside the allowed domain"))
            }
            DbError::NotOwner(what) => {
                ApiError::forbidden(format!("{what} belongs to another account"))
            }
            DbError::InvalidItem(reason) => ApiError::bad_request(reason),
            other => {
                tracing::error!(error = %other, "storage failure");
                ApiError::internal("storage failure")
            }
        }
    }
}
