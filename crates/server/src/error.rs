use alfafin_gas::GasError;
use alfafin_parse::PurchaseError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Purchase(#[from] PurchaseError),
    #[error("{0}")]
    Gas(#[from] GasError),
    #[error("Sender is not allowed")]
    Forbidden,
    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Purchase(e) => e.kind(),
            ApiError::Gas(_) => "remote_ledger",
            ApiError::Forbidden => "forbidden",
            ApiError::BadRequest(_) => "bad_request",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Purchase(PurchaseError::RateLookupFailure(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Purchase(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Gas(_) => StatusCode::BAD_GATEWAY,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

impl From<&ApiError> for ErrorBody {
    fn from(e: &ApiError) -> Self {
        ErrorBody { error: e.to_string(), kind: e.kind() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::from(&self))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
