//! Endpoint handlers, one module per resource.
//!
//! Handlers take the shared state and a fully read request and return an
//! [`ApiResponse`](crate::http::ApiResponse); the router decides which one
//! runs.

pub mod audit;
pub mod auth;
pub mod cases;
pub mod health;
pub mod interactions;
pub mod participants;
pub mod reports;
pub mod schemas;
pub mod summary;
pub mod tasks;

use casewise_core::responses::DeletedResponse;

use crate::error::ApiError;
use crate::http::ApiResponse;

pub(crate) fn deleted(id: &str) -> Result<ApiResponse, ApiError> {
    ApiResponse::ok(&DeletedResponse {
        id: id.to_string(),
        deleted: true,
    })
}
