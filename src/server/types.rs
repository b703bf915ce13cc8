//! API request state and response bodies.

use crate::menu::AggregatedMenu;
use crate::scan::MenuScanner;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default request body limit: 50 MB.
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub scanner: Arc<MenuScanner>,
}

/// `200 { success: true, data: { name, categories } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadMenuResponse {
    pub success: bool,
    pub data: AggregatedMenu,
}

impl UploadMenuResponse {
    pub fn ok(data: AggregatedMenu) -> Self {
        Self { success: true, data }
    }
}

/// `500 { success: false, message }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub message: String,
}

impl FailureResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
