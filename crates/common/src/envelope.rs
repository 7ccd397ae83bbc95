use serde::{Deserialize, Serialize};

/// Standard REST response envelope: `{ statusCode, message, success, data }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub message: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: 200,
            message: message.into(),
            success: true,
            data: Some(data),
        }
    }

    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self {
            status_code: 201,
            message: message.into(),
            success: true,
            data: Some(data),
        }
    }
}

impl ApiResponse<serde_json::Value> {
    /// An envelope with no payload (logout, forgot-password, ...).
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            message: message.into(),
            success: true,
            data: None,
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
            success: false,
            data: None,
        }
    }
}
