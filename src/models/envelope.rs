use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::{ClientError, GENERIC_ERROR_MESSAGE};

/// The standard wrapper every backend endpoint answers with.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub status_code: u16,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Left untyped: the backend serializes it as either a string or a date array.
    #[serde(default)]
    pub timestamp: Value,
}

impl<T> ApiEnvelope<T> {
    /// The envelope message, or the generic fallback when the backend sent none.
    pub fn display_message(&self) -> String {
        if self.message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            self.message.clone()
        }
    }

    /// Unwraps a successful envelope whose payload may legitimately be null.
    pub fn into_result(self) -> Result<Option<T>, ClientError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(ClientError::Api {
                status: self.status_code,
                message: self.display_message(),
            })
        }
    }

    /// Unwraps a successful envelope that must carry a payload.
    pub fn into_data(self) -> Result<T, ClientError> {
        let status = self.status_code;
        self.into_result()?
            .ok_or_else(|| ClientError::Decode(format!("Response {} carried no data", status)))
    }
}
