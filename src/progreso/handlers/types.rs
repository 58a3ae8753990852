//! Request/response types for the HTTP API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub device_id: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub id: String,
    pub username: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SaveResponse {
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    #[test]
    fn register_request_uses_camel_case_device_id() -> Result<()> {
        let request = RegisterRequest {
            username: "alice".to_string(),
            password: "correct horse".to_string(),
            device_id: "device-1".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let device_id = value
            .get("deviceId")
            .and_then(serde_json::Value::as_str)
            .context("missing deviceId")?;
        assert_eq!(device_id, "device-1");

        let decoded: RegisterRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.device_id, "device-1");
        Ok(())
    }

    #[test]
    fn login_response_nests_user() -> Result<()> {
        let response = LoginResponse {
            token: "signed".to_string(),
            user: UserSummary {
                id: "00000000-0000-0000-0000-000000000000".to_string(),
                username: "alice".to_string(),
            },
        };
        let value = serde_json::to_value(&response)?;
        assert_eq!(value["user"]["username"], "alice");
        assert_eq!(value["token"], "signed");
        Ok(())
    }
}
