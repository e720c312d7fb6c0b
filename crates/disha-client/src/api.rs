//! Portal REST API client.
//!
//! One `reqwest::Client` wrapped with the endpoints the portal
//! exposes. Application-level rejections (`{"error": ...}` /
//! `{"reason": ...}` bodies) are surfaced as [`DishaError::Rejected`]
//! with the portal's own message; everything below that is a
//! [`DishaError::Transport`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use disha_core::error::{DishaError, Result};
use disha_core::feed::Notification;
use disha_core::session::Role;

use crate::chat::{ChatTransport, ChunkStream};
use crate::config::PortalConfig;
use crate::poller::NotificationSource;

/// The signed-in user as reported by `POST /login`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(rename = "fullName")]
    pub full_name: Option<String>,
    pub role: Role,
    pub department: Option<String>,
}

/// Registration form for `POST /signup`.
#[derive(Debug, Clone, Serialize)]
pub struct SignupForm {
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub email: String,
    #[serde(rename = "idNumber")]
    pub id_number: String,
    pub department: String,
    pub password: String,
}

/// One roster row from `GET /admin/students`.
#[derive(Debug, Clone, Deserialize)]
pub struct StudentRecord {
    pub id: u64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub dept: Option<String>,
    pub joined: Option<String>,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    role: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    user: UserProfile,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

#[derive(Serialize)]
struct BroadcastRequest<'a> {
    message: &'a str,
    #[serde(rename = "adminName")]
    admin_name: &'a str,
}

/// Wire shape of a notification (`admin_name` is the author's display
/// name; `created_at` only appears on the history endpoint).
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationDto {
    pub admin_name: String,
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl From<NotificationDto> for Notification {
    fn from(dto: NotificationDto) -> Self {
        // The portal emits RFC 3339 from the history endpoint and an
        // RFC 2822 date when the raw record leaks through.
        let created_at = dto
            .created_at
            .as_deref()
            .and_then(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .or_else(|_| DateTime::parse_from_rfc2822(raw))
                    .ok()
            })
            .map(|parsed| parsed.with_timezone(&Utc));
        Notification {
            author: dto.admin_name,
            message: dto.message,
            created_at,
        }
    }
}

/// Rejection body the portal sends with non-2xx statuses.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// Client for the portal backend.
#[derive(Clone)]
pub struct PortalApi {
    client: Client,
    config: PortalConfig,
}

impl PortalApi {
    pub fn new(config: PortalConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Builds a client against `DISHA_BASE_URL` or the local default.
    pub fn from_env() -> Self {
        Self::new(PortalConfig::from_env())
    }

    /// Authenticates against `POST /login` for the given role.
    pub async fn login(&self, email: &str, password: &str, role: Role) -> Result<UserProfile> {
        let body = LoginRequest {
            email,
            password,
            role: role.as_str(),
        };
        let response = self
            .client
            .post(self.config.endpoint("/login"))
            .json(&body)
            .send()
            .await
            .map_err(|err| DishaError::transport(format!("login request failed: {err}")))?;

        let response = Self::check_status(response).await?;
        let parsed: LoginResponse = response.json().await.map_err(|err| {
            DishaError::transport(format!("failed to parse login response: {err}"))
        })?;
        Ok(parsed.user)
    }

    /// Registers a new student account via `POST /signup`.
    pub async fn signup(&self, form: &SignupForm) -> Result<()> {
        let response = self
            .client
            .post(self.config.endpoint("/signup"))
            .json(form)
            .send()
            .await
            .map_err(|err| DishaError::transport(format!("signup request failed: {err}")))?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Latest broadcast notifications, newest first (`GET /notifications`).
    pub async fn notifications(&self) -> Result<Vec<NotificationDto>> {
        self.fetch_notifications("/notifications").await
    }

    /// Full notification history (`GET /notifications/all`).
    pub async fn notifications_all(&self) -> Result<Vec<NotificationDto>> {
        self.fetch_notifications("/notifications/all").await
    }

    async fn fetch_notifications(&self, path: &str) -> Result<Vec<NotificationDto>> {
        let response = self
            .client
            .get(self.config.endpoint(path))
            .send()
            .await
            .map_err(|err| {
                DishaError::transport(format!("notification fetch failed: {err}"))
            })?;

        let response = Self::check_status(response).await?;
        response.json().await.map_err(|err| {
            DishaError::transport(format!("failed to parse notifications: {err}"))
        })
    }

    /// Publishes a broadcast notification (`POST /admin/broadcast`).
    pub async fn broadcast(&self, message: &str, admin_name: &str) -> Result<()> {
        let body = BroadcastRequest {
            message,
            admin_name,
        };
        let response = self
            .client
            .post(self.config.endpoint("/admin/broadcast"))
            .json(&body)
            .send()
            .await
            .map_err(|err| DishaError::transport(format!("broadcast request failed: {err}")))?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// The student roster for the admin dashboard (`GET /admin/students`).
    pub async fn students(&self) -> Result<Vec<StudentRecord>> {
        let response = self
            .client
            .get(self.config.endpoint("/admin/students"))
            .send()
            .await
            .map_err(|err| DishaError::transport(format!("roster fetch failed: {err}")))?;

        let response = Self::check_status(response).await?;
        response
            .json()
            .await
            .map_err(|err| DishaError::transport(format!("failed to parse roster: {err}")))
    }

    /// Maps a non-success response into the portal's own error message
    /// where one exists, otherwise into a transport error.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body_text = response.text().await.unwrap_or_default();
        Err(map_http_error(status, body_text))
    }
}

fn map_http_error(status: StatusCode, body: String) -> DishaError {
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.reason.or(parsed.error));

    match message {
        Some(message) => DishaError::rejected(message),
        None => DishaError::transport(format!("portal returned status {status}")),
    }
}

#[async_trait]
impl ChatTransport for PortalApi {
    /// Opens one streaming chat exchange (`POST /chat`, chunked text
    /// body). Failures before the first byte are transport errors; the
    /// consumer turns them into the fallback reply.
    async fn open(&self, query: &str) -> Result<ChunkStream> {
        let response = self
            .client
            .post(self.config.endpoint("/chat"))
            .json(&ChatRequest { query })
            .send()
            .await
            .map_err(|err| DishaError::transport(format!("chat request failed: {err}")))?;

        if !response.status().is_success() {
            return Err(DishaError::transport(format!(
                "chat endpoint returned status {}",
                response.status()
            )));
        }

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|err| DishaError::transport(format!("chat stream failed: {err}")))
        });
        Ok(stream.boxed())
    }
}

#[async_trait]
impl NotificationSource for PortalApi {
    async fn latest(&self) -> Result<Vec<Notification>> {
        let items = self.notifications().await?;
        Ok(items.into_iter().map(Notification::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_body_prefers_reason_over_error() {
        let err = map_http_error(
            StatusCode::BAD_REQUEST,
            r#"{"error": "Account Conflict", "reason": "An account with that email exists."}"#
                .to_string(),
        );
        assert!(matches!(
            err,
            DishaError::Rejected(message) if message == "An account with that email exists."
        ));
    }

    #[test]
    fn bare_error_body_is_still_a_rejection() {
        let err = map_http_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error": "Invalid student credentials"}"#.to_string(),
        );
        assert!(matches!(
            err,
            DishaError::Rejected(message) if message == "Invalid student credentials"
        ));
    }

    #[test]
    fn unparseable_body_degrades_to_transport_error() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, "<html>upstream down</html>".to_string());
        assert!(err.is_transport());
    }

    #[test]
    fn notification_dto_parses_history_timestamps() {
        let dto = NotificationDto {
            admin_name: "TNP Admin".to_string(),
            message: "Drive on Friday".to_string(),
            created_at: Some("2026-08-20T10:30:00+00:00".to_string()),
        };
        let note = Notification::from(dto);
        assert_eq!(note.author, "TNP Admin");
        assert!(note.created_at.is_some());

        let bare = NotificationDto {
            admin_name: "TNP Admin".to_string(),
            message: "Banner only".to_string(),
            created_at: None,
        };
        assert!(Notification::from(bare).created_at.is_none());
    }
}
