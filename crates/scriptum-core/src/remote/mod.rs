//! HTTP client for the Remote Note Service.
//!
//! Every operation requires an active session and fails fast without one.
//! A 401 from any endpoint runs the global deauthentication side effect
//! through [`AuthContext::handle_unauthorized`] before the error propagates.

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthContext, AuthSession};
use crate::error::{Error, Result};
use crate::models::{Note, NoteDraft, NoteId, NotePatch, Tag, TagDraft, TagId, TagPatch};
use crate::util::{compact_text, is_http_url, normalize_text_option};

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the note and tag endpoints.
#[derive(Clone)]
pub struct NoteServiceClient {
    base_url: String,
    client: Client,
    context: AuthContext,
}

impl NoteServiceClient {
    pub fn new(base_url: impl Into<String>, context: AuthContext) -> Result<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        Ok(Self {
            base_url,
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            context,
        })
    }

    /// The shared session context this client authenticates with.
    #[must_use]
    pub const fn context(&self) -> &AuthContext {
        &self.context
    }

    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        let session = self.require_session()?;
        let request = self
            .client
            .get(format!("{}/notes", self.base_url))
            .query(&[("userId", session.user.id.as_str())]);
        self.send_json(request, &session).await
    }

    pub async fn create_note(&self, draft: &NoteDraft) -> Result<Note> {
        let session = self.require_session()?;
        let now = Utc::now();
        let body = CreateNoteBody {
            draft,
            user_id: &session.user.id,
            created_at: now,
            modified_at: now,
        };
        let request = self
            .client
            .post(format!("{}/notes", self.base_url))
            .json(&body);
        self.send_json(request, &session).await
    }

    pub async fn fetch_note(&self, id: &NoteId) -> Result<Option<Note>> {
        let session = self.require_session()?;
        let request = self.client.get(self.note_url(id));
        self.send_optional_json(request, &session).await
    }

    pub async fn update_note(&self, id: &NoteId, patch: &NotePatch) -> Result<Note> {
        let session = self.require_session()?;
        let body = UpdateNoteBody {
            patch,
            modified_at: Utc::now(),
        };
        let request = self.client.put(self.note_url(id)).json(&body);
        self.send_json(request, &session).await
    }

    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let session = self.require_session()?;
        let request = self.client.delete(self.note_url(id));
        self.send_empty(request, &session).await
    }

    pub async fn notes_by_tag(&self, tag_id: &TagId) -> Result<Vec<Note>> {
        let session = self.require_session()?;
        let request = self
            .client
            .get(format!(
                "{}/notes/tag/{}",
                self.base_url,
                urlencoding::encode(tag_id.as_str())
            ))
            .query(&[("userId", session.user.id.as_str())]);
        self.send_json(request, &session).await
    }

    pub async fn search_notes_by_title(&self, title: &str) -> Result<Vec<Note>> {
        let session = self.require_session()?;
        let request = self
            .client
            .get(format!("{}/notes/search/title", self.base_url))
            .query(&[("userId", session.user.id.as_str()), ("title", title)]);
        self.send_json(request, &session).await
    }

    pub async fn search_notes_by_content(&self, content: &str) -> Result<Vec<Note>> {
        let session = self.require_session()?;
        let request = self
            .client
            .get(format!("{}/notes/search/content", self.base_url))
            .query(&[("userId", session.user.id.as_str()), ("content", content)]);
        self.send_json(request, &session).await
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        let session = self.require_session()?;
        let request = self
            .client
            .get(format!("{}/tags", self.base_url))
            .query(&[("userId", session.user.id.as_str())]);
        self.send_json(request, &session).await
    }

    pub async fn create_tag(&self, draft: &TagDraft) -> Result<Tag> {
        let session = self.require_session()?;
        let now = Utc::now();
        let body = CreateTagBody {
            draft,
            user_id: &session.user.id,
            created_at: now,
            modified_at: now,
        };
        let request = self
            .client
            .post(format!("{}/tags", self.base_url))
            .json(&body);
        self.send_json(request, &session).await
    }

    pub async fn fetch_tag(&self, id: &TagId) -> Result<Option<Tag>> {
        let session = self.require_session()?;
        let request = self.client.get(self.tag_url(id));
        self.send_optional_json(request, &session).await
    }

    pub async fn update_tag(&self, id: &TagId, patch: &TagPatch) -> Result<Tag> {
        let session = self.require_session()?;
        let body = UpdateTagBody {
            patch,
            modified_at: Utc::now(),
        };
        let request = self.client.put(self.tag_url(id)).json(&body);
        self.send_json(request, &session).await
    }

    pub async fn delete_tag(&self, id: &TagId) -> Result<()> {
        let session = self.require_session()?;
        let request = self.client.delete(self.tag_url(id));
        self.send_empty(request, &session).await
    }

    pub async fn search_tags_by_name(&self, name: &str) -> Result<Vec<Tag>> {
        let session = self.require_session()?;
        let request = self
            .client
            .get(format!("{}/tags/search", self.base_url))
            .query(&[("userId", session.user.id.as_str()), ("name", name)]);
        self.send_json(request, &session).await
    }

    fn note_url(&self, id: &NoteId) -> String {
        format!(
            "{}/notes/{}",
            self.base_url,
            urlencoding::encode(id.as_str())
        )
    }

    fn tag_url(&self, id: &TagId) -> String {
        format!("{}/tags/{}", self.base_url, urlencoding::encode(id.as_str()))
    }

    fn require_session(&self) -> Result<AuthSession> {
        self.context.session().ok_or(Error::AuthRequired)
    }

    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        session: &AuthSession,
    ) -> Result<T> {
        let response = request.bearer_auth(&session.token).send().await?;
        let response = self.check_response(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Like [`Self::send_json`], but a 404 becomes `Ok(None)`.
    async fn send_optional_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
        session: &AuthSession,
    ) -> Result<Option<T>> {
        let response = request.bearer_auth(&session.token).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = self.check_response(response).await?;
        Ok(Some(response.json::<T>().await?))
    }

    async fn send_empty(&self, request: RequestBuilder, session: &AuthSession) -> Result<()> {
        let response = request.bearer_auth(&session.token).send().await?;
        self.check_response(response).await?;
        Ok(())
    }

    async fn check_response(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED {
            self.context.handle_unauthorized();
        }
        Err(Error::Api {
            status: status.as_u16(),
            message: parse_api_error(status, &body),
        })
    }
}

/// Normalize a configured API base URL: trim, require an http(s) scheme,
/// and drop any trailing slash.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let url = normalize_text_option(Some(url.to_string()))
        .ok_or_else(|| Error::InvalidInput("API base URL must not be empty".into()))?;
    if !is_http_url(&url) {
        return Err(Error::InvalidInput(
            "API base URL must include http:// or https://".into(),
        ));
    }
    Ok(url.trim_end_matches('/').to_string())
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Extract a human-readable message from an error response, preferring the
/// body's `message`/`error` fields and falling back to the status code.
pub fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            let message = message.trim();
            if !message.is_empty() {
                return format!("{} ({})", message, status.as_u16());
            }
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateNoteBody<'a> {
    #[serde(flatten)]
    draft: &'a NoteDraft,
    user_id: &'a str,
    created_at: chrono::DateTime<Utc>,
    modified_at: chrono::DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateNoteBody<'a> {
    #[serde(flatten)]
    patch: &'a NotePatch,
    modified_at: chrono::DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTagBody<'a> {
    #[serde(flatten)]
    draft: &'a TagDraft,
    user_id: &'a str,
    created_at: chrono::DateTime<Utc>,
    modified_at: chrono::DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTagBody<'a> {
    #[serde(flatten)]
    patch: &'a TagPatch,
    modified_at: chrono::DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use crate::auth::MemorySessionStore;

    use super::*;

    fn client() -> NoteServiceClient {
        let context = AuthContext::new(MemorySessionStore::default());
        NoteServiceClient::new("https://api.example.com/api/", context).unwrap()
    }

    #[test]
    fn normalize_base_url_trims_trailing_slash() {
        assert_eq!(
            normalize_base_url(" https://api.example.com/api/ ").unwrap(),
            "https://api.example.com/api"
        );
    }

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url("   ").is_err());
        assert!(normalize_base_url("api.example.com").is_err());
    }

    #[test]
    fn note_url_encodes_opaque_ids() {
        let url = client().note_url(&"id with spaces/slash".parse().unwrap());
        assert_eq!(
            url,
            "https://api.example.com/api/notes/id%20with%20spaces%2Fslash"
        );
    }

    #[test]
    fn parse_api_error_prefers_body_message() {
        let parsed = parse_api_error(
            StatusCode::BAD_REQUEST,
            r#"{"message": "Title must be at least 2 characters"}"#,
        );
        assert_eq!(parsed, "Title must be at least 2 characters (400)");
    }

    #[test]
    fn parse_api_error_falls_back_to_status() {
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
        assert_eq!(
            parse_api_error(StatusCode::BAD_GATEWAY, "upstream exploded"),
            "upstream exploded (502)"
        );
    }

    #[test]
    fn requests_fail_fast_without_a_session() {
        let error = client().require_session().unwrap_err();
        assert!(matches!(error, Error::AuthRequired));
    }

    #[test]
    fn create_body_carries_user_and_timestamps() {
        let draft = NoteDraft::new("Title", "Body that is long enough").with_tags(vec!["t1".into()]);
        let now = Utc::now();
        let body = CreateNoteBody {
            draft: &draft,
            user_id: "user-1",
            created_at: now,
            modified_at: now,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["userId"], serde_json::json!("user-1"));
        assert_eq!(value["title"], serde_json::json!("Title"));
        assert_eq!(value["tags"], serde_json::json!(["t1"]));
        assert!(value.get("createdAt").is_some());
        assert!(value.get("id").is_none());
    }

    #[test]
    fn update_body_sends_only_set_fields_plus_timestamp() {
        let patch = NotePatch::default().with_pinned(true);
        let body = UpdateNoteBody {
            patch: &patch,
            modified_at: Utc::now(),
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["isPinned"], serde_json::json!(true));
        assert!(value.get("modifiedAt").is_some());
        assert!(value.get("title").is_none());
        assert!(value.get("content").is_none());
    }
}
