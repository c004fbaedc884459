//! HTTP implementation of [`Directory`] for the Webex REST API.
//!
//! Listings are paginated server-side. Two styles are followed until the
//! collection is exhausted:
//!
//! - `Link: <...>; rel="next"` headers (rooms, memberships)
//! - SCIM-style `startIndex`/`totalResults` bodies (groups, group members)
//!
//! Rate limiting (429) and gateway errors (502/503/504) are retried with
//! exponential backoff; 429 honours `Retry-After`. A `POST` is not
//! idempotent, so it is only retried when the platform cannot have acted on
//! it: 429 and connection failures.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, LINK, RETRY_AFTER};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::{BearerToken, DirectoryConfig};
use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::types::{Group, GroupMember, RemovalStatus, Room, RoomMembership};

/// Longest `Retry-After` we are willing to sleep for.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(300);

/// Error bodies are truncated to this many characters in messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Client for the platform's membership APIs.
#[derive(Debug, Clone)]
pub struct WebexClient {
    /// Configuration for the client.
    config: Arc<DirectoryConfig>,
    /// Parsed API root.
    api_root: Url,
    token: BearerToken,
    http_client: reqwest::Client,
}

impl WebexClient {
    /// Create a client for one run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the configuration is invalid or the HTTP
    /// client cannot be built.
    pub fn new(config: DirectoryConfig, token: BearerToken) -> Result<Self> {
        config.validate()?;
        let api_root = config.api_root()?;

        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config: Arc::new(config),
            api_root,
            token,
            http_client,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Build an endpoint URL below the API root. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_root.clone();
        url.path_segments_mut()
            .map_err(|()| Error::config("API root cannot carry path segments"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Build a list endpoint URL with its page size and extra query pairs.
    fn list_endpoint(&self, segments: &[&str], size_param: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = self.endpoint(segments)?;
        url.query_pairs_mut()
            .extend_pairs(query)
            .append_pair(size_param, &self.config.page_size.to_string());
        Ok(url)
    }

    /// Send a request, retrying rate-limited and transient responses.
    async fn send(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<Response> {
        let endpoint = url.path();
        let max_retries = self.config.max_retries;
        let mut attempt = 0u32;

        loop {
            let mut request = self
                .http_client
                .request(method.clone(), url.clone())
                .bearer_auth(self.token.expose());
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) if is_retryable(&method, response.status()) => {
                    let status = response.status();
                    if attempt >= max_retries {
                        return Err(Error::transport(format!(
                            "{method} {endpoint} still returned {status} after {attempt} retries"
                        )));
                    }
                    let delay = retry_after(response.headers()).unwrap_or_else(|| self.backoff(attempt));
                    attempt = attempt.saturating_add(1);
                    warn!(
                        %status,
                        endpoint,
                        attempt,
                        max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Retrying after transient response"
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() && attempt < max_retries => {
                    let delay = self.backoff(attempt);
                    attempt = attempt.saturating_add(1);
                    warn!(endpoint, attempt, max_retries, error = %e, "Retrying after connection failure");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(Error::from_reqwest(endpoint, &e)),
            }
        }
    }

    /// Exponential backoff: base, 2x base, 4x base, ...
    fn backoff(&self, attempt: u32) -> Duration {
        self.config
            .retry_base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Fetch every page of a listing and concatenate the items under `key`.
    async fn list_all<T: DeserializeOwned>(&self, first: Url, key: &str) -> Result<Vec<T>> {
        let mut items: Vec<T> = Vec::new();
        let mut next = Some(first);
        let mut visited: HashSet<Url> = HashSet::new();

        while let Some(url) = next.take() {
            if !visited.insert(url.clone()) {
                warn!(endpoint = url.path(), "Next page was already fetched, stopping");
                break;
            }

            let response = self.send(Method::GET, &url, None).await?;
            let response = check_status(response, url.path()).await?;
            let link = next_link(response.headers(), &url);

            let body: Value = response
                .json()
                .await
                .map_err(|e| Error::from_reqwest(url.path(), &e))?;
            let page: Vec<T> = decode_items(url.path(), &body, key)?;
            let page_len = page.len();
            items.extend(page);

            debug!(endpoint = url.path(), page = visited.len(), items = page_len, "Fetched page");

            next = link.or_else(|| offset_continuation(&url, &body, items.len(), page_len));
        }

        Ok(items)
    }
}

#[async_trait]
impl Directory for WebexClient {
    async fn list_groups(&self) -> Result<Vec<Group>> {
        let url = self.list_endpoint(&["groups"], "count", &[])?;
        let groups = self.list_all(url, "groups").await?;
        info!(count = groups.len(), "Listed groups");
        Ok(groups)
    }

    async fn list_group_members(&self, group_id: &str) -> Result<Vec<GroupMember>> {
        let url = self.list_endpoint(&["groups", group_id, "members"], "count", &[])?;
        let members = self.list_all(url, "members").await?;
        debug!(group_id, count = members.len(), "Listed group members");
        Ok(members)
    }

    async fn list_rooms(&self) -> Result<Vec<Room>> {
        let url = self.list_endpoint(&["rooms"], "max", &[])?;
        let rooms = self.list_all(url, "items").await?;
        info!(count = rooms.len(), "Listed rooms");
        Ok(rooms)
    }

    async fn list_room_memberships(&self, room_id: &str) -> Result<Vec<RoomMembership>> {
        let url = self.list_endpoint(&["memberships"], "max", &[("roomId", room_id)])?;
        let memberships = self.list_all(url, "items").await?;
        debug!(room_id, count = memberships.len(), "Listed room memberships");
        Ok(memberships)
    }

    async fn add_membership(&self, room_id: &str, person_id: &str) -> Result<String> {
        let url = self.endpoint(&["memberships"])?;
        let body = serde_json::json!({
            "roomId": room_id,
            "personId": person_id,
            "isModerator": false,
        });

        let response = self.send(Method::POST, &url, Some(&body)).await?;
        let response = check_status(response, url.path()).await?;
        let created: Value = response
            .json()
            .await
            .map_err(|e| Error::from_reqwest(url.path(), &e))?;

        created
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::protocol(url.path(), "created membership has no 'id'"))
    }

    async fn remove_membership(&self, membership_id: &str) -> Result<RemovalStatus> {
        let url = self.endpoint(&["memberships", membership_id])?;
        let response = self.send(Method::DELETE, &url, None).await?;
        let status = response.status();

        if is_auth_failure(status) {
            return Err(Error::auth(status.as_u16(), error_body(response).await));
        }

        Ok(RemovalStatus::new(status.as_u16(), membership_id))
    }
}

/// Whether a response to `method` may be retried.
///
/// A gateway error on `POST` may arrive after the platform created the
/// resource, so only rate limiting is retried there.
fn is_retryable(method: &Method, status: StatusCode) -> bool {
    match status {
        StatusCode::TOO_MANY_REQUESTS => true,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            *method != Method::POST
        }
        _ => false,
    }
}

const fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Map a non-success response onto the error taxonomy.
async fn check_status(response: Response, endpoint: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = error_body(response).await;
    if is_auth_failure(status) {
        Err(Error::auth(status.as_u16(), body))
    } else if status.is_server_error() {
        Err(Error::transport(format!("{endpoint} returned {status}: {body}")))
    } else {
        Err(Error::protocol(endpoint, format!("HTTP {status}: {body}")))
    }
}

async fn error_body(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

/// Pull the array under `key` out of a list response and decode its items.
fn decode_items<T: DeserializeOwned>(endpoint: &str, body: &Value, key: &str) -> Result<Vec<T>> {
    let items = body
        .get(key)
        .ok_or_else(|| Error::protocol(endpoint, format!("response has no '{key}' array")))?;
    serde_json::from_value(items.clone())
        .map_err(|e| Error::protocol(endpoint, format!("malformed '{key}' entry: {e}")))
}

/// The `rel="next"` target of an RFC 8288 `Link` header, resolved against
/// the current page.
fn next_link(headers: &HeaderMap, current: &Url) -> Option<Url> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|link| {
            let mut parts = link.split(';');
            let target = parts.next()?.trim().strip_prefix('<')?.strip_suffix('>')?;
            let is_next = parts.any(|param| {
                let param = param.trim();
                param == "rel=\"next\"" || param == "rel=next"
            });
            if is_next {
                current.join(target).ok()
            } else {
                None
            }
        })
}

/// Next page for SCIM-style bodies carrying `totalResults` and `startIndex`.
fn offset_continuation(current: &Url, body: &Value, fetched: usize, page_len: usize) -> Option<Url> {
    let total = body.get("totalResults")?.as_u64()?;
    let fetched = u64::try_from(fetched).unwrap_or(u64::MAX);
    if page_len == 0 || fetched >= total {
        return None;
    }

    let start = body.get("startIndex").and_then(Value::as_u64).unwrap_or(1);
    let next_start = start.saturating_add(u64::try_from(page_len).unwrap_or(u64::MAX));

    let kept: Vec<(String, String)> = current
        .query_pairs()
        .filter(|(k, _)| k != "startIndex")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let mut next = current.clone();
    next.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair("startIndex", &next_start.to_string());
    Some(next)
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let secs: u64 = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()?;
    Some(Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}
