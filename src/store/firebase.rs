use anyhow::anyhow;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{header::ACCEPT, RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

use super::{
    path::StorePath,
    sse::{SseDecoder, SseEvent},
    tree, Feed, RealtimeStore, Subscription,
};

/// REST and event-stream client for a Firebase-style realtime database.
#[derive(Clone)]
pub struct FirebaseStore {
    inner: reqwest::Client,
    base: Url,
    auth: Option<String>,
}

#[derive(Deserialize)]
struct StreamPayload {
    path: String,
    data: Value,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl FirebaseStore {
    pub fn new(base: &str, auth: Option<String>) -> anyhow::Result<Self> {
        let base: Url = base
            .parse()
            .map_err(|e| anyhow!("{} is not a valid url: {}", base, e))?;
        if base.cannot_be_a_base() {
            return Err(anyhow!("{} cannot be used as a database url", base));
        }

        Ok(Self {
            inner: reqwest::Client::new(),
            base,
            auth,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `<base>/<path>.json`, plus the auth token when one is configured.
    pub fn url(&self, path: &StorePath) -> StoreResult<Url> {
        let mut url = self.base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| StoreError::InvalidPath {
                path: path.to_string(),
                reason: "database url cannot hold a path",
            })?;
            segments.pop_if_empty();

            match path.segments().split_last() {
                Some((last, parents)) => {
                    segments.extend(parents);
                    segments.push(&format!("{last}.json"));
                }
                None => {
                    segments.push(".json");
                }
            }
        }

        if let Some(auth) = &self.auth {
            url.query_pairs_mut().append_pair("auth", auth);
        }
        Ok(url)
    }

    async fn check(response: Response) -> StoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);

        Err(StoreError::Remote {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl RealtimeStore for FirebaseStore {
    async fn get(&self, path: &StorePath) -> StoreResult<Value> {
        let response = self.inner.get(self.url(path)?).send().await?;
        let value = Self::check(response).await?.json().await?;

        Ok(value)
    }

    async fn set(&self, path: &StorePath, value: Value) -> StoreResult<()> {
        let response = self.inner.put(self.url(path)?).json(&value).send().await?;
        Self::check(response).await?;

        Ok(())
    }

    async fn keys(&self, path: &StorePath) -> StoreResult<Vec<String>> {
        let mut url = self.url(path)?;
        url.query_pairs_mut().append_pair("shallow", "true");

        let response = self.inner.get(url).send().await?;
        let value: Value = Self::check(response).await?.json().await?;

        let mut keys = match value {
            Value::Object(map) => map.keys().cloned().collect::<Vec<_>>(),
            _ => vec![],
        };
        keys.sort();
        Ok(keys)
    }

    async fn subscribe(&self, path: &StorePath) -> StoreResult<Subscription> {
        let request = self
            .inner
            .get(self.url(path)?)
            .header(ACCEPT, "text/event-stream");
        let watched = path.clone();
        log::info!("subscribing to {}", watched);

        Ok(Subscription::spawn(path.clone(), move |feed| async move {
            if let Err(e) = stream(request, &watched, &feed).await {
                let _ = feed.send(Err(e));
            }
        }))
    }
}

/// Drives one event stream, pushing the mirrored node after every change.
/// Always ends in an error: the stream has no normal end.
async fn stream(request: RequestBuilder, path: &StorePath, feed: &Feed) -> StoreResult<()> {
    let response = FirebaseStore::check(request.send().await?).await?;
    let mut bytes = response.bytes_stream();
    let mut decoder = SseDecoder::new();
    let mut mirror = Value::Null;
    let mut last: Option<Value> = None;

    while let Some(chunk) = bytes.next().await {
        let chunk = chunk?;
        for event in decoder.push(&chunk) {
            log::debug!("{}: {} event", path, event.event);
            if let Some(value) = apply_event(path, &mut mirror, &mut last, event)? {
                feed.send(Ok(value))
                    .map_err(|_| StoreError::Closed(path.to_string()))?;
            }
        }
    }

    Err(StoreError::Closed(path.to_string()))
}

/// Applies one stream event to `mirror`. Returns the new mirror when it
/// differs from the last one returned.
pub(crate) fn apply_event(
    path: &StorePath,
    mirror: &mut Value,
    last: &mut Option<Value>,
    event: SseEvent,
) -> StoreResult<Option<Value>> {
    match event.event.as_str() {
        "put" | "patch" => {
            let payload: StreamPayload = serde_json::from_str(&event.data)?;
            let at = StorePath::parse(&payload.path)?;

            if event.event == "put" {
                tree::set_at(mirror, &at, payload.data);
            } else if let Value::Object(children) = payload.data {
                tree::merge_at(mirror, &at, children);
            }

            if last.as_ref() == Some(&*mirror) {
                return Ok(None);
            }
            *last = Some(mirror.clone());
            Ok(Some(mirror.clone()))
        }
        "keep-alive" => Ok(None),
        "cancel" | "auth_revoked" => Err(StoreError::Cancelled {
            path: path.to_string(),
            reason: event.data,
        }),
        other => {
            log::debug!("ignoring {other} event on {path}");
            Ok(None)
        }
    }
}
