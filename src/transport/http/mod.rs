use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::core::error::{ConfigError, ProviderError};
use crate::core::types::{AdapterContext, ProviderFamily};

const CUSTOM_HEADER_PREFIX: &str = "transport.header.";
const REQUEST_ID_HEADER_KEY: &str = "transport.request_id_header";
const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// A response whose body parsed as JSON, whatever its status code.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonReply {
    pub status_code: u16,
    pub request_id: Option<String>,
    pub body: Value,
}

impl JsonReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// One request, one response. Nothing here retries: submissions must not be
/// repeated and the poll loop owns its own cadence.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_ms: u64,
}

impl HttpTransport {
    pub fn new(timeout_ms: u64) -> Result<Self, ConfigError> {
        Self::with_client(reqwest::Client::new(), timeout_ms)
    }

    pub fn with_client(client: reqwest::Client, timeout_ms: u64) -> Result<Self, ConfigError> {
        Self::validate_timeout(timeout_ms)?;

        Ok(Self { client, timeout_ms })
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub async fn post_json<TReq, TResp>(
        &self,
        family: ProviderFamily,
        model: Option<&str>,
        url: &str,
        body: &TReq,
        bearer_token: Option<&str>,
        ctx: &AdapterContext,
    ) -> Result<TResp, ProviderError>
    where
        TReq: Serialize + ?Sized,
        TResp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body).map_err(|error| ProviderError::Serialization {
            family,
            model: model.map(str::to_string),
            request_id: None,
            message: error.to_string(),
        })?;

        let header_config = build_header_config(family, model, bearer_token, ctx)?;
        let response = self
            .send(family, Method::POST, url, Some(payload), &header_config)
            .await?;
        decode_strict(family, model, response, &header_config.request_id_header).await
    }

    /// GET that keeps error responses carrying a JSON object body, so callers
    /// can read provider-side error payloads. Other non-2xx responses become
    /// `ProviderError::Status`.
    pub async fn get_json_reply(
        &self,
        family: ProviderFamily,
        url: &str,
        bearer_token: Option<&str>,
        ctx: &AdapterContext,
    ) -> Result<JsonReply, ProviderError> {
        let header_config = build_header_config(family, None, bearer_token, ctx)?;
        let response = self
            .send(family, Method::GET, url, None, &header_config)
            .await?;
        let status_code = response.status().as_u16();
        let success = response.status().is_success();
        let request_id = extract_request_id(response.headers(), &header_config.request_id_header);

        let text = response.text().await.map_err(|error| ProviderError::Transport {
            family,
            request_id: request_id.clone(),
            message: format!("failed to read response body: {error}"),
        })?;

        match (success, serde_json::from_str::<Value>(&text)) {
            (true, Ok(body)) => Ok(JsonReply {
                status_code,
                request_id,
                body,
            }),
            (false, Ok(body)) if body.is_object() => Ok(JsonReply {
                status_code,
                request_id,
                body,
            }),
            (true, Err(error)) => Err(ProviderError::Serialization {
                family,
                model: None,
                request_id,
                message: error.to_string(),
            }),
            (false, _) => Err(ProviderError::Status {
                family,
                model: None,
                status_code,
                request_id,
                message: status_message(status_code, &text),
            }),
        }
    }

    async fn send(
        &self,
        family: ProviderFamily,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        header_config: &HeaderConfig,
    ) -> Result<Response, ProviderError> {
        let mut request_builder = self
            .client
            .request(method, url)
            .timeout(Duration::from_millis(self.timeout_ms))
            .headers(header_config.headers.clone());

        if let Some(payload) = body {
            request_builder = request_builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(payload);
        }

        request_builder
            .send()
            .await
            .map_err(|error| ProviderError::Transport {
                family,
                request_id: None,
                message: error.to_string(),
            })
    }

    fn validate_timeout(timeout_ms: u64) -> Result<(), ConfigError> {
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout { timeout_ms });
        }
        Ok(())
    }
}

struct HeaderConfig {
    headers: HeaderMap,
    request_id_header: HeaderName,
}

fn build_header_config(
    family: ProviderFamily,
    model: Option<&str>,
    bearer_token: Option<&str>,
    ctx: &AdapterContext,
) -> Result<HeaderConfig, ProviderError> {
    let request_id_header = match ctx.metadata.get(REQUEST_ID_HEADER_KEY) {
        Some(value) => parse_header_name(value, family, model)?,
        None => HeaderName::from_static(DEFAULT_REQUEST_ID_HEADER),
    };

    let mut headers = HeaderMap::new();
    for (key, value) in &ctx.metadata {
        if let Some(raw_name) = key.strip_prefix(CUSTOM_HEADER_PREFIX) {
            let header_name = parse_header_name(raw_name, family, model)?;
            let header_value =
                HeaderValue::from_str(value).map_err(|error| ProviderError::Protocol {
                    family,
                    model: model.map(str::to_string),
                    request_id: None,
                    message: format!("invalid header value for {raw_name}: {error}"),
                })?;
            headers.insert(header_name, header_value);
        }
    }

    if let Some(token) = bearer_token {
        let mut auth_value =
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|error| {
                ProviderError::Protocol {
                    family,
                    model: model.map(str::to_string),
                    request_id: None,
                    message: format!("invalid bearer token header value: {error}"),
                }
            })?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
    }

    Ok(HeaderConfig {
        headers,
        request_id_header,
    })
}

async fn decode_strict<TResp>(
    family: ProviderFamily,
    model: Option<&str>,
    response: Response,
    request_id_header: &HeaderName,
) -> Result<TResp, ProviderError>
where
    TResp: DeserializeOwned,
{
    let status_code = response.status().as_u16();
    let request_id = extract_request_id(response.headers(), request_id_header);

    if !response.status().is_success() {
        let message = match response.text().await {
            Ok(body) => status_message(status_code, &body),
            Err(error) => {
                format!("http status {status_code}; failed to read response body: {error}")
            }
        };
        return Err(ProviderError::Status {
            family,
            model: model.map(str::to_string),
            status_code,
            request_id,
            message,
        });
    }

    response
        .json::<TResp>()
        .await
        .map_err(|error| ProviderError::Serialization {
            family,
            model: model.map(str::to_string),
            request_id,
            message: error.to_string(),
        })
}

fn parse_header_name(
    value: &str,
    family: ProviderFamily,
    model: Option<&str>,
) -> Result<HeaderName, ProviderError> {
    HeaderName::from_bytes(value.as_bytes()).map_err(|error| ProviderError::Protocol {
        family,
        model: model.map(str::to_string),
        request_id: None,
        message: format!("invalid header name: {value}: {error}"),
    })
}

fn extract_request_id(headers: &HeaderMap, request_id_header: &HeaderName) -> Option<String> {
    headers
        .get(request_id_header)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn status_message(status_code: u16, body: &str) -> String {
    if body.trim().is_empty() {
        format!("http status {status_code}")
    } else {
        body.trim().to_string()
    }
}

#[cfg(test)]
mod tests;
