// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::constants::*;
use crate::setting::AWS_EC2_METADATA_SERVICE_ENDPOINT;
use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::{Method, StatusCode};
use log::debug;
use sdkgate_core::time::Duration;
use sdkgate_core::{CachedValue, Context, Error, Result};

/// Client of the EC2 instance metadata service, speaking IMDSv2.
///
/// A session token is fetched with `PUT /latest/api/token` and sent with every
/// `GET`. The token is cached until shortly before it expires.
#[derive(Debug)]
pub struct ImdsClient {
    endpoint: Option<String>,
    token: CachedValue<String>,
}

impl Default for ImdsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ImdsClient {
    /// Create a client that resolves its endpoint from the context.
    pub fn new() -> Self {
        Self {
            endpoint: None,
            token: CachedValue::new(Duration::try_seconds(120).expect("in bounds")),
        }
    }

    /// Use a fixed endpoint instead of `AWS_EC2_METADATA_SERVICE_ENDPOINT`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn endpoint(&self, ctx: &Context) -> Result<String> {
        let endpoint = match &self.endpoint {
            Some(v) => v.clone(),
            None => AWS_EC2_METADATA_SERVICE_ENDPOINT
                .resolve_from_env(ctx)?
                .unwrap_or_else(|| IMDS_DEFAULT_ENDPOINT.to_string()),
        };
        Ok(endpoint.trim_end_matches('/').to_string())
    }

    async fn token(&self, ctx: &Context) -> Result<String> {
        self.token
            .get_or_load(ctx, || async {
                let token = self.fetch_token(ctx).await?;
                let ttl = Duration::try_seconds(IMDS_TOKEN_TTL_SECONDS).expect("in bounds");
                Ok((token, Some(ctx.now() + ttl)))
            })
            .await
    }

    async fn fetch_token(&self, ctx: &Context) -> Result<String> {
        let endpoint = self.endpoint(ctx)?;
        let url = format!("{endpoint}{IMDS_TOKEN_PATH}");
        let req = http::Request::builder()
            .uri(&url)
            .method(Method::PUT)
            .header(CONTENT_LENGTH, "0")
            .header(
                X_AWS_EC2_METADATA_TOKEN_TTL_SECONDS,
                IMDS_TOKEN_TTL_SECONDS.to_string(),
            )
            .body(Bytes::new())
            .map_err(|e| {
                Error::request_invalid("failed to build IMDS token request")
                    .with_source(e)
                    .with_context(format!("url: {url}"))
            })?;

        let resp = ctx.http_send_as_string(req).await.map_err(|e| {
            Error::unexpected("failed to connect to IMDS")
                .with_source(e)
                .with_context(format!("endpoint: {endpoint}"))
                .with_context("hint: check if running on EC2 instance")
                .set_retryable(true)
        })?;

        match resp.status() {
            StatusCode::OK => Ok(resp.into_body()),
            StatusCode::FORBIDDEN => Err(Error::permission_denied(
                "Request forbidden: IMDS is disabled or the caller has insufficient permissions.",
            )
            .with_context(format!("endpoint: {endpoint}"))),
            status => Err(imds_error("fetch_imds_token", status, resp.body())),
        }
    }

    /// Fetch `path` as a string.
    ///
    /// A `401` means the cached token was rejected; it's dropped and the
    /// request is tried once more with a fresh one.
    pub async fn get(&self, ctx: &Context, path: &str) -> Result<String> {
        let token = self.token(ctx).await?;
        match self.get_with_token(ctx, path, &token).await? {
            Ok(body) => Ok(body),
            Err(StatusCode::UNAUTHORIZED) => {
                debug!("IMDS rejected cached token, fetching a new one");
                self.token.clear();
                let token = self.token(ctx).await?;
                match self.get_with_token(ctx, path, &token).await? {
                    Ok(body) => Ok(body),
                    Err(status) => Err(imds_error(path, status, "")),
                }
            }
            Err(status) => Err(imds_error(path, status, "")),
        }
    }

    /// Send one `GET`; a non-200 status is returned as the inner error.
    async fn get_with_token(
        &self,
        ctx: &Context,
        path: &str,
        token: &str,
    ) -> Result<std::result::Result<String, StatusCode>> {
        let endpoint = self.endpoint(ctx)?;
        let url = format!("{endpoint}{path}");
        let req = http::Request::builder()
            .uri(&url)
            .method(Method::GET)
            .header(X_AWS_EC2_METADATA_TOKEN, token)
            .body(Bytes::new())
            .map_err(|e| {
                Error::request_invalid("failed to build IMDS request")
                    .with_source(e)
                    .with_context(format!("url: {url}"))
            })?;

        let resp = ctx.http_send_as_string(req).await.map_err(|e| {
            Error::unexpected("failed to send IMDS request")
                .with_source(e)
                .with_context(format!("path: {path}"))
                .set_retryable(true)
        })?;

        if resp.status() == StatusCode::OK {
            Ok(Ok(resp.into_body()))
        } else {
            Ok(Err(resp.status()))
        }
    }
}

fn imds_error(operation: &str, status: StatusCode, body: &str) -> Error {
    let err = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Error::permission_denied(format!("IMDS denied access: {status}"))
        }
        StatusCode::NOT_FOUND => Error::config_invalid(format!("IMDS resource not found: {status}")),
        s if s.is_server_error() => {
            Error::unexpected(format!("IMDS server error: {status}")).set_retryable(true)
        }
        _ => Error::unexpected(format!("IMDS returned unexpected status: {status}")),
    };
    let err = err.with_context(format!("operation: {operation}"));
    if body.is_empty() {
        err
    } else {
        err.with_context(format!("response: {body}"))
    }
}
