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

use super::config::{SignedBodyValue, SigningConfigBuilder};
use super::v4::sign_request;
use crate::{Credential, ExecutionContext};
use http::request::Parts;
use log::{debug, warn};
use sdkgate_core::{Body, Context, Error, ProvideCredential, Result, SigningCredential};
use std::fmt::{Debug, Formatter};

/// Signs outgoing requests with SigV4.
///
/// The middleware holds a base signing config, whose region may be left
/// empty, and a credential provider. For every request it layers the
/// overrides from the [`ExecutionContext`] on top of the base, picks the
/// payload hash and signs.
///
/// Payload hash, first match wins:
///
/// 1. a value precomputed by the caller
/// 2. `UNSIGNED-PAYLOAD` when the operation asks for it
/// 3. the hash of the empty payload
/// 4. `UNSIGNED-PAYLOAD` for a stream that can't be replayed
/// 5. the SHA256 of the body
pub struct SigV4SigningMiddleware {
    base: SigningConfigBuilder,
    credential: Box<dyn ProvideCredential<Credential = Credential>>,
}

impl Debug for SigV4SigningMiddleware {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigV4SigningMiddleware")
            .field("base", &self.base)
            .field("credential", &self.credential)
            .finish()
    }
}

impl SigV4SigningMiddleware {
    /// Create a middleware from a base config and a credential provider.
    pub fn new(
        base: SigningConfigBuilder,
        credential: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        Self::with_boxed_provider(base, Box::new(credential))
    }

    pub(crate) fn with_boxed_provider(
        base: SigningConfigBuilder,
        credential: Box<dyn ProvideCredential<Credential = Credential>>,
    ) -> Self {
        Self { base, credential }
    }

    /// Sign `req`, reading and updating `exec`.
    ///
    /// A replayable body stream is rewound after hashing so it can be sent.
    pub async fn sign(
        &self,
        ctx: &Context,
        req: &mut Parts,
        body: &mut Body,
        exec: &mut ExecutionContext,
    ) -> Result<()> {
        let mut builder = self.base.clone();
        if let Some(region) = &exec.signing_region {
            builder = builder.region(region);
        }
        if let Some(service) = &exec.signing_service {
            builder = builder.service(service);
        }
        builder = builder.date(exec.signing_date.unwrap_or_else(|| ctx.now()));
        if let Some(header) = exec.signed_body_header {
            builder = builder.signed_body_header(header);
        }

        let credential = self
            .credential
            .provide_credential(ctx)
            .await?
            .ok_or_else(|| Error::credential_invalid("no credential available for signing"))?;
        if !credential.is_valid(ctx.now()) {
            return Err(Error::credential_invalid(
                "credential is incomplete or about to expire",
            ));
        }
        builder = builder.credential(credential);

        let body_value = signed_body_value(body, exec).await?;
        let config = builder.signed_body_value(body_value).build()?;
        debug!(
            "signing request for service {} in region {}",
            config.service, config.region
        );

        let signature = sign_request(req, &config)?;
        exec.request_signature = Some(signature);

        body.reset_stream()
    }
}

async fn signed_body_value(body: &mut Body, exec: &ExecutionContext) -> Result<SignedBodyValue> {
    if let Some(v) = &exec.signed_body_value {
        return Ok(v.clone());
    }
    if exec.unsigned_payload {
        return Ok(SignedBodyValue::UnsignedPayload);
    }
    if body.is_empty() {
        return Ok(SignedBodyValue::Empty);
    }
    if body.is_unbounded_stream() {
        warn!("unable to compute hash for unbounded stream; defaulting to unsigned payload");
        return Ok(SignedBodyValue::UnsignedPayload);
    }
    Ok(SignedBodyValue::Precomputed(body.hex_sha256().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::X_AMZ_CONTENT_SHA_256;
    use crate::provide_credential::StaticCredentialProvider;
    use crate::sign::{SignedBodyHeader, SigningConfig};
    use bytes::Bytes;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use sdkgate_core::hash::{hex_sha256, EMPTY_SHA256};
    use sdkgate_core::{BodyStream, ErrorKind, OneShotStream, ReplayableStream};

    fn middleware(base: SigningConfigBuilder) -> SigV4SigningMiddleware {
        SigV4SigningMiddleware::new(
            base.service("s3")
                .signed_body_header(SignedBodyHeader::XAmzContentSha256),
            StaticCredentialProvider::new("AKIDEXAMPLE", "secret"),
        )
    }

    fn parts() -> Parts {
        http::Request::builder()
            .method("PUT")
            .uri("https://bucket.s3.amazonaws.com/key")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn exec_ctx() -> ExecutionContext {
        ExecutionContext::new()
            .with_signing_region("us-west-2")
            .with_signing_date(chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    fn content_sha256(req: &Parts) -> &str {
        req.headers[X_AMZ_CONTENT_SHA_256].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_body_hash_policy() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let m = middleware(SigningConfig::builder());
        let ctx = Context::new();

        let mut req = parts();
        let mut exec = exec_ctx().with_signed_body_value(SignedBodyValue::Precomputed("abc".into()));
        m.sign(&ctx, &mut req, &mut Body::from("ignored"), &mut exec).await?;
        assert_eq!(content_sha256(&req), "abc");

        let mut req = parts();
        let mut exec = exec_ctx().with_unsigned_payload();
        m.sign(&ctx, &mut req, &mut Body::from("data"), &mut exec).await?;
        assert_eq!(content_sha256(&req), "UNSIGNED-PAYLOAD");

        let mut req = parts();
        m.sign(&ctx, &mut req, &mut Body::Empty, &mut exec_ctx()).await?;
        assert_eq!(content_sha256(&req), EMPTY_SHA256);

        let mut req = parts();
        let mut body = Body::stream(OneShotStream::new([Bytes::from_static(b"data")]));
        m.sign(&ctx, &mut req, &mut body, &mut exec_ctx()).await?;
        assert_eq!(content_sha256(&req), "UNSIGNED-PAYLOAD");

        let mut req = parts();
        m.sign(&ctx, &mut req, &mut Body::from("data"), &mut exec_ctx()).await?;
        assert_eq!(content_sha256(&req), hex_sha256(b"data"));
        Ok(())
    }

    #[tokio::test]
    async fn test_replayable_stream_is_rewound() -> Result<()> {
        let m = middleware(SigningConfig::builder());
        let mut body = Body::stream(ReplayableStream::new([
            Bytes::from_static(b"hello "),
            Bytes::from_static(b"world"),
        ]));

        let mut req = parts();
        m.sign(&Context::new(), &mut req, &mut body, &mut exec_ctx()).await?;
        assert_eq!(content_sha256(&req), hex_sha256(b"hello world"));

        let Body::Stream(stream) = &mut body else {
            panic!("body must stay a stream");
        };
        assert_eq!(
            stream.next_chunk().await?,
            Some(Bytes::from_static(b"hello "))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_signature_is_recorded() -> Result<()> {
        let m = middleware(SigningConfig::builder());
        let mut exec = exec_ctx();
        let mut req = parts();
        m.sign(&Context::new(), &mut req, &mut Body::Empty, &mut exec).await?;

        let signature = exec.request_signature.expect("signature must be recorded");
        let authorization = req.headers[http::header::AUTHORIZATION].to_str().unwrap();
        assert!(authorization.ends_with(&format!("Signature={signature}")));
        assert!(authorization.contains("/20240101/us-west-2/s3/aws4_request"));
        Ok(())
    }

    #[tokio::test]
    async fn test_region_must_not_be_blank() {
        let m = middleware(SigningConfig::builder().region(""));
        let mut exec = ExecutionContext::new();
        let err = m
            .sign(&Context::new(), &mut parts(), &mut Body::Empty, &mut exec)
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
        assert!(exec.request_signature.is_none());
    }

    #[tokio::test]
    async fn test_base_region_is_used_without_override() -> Result<()> {
        let m = middleware(SigningConfig::builder().region("eu-central-1"));
        let mut req = parts();
        m.sign(&Context::new(), &mut req, &mut Body::Empty, &mut ExecutionContext::new())
            .await?;
        assert!(req.headers[http::header::AUTHORIZATION]
            .to_str()
            .unwrap()
            .contains("/eu-central-1/s3/aws4_request"));
        Ok(())
    }
}
