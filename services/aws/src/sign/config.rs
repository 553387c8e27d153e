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
use crate::Credential;
use sdkgate_core::hash::EMPTY_SHA256;
use sdkgate_core::time::{now, DateTime, Duration};
use sdkgate_core::{Error, Result};

/// Signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SigningAlgorithm {
    /// `AWS4-HMAC-SHA256`.
    #[default]
    SigV4,
    /// `AWS4-ECDSA-P256-SHA256`, used for multi-region access points.
    SigV4Asymmetric,
}

/// Where the signature goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureType {
    /// `Authorization` header.
    #[default]
    Headers,
    /// Presigned url query parameters, requires an expiry.
    QueryParams,
}

/// The payload hash that goes into the canonical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignedBodyValue {
    /// SHA256 of the empty payload.
    Empty,
    /// `UNSIGNED-PAYLOAD`.
    UnsignedPayload,
    /// `STREAMING-AWS4-HMAC-SHA256-PAYLOAD`, for chunked uploads.
    StreamingPayload,
    /// `STREAMING-AWS4-HMAC-SHA256-EVENTS`, for event streams.
    StreamingEvents,
    /// A hash computed by the caller.
    Precomputed(String),
}

impl SignedBodyValue {
    /// The value as written into the canonical request.
    pub fn as_str(&self) -> &str {
        match self {
            SignedBodyValue::Empty => EMPTY_SHA256,
            SignedBodyValue::UnsignedPayload => UNSIGNED_PAYLOAD,
            SignedBodyValue::StreamingPayload => STREAMING_AWS4_HMAC_SHA256_PAYLOAD,
            SignedBodyValue::StreamingEvents => STREAMING_AWS4_HMAC_SHA256_EVENTS,
            SignedBodyValue::Precomputed(v) => v,
        }
    }
}

/// Whether the payload hash is also sent as a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignedBodyHeader {
    /// Don't add a header.
    #[default]
    None,
    /// Add `x-amz-content-sha256`, as S3 requires.
    XAmzContentSha256,
}

/// Everything needed to sign one request.
///
/// Build it with [`SigningConfig::builder`].
#[derive(Debug, Clone)]
pub struct SigningConfig {
    /// Region the request is signed for.
    pub region: String,
    /// Signing name of the service.
    pub service: String,
    /// Credential to sign with.
    pub credential: Credential,
    /// Signing algorithm.
    pub algorithm: SigningAlgorithm,
    /// Signing time.
    pub date: DateTime,
    /// Header or query signature.
    pub signature_type: SignatureType,
    /// Payload hash written into the canonical request.
    pub signed_body_value: SignedBodyValue,
    /// Whether the payload hash is sent as a header.
    pub signed_body_header: SignedBodyHeader,
    /// Remove `.` and `..` segments from the path before signing.
    pub normalize_uri_path: bool,
    /// Encode the already encoded path once more. Every service but S3 wants this.
    pub use_double_uri_encode: bool,
    /// Add the session token after signing instead of signing it.
    pub omit_session_token: bool,
    /// Validity of a presigned request.
    pub expires_in: Option<Duration>,
}

impl SigningConfig {
    /// Start building a config with default flags.
    pub fn builder() -> SigningConfigBuilder {
        SigningConfigBuilder::default()
    }
}

/// Builder of [`SigningConfig`].
///
/// Any field may be left unset while layering partial configs; [`build`]
/// checks that the result is complete.
///
/// [`build`]: SigningConfigBuilder::build
#[derive(Debug, Clone)]
pub struct SigningConfigBuilder {
    region: Option<String>,
    service: Option<String>,
    credential: Option<Credential>,
    algorithm: SigningAlgorithm,
    date: Option<DateTime>,
    signature_type: SignatureType,
    signed_body_value: Option<SignedBodyValue>,
    signed_body_header: SignedBodyHeader,
    normalize_uri_path: bool,
    use_double_uri_encode: bool,
    omit_session_token: bool,
    expires_in: Option<Duration>,
}

impl Default for SigningConfigBuilder {
    fn default() -> Self {
        Self {
            region: None,
            service: None,
            credential: None,
            algorithm: SigningAlgorithm::SigV4,
            date: None,
            signature_type: SignatureType::Headers,
            signed_body_value: None,
            signed_body_header: SignedBodyHeader::None,
            normalize_uri_path: true,
            use_double_uri_encode: true,
            omit_session_token: false,
            expires_in: None,
        }
    }
}

impl SigningConfigBuilder {
    /// Set the region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the service signing name.
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Set the credential.
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Set the algorithm.
    pub fn algorithm(mut self, algorithm: SigningAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the signing time. Defaults to now.
    pub fn date(mut self, date: DateTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Set where the signature goes.
    pub fn signature_type(mut self, signature_type: SignatureType) -> Self {
        self.signature_type = signature_type;
        self
    }

    /// Set the payload hash. Defaults to `UNSIGNED-PAYLOAD`.
    pub fn signed_body_value(mut self, value: SignedBodyValue) -> Self {
        self.signed_body_value = Some(value);
        self
    }

    /// Set whether the payload hash is sent as a header.
    pub fn signed_body_header(mut self, header: SignedBodyHeader) -> Self {
        self.signed_body_header = header;
        self
    }

    /// Set path normalization.
    pub fn normalize_uri_path(mut self, v: bool) -> Self {
        self.normalize_uri_path = v;
        self
    }

    /// Set double uri encoding.
    pub fn use_double_uri_encode(mut self, v: bool) -> Self {
        self.use_double_uri_encode = v;
        self
    }

    /// Set whether the session token stays out of the signature.
    pub fn omit_session_token(mut self, v: bool) -> Self {
        self.omit_session_token = v;
        self
    }

    /// Set how long a presigned request stays valid.
    pub fn expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    /// The region set so far, if any.
    pub fn get_region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Validate and build the config.
    pub fn build(self) -> Result<SigningConfig> {
        let region = match self.region {
            Some(v) if !v.trim().is_empty() => v,
            _ => return Err(Error::request_invalid("signing region must not be blank")),
        };
        let service = match self.service {
            Some(v) if !v.trim().is_empty() => v,
            _ => return Err(Error::request_invalid("signing service must not be blank")),
        };
        let credential = self
            .credential
            .ok_or_else(|| Error::credential_invalid("signing credential is required"))?;
        if self.signature_type == SignatureType::QueryParams {
            match self.expires_in {
                Some(d) if d > Duration::zero() => {}
                _ => {
                    return Err(Error::request_invalid(
                        "presigned requests require a positive expiry",
                    ))
                }
            }
        }

        Ok(SigningConfig {
            region,
            service,
            credential,
            algorithm: self.algorithm,
            date: self.date.unwrap_or_else(now),
            signature_type: self.signature_type,
            signed_body_value: self
                .signed_body_value
                .unwrap_or(SignedBodyValue::UnsignedPayload),
            signed_body_header: self.signed_body_header,
            normalize_uri_path: self.normalize_uri_path,
            use_double_uri_encode: self.use_double_uri_encode,
            omit_session_token: self.omit_session_token,
            expires_in: self.expires_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdkgate_core::ErrorKind;

    fn base() -> SigningConfigBuilder {
        SigningConfig::builder()
            .service("s3")
            .credential(Credential::new("ak", "sk"))
    }

    #[test]
    fn test_defaults() -> Result<()> {
        let config = base().region("us-east-1").build()?;
        assert_eq!(config.algorithm, SigningAlgorithm::SigV4);
        assert_eq!(config.signature_type, SignatureType::Headers);
        assert_eq!(config.signed_body_value, SignedBodyValue::UnsignedPayload);
        assert_eq!(config.signed_body_header, SignedBodyHeader::None);
        assert!(config.normalize_uri_path);
        assert!(config.use_double_uri_encode);
        assert!(!config.omit_session_token);
        Ok(())
    }

    #[test]
    fn test_blank_region_is_rejected() {
        for builder in [base(), base().region(""), base().region("  ")] {
            let err = builder.build().expect_err("must fail");
            assert_eq!(err.kind(), ErrorKind::RequestInvalid);
            assert_eq!(err.message(), "signing region must not be blank");
        }
    }

    #[test]
    fn test_presign_requires_expiry() {
        let err = base()
            .region("us-east-1")
            .signature_type(SignatureType::QueryParams)
            .build()
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    }

    #[test]
    fn test_signed_body_values() {
        assert_eq!(SignedBodyValue::Empty.as_str(), EMPTY_SHA256);
        assert_eq!(SignedBodyValue::UnsignedPayload.as_str(), "UNSIGNED-PAYLOAD");
        assert_eq!(
            SignedBodyValue::StreamingPayload.as_str(),
            "STREAMING-AWS4-HMAC-SHA256-PAYLOAD"
        );
        assert_eq!(
            SignedBodyValue::StreamingEvents.as_str(),
            "STREAMING-AWS4-HMAC-SHA256-EVENTS"
        );
        assert_eq!(SignedBodyValue::Precomputed("abc".into()).as_str(), "abc");
    }
}
