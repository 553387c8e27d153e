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

use crate::sign::{SignedBodyHeader, SignedBodyValue};
use sdkgate_core::time::DateTime;
use std::collections::HashMap;

/// Per-request state shared between the operation and the signing middleware.
///
/// Overrides set here win over the middleware's base signing config. The
/// middleware writes the resulting signature back into `request_signature`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionContext {
    /// Region to sign for, instead of the configured one.
    pub signing_region: Option<String>,
    /// Service signing name, instead of the configured one.
    pub signing_service: Option<String>,
    /// Signing time, instead of the context clock.
    pub signing_date: Option<DateTime>,
    /// Sign with `UNSIGNED-PAYLOAD` instead of hashing the body.
    pub unsigned_payload: bool,
    /// Payload hash known in advance, skips hashing the body.
    pub signed_body_value: Option<SignedBodyValue>,
    /// Whether to send the payload hash header, instead of the configured choice.
    pub signed_body_header: Option<SignedBodyHeader>,
    /// Account id of the caller, if known.
    pub account_id: Option<String>,
    /// Signature of the last signed request.
    pub request_signature: Option<String>,
    /// Free-form attributes, such as business metric tags.
    pub extensions: HashMap<String, String>,
}

impl ExecutionContext {
    /// Create an empty execution context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the signing region.
    pub fn with_signing_region(mut self, region: impl Into<String>) -> Self {
        self.signing_region = Some(region.into());
        self
    }

    /// Override the service signing name.
    pub fn with_signing_service(mut self, service: impl Into<String>) -> Self {
        self.signing_service = Some(service.into());
        self
    }

    /// Override the signing time.
    pub fn with_signing_date(mut self, date: DateTime) -> Self {
        self.signing_date = Some(date);
        self
    }

    /// Request an unsigned payload.
    pub fn with_unsigned_payload(mut self) -> Self {
        self.unsigned_payload = true;
        self
    }

    /// Provide the payload hash up front.
    pub fn with_signed_body_value(mut self, value: SignedBodyValue) -> Self {
        self.signed_body_value = Some(value);
        self
    }

    /// Override whether the payload hash header is sent.
    pub fn with_signed_body_header(mut self, header: SignedBodyHeader) -> Self {
        self.signed_body_header = Some(header);
        self
    }

    /// Set the caller's account id.
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Set a free-form attribute.
    pub fn insert_extension(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extensions.insert(key.into(), value.into());
    }

    /// Get a free-form attribute.
    pub fn extension(&self, key: &str) -> Option<&str> {
        self.extensions.get(key).map(|v| v.as_str())
    }
}
