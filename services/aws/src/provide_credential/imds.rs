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

use crate::constants::IMDS_CREDENTIALS_PATH;
use crate::imds::ImdsClient;
use crate::setting::AWS_EC2_METADATA_DISABLED;
use crate::Credential;
use async_trait::async_trait;
use log::debug;
use sdkgate_core::time::parse_rfc3339;
use sdkgate_core::{Context, Error, ProvideCredential, Result};
use serde::Deserialize;

/// ImdsCredentialProvider loads the credentials of the IAM role attached to
/// the current EC2 instance.
///
/// Returns `None` when `AWS_EC2_METADATA_DISABLED` is true.
#[derive(Debug, Default)]
pub struct ImdsCredentialProvider {
    client: ImdsClient,
}

impl ImdsCredentialProvider {
    /// Create a new `ImdsCredentialProvider` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given metadata client.
    pub fn with_client(mut self, client: ImdsClient) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl ProvideCredential for ImdsCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        if AWS_EC2_METADATA_DISABLED
            .resolve_from_env(ctx)?
            .unwrap_or_default()
        {
            debug!("instance metadata is disabled, skipping");
            return Ok(None);
        }

        // List the roles attached to the instance and use the first one.
        let roles = self.client.get(ctx, IMDS_CREDENTIALS_PATH).await?;
        let Some(role) = roles.lines().map(str::trim).find(|l| !l.is_empty()) else {
            return Err(
                Error::config_invalid("no IAM role attached to EC2 instance")
                    .with_context("hint: attach an IAM role to your EC2 instance"),
            );
        };

        let content = self
            .client
            .get(ctx, &format!("{IMDS_CREDENTIALS_PATH}{role}"))
            .await
            .map_err(|e| e.with_context(format!("role: {role}")))?;
        let resp: Ec2MetadataIamSecurityCredentials =
            serde_json::from_str(&content).map_err(|e| {
                Error::unexpected("failed to parse IMDS credentials response")
                    .with_source(e)
                    .with_context(format!("response_length: {}", content.len()))
                    .with_context(format!("role: {role}"))
            })?;

        match resp.code.as_str() {
            "Success" => {}
            "AssumeRoleUnauthorizedAccess" => {
                return Err(Error::permission_denied(format!(
                    "EC2 instance not authorized to assume role: {}",
                    resp.message
                ))
                .with_context(format!("error_code: {}", resp.code))
                .with_context(format!("role: {role}")));
            }
            code if code.contains("Expired") => {
                return Err(Error::credential_invalid(format!(
                    "IMDS credentials expired: {}",
                    resp.message
                ))
                .with_context(format!("error_code: {}", resp.code))
                .with_context(format!("role: {role}")));
            }
            _ => {
                return Err(Error::unexpected(format!(
                    "IMDS returned error: [{}] {}",
                    resp.code, resp.message
                ))
                .with_context(format!("role: {role}")));
            }
        }

        let expires_in = parse_rfc3339(&resp.expiration)?;
        Ok(Some(Credential {
            access_key_id: resp.access_key_id,
            secret_access_key: resp.secret_access_key,
            session_token: Some(resp.token),
            expires_in: Some(expires_in),
        }))
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Ec2MetadataIamSecurityCredentials {
    access_key_id: String,
    secret_access_key: String,
    token: String,
    expiration: String,

    code: String,
    message: String,
}
