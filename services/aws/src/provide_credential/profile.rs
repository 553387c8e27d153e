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

use crate::profile::{load_shared_config, Profile};
use crate::Credential;
use async_trait::async_trait;
use log::debug;
use sdkgate_core::{Context, Error, ProvideCredential, Result};

/// ProfileCredentialProvider loads AWS credentials from the shared config files.
///
/// Both `~/.aws/config` and `~/.aws/credentials` are read, or the paths set
/// through `AWS_CONFIG_FILE` and `AWS_SHARED_CREDENTIALS_FILE`. Keys defined in
/// the config file win over the credentials file.
///
/// The profile to use is determined by:
/// 1. The profile specified via `with_profile()`
/// 2. The `aws.profile` property or the `AWS_PROFILE` environment variable
/// 3. Default to "default"
#[derive(Debug, Default, Clone)]
pub struct ProfileCredentialProvider {
    profile: Option<String>,
}

impl ProfileCredentialProvider {
    /// Create a new ProfileCredentialProvider with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the profile name to use.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

/// Read static credentials out of a profile.
fn credential_from_profile(profile: &Profile) -> Result<Option<Credential>> {
    let access_key_id = profile.get("aws_access_key_id");
    let secret_access_key = profile.get("aws_secret_access_key");

    match (access_key_id, secret_access_key) {
        (Some(ak), Some(sk)) => Ok(Some(Credential {
            access_key_id: ak.to_string(),
            secret_access_key: sk.to_string(),
            session_token: profile.get("aws_session_token").map(|s| s.to_string()),
            expires_in: None,
        })),
        (None, None) => {
            debug!("profile {} has no static credentials", profile.name());
            Ok(None)
        }
        _ => Err(Error::credential_invalid(
            "profile must define both aws_access_key_id and aws_secret_access_key",
        )
        .with_context(format!("profile: {}", profile.name()))),
    }
}

#[async_trait]
impl ProvideCredential for ProfileCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let shared = load_shared_config(ctx, self.profile.as_deref()).await?;
        credential_from_profile(shared.active_profile())
    }
}
