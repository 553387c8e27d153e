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

use crate::provide_credential::{
    EnvCredentialProvider, ImdsCredentialProvider, ProfileCredentialProvider,
};
use crate::Credential;
use async_trait::async_trait;
use sdkgate_core::time::Duration;
use sdkgate_core::{CachedValue, Context, ProvideCredential, ProvideCredentialChain, Result};

/// DefaultCredentialProvider is a loader that will try to load credential via default chains.
///
/// Resolution order:
///
/// 1. Process properties and environment variables
/// 2. Shared config (`~/.aws/config`, `~/.aws/credentials`)
/// 3. EC2 IMDSv2
///
/// The resolved credential is cached until 10 seconds before it expires.
/// Credentials without an expiry are reloaded every 15 minutes.
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    chain: ProvideCredentialChain<Credential>,
    cache: CachedValue<Credential>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultCredentialProvider {
    /// Create a new `DefaultCredentialProvider` instance.
    pub fn new() -> Self {
        Self::with_profile_provider(ProfileCredentialProvider::new())
    }

    /// Create a provider whose shared config step reads `profile`.
    pub fn with_profile(profile: impl Into<String>) -> Self {
        Self::with_profile_provider(ProfileCredentialProvider::new().with_profile(profile))
    }

    fn with_profile_provider(profile: ProfileCredentialProvider) -> Self {
        let chain = ProvideCredentialChain::new(EnvCredentialProvider::new())
            .push(profile)
            .push(ImdsCredentialProvider::new());
        Self::with_chain(chain)
    }

    /// Create with a custom credential chain.
    pub fn with_chain(chain: ProvideCredentialChain<Credential>) -> Self {
        Self {
            chain,
            cache: CachedValue::new(Duration::try_seconds(10).expect("in bounds")),
        }
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let cred = self
            .cache
            .get_or_load(ctx, || async {
                let cred = self.chain.resolve(ctx).await?;
                let expires_at = cred.expires_in.unwrap_or_else(|| {
                    ctx.now() + Duration::try_minutes(15).expect("in bounds")
                });
                Ok((cred, Some(expires_at)))
            })
            .await?;
        Ok(Some(cred))
    }
}
