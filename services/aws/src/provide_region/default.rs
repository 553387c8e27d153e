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

use crate::provide_region::{EnvRegionProvider, ImdsRegionProvider, ProfileRegionProvider};
use async_trait::async_trait;
use sdkgate_core::{Context, ProvideRegion, ProvideRegionChain, Result};

/// DefaultRegionProvider resolves the region via the default chain.
///
/// Resolution order:
///
/// 1. `aws.region` property, then `AWS_REGION`
/// 2. `region` in the active shared config profile
/// 3. EC2 IMDSv2
#[derive(Debug)]
pub struct DefaultRegionProvider {
    chain: ProvideRegionChain,
}

impl Default for DefaultRegionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultRegionProvider {
    /// Create a new `DefaultRegionProvider` instance.
    pub fn new() -> Self {
        Self::with_profile_provider(ProfileRegionProvider::new())
    }

    /// Create a provider whose shared config step reads `profile`.
    pub fn with_profile(profile: impl Into<String>) -> Self {
        Self::with_profile_provider(ProfileRegionProvider::new().with_profile(profile))
    }

    fn with_profile_provider(profile: ProfileRegionProvider) -> Self {
        let chain = ProvideRegionChain::new(EnvRegionProvider::new())
            .push(profile)
            .push(ImdsRegionProvider::new());
        Self { chain }
    }

    /// Create with a custom region chain.
    pub fn with_chain(chain: ProvideRegionChain) -> Self {
        Self { chain }
    }

    /// Resolve the region, failing when no provider has one.
    pub async fn resolve(&self, ctx: &Context) -> Result<String> {
        self.chain.resolve(ctx).await
    }
}

#[async_trait]
impl ProvideRegion for DefaultRegionProvider {
    async fn provide_region(&self, ctx: &Context) -> Result<Option<String>> {
        self.chain.provide_region(ctx).await
    }
}
