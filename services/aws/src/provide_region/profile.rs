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

use crate::profile::load_shared_config;
use async_trait::async_trait;
use sdkgate_core::{Context, ProvideRegion, Result};

/// ProfileRegionProvider reads `region` from the active shared config profile.
#[derive(Debug, Default, Clone)]
pub struct ProfileRegionProvider {
    profile: Option<String>,
}

impl ProfileRegionProvider {
    /// Create a new ProfileRegionProvider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the profile name to use.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

#[async_trait]
impl ProvideRegion for ProfileRegionProvider {
    async fn provide_region(&self, ctx: &Context) -> Result<Option<String>> {
        let shared = load_shared_config(ctx, self.profile.as_deref()).await?;
        Ok(shared
            .active_profile()
            .get("region")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.to_string()))
    }
}
