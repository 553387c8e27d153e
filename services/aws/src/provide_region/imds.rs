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

use crate::constants::IMDS_REGION_PATH;
use crate::imds::ImdsClient;
use crate::setting::AWS_EC2_METADATA_DISABLED;
use async_trait::async_trait;
use log::debug;
use sdkgate_core::time::Duration;
use sdkgate_core::{CachedValue, Context, ProvideRegion, Result};

/// ImdsRegionProvider asks the instance metadata service which region the
/// current EC2 instance runs in.
///
/// The region of an instance never changes, so the first answer is kept.
#[derive(Debug)]
pub struct ImdsRegionProvider {
    client: ImdsClient,
    region: CachedValue<String>,
}

impl Default for ImdsRegionProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ImdsRegionProvider {
    /// Create a new `ImdsRegionProvider` instance.
    pub fn new() -> Self {
        Self {
            client: ImdsClient::new(),
            region: CachedValue::new(Duration::zero()),
        }
    }

    /// Use the given metadata client.
    pub fn with_client(mut self, client: ImdsClient) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl ProvideRegion for ImdsRegionProvider {
    async fn provide_region(&self, ctx: &Context) -> Result<Option<String>> {
        if AWS_EC2_METADATA_DISABLED
            .resolve_from_env(ctx)?
            .unwrap_or_default()
        {
            debug!("instance metadata is disabled, skipping");
            return Ok(None);
        }

        let region = self
            .region
            .get_or_load(ctx, || async {
                let region = self.client.get(ctx, IMDS_REGION_PATH).await?;
                Ok((region.trim().to_string(), None))
            })
            .await?;
        Ok(Some(region))
    }
}
