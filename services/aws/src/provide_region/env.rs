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

use crate::setting::AWS_REGION;
use async_trait::async_trait;
use sdkgate_core::{Context, ProvideRegion, Result};

/// EnvRegionProvider reads the `aws.region` property or the `AWS_REGION`
/// environment variable.
#[derive(Debug, Default, Clone)]
pub struct EnvRegionProvider;

impl EnvRegionProvider {
    /// Create a new EnvRegionProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideRegion for EnvRegionProvider {
    async fn provide_region(&self, ctx: &Context) -> Result<Option<String>> {
        Ok(AWS_REGION
            .resolve_from_env(ctx)?
            .filter(|v| !v.trim().is_empty()))
    }
}
