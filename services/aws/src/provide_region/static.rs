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

use async_trait::async_trait;
use sdkgate_core::{Context, ProvideRegion, Result};

/// StaticRegionProvider always provides the same region.
#[derive(Debug, Clone)]
pub struct StaticRegionProvider {
    region: String,
}

impl StaticRegionProvider {
    /// Create a provider for `region`.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
        }
    }
}

#[async_trait]
impl ProvideRegion for StaticRegionProvider {
    async fn provide_region(&self, _: &Context) -> Result<Option<String>> {
        Ok(Some(self.region.clone()))
    }
}
