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

use crate::time::DateTime;
use crate::{Context, Result};
use std::fmt::Debug;

/// SigningCredential is a credential that can be used to sign requests.
pub trait SigningCredential: Clone + Debug + Send + Sync + Unpin + 'static {
    /// Check if the credential is complete and not about to expire.
    fn is_valid(&self, now: DateTime) -> bool;

    /// When the credential stops being usable, `None` if it never expires.
    fn expires_at(&self) -> Option<DateTime>;
}

/// ProvideCredential is the trait used to load credentials from one source.
///
/// Returning `Ok(None)` means "this source has nothing", which lets a chain
/// move on to the next source.
#[async_trait::async_trait]
pub trait ProvideCredential: Debug + Send + Sync + Unpin + 'static {
    /// Credential returned by this provider.
    type Credential: Send + Sync + Unpin + 'static;

    /// Load credential from current env.
    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>>;
}

/// ProvideRegion is the trait used to resolve a region from one source.
#[async_trait::async_trait]
pub trait ProvideRegion: Debug + Send + Sync + Unpin + 'static {
    /// Resolve the region, `Ok(None)` if this source has none.
    async fn provide_region(&self, ctx: &Context) -> Result<Option<String>>;
}
