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

//! AWS configuration resolution, credentials and SigV4 signing.
//!
//! ## Overview
//!
//! - [`profile`]: shared config file parser and the merged [`profile::SharedConfig`]
//! - [`setting`]: typed settings resolved from property, environment, profile and default
//! - [`DefaultCredentialProvider`] / [`DefaultRegionProvider`]: the default chains
//! - [`EndpointConfig`] / [`resolve_retry_strategy`]: client options
//! - [`SigV4SigningMiddleware`]: signs requests with an [`ExecutionContext`]
//!
//! ## Example
//!
//! ```no_run
//! use sdkgate_aws::{AwsConfig, ExecutionContext};
//! use sdkgate_core::{Body, Context};
//! use sdkgate_file_read_tokio::TokioFileRead;
//! use sdkgate_http_send_reqwest::ReqwestHttpSend;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let ctx = Context::new()
//!     .with_file_read(TokioFileRead)
//!     .with_http_send(ReqwestHttpSend::default())
//!     .with_env(sdkgate_core::OsEnv);
//!
//! let middleware = AwsConfig::new()
//!     .resolve(&ctx, "S3")
//!     .await?
//!     .into_signing_middleware("s3");
//!
//! let mut req = http::Request::get("https://bucket.s3.amazonaws.com/key")
//!     .body(())?
//!     .into_parts()
//!     .0;
//! middleware
//!     .sign(&ctx, &mut req, &mut Body::Empty, &mut ExecutionContext::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod constants;

mod credential;
pub use credential::Credential;

pub mod profile;
pub mod setting;

mod retry;
pub use retry::{
    parse_retry_mode, resolve_retry_strategy, RetryMode, RetryStrategyOptions,
    DEFAULT_MAX_ATTEMPTS,
};

mod endpoint;
pub use endpoint::{
    parse_account_id_endpoint_mode, resolve_account_id, resolve_account_id_endpoint_mode,
    resolve_endpoint_discovery_enabled, resolve_endpoint_url, resolve_use_dualstack,
    resolve_use_fips, AccountIdEndpointMode, EndpointConfig,
};

mod imds;
pub use imds::ImdsClient;

mod provide_credential;
pub use provide_credential::{
    DefaultCredentialProvider, EnvCredentialProvider, ImdsCredentialProvider,
    ProfileCredentialProvider, StaticCredentialProvider,
};

mod provide_region;
pub use provide_region::{
    DefaultRegionProvider, EnvRegionProvider, ImdsRegionProvider, ProfileRegionProvider,
    StaticRegionProvider,
};

mod sign;
pub use sign::{
    sign_request, SigV4SigningMiddleware, SignatureType, SignedBodyHeader, SignedBodyValue,
    SigningAlgorithm, SigningConfig, SigningConfigBuilder,
};

mod execution;
pub use execution::ExecutionContext;

mod config;
pub use config::{AwsConfig, ResolvedConfig};
