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

//! Core components shared by every sdkgate service crate.
//!
//! ## Overview
//!
//! This crate defines the platform seam and the resolution primitives the AWS
//! config and signing code is built on:
//!
//! - [`Context`]: environment, process properties, file system, HTTP and clock
//! - [`ProvideCredential`] / [`ProvideRegion`]: one source of credentials or region
//! - [`ProvideChain`] ([`ProvideCredentialChain`] / [`ProvideRegionChain`]): ordered sources, first hit wins
//! - [`CachedValue`]: expiring cache with single-flight refresh
//! - [`SigningRequest`] and [`Body`]: the request as the signer sees it
//!
//! ## Example
//!
//! ```
//! use async_trait::async_trait;
//! use sdkgate_core::{Context, ProvideRegion, ProvideRegionChain, Result};
//!
//! #[derive(Debug)]
//! struct Fixed(&'static str);
//!
//! #[async_trait]
//! impl ProvideRegion for Fixed {
//!     async fn provide_region(&self, _: &Context) -> Result<Option<String>> {
//!         Ok(Some(self.0.to_string()))
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let chain = ProvideRegionChain::new(Fixed("us-east-1"));
//! assert_eq!(chain.resolve(&Context::new()).await?, "us-east-1");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod hash;
pub mod time;
pub mod utils;

mod context;
pub use context::{
    Clock, Context, Env, FileRead, HttpSend, ManualClock, NoopEnv, NoopFileRead, NoopHttpSend,
    NoopProperties, OsEnv, Properties, StaticEnv, StaticProperties, SystemClock,
};

mod error;
pub use error::{Error, ErrorKind, Result};

mod api;
pub use api::{ProvideCredential, ProvideRegion, SigningCredential};

mod chain;
pub use chain::{ChainMember, ProvideChain, ProvideCredentialChain, ProvideRegionChain};

mod cache;
pub use cache::CachedValue;

mod body;
pub use body::{Body, BodyStream, OneShotStream, ReplayableStream};

mod request;
pub use request::SigningRequest;
