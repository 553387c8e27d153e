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

use crate::profile::Profile;
use crate::setting::{AWS_MAX_ATTEMPTS, AWS_RETRY_MODE};
use sdkgate_core::{Context, Error, Result};
use std::fmt::{Display, Formatter};

/// Default number of attempts, first try included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry behavior requested through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryMode {
    /// Pre-standard behavior; treated like `Standard`.
    Legacy,
    /// Exponential backoff with jitter and a retry quota.
    #[default]
    Standard,
    /// Client-side rate limiting on top of `Standard`.
    Adaptive,
}

impl Display for RetryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RetryMode::Legacy => "legacy",
            RetryMode::Standard => "standard",
            RetryMode::Adaptive => "adaptive",
        })
    }
}

/// Parse a retry mode token.
///
/// `adaptive` is recognized but not available, and fails with a different
/// error kind than an unknown token.
pub fn parse_retry_mode(v: &str) -> Result<RetryMode> {
    match v.trim().to_lowercase().as_str() {
        "legacy" => Ok(RetryMode::Legacy),
        "standard" => Ok(RetryMode::Standard),
        "adaptive" => Err(Error::unimplemented(
            "retry mode 'adaptive' is not implemented yet",
        )),
        _ => Err(Error::unsupported(format!(
            "retry mode '{v}' is not supported, expected one of 'legacy', 'standard' or 'adaptive'"
        ))),
    }
}

/// Resolved retry options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryStrategyOptions {
    /// Attempts per request, at least 1.
    pub max_attempts: u32,
    /// Retry mode.
    pub retry_mode: RetryMode,
}

impl Default for RetryStrategyOptions {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_mode: RetryMode::Standard,
        }
    }
}

/// Resolve `max_attempts` and `retry_mode` from property, env and profile.
pub fn resolve_retry_strategy(
    ctx: &Context,
    profile: Option<&Profile>,
) -> Result<RetryStrategyOptions> {
    let defaults = RetryStrategyOptions::default();
    let max_attempts = AWS_MAX_ATTEMPTS.resolve(ctx, profile)?;
    let retry_mode = AWS_RETRY_MODE.resolve(ctx, profile)?;

    Ok(RetryStrategyOptions {
        max_attempts: max_attempts.unwrap_or(defaults.max_attempts),
        retry_mode: retry_mode.unwrap_or(defaults.retry_mode),
    })
}
