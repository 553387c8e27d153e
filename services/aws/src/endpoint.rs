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

//! Endpoint related configuration: url overrides, FIPS, dual-stack, account id
//! routing and endpoint discovery.

use crate::profile::{Profile, SharedConfig};
use crate::setting::{
    service_config_key, service_env_suffix, service_property_suffix, AWS_ACCOUNT_ID_ENDPOINT_MODE,
    AWS_ENABLE_ENDPOINT_DISCOVERY, AWS_ENDPOINT_URL, AWS_IGNORE_CONFIGURED_ENDPOINT_URLS,
    AWS_USE_DUALSTACK_ENDPOINT, AWS_USE_FIPS_ENDPOINT,
};
use log::debug;
use sdkgate_core::{Context, Error, Result};
use std::fmt::{Display, Formatter};

/// Find the endpoint url configured for `service_id`.
///
/// Sources in order:
///
/// 1. `AWS_ENDPOINT_URL_<SERVICE_ID>`
/// 2. `aws.endpointUrl<ServiceId>`
/// 3. `AWS_ENDPOINT_URL`
/// 4. `aws.endpointUrl`
/// 5. `<service_id>.endpoint_url` in the services section of the active profile
/// 6. `endpoint_url` in the active profile
///
/// If `ignore_configured_endpoint_urls` resolves true from any source, every
/// override above is ignored and `None` is returned.
pub fn resolve_endpoint_url(
    ctx: &Context,
    shared: &SharedConfig,
    service_id: &str,
) -> Result<Option<String>> {
    let profile = shared.active_profile();
    if AWS_IGNORE_CONFIGURED_ENDPOINT_URLS
        .resolve(ctx, Some(profile))?
        .unwrap_or_default()
    {
        debug!("configured endpoint urls are ignored for service {service_id}");
        return Ok(None);
    }

    let env = format!("{}_{}", AWS_ENDPOINT_URL.env, service_env_suffix(service_id));
    if let Some(v) = ctx.env_var(&env) {
        return Ok(Some(v));
    }
    let property = format!(
        "{}{}",
        AWS_ENDPOINT_URL.property,
        service_property_suffix(service_id)
    );
    if let Some(v) = ctx.property(&property) {
        return Ok(Some(v));
    }
    if let Some(v) = ctx.env_var(AWS_ENDPOINT_URL.env) {
        return Ok(Some(v));
    }
    if let Some(v) = ctx.property(AWS_ENDPOINT_URL.property) {
        return Ok(Some(v));
    }

    if let Some(section) = shared.services_section(profile)? {
        if let Some(v) = section.sub_property(&service_config_key(service_id), "endpoint_url") {
            return Ok(Some(v));
        }
    }
    Ok(profile.get("endpoint_url").map(|v| v.to_string()))
}

/// Whether FIPS endpoints are requested, `None` when unset.
pub fn resolve_use_fips(ctx: &Context, profile: &Profile) -> Result<Option<bool>> {
    AWS_USE_FIPS_ENDPOINT.resolve(ctx, Some(profile))
}

/// Whether dual-stack endpoints are requested, `None` when unset.
pub fn resolve_use_dualstack(ctx: &Context, profile: &Profile) -> Result<Option<bool>> {
    AWS_USE_DUALSTACK_ENDPOINT.resolve(ctx, Some(profile))
}

/// Whether endpoint discovery is on.
///
/// Falls back to whether the service itself requires discovery.
pub fn resolve_endpoint_discovery_enabled(
    ctx: &Context,
    profile: &Profile,
    service_requires: bool,
) -> Result<bool> {
    Ok(AWS_ENABLE_ENDPOINT_DISCOVERY
        .resolve(ctx, Some(profile))?
        .unwrap_or(service_requires))
}

/// How the caller's account id takes part in endpoint resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountIdEndpointMode {
    /// Use the account id when one is available.
    #[default]
    Preferred,
    /// Never use the account id.
    Disabled,
    /// Fail when no account id is available.
    Required,
}

impl Display for AccountIdEndpointMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AccountIdEndpointMode::Preferred => "preferred",
            AccountIdEndpointMode::Disabled => "disabled",
            AccountIdEndpointMode::Required => "required",
        })
    }
}

/// Parse an account id endpoint mode token, case-insensitive.
pub fn parse_account_id_endpoint_mode(v: &str) -> Result<AccountIdEndpointMode> {
    match v.trim().to_lowercase().as_str() {
        "preferred" => Ok(AccountIdEndpointMode::Preferred),
        "disabled" => Ok(AccountIdEndpointMode::Disabled),
        "required" => Ok(AccountIdEndpointMode::Required),
        _ => Err(Error::unsupported(format!(
            "account id endpoint mode '{v}' is not supported, expected one of 'preferred', 'disabled' or 'required'"
        ))),
    }
}

/// Resolve the account id endpoint mode, `Preferred` when unset.
pub fn resolve_account_id_endpoint_mode(
    ctx: &Context,
    profile: &Profile,
) -> Result<AccountIdEndpointMode> {
    Ok(AWS_ACCOUNT_ID_ENDPOINT_MODE
        .resolve(ctx, Some(profile))?
        .unwrap_or_default())
}

/// Pick the account id to route with under `mode`.
pub fn resolve_account_id(
    mode: AccountIdEndpointMode,
    account_id: Option<&str>,
) -> Result<Option<String>> {
    match mode {
        AccountIdEndpointMode::Preferred => Ok(account_id.map(|v| v.to_string())),
        AccountIdEndpointMode::Disabled => Ok(None),
        AccountIdEndpointMode::Required => match account_id {
            Some(v) => Ok(Some(v.to_string())),
            None => Err(Error::config_invalid(
                "AccountIdEndpointMode is set to required but no AWS account ID found",
            )),
        },
    }
}

/// Endpoint settings resolved for one service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Configured endpoint url override.
    pub endpoint_url: Option<String>,
    /// Use dual-stack endpoints.
    pub use_dualstack: bool,
    /// Use FIPS endpoints.
    pub use_fips: bool,
    /// Account id routing mode.
    pub account_id_endpoint_mode: AccountIdEndpointMode,
}

impl EndpointConfig {
    /// Resolve every endpoint setting of `service_id`.
    pub fn resolve(ctx: &Context, shared: &SharedConfig, service_id: &str) -> Result<Self> {
        let profile = shared.active_profile();
        Ok(Self {
            endpoint_url: resolve_endpoint_url(ctx, shared, service_id)?,
            use_dualstack: resolve_use_dualstack(ctx, profile)?.unwrap_or_default(),
            use_fips: resolve_use_fips(ctx, profile)?.unwrap_or_default(),
            account_id_endpoint_mode: resolve_account_id_endpoint_mode(ctx, profile)?,
        })
    }
}
