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

//! Resolution of individual configuration values.
//!
//! Every value is described by a [`Setting`] descriptor and resolved from the
//! first source that has it: process property, then environment variable,
//! then the active profile, then the built-in default. A value that is present
//! but fails to parse is an error; it never falls through to a lower source.

use crate::profile::Profile;
use sdkgate_core::{Context, Error, Result};
use std::fmt::{Debug, Formatter};

/// Describes where one configuration value may come from and how to parse it.
pub struct Setting<T: 'static> {
    /// Environment variable name.
    pub env: &'static str,
    /// Process property name.
    pub property: &'static str,
    /// Key inside the active profile, if the value may come from shared config.
    pub profile_key: Option<&'static str>,
    /// Value used when no source has one.
    pub default: Option<fn() -> T>,
    /// Turns the raw string into `T`.
    pub parse: fn(&str) -> Result<T>,
}

impl<T> Debug for Setting<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Setting")
            .field("env", &self.env)
            .field("property", &self.property)
            .field("profile_key", &self.profile_key)
            .finish()
    }
}

impl<T> Setting<T> {
    /// Resolve the value from property, environment and then the profile.
    ///
    /// Returns the default when none of them has a value.
    pub fn resolve(&self, ctx: &Context, profile: Option<&Profile>) -> Result<Option<T>> {
        if let Some(v) = ctx.property(self.property) {
            return self.parse_from(&v, format!("property: {}", self.property));
        }
        if let Some(v) = ctx.env_var(self.env) {
            return self.parse_from(&v, format!("env: {}", self.env));
        }
        if let (Some(key), Some(profile)) = (self.profile_key, profile) {
            if let Some(v) = profile.get(key) {
                return self.parse_from(v, format!("profile {}: {key}", profile.name()));
            }
        }
        Ok(self.default.map(|f| f()))
    }

    /// Resolve only from property and environment.
    pub fn resolve_from_env(&self, ctx: &Context) -> Result<Option<T>> {
        self.resolve(ctx, None)
    }

    /// Resolve the service-scoped variant of this setting.
    ///
    /// The property is `<property><ServiceId>`, the environment variable is
    /// `<ENV>_<SERVICE_ID>` and the profile value is the `<service_id>`
    /// sub-property `<profile_key>` of the given services section. Defaults do
    /// not apply.
    pub fn resolve_for_service(
        &self,
        ctx: &Context,
        service_id: &str,
        services_section: Option<&Profile>,
    ) -> Result<Option<T>> {
        let property = format!("{}{}", self.property, service_property_suffix(service_id));
        if let Some(v) = ctx.property(&property) {
            return self.parse_from(&v, format!("property: {property}"));
        }
        let env = format!("{}_{}", self.env, service_env_suffix(service_id));
        if let Some(v) = ctx.env_var(&env) {
            return self.parse_from(&v, format!("env: {env}"));
        }
        if let (Some(key), Some(section)) = (self.profile_key, services_section) {
            let service_key = service_config_key(service_id);
            if let Some(v) = section.sub_property(&service_key, key) {
                return self.parse_from(
                    &v,
                    format!("services {}: {service_key}.{key}", section.name()),
                );
            }
        }
        Ok(None)
    }

    fn parse_from(&self, raw: &str, source: String) -> Result<Option<T>> {
        (self.parse)(raw).map(Some).map_err(|e| e.with_context(source))
    }
}

/// `S3 Control` -> `S3_CONTROL`
pub fn service_env_suffix(service_id: &str) -> String {
    service_id.trim().replace(' ', "_").to_uppercase()
}

/// `S3 Control` -> `S3Control`
pub fn service_property_suffix(service_id: &str) -> String {
    service_id
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

/// `S3 Control` -> `s3_control`
pub fn service_config_key(service_id: &str) -> String {
    service_id.trim().replace(' ', "_").to_lowercase()
}

/// Keep the raw string.
pub fn parse_string(v: &str) -> Result<String> {
    Ok(v.to_string())
}

/// Case-insensitive `true` or `false`.
pub fn parse_bool(v: &str) -> Result<bool> {
    match v.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(Error::config_invalid(format!(
            "'{v}' is not a valid boolean, expected 'true' or 'false'"
        ))),
    }
}

/// A positive integer.
pub fn parse_max_attempts(v: &str) -> Result<u32> {
    let n: i64 = v.trim().parse().map_err(|e| {
        Error::config_invalid(format!("max attempts '{v}' is not an integer")).with_source(e)
    })?;
    if n < 1 {
        return Err(Error::value_out_of_range(format!(
            "max attempts must be at least 1, got {n}"
        )));
    }
    u32::try_from(n)
        .map_err(|_| Error::value_out_of_range(format!("max attempts {n} is too large")))
}

macro_rules! setting {
    ($(#[$meta:meta])* $name:ident: $ty:ty = $env:literal, $prop:literal, $key:expr, $default:expr, $parse:expr) => {
        $(#[$meta])*
        pub const $name: Setting<$ty> = Setting {
            env: $env,
            property: $prop,
            profile_key: $key,
            default: $default,
            parse: $parse,
        };
    };
}

setting!(
    /// Access key id of static credentials.
    AWS_ACCESS_KEY_ID: String = "AWS_ACCESS_KEY_ID", "aws.accessKeyId", Some("aws_access_key_id"), None, parse_string
);
setting!(
    /// Secret access key of static credentials.
    AWS_SECRET_ACCESS_KEY: String = "AWS_SECRET_ACCESS_KEY", "aws.secretAccessKey", Some("aws_secret_access_key"), None, parse_string
);
setting!(
    /// Session token of temporary credentials.
    AWS_SESSION_TOKEN: String = "AWS_SESSION_TOKEN", "aws.sessionToken", Some("aws_session_token"), None, parse_string
);
setting!(
    /// Region requests are sent to and signed for.
    AWS_REGION: String = "AWS_REGION", "aws.region", Some("region"), None, parse_string
);
setting!(
    /// Path of the shared config file.
    AWS_CONFIG_FILE: String = "AWS_CONFIG_FILE", "aws.configFile", None, Some(|| crate::constants::DEFAULT_CONFIG_FILE.to_string()), parse_string
);
setting!(
    /// Path of the shared credentials file.
    AWS_SHARED_CREDENTIALS_FILE: String = "AWS_SHARED_CREDENTIALS_FILE", "aws.sharedCredentialsFile", None, Some(|| crate::constants::DEFAULT_CREDENTIALS_FILE.to_string()), parse_string
);
setting!(
    /// Name of the active profile.
    AWS_PROFILE: String = "AWS_PROFILE", "aws.profile", None, Some(|| crate::constants::DEFAULT_PROFILE.to_string()), parse_string
);
setting!(
    /// Turns the instance metadata providers off.
    AWS_EC2_METADATA_DISABLED: bool = "AWS_EC2_METADATA_DISABLED", "aws.disableEc2Metadata", None, Some(|| false), parse_bool
);
setting!(
    /// Overrides the instance metadata endpoint.
    AWS_EC2_METADATA_SERVICE_ENDPOINT: String = "AWS_EC2_METADATA_SERVICE_ENDPOINT", "aws.ec2MetadataServiceEndpoint", Some("ec2_metadata_service_endpoint"), None, parse_string
);
setting!(
    /// Maximum number of attempts per request, first try included.
    AWS_MAX_ATTEMPTS: u32 = "AWS_MAX_ATTEMPTS", "aws.maxAttempts", Some("max_attempts"), None, parse_max_attempts
);
setting!(
    /// Retry mode token.
    AWS_RETRY_MODE: crate::RetryMode = "AWS_RETRY_MODE", "aws.retryMode", Some("retry_mode"), None, crate::retry::parse_retry_mode
);
setting!(
    /// Use FIPS endpoints.
    AWS_USE_FIPS_ENDPOINT: bool = "AWS_USE_FIPS_ENDPOINT", "aws.useFipsEndpoint", Some("use_fips_endpoint"), None, parse_bool
);
setting!(
    /// Use dual-stack endpoints.
    AWS_USE_DUALSTACK_ENDPOINT: bool = "AWS_USE_DUALSTACK_ENDPOINT", "aws.useDualstackEndpoint", Some("use_dualstack_endpoint"), None, parse_bool
);
setting!(
    /// Endpoint url override, global or per service.
    AWS_ENDPOINT_URL: String = "AWS_ENDPOINT_URL", "aws.endpointUrl", Some("endpoint_url"), None, parse_string
);
setting!(
    /// Ignore every configured endpoint url override.
    AWS_IGNORE_CONFIGURED_ENDPOINT_URLS: bool = "AWS_IGNORE_CONFIGURED_ENDPOINT_URLS", "aws.ignoreConfiguredEndpointUrls", Some("ignore_configured_endpoint_urls"), Some(|| false), parse_bool
);
setting!(
    /// How account ids are used to route requests.
    AWS_ACCOUNT_ID_ENDPOINT_MODE: crate::AccountIdEndpointMode = "AWS_ACCOUNT_ID_ENDPOINT_MODE", "aws.accountIdEndpointMode", Some("account_id_endpoint_mode"), None, crate::endpoint::parse_account_id_endpoint_mode
);
setting!(
    /// Enable endpoint discovery.
    AWS_ENABLE_ENDPOINT_DISCOVERY: bool = "AWS_ENABLE_ENDPOINT_DISCOVERY", "aws.endpointDiscoveryEnabled", Some("endpoint_discovery_enabled"), None, parse_bool
);
