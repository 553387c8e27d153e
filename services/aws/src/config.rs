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

use crate::endpoint::{resolve_account_id_endpoint_mode, resolve_endpoint_url};
use crate::endpoint::{resolve_use_dualstack, resolve_use_fips};
use crate::profile::load_shared_config;
use crate::provide_credential::{DefaultCredentialProvider, StaticCredentialProvider};
use crate::provide_region::{
    DefaultRegionProvider, EnvRegionProvider, ImdsRegionProvider, StaticRegionProvider,
};
use crate::retry::resolve_retry_strategy;
use crate::sign::{SigV4SigningMiddleware, SigningConfig};
use crate::{
    AccountIdEndpointMode, Credential, EndpointConfig, RetryMode, RetryStrategyOptions,
};
use log::debug;
use sdkgate_core::{Context, Error, ProvideCredential, ProvideRegionChain, Result};
use std::fmt::{Debug, Formatter};

/// Client configuration with explicit overrides.
///
/// Every value set here wins over what [`AwsConfig::resolve`] would find in
/// properties, environment variables or the shared config files.
///
/// ```no_run
/// use sdkgate_aws::AwsConfig;
/// use sdkgate_core::Context;
///
/// # async fn example() -> sdkgate_core::Result<()> {
/// let config = AwsConfig::new()
///     .with_region("eu-west-1")
///     .resolve(&Context::new(), "S3")
///     .await?;
/// assert_eq!(config.region, "eu-west-1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AwsConfig {
    profile: Option<String>,
    region: Option<String>,
    max_attempts: Option<u32>,
    retry_mode: Option<RetryMode>,
    endpoint_url: Option<String>,
    use_fips: Option<bool>,
    use_dualstack: Option<bool>,
    account_id_endpoint_mode: Option<AccountIdEndpointMode>,
    credential: Option<Credential>,
}

impl AwsConfig {
    /// Create a config without overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `profile` instead of `aws.profile` / `AWS_PROFILE`.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set max attempts.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the retry mode.
    pub fn with_retry_mode(mut self, retry_mode: RetryMode) -> Self {
        self.retry_mode = Some(retry_mode);
        self
    }

    /// Set the endpoint url. Applies even when configured urls are ignored.
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Set whether FIPS endpoints are used.
    pub fn with_use_fips(mut self, v: bool) -> Self {
        self.use_fips = Some(v);
        self
    }

    /// Set whether dual-stack endpoints are used.
    pub fn with_use_dualstack(mut self, v: bool) -> Self {
        self.use_dualstack = Some(v);
        self
    }

    /// Set the account id endpoint mode.
    pub fn with_account_id_endpoint_mode(mut self, mode: AccountIdEndpointMode) -> Self {
        self.account_id_endpoint_mode = Some(mode);
        self
    }

    /// Sign with a fixed credential instead of the default chain.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Resolve every setting a client of `service_id` needs.
    ///
    /// Every setting here comes from one read of the shared config files.
    /// Credentials are not loaded here: the returned provider reads the files
    /// again whenever it loads or refreshes them.
    pub async fn resolve(self, ctx: &Context, service_id: &str) -> Result<ResolvedConfig> {
        if self.max_attempts == Some(0) {
            return Err(
                Error::value_out_of_range("max attempts must be at least 1, got 0")
                    .with_context("source: client config"),
            );
        }

        let shared = load_shared_config(ctx, self.profile.as_deref()).await?;
        let profile = shared.active_profile();
        debug!("resolving client config with profile {}", profile.name());

        let region = match self.region {
            Some(v) => v,
            None => {
                // Same order as the default region chain, with the profile already loaded.
                let mut chain = ProvideRegionChain::new(EnvRegionProvider::new());
                if let Some(v) = profile.get("region").filter(|v| !v.trim().is_empty()) {
                    chain = chain.push(StaticRegionProvider::new(v));
                }
                DefaultRegionProvider::with_chain(chain.push(ImdsRegionProvider::new()))
                    .resolve(ctx)
                    .await?
            }
        };

        let mut retry = resolve_retry_strategy(ctx, Some(profile))?;
        if let Some(v) = self.max_attempts {
            retry.max_attempts = v;
        }
        if let Some(v) = self.retry_mode {
            retry.retry_mode = v;
        }

        let endpoint = EndpointConfig {
            endpoint_url: match self.endpoint_url {
                Some(v) => Some(v),
                None => resolve_endpoint_url(ctx, &shared, service_id)?,
            },
            use_dualstack: match self.use_dualstack {
                Some(v) => v,
                None => resolve_use_dualstack(ctx, profile)?.unwrap_or_default(),
            },
            use_fips: match self.use_fips {
                Some(v) => v,
                None => resolve_use_fips(ctx, profile)?.unwrap_or_default(),
            },
            account_id_endpoint_mode: match self.account_id_endpoint_mode {
                Some(v) => v,
                None => resolve_account_id_endpoint_mode(ctx, profile)?,
            },
        };

        let credential: Box<dyn ProvideCredential<Credential = Credential>> = match self.credential
        {
            Some(cred) => Box::new(StaticCredentialProvider::from(cred)),
            None => Box::new(DefaultCredentialProvider::with_profile(profile.name())),
        };

        Ok(ResolvedConfig {
            profile: profile.name().to_string(),
            region,
            retry,
            endpoint,
            credential,
        })
    }
}

/// Settings resolved by [`AwsConfig::resolve`].
pub struct ResolvedConfig {
    /// Name of the active profile.
    pub profile: String,
    /// Region requests are sent to and signed for.
    pub region: String,
    /// Retry options.
    pub retry: RetryStrategyOptions,
    /// Endpoint settings of the service.
    pub endpoint: EndpointConfig,
    credential: Box<dyn ProvideCredential<Credential = Credential>>,
}

impl Debug for ResolvedConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("profile", &self.profile)
            .field("region", &self.region)
            .field("retry", &self.retry)
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential)
            .finish()
    }
}

impl ResolvedConfig {
    /// The credential provider requests are signed with.
    pub fn credential_provider(&self) -> &dyn ProvideCredential<Credential = Credential> {
        self.credential.as_ref()
    }

    /// Build a signing middleware for `signing_name` in the resolved region.
    pub fn into_signing_middleware(self, signing_name: &str) -> SigV4SigningMiddleware {
        let base = SigningConfig::builder()
            .region(self.region)
            .service(signing_name);
        SigV4SigningMiddleware::with_boxed_provider(base, self.credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sdkgate_core::{Body, ErrorKind, StaticEnv, StaticProperties};
    use sdkgate_file_read_tokio::TokioFileRead;
    use std::collections::HashMap;
    use std::fs;

    fn ctx_with_home(home: &std::path::Path, envs: &[(&str, &str)]) -> Context {
        Context::new()
            .with_file_read(TokioFileRead)
            .with_env(StaticEnv {
                home_dir: Some(home.to_path_buf()),
                envs: envs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<HashMap<_, _>>(),
            })
    }

    fn write_config(home: &std::path::Path, config: &str, credentials: &str) {
        let dir = home.join(".aws");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config"), config).unwrap();
        fs::write(dir.join("credentials"), credentials).unwrap();
    }

    #[tokio::test]
    async fn test_resolve_from_shared_config() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();
        let home = tempfile::tempdir()?;
        write_config(
            home.path(),
            "[profile dev]\nregion = ap-south-1\nmax_attempts = 5\nuse_fips_endpoint = true\nendpoint_url = http://localhost:4566\n",
            "[dev]\naws_access_key_id = AKID\naws_secret_access_key = SECRET\n",
        );
        let ctx = ctx_with_home(home.path(), &[("AWS_PROFILE", "dev")]);

        let resolved = AwsConfig::new().resolve(&ctx, "S3").await?;
        assert_eq!(resolved.profile, "dev");
        assert_eq!(resolved.region, "ap-south-1");
        assert_eq!(resolved.retry.max_attempts, 5);
        assert_eq!(resolved.retry.retry_mode, RetryMode::Standard);
        assert!(resolved.endpoint.use_fips);
        assert!(!resolved.endpoint.use_dualstack);
        assert_eq!(
            resolved.endpoint.endpoint_url.as_deref(),
            Some("http://localhost:4566")
        );

        let cred = resolved
            .credential_provider()
            .provide_credential(&ctx)
            .await?
            .expect("credential must be loaded");
        assert_eq!(cred.access_key_id, "AKID");
        Ok(())
    }

    #[tokio::test]
    async fn test_overrides_win() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        write_config(
            home.path(),
            "[default]\nregion = us-east-1\nmax_attempts = 5\nretry_mode = legacy\nuse_dualstack_endpoint = true\n",
            "",
        );
        let ctx = ctx_with_home(home.path(), &[("AWS_ENDPOINT_URL", "http://env")]);

        let resolved = AwsConfig::new()
            .with_region("eu-west-1")
            .with_max_attempts(1)
            .with_retry_mode(RetryMode::Standard)
            .with_endpoint_url("http://explicit")
            .with_use_dualstack(false)
            .with_account_id_endpoint_mode(AccountIdEndpointMode::Disabled)
            .with_credential(Credential::new("ak", "sk"))
            .resolve(&ctx, "DynamoDB")
            .await?;
        assert_eq!(resolved.region, "eu-west-1");
        assert_eq!(
            resolved.retry,
            RetryStrategyOptions {
                max_attempts: 1,
                retry_mode: RetryMode::Standard,
            }
        );
        assert_eq!(resolved.endpoint.endpoint_url.as_deref(), Some("http://explicit"));
        assert!(!resolved.endpoint.use_dualstack);
        assert_eq!(
            resolved.endpoint.account_id_endpoint_mode,
            AccountIdEndpointMode::Disabled
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_setting_fails_resolution() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        write_config(home.path(), "[default]\nregion = us-east-1\n", "");
        let ctx = ctx_with_home(home.path(), &[]).with_properties(StaticProperties::from([(
            "aws.maxAttempts",
            "-1",
        )]));

        let err = AwsConfig::new()
            .resolve(&ctx, "S3")
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::ValueOutOfRange);
        Ok(())
    }

    #[tokio::test]
    async fn test_max_attempts_override_must_be_positive() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        write_config(home.path(), "[default]\nmax_attempts = 4\n", "");
        let ctx = ctx_with_home(home.path(), &[]);

        let err = AwsConfig::new()
            .with_region("us-east-1")
            .with_credential(Credential::new("ak", "sk"))
            .with_max_attempts(0)
            .resolve(&ctx, "S3")
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::ValueOutOfRange);
        assert!(err.to_string().contains("at least 1"), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn test_region_from_loaded_profile() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        write_config(home.path(), "[profile dev]\nregion = ca-central-1\n", "");
        let ctx = ctx_with_home(home.path(), &[("AWS_EC2_METADATA_DISABLED", "true")]);

        let resolved = AwsConfig::new()
            .with_profile("dev")
            .with_credential(Credential::new("ak", "sk"))
            .resolve(&ctx, "S3")
            .await?;
        assert_eq!(resolved.region, "ca-central-1");

        let ctx = ctx_with_home(
            home.path(),
            &[("AWS_EC2_METADATA_DISABLED", "true"), ("AWS_REGION", "us-east-2")],
        );
        let resolved = AwsConfig::new()
            .with_profile("dev")
            .with_credential(Credential::new("ak", "sk"))
            .resolve(&ctx, "S3")
            .await?;
        assert_eq!(resolved.region, "us-east-2");

        let empty = tempfile::tempdir()?;
        let err = AwsConfig::new()
            .with_credential(Credential::new("ak", "sk"))
            .resolve(
                &ctx_with_home(empty.path(), &[("AWS_EC2_METADATA_DISABLED", "true")]),
                "S3",
            )
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.to_string().contains("no region found"), "{err}");
        Ok(())
    }

    #[tokio::test]
    async fn test_signing_middleware_uses_resolved_region() -> anyhow::Result<()> {
        let home = tempfile::tempdir()?;
        write_config(home.path(), "[default]\nregion = sa-east-1\n", "");
        let ctx = ctx_with_home(home.path(), &[]);

        let middleware = AwsConfig::new()
            .with_credential(Credential::new("ak", "sk"))
            .resolve(&ctx, "S3")
            .await?
            .into_signing_middleware("s3");

        let mut req = http::Request::get("https://bucket.s3.amazonaws.com/")
            .body(())?
            .into_parts()
            .0;
        let mut exec = crate::ExecutionContext::new();
        middleware
            .sign(&ctx, &mut req, &mut Body::Empty, &mut exec)
            .await?;
        assert!(req.headers[http::header::AUTHORIZATION]
            .to_str()?
            .contains("/sa-east-1/s3/aws4_request"));
        Ok(())
    }
}
