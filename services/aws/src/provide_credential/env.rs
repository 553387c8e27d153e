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

use crate::setting::{AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY, AWS_SESSION_TOKEN};
use crate::Credential;
use async_trait::async_trait;
use sdkgate_core::{Context, Error, ProvideCredential, Result};

/// EnvCredentialProvider loads AWS credentials from process properties and
/// environment variables.
///
/// Each value is looked up as a property first, then as an environment variable:
/// - `aws.accessKeyId` / `AWS_ACCESS_KEY_ID`: The AWS access key ID
/// - `aws.secretAccessKey` / `AWS_SECRET_ACCESS_KEY`: The AWS secret access key
/// - `aws.sessionToken` / `AWS_SESSION_TOKEN`: The AWS session token (optional)
#[derive(Debug, Default, Clone)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new EnvCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let access_key_id = AWS_ACCESS_KEY_ID.resolve_from_env(ctx)?;
        let secret_access_key = AWS_SECRET_ACCESS_KEY.resolve_from_env(ctx)?;

        match (access_key_id, secret_access_key) {
            (Some(ak), Some(sk)) => Ok(Some(Credential {
                access_key_id: ak,
                secret_access_key: sk,
                session_token: AWS_SESSION_TOKEN.resolve_from_env(ctx)?,
                expires_in: None,
            })),
            (None, None) => Ok(None),
            (Some(_), None) => Err(Error::credential_invalid(
                "access key id is set but secret access key is missing",
            )
            .with_context(format!("env: {}", AWS_SECRET_ACCESS_KEY.env))),
            (None, Some(_)) => Err(Error::credential_invalid(
                "secret access key is set but access key id is missing",
            )
            .with_context(format!("env: {}", AWS_ACCESS_KEY_ID.env))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdkgate_core::{ErrorKind, StaticEnv, StaticProperties};
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> StaticEnv {
        StaticEnv {
            home_dir: None,
            envs: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_env_credential_provider() -> anyhow::Result<()> {
        let ctx = Context::new().with_env(env(&[
            ("AWS_ACCESS_KEY_ID", "test_access_key"),
            ("AWS_SECRET_ACCESS_KEY", "test_secret_key"),
        ]));

        let cred = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await?
            .expect("credential must be provided");
        assert_eq!(cred.access_key_id, "test_access_key");
        assert_eq!(cred.secret_access_key, "test_secret_key");
        assert!(cred.session_token.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_properties_win_over_env() -> anyhow::Result<()> {
        let ctx = Context::new()
            .with_env(env(&[
                ("AWS_ACCESS_KEY_ID", "env_access_key"),
                ("AWS_SECRET_ACCESS_KEY", "env_secret_key"),
                ("AWS_SESSION_TOKEN", "env_token"),
            ]))
            .with_properties(StaticProperties::from([
                ("aws.accessKeyId", "prop_access_key"),
                ("aws.secretAccessKey", "prop_secret_key"),
            ]));

        let cred = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await?
            .expect("credential must be provided");
        assert_eq!(cred.access_key_id, "prop_access_key");
        assert_eq!(cred.secret_access_key, "prop_secret_key");
        assert_eq!(cred.session_token.as_deref(), Some("env_token"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_and_partial() -> anyhow::Result<()> {
        let ctx = Context::new().with_env(StaticEnv {
            home_dir: None,
            envs: HashMap::new(),
        });
        assert!(EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await?
            .is_none());

        let ctx = Context::new().with_env(env(&[("AWS_ACCESS_KEY_ID", "only_access_key")]));
        let err = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
        Ok(())
    }
}
