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

//! Ordered provider chains.
//!
//! A chain asks each member in turn and returns the first value found. A
//! member that fails is logged and skipped. When no member produces a value,
//! [`ProvideChain::resolve`] fails with one error listing every member and
//! what it did. Used as a provider itself, an exhausted chain reports
//! `Ok(None)` so an outer chain records it as "not found".

use crate::{Context, Error, ProvideCredential, ProvideRegion, Result};
use async_trait::async_trait;
use std::fmt::{self, Debug};

/// What a single chain member did during one resolution.
enum Outcome {
    Empty,
    Failed(String),
}

/// Collects member outcomes and renders the exhaustion error.
struct Attempts {
    what: &'static str,
    tried: Vec<String>,
}

impl Attempts {
    fn new(what: &'static str) -> Self {
        Self {
            what,
            tried: Vec::new(),
        }
    }

    fn record(&mut self, provider: &dyn Debug, outcome: Outcome) {
        let entry = match outcome {
            Outcome::Empty => format!("{provider:?}: not found"),
            Outcome::Failed(err) => format!("{provider:?}: failed: {err}"),
        };
        self.tried.push(entry);
    }

    fn into_error(self) -> Error {
        Error::config_invalid(format!(
            "no {} found after trying every provider in chain: [{}]",
            self.what,
            self.tried.join("; ")
        ))
    }
}

/// A provider trait object that can sit in a [`ProvideChain`].
#[async_trait]
pub trait ChainMember: Debug + Send + Sync {
    /// Value the members produce.
    type Value: Send;

    /// Name of the value, used in logs and the exhaustion error.
    const WHAT: &'static str;

    /// Ask this member for a value.
    async fn provide(&self, ctx: &Context) -> Result<Option<Self::Value>>;
}

#[async_trait]
impl<'a, C: Send + Sync + Unpin + 'static> ChainMember for dyn ProvideCredential<Credential = C> + 'a {
    type Value = C;

    const WHAT: &'static str = "credentials";

    async fn provide(&self, ctx: &Context) -> Result<Option<C>> {
        self.provide_credential(ctx).await
    }
}

#[async_trait]
impl<'a> ChainMember for dyn ProvideRegion + 'a {
    type Value = String;

    const WHAT: &'static str = "region";

    async fn provide(&self, ctx: &Context) -> Result<Option<String>> {
        self.provide_region(ctx).await
    }
}

/// ProvideChain tries providers in order, first value wins.
pub struct ProvideChain<P: ?Sized> {
    providers: Vec<Box<P>>,
}

/// ProvideCredentialChain tries credential providers in order.
pub type ProvideCredentialChain<C> = ProvideChain<dyn ProvideCredential<Credential = C>>;

/// ProvideRegionChain tries region providers in order.
pub type ProvideRegionChain = ProvideChain<dyn ProvideRegion>;

impl<P: ChainMember + ?Sized> ProvideChain<P> {
    /// Create a chain from a list of providers.
    ///
    /// A chain without members can never produce a value, so an empty list is
    /// rejected.
    pub fn from_vec(providers: Vec<Box<P>>) -> Result<Self> {
        if providers.is_empty() {
            return Err(Error::config_invalid(format!(
                "{} provider chain must contain at least one provider",
                P::WHAT
            )));
        }
        Ok(Self { providers })
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Always false, chains are never empty.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Resolve the value, failing if no provider has one.
    pub async fn resolve(&self, ctx: &Context) -> Result<P::Value> {
        self.first_value(ctx).await.map_err(Attempts::into_error)
    }

    async fn first_value(&self, ctx: &Context) -> std::result::Result<P::Value, Attempts> {
        let mut attempts = Attempts::new(P::WHAT);
        for provider in &self.providers {
            log::debug!("trying {} provider: {provider:?}", P::WHAT);

            match provider.provide(ctx).await {
                Ok(Some(v)) => {
                    log::debug!("loaded {} from provider: {provider:?}", P::WHAT);
                    return Ok(v);
                }
                Ok(None) => {
                    log::debug!("no {} found in provider: {provider:?}", P::WHAT);
                    attempts.record(provider, Outcome::Empty);
                }
                Err(e) => {
                    log::warn!("error loading {} from provider {provider:?}: {e}", P::WHAT);
                    attempts.record(provider, Outcome::Failed(e.to_string()));
                }
            }
        }
        Err(attempts)
    }

    async fn provide_or_none(&self, ctx: &Context) -> Result<Option<P::Value>> {
        match self.first_value(ctx).await {
            Ok(v) => Ok(Some(v)),
            Err(attempts) => {
                log::debug!("{}", attempts.into_error());
                Ok(None)
            }
        }
    }
}

impl<C: Send + Sync + Unpin + 'static> ProvideCredentialChain<C> {
    /// Create a chain starting with `first`.
    pub fn new(first: impl ProvideCredential<Credential = C>) -> Self {
        Self {
            providers: vec![Box::new(first)],
        }
    }

    /// Add a credential provider to the end of the chain.
    pub fn push(mut self, provider: impl ProvideCredential<Credential = C>) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl ProvideRegionChain {
    /// Create a chain starting with `first`.
    pub fn new(first: impl ProvideRegion) -> Self {
        Self {
            providers: vec![Box::new(first)],
        }
    }

    /// Add a region provider to the end of the chain.
    pub fn push(mut self, provider: impl ProvideRegion) -> Self {
        self.providers.push(Box::new(provider));
        self
    }
}

impl<P: Debug + ?Sized> Debug for ProvideChain<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.providers.iter()).finish()
    }
}

#[async_trait]
impl<C: Send + Sync + Unpin + 'static> ProvideCredential for ProvideCredentialChain<C> {
    type Credential = C;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.provide_or_none(ctx).await
    }
}

#[async_trait]
impl ProvideRegion for ProvideRegionChain {
    async fn provide_region(&self, ctx: &Context) -> Result<Option<String>> {
        self.provide_or_none(ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct MockRegion {
        name: &'static str,
        region: Option<&'static str>,
        calls: Arc<AtomicUsize>,
    }

    impl MockRegion {
        fn new(name: &'static str, region: Option<&'static str>) -> Self {
            Self {
                name,
                region,
                calls: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl ProvideRegion for MockRegion {
        async fn provide_region(&self, _: &Context) -> Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.region.map(str::to_string))
        }
    }

    #[derive(Debug)]
    struct FailingRegion;

    #[async_trait]
    impl ProvideRegion for FailingRegion {
        async fn provide_region(&self, _: &Context) -> Result<Option<String>> {
            Err(Error::unexpected("metadata service unreachable"))
        }
    }

    #[derive(Debug)]
    struct MockCredential(Option<&'static str>);

    #[async_trait]
    impl ProvideCredential for MockCredential {
        type Credential = String;

        async fn provide_credential(&self, _: &Context) -> Result<Option<String>> {
            match self.0 {
                Some("boom") => Err(Error::credential_invalid("boom")),
                v => Ok(v.map(str::to_string)),
            }
        }
    }

    #[tokio::test]
    async fn test_region_chain_short_circuits() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let third = MockRegion::new("third", Some("us-east-2"));
        let third_calls = third.calls.clone();
        let chain = ProvideRegionChain::new(MockRegion::new("first", None))
            .push(MockRegion::new("second", Some("us-east-1")))
            .push(third);

        assert_eq!(chain.resolve(&Context::new()).await?, "us-east-1");
        assert_eq!(third_calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_region_chain_skips_failures() -> Result<()> {
        let chain =
            ProvideRegionChain::new(FailingRegion).push(MockRegion::new("b", Some("eu-west-1")));
        assert_eq!(chain.resolve(&Context::new()).await?, "eu-west-1");
        Ok(())
    }

    #[tokio::test]
    async fn test_region_chain_exhausted_names_every_provider() {
        let chain = ProvideRegionChain::new(MockRegion::new("first", None)).push(FailingRegion);

        let err = chain
            .resolve(&Context::new())
            .await
            .expect_err("chain must fail");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        let msg = err.to_string();
        assert!(msg.contains("no region found"), "{msg}");
        assert!(msg.contains("name: \"first\""), "{msg}");
        assert!(msg.contains("not found"), "{msg}");
        assert!(
            msg.contains("FailingRegion: failed: metadata service unreachable"),
            "{msg}"
        );
    }

    #[test]
    fn test_empty_chain_rejected() {
        let err = ProvideRegionChain::from_vec(vec![]).expect_err("must reject");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = ProvideCredentialChain::<String>::from_vec(vec![]).expect_err("must reject");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[tokio::test]
    async fn test_credential_chain_first_success() -> Result<()> {
        let chain = ProvideCredentialChain::new(MockCredential(Some("boom")))
            .push(MockCredential(None))
            .push(MockCredential(Some("key-a")))
            .push(MockCredential(Some("key-b")));

        assert_eq!(chain.len(), 4);
        assert_eq!(
            chain.provide_credential(&Context::new()).await?,
            Some("key-a".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_nested_chain_reports_not_found() -> Result<()> {
        let inner = ProvideRegionChain::new(MockRegion::new("inner", None));
        let ctx = Context::new();
        assert_eq!(inner.provide_region(&ctx).await?, None);

        let outer = ProvideRegionChain::new(inner).push(MockRegion::new("last", None));
        let msg = outer.resolve(&ctx).await.expect_err("must fail").to_string();
        assert!(msg.contains("[[MockRegion"), "{msg}");
        assert!(!msg.contains("failed"), "{msg}");

        let outer = ProvideRegionChain::new(ProvideRegionChain::new(MockRegion::new("inner", None)))
            .push(MockRegion::new("last", Some("ap-east-1")));
        assert_eq!(outer.resolve(&ctx).await?, "ap-east-1");

        let nested = ProvideCredentialChain::new(ProvideCredentialChain::new(MockCredential(None)))
            .push(MockCredential(Some("key-a")));
        assert_eq!(nested.resolve(&ctx).await?, "key-a");
        Ok(())
    }

    #[tokio::test]
    async fn test_credential_chain_all_fail() {
        let chain = ProvideCredentialChain::new(MockCredential(Some("boom")))
            .push(MockCredential(None));

        let err = chain
            .resolve(&Context::new())
            .await
            .expect_err("chain must fail");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.to_string().contains("no credentials found"));
    }
}
