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

use crate::time::{self, DateTime, Duration};
use crate::{Error, Result};
use bytes::Bytes;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Context is the platform every resolution and signing step runs against.
///
/// It carries the environment, process properties, file system, HTTP client and
/// clock. Nothing in sdkgate reads `std::env` or the file system directly.
///
/// ## Important
///
/// Unconfigured components fall back to no-op implementations: env and
/// properties are empty, files and HTTP fail, and the clock is the system clock.
///
/// ## Example
///
/// ```
/// use sdkgate_core::{Context, OsEnv, StaticProperties};
///
/// let ctx = Context::new()
///     .with_env(OsEnv)
///     .with_properties(StaticProperties::from([("aws.region", "us-west-2")]));
/// assert_eq!(ctx.property("aws.region").as_deref(), Some("us-west-2"));
/// ```
#[derive(Clone)]
pub struct Context {
    fs: Arc<dyn FileRead>,
    http: Arc<dyn HttpSend>,
    env: Arc<dyn Env>,
    props: Arc<dyn Properties>,
    clock: Arc<dyn Clock>,
}

impl Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("fs", &self.fs)
            .field("http", &self.http)
            .field("env", &self.env)
            .field("props", &self.props)
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Create a new Context with no-op implementations.
    pub fn new() -> Self {
        Self {
            fs: Arc::new(NoopFileRead),
            http: Arc::new(NoopHttpSend),
            env: Arc::new(NoopEnv),
            props: Arc::new(NoopProperties),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the file reader implementation.
    pub fn with_file_read(mut self, fs: impl FileRead) -> Self {
        self.fs = Arc::new(fs);
        self
    }

    /// Replace the HTTP client implementation.
    pub fn with_http_send(mut self, http: impl HttpSend) -> Self {
        self.http = Arc::new(http);
        self
    }

    /// Replace the environment implementation.
    pub fn with_env(mut self, env: impl Env) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Replace the process properties implementation.
    pub fn with_properties(mut self, props: impl Properties) -> Self {
        self.props = Arc::new(props);
        self
    }

    /// Replace the clock implementation.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Read the file content entirely in `Vec<u8>`.
    #[inline]
    pub async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        self.fs.file_read(path).await
    }

    /// Read the file content entirely in `String`.
    pub async fn file_read_as_string(&self, path: &str) -> Result<String> {
        let bytes = self.file_read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).to_string())
    }

    /// Send http request and return the response.
    #[inline]
    pub async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        self.http.http_send(req).await
    }

    /// Send http request and return the response as string.
    pub async fn http_send_as_string(
        &self,
        req: http::Request<Bytes>,
    ) -> Result<http::Response<String>> {
        let (parts, body) = self.http.http_send(req).await?.into_parts();
        let body = String::from_utf8_lossy(&body).to_string();
        Ok(http::Response::from_parts(parts, body))
    }

    /// Get the environment variable.
    ///
    /// - Returns `Some(v)` if the environment variable is found and is valid utf-8.
    /// - Returns `None` if the environment variable is not found or value is invalid.
    #[inline]
    pub fn env_var(&self, key: &str) -> Option<String> {
        self.env.var(key)
    }

    /// Returns an hashmap of (variable, value) pairs of strings, for all the
    /// environment variables of the current process.
    #[inline]
    pub fn env_vars(&self) -> HashMap<String, String> {
        self.env.vars()
    }

    /// Get a process property such as `aws.region`.
    #[inline]
    pub fn property(&self, key: &str) -> Option<String> {
        self.props.property(key)
    }

    /// Current time according to the configured clock.
    #[inline]
    pub fn now(&self) -> DateTime {
        self.clock.now()
    }

    /// Get the home directory of the current user.
    ///
    /// Lookup order:
    ///
    /// 1. `HOME`
    /// 2. On windows only: `USERPROFILE`, then `HOMEDRIVE` + `HOMEPATH`
    /// 3. The `user.home` property
    /// 4. The home directory reported by the [`Env`] implementation
    pub fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir_for(cfg!(windows))
    }

    fn home_dir_for(&self, windows: bool) -> Option<PathBuf> {
        let non_empty = |v: Option<String>| v.filter(|v| !v.is_empty());

        if let Some(home) = non_empty(self.env_var("HOME")) {
            return Some(PathBuf::from(home));
        }
        if windows {
            if let Some(profile) = non_empty(self.env_var("USERPROFILE")) {
                return Some(PathBuf::from(profile));
            }
            if let (Some(drive), Some(path)) = (
                non_empty(self.env_var("HOMEDRIVE")),
                non_empty(self.env_var("HOMEPATH")),
            ) {
                return Some(PathBuf::from(format!("{drive}{path}")));
            }
        }
        if let Some(home) = non_empty(self.property("user.home")) {
            return Some(PathBuf::from(home));
        }
        self.env.home_dir()
    }

    /// Expand `~` in input path.
    ///
    /// - If path not starts with `~/` or `~\\`, returns `Some(path)` directly.
    /// - Otherwise, replace `~` with home dir instead.
    /// - If home_dir is not found, returns `None`.
    pub fn expand_home_dir(&self, path: &str) -> Option<String> {
        if path != "~" && !path.starts_with("~/") && !path.starts_with("~\\") {
            Some(path.to_string())
        } else {
            self.home_dir()
                .map(|home| format!("{}{}", home.to_string_lossy(), &path[1..]))
        }
    }
}

/// FileRead is used to read the file content entirely in `Vec<u8>`.
///
/// This is used to load the shared config and credentials files.
#[async_trait::async_trait]
pub trait FileRead: Debug + Send + Sync + 'static {
    /// Read the file content entirely in `Vec<u8>`.
    async fn file_read(&self, path: &str) -> Result<Vec<u8>>;
}

/// HttpSend is used to send http request during credential and region resolution.
///
/// For example, fetch the IMDS token and instance role credentials. This trait is
/// not meant to be used as a general http client.
#[async_trait::async_trait]
pub trait HttpSend: Debug + Send + Sync + 'static {
    /// Send http request and return the response.
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>>;
}

/// Access to environment variables.
pub trait Env: Debug + Send + Sync + 'static {
    /// Get an environment variable.
    ///
    /// - Returns `Some(v)` if the environment variable is found and is valid utf-8.
    /// - Returns `None` if the environment variable is not found or value is invalid.
    fn var(&self, key: &str) -> Option<String>;

    /// Returns an hashmap of (variable, value) pairs of strings, for all the
    /// environment variables of the current process.
    fn vars(&self) -> HashMap<String, String>;

    /// Return the path to the users home dir, returns `None` if any error occurs.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// Process level properties, a namespace parallel to the environment.
///
/// Properties use dotted keys like `aws.region` and take precedence over
/// environment variables during setting resolution.
pub trait Properties: Debug + Send + Sync + 'static {
    /// Get a property by key.
    fn property(&self, key: &str) -> Option<String>;
}

/// Source of the current time.
pub trait Clock: Debug + Send + Sync + 'static {
    /// Current time in UTC.
    fn now(&self) -> DateTime;
}

/// Implements Env for the OS context, both Unix style and Windows.
#[derive(Debug, Copy, Clone)]
pub struct OsEnv;

impl Env for OsEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var_os(key)?.into_string().ok()
    }

    fn vars(&self) -> HashMap<String, String> {
        std::env::vars().collect()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        home::home_dir()
    }
}

/// StaticEnv provides a static env environment.
///
/// This is useful for testing or for providing a fixed environment.
#[derive(Debug, Clone, Default)]
pub struct StaticEnv {
    /// The home directory to use.
    pub home_dir: Option<PathBuf>,
    /// The environment variables to use.
    pub envs: HashMap<String, String>,
}

impl Env for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.envs.get(key).cloned()
    }

    fn vars(&self) -> HashMap<String, String> {
        self.envs.clone()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home_dir.clone()
    }
}

/// StaticProperties provides a fixed set of process properties.
#[derive(Debug, Clone, Default)]
pub struct StaticProperties {
    /// The properties to use.
    pub props: HashMap<String, String>,
}

impl Properties for StaticProperties {
    fn property(&self, key: &str) -> Option<String> {
        self.props.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for StaticProperties {
    fn from(value: [(K, V); N]) -> Self {
        Self {
            props: value
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// SystemClock reads the wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        time::now()
    }
}

/// ManualClock only moves when told to.
///
/// Clones share the same time, so a test can keep a handle and advance the
/// clock seen by a [`Context`].
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    pub fn new(now: DateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Set the current time.
    pub fn set(&self, now: DateTime) {
        *self.now.lock().expect("lock poisoned") = now;
    }

    /// Move the current time forward.
    pub fn advance(&self, by: Duration) {
        *self.now.lock().expect("lock poisoned") += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime {
        *self.now.lock().expect("lock poisoned")
    }
}

/// NoopFileRead is a no-op implementation that always returns an error.
///
/// This is used when no file reader is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFileRead;

#[async_trait::async_trait]
impl FileRead for NoopFileRead {
    async fn file_read(&self, _path: &str) -> Result<Vec<u8>> {
        Err(Error::unexpected(
            "file reading not supported: no file reader configured",
        ))
    }
}

/// NoopHttpSend is a no-op implementation that always returns an error.
///
/// This is used when no HTTP client is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHttpSend;

#[async_trait::async_trait]
impl HttpSend for NoopHttpSend {
    async fn http_send(&self, _req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        Err(Error::unexpected(
            "HTTP sending not supported: no HTTP client configured",
        ))
    }
}

/// NoopEnv is a no-op implementation that always returns None/empty.
///
/// This is used when no environment is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnv;

impl Env for NoopEnv {
    fn var(&self, _key: &str) -> Option<String> {
        None
    }

    fn vars(&self) -> HashMap<String, String> {
        HashMap::new()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        None
    }
}

/// NoopProperties has no properties at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProperties;

impl Properties for NoopProperties {
    fn property(&self, _key: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx_with_env(envs: &[(&str, &str)]) -> Context {
        Context::new().with_env(StaticEnv {
            home_dir: Some(PathBuf::from("/os/home")),
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    #[test]
    fn test_home_dir_prefers_home() {
        let ctx = ctx_with_env(&[("HOME", "/home/alice"), ("USERPROFILE", "C:\\alice")]);
        assert_eq!(ctx.home_dir_for(true), Some(PathBuf::from("/home/alice")));
        assert_eq!(ctx.home_dir_for(false), Some(PathBuf::from("/home/alice")));
    }

    #[test]
    fn test_home_dir_windows_fallbacks() {
        let ctx = ctx_with_env(&[("USERPROFILE", "C:\\Users\\alice")]);
        assert_eq!(
            ctx.home_dir_for(true),
            Some(PathBuf::from("C:\\Users\\alice"))
        );

        let ctx = ctx_with_env(&[("HOMEDRIVE", "D:"), ("HOMEPATH", "\\alice")]);
        assert_eq!(ctx.home_dir_for(true), Some(PathBuf::from("D:\\alice")));

        // USERPROFILE is not consulted outside windows.
        let ctx = ctx_with_env(&[("USERPROFILE", "C:\\Users\\alice")]);
        assert_eq!(ctx.home_dir_for(false), Some(PathBuf::from("/os/home")));
    }

    #[test]
    fn test_home_dir_property_then_env_impl() {
        let ctx = ctx_with_env(&[])
            .with_properties(StaticProperties::from([("user.home", "/prop/home")]));
        assert_eq!(ctx.home_dir_for(false), Some(PathBuf::from("/prop/home")));

        let ctx = ctx_with_env(&[]);
        assert_eq!(ctx.home_dir_for(false), Some(PathBuf::from("/os/home")));

        assert_eq!(Context::new().home_dir_for(true), None);
    }

    #[test]
    fn test_expand_home_dir() {
        let ctx = ctx_with_env(&[("HOME", "/home/alice")]);
        assert_eq!(
            ctx.expand_home_dir("~/.aws/config").as_deref(),
            Some("/home/alice/.aws/config")
        );
        assert_eq!(
            ctx.expand_home_dir("/etc/aws/config").as_deref(),
            Some("/etc/aws/config")
        );
        assert_eq!(Context::new().expand_home_dir("~/.aws/config"), None);
    }

    #[test]
    fn test_manual_clock() {
        let t0 = chrono::Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::new(t0);
        let ctx = Context::new().with_clock(clock.clone());
        assert_eq!(ctx.now(), t0);

        clock.advance(Duration::try_seconds(30).unwrap());
        assert_eq!(ctx.now(), t0 + Duration::try_seconds(30).unwrap());
    }
}
