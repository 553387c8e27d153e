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

//! Expiring value cache with single-flight refresh.

use crate::time::{DateTime, Duration};
use crate::{Context, Result};
use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::RwLock;
use tokio::sync::Mutex;

struct Entry<T> {
    value: T,
    /// `None` means the value never expires.
    expires_at: Option<DateTime>,
}

/// CachedValue holds one expiring value.
///
/// A value counts as expired `buffer` before its real expiry so callers never
/// receive something that is about to stop working. Refreshes go through
/// [`CachedValue::get_or_load`], which runs at most one loader at a time: callers
/// arriving during a refresh wait for it and share its result.
///
/// A loader that fails, or whose future is dropped, installs nothing and the
/// next caller loads again.
pub struct CachedValue<T> {
    buffer: Duration,
    entry: RwLock<Option<Entry<T>>>,
    refresh: Mutex<()>,
}

impl<T: Clone + Send + Sync> CachedValue<T> {
    /// Create an empty cache that treats values as expired `buffer` early.
    pub fn new(buffer: Duration) -> Self {
        Self {
            buffer,
            entry: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Create a cache that already holds `value`.
    pub fn with_value(buffer: Duration, value: T, expires_at: Option<DateTime>) -> Self {
        let cache = Self::new(buffer);
        *cache.entry.write().expect("lock poisoned") = Some(Entry { value, expires_at });
        cache
    }

    /// The safety buffer subtracted from every expiry.
    pub fn buffer(&self) -> Duration {
        self.buffer
    }

    /// Check if the cached value is missing or within the buffer of its expiry.
    pub fn is_expired(&self, ctx: &Context) -> bool {
        let guard = self.entry.read().expect("lock poisoned");
        self.entry_expired(guard.as_ref(), ctx.now())
    }

    /// Get the cached value if it's still fresh, without refreshing.
    pub fn get(&self, ctx: &Context) -> Option<T> {
        let guard = self.entry.read().expect("lock poisoned");
        if self.entry_expired(guard.as_ref(), ctx.now()) {
            return None;
        }
        guard.as_ref().map(|e| e.value.clone())
    }

    /// Drop the cached value.
    pub fn clear(&self) {
        *self.entry.write().expect("lock poisoned") = None;
    }

    /// Get the cached value, running `loader` if it is expired.
    ///
    /// `loader` returns the new value and when it expires.
    pub async fn get_or_load<F, Fut>(&self, ctx: &Context, loader: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(T, Option<DateTime>)>>,
    {
        if let Some(value) = self.get(ctx) {
            return Ok(value);
        }

        let _refresh = self.refresh.lock().await;
        // Someone else may have refreshed while we were waiting.
        if let Some(value) = self.get(ctx) {
            return Ok(value);
        }

        let (value, expires_at) = loader().await?;
        *self.entry.write().expect("lock poisoned") = Some(Entry {
            value: value.clone(),
            expires_at,
        });
        Ok(value)
    }

    fn entry_expired(&self, entry: Option<&Entry<T>>, now: DateTime) -> bool {
        match entry {
            None => true,
            Some(Entry {
                expires_at: None, ..
            }) => false,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => now >= *at - self.buffer,
        }
    }
}

impl<T> Debug for CachedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expires_at = self
            .entry
            .read()
            .ok()
            .and_then(|e| e.as_ref().map(|e| e.expires_at));
        f.debug_struct("CachedValue")
            .field("buffer", &self.buffer)
            .field("expires_at", &expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, ManualClock};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn t0() -> DateTime {
        chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn secs(n: i64) -> Duration {
        Duration::try_seconds(n).expect("in bounds")
    }

    #[test]
    fn test_expiry_boundary() {
        let clock = ManualClock::new(t0());
        let ctx = Context::new().with_clock(clock.clone());
        let cache = CachedValue::with_value(secs(30), "v", Some(t0() + secs(100)));

        clock.set(t0() + secs(69));
        assert!(!cache.is_expired(&ctx));
        assert_eq!(cache.get(&ctx), Some("v"));

        clock.set(t0() + secs(70));
        assert!(cache.is_expired(&ctx));
        assert_eq!(cache.get(&ctx), None);
    }

    #[test]
    fn test_empty_is_expired() {
        let cache = CachedValue::<String>::new(secs(10));
        assert!(cache.is_expired(&Context::new()));
        assert_eq!(cache.get(&Context::new()), None);
    }

    #[test]
    fn test_never_expires() {
        let clock = ManualClock::new(t0());
        let ctx = Context::new().with_clock(clock.clone());
        let cache = CachedValue::with_value(secs(10), 1u8, None);
        clock.advance(secs(86400 * 365));
        assert!(!cache.is_expired(&ctx));
    }

    #[tokio::test]
    async fn test_get_or_load_reuses_fresh_value() -> Result<()> {
        let ctx = Context::new().with_clock(ManualClock::new(t0()));
        let cache = CachedValue::new(secs(10));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v = cache
                .get_or_load(&ctx, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok((42, Some(t0() + secs(60))))
                })
                .await?;
            assert_eq!(v, 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_flight() {
        let ctx = Context::new().with_clock(ManualClock::new(t0()));
        let cache = Arc::new(CachedValue::new(secs(10)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let (ctx, cache, calls) = (ctx.clone(), cache.clone(), calls.clone());
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_load(&ctx, || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                        Ok(("token".to_string(), Some(t0() + secs(3600))))
                    })
                    .await
            }));
        }

        for h in handles {
            assert_eq!(h.await.expect("task must not panic").unwrap(), "token");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_installs_nothing() -> Result<()> {
        let ctx = Context::new().with_clock(ManualClock::new(t0()));
        let cache = CachedValue::<u32>::new(secs(10));

        let err = cache
            .get_or_load(&ctx, || async { Err(Error::unexpected("imds down")) })
            .await
            .expect_err("loader error must surface");
        assert_eq!(err.to_string(), "imds down");
        assert!(cache.is_expired(&ctx));

        let v = cache
            .get_or_load(&ctx, || async { Ok((7, None)) })
            .await?;
        assert_eq!(v, 7);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancelled_load_installs_nothing() -> Result<()> {
        let ctx = Context::new().with_clock(ManualClock::new(t0()));
        let cache = CachedValue::<u32>::new(secs(10));

        let pending = cache.get_or_load(&ctx, || async {
            std::future::pending::<()>().await;
            Ok((1, None))
        });
        let timed_out =
            tokio::time::timeout(std::time::Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert!(cache.is_expired(&ctx));

        // The refresh lock was released with the dropped future.
        let v = cache
            .get_or_load(&ctx, || async { Ok((2, None)) })
            .await?;
        assert_eq!(v, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_reload_after_expiry() -> Result<()> {
        let clock = ManualClock::new(t0());
        let ctx = Context::new().with_clock(clock.clone());
        let cache = CachedValue::new(secs(30));

        let v = cache
            .get_or_load(&ctx, || async { Ok(("old", Some(t0() + secs(100)))) })
            .await?;
        assert_eq!(v, "old");

        clock.set(t0() + secs(75));
        let v = cache
            .get_or_load(&ctx, || async { Ok(("new", Some(t0() + secs(500)))) })
            .await?;
        assert_eq!(v, "new");
        Ok(())
    }
}
