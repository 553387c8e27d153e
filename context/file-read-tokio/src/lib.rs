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

//! Tokio-based file reading for sdkgate.
//!
//! This crate provides `TokioFileRead`, an async file reader that implements
//! the `FileRead` trait from `sdkgate_core` on top of `tokio::fs`. It's what
//! loads the shared `~/.aws/config` and `~/.aws/credentials` files.
//!
//! ## Example
//!
//! ```no_run
//! use sdkgate_core::{Context, OsEnv};
//! use sdkgate_file_read_tokio::TokioFileRead;
//!
//! #[tokio::main]
//! async fn main() {
//!     let ctx = Context::new()
//!         .with_file_read(TokioFileRead)
//!         .with_env(OsEnv);
//!
//!     match ctx.file_read_as_string("/home/me/.aws/config").await {
//!         Ok(content) => println!("read {} bytes", content.len()),
//!         Err(e) => eprintln!("failed to read file: {}", e),
//!     }
//! }
//! ```

use async_trait::async_trait;
use sdkgate_core::{Error, FileRead, Result};

/// Tokio-based implementation of the `FileRead` trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileRead;

#[async_trait]
impl FileRead for TokioFileRead {
    async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| {
            Error::unexpected("failed to read file")
                .with_context(format!("path: {path}"))
                .with_source(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_existing_file() {
        let mut f = tempfile::NamedTempFile::new().expect("temp file must be created");
        f.write_all(b"[default]\nregion = us-east-1\n")
            .expect("write must succeed");

        let content = TokioFileRead
            .file_read(f.path().to_str().expect("path must be utf-8"))
            .await
            .expect("read must succeed");
        assert_eq!(content, b"[default]\nregion = us-east-1\n");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let err = TokioFileRead
            .file_read("/definitely/not/here/config")
            .await
            .expect_err("read must fail");
        assert!(err.to_string().contains("/definitely/not/here/config"));
    }
}
