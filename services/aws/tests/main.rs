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

mod shared_config;

use sdkgate_core::{Context, StaticEnv};
use sdkgate_file_read_tokio::TokioFileRead;
use std::collections::HashMap;
use std::fs;
use tempfile::TempDir;

/// A home directory holding `~/.aws/config` and `~/.aws/credentials`.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new(config: &str, credentials: &str) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let dir = tempfile::tempdir().expect("tempdir must be created");
        let aws = dir.path().join(".aws");
        fs::create_dir_all(&aws).expect("aws dir must be created");
        fs::write(aws.join("config"), config).expect("config must be written");
        fs::write(aws.join("credentials"), credentials).expect("credentials must be written");
        Self { dir }
    }

    pub fn path(&self) -> &std::path::Path {
        self.dir.path()
    }

    /// A context reading files from disk with `envs` as the environment.
    pub fn context(&self, envs: &[(&str, &str)]) -> Context {
        Context::new().with_file_read(TokioFileRead).with_env(StaticEnv {
            home_dir: Some(self.dir.path().to_path_buf()),
            envs: envs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        })
    }
}
