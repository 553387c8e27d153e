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

//! Shared configuration loaded from `~/.aws/config` and `~/.aws/credentials`.

mod parse;
pub use parse::{parse, FileType, ParsedFile, SectionKind};

use crate::setting::{AWS_CONFIG_FILE, AWS_PROFILE, AWS_SHARED_CREDENTIALS_FILE};
use log::debug;
use sdkgate_core::{Context, Error, Result};
use std::collections::HashMap;

/// A named set of properties. Keys keep the order they were first defined in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    name: String,
    properties: Vec<(String, String)>,
}

impl Profile {
    /// Create an empty profile.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Name of this profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of a property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, replacing any earlier value in place.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.properties.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.properties.push((key, value)),
        }
    }

    /// Iterate all properties in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the profile has no properties.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Parse the `key = value` lines nested under a blank-valued property.
    pub fn sub_properties(&self, key: &str) -> Vec<(String, String)> {
        let Some(raw) = self.get(key) else {
            return Vec::new();
        };
        raw.lines()
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .filter(|(k, _)| !k.is_empty())
            .collect()
    }

    /// One nested value under a blank-valued property.
    pub fn sub_property(&self, key: &str, sub_key: &str) -> Option<String> {
        self.sub_properties(key)
            .into_iter()
            .rev()
            .find(|(k, _)| k == sub_key)
            .map(|(_, v)| v)
    }

    /// Overlay `other` on top of this profile, key by key.
    fn merge(&mut self, other: Profile) {
        for (k, v) in other.properties {
            self.set(k, v);
        }
    }
}

/// Where shared configuration is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSource {
    /// Active profile name.
    pub profile: String,
    /// Path of the config file, with `~` already expanded.
    pub config_file: String,
    /// Path of the credentials file, with `~` already expanded.
    pub credentials_file: String,
}

impl ConfigurationSource {
    /// Resolve the active profile and file paths from the context.
    ///
    /// An explicit `profile` wins over `aws.profile` and `AWS_PROFILE`.
    pub fn resolve(ctx: &Context, profile: Option<&str>) -> Result<Self> {
        let profile = match profile {
            Some(p) => p.to_string(),
            None => AWS_PROFILE.resolve_from_env(ctx)?.unwrap_or_default(),
        };
        let config_file = AWS_CONFIG_FILE.resolve_from_env(ctx)?.unwrap_or_default();
        let credentials_file = AWS_SHARED_CREDENTIALS_FILE
            .resolve_from_env(ctx)?
            .unwrap_or_default();

        Ok(Self {
            profile,
            config_file: expand_path(ctx, &config_file)?,
            credentials_file: expand_path(ctx, &credentials_file)?,
        })
    }
}

fn expand_path(ctx: &Context, path: &str) -> Result<String> {
    if !path.starts_with('~') {
        return Ok(path.to_string());
    }
    ctx.expand_home_dir(path).ok_or_else(|| {
        Error::config_invalid("Unable to determine user home directory")
            .with_context(format!("path: {path}"))
    })
}

/// Profiles and services sections merged from both shared files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedConfig {
    active_profile: String,
    profiles: HashMap<String, Profile>,
    services: HashMap<String, Profile>,
}

impl SharedConfig {
    /// Merge parsed config and credentials files.
    ///
    /// Profiles present in both are merged key by key; a key defined in the
    /// config file wins.
    pub fn new(
        active_profile: impl Into<String>,
        config: ParsedFile,
        credentials: ParsedFile,
    ) -> Self {
        let active_profile = active_profile.into();
        let mut profiles = credentials.profiles;
        for (name, profile) in config.profiles {
            match profiles.get_mut(&name) {
                Some(existing) => existing.merge(profile),
                None => {
                    profiles.insert(name, profile);
                }
            }
        }
        if !profiles.contains_key(&active_profile) {
            profiles.insert(active_profile.clone(), Profile::new(active_profile.clone()));
        }

        Self {
            active_profile,
            profiles,
            services: config.services,
        }
    }

    /// Name of the active profile.
    pub fn active_profile_name(&self) -> &str {
        &self.active_profile
    }

    /// The active profile, empty when it's defined in neither file.
    pub fn active_profile(&self) -> &Profile {
        // `new` always inserts the active profile.
        &self.profiles[&self.active_profile]
    }

    /// A profile by name.
    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// A `[services name]` section by name.
    pub fn services(&self, name: &str) -> Option<&Profile> {
        self.services.get(name)
    }

    /// The services section `profile` refers to with its `services` key.
    pub fn services_section(&self, profile: &Profile) -> Result<Option<&Profile>> {
        let Some(name) = profile.get("services") else {
            return Ok(None);
        };
        self.services.get(name).map(Some).ok_or_else(|| {
            Error::config_invalid(format!(
                "shared config points to nonexistent services section '{name}'"
            ))
        })
    }
}

/// Load shared configuration.
///
/// Missing or unreadable files are treated as empty.
pub async fn load_shared_config(ctx: &Context, profile: Option<&str>) -> Result<SharedConfig> {
    let source = ConfigurationSource::resolve(ctx, profile)?;
    load_shared_config_from(ctx, &source).await
}

/// Load shared configuration from an already resolved source.
pub async fn load_shared_config_from(
    ctx: &Context,
    source: &ConfigurationSource,
) -> Result<SharedConfig> {
    let config = load_file(ctx, FileType::Config, &source.config_file).await?;
    let credentials = load_file(ctx, FileType::Credentials, &source.credentials_file).await?;
    Ok(SharedConfig::new(source.profile.clone(), config, credentials))
}

async fn load_file(ctx: &Context, file_type: FileType, path: &str) -> Result<ParsedFile> {
    let content = match ctx.file_read_as_string(path).await {
        Ok(content) => content,
        Err(err) => {
            debug!("failed to read shared {file_type:?} file {path}: {err:?}");
            return Ok(ParsedFile::default());
        }
    };
    parse(file_type, &content).map_err(|e| e.with_context(format!("path: {path}")))
}
