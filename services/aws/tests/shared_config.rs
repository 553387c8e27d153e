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

use crate::TestHome;
use anyhow::Result;
use pretty_assertions::assert_eq;
use sdkgate_aws::profile::{load_shared_config, ConfigurationSource};
use sdkgate_aws::{resolve_endpoint_url, AwsConfig, RetryMode};
use sdkgate_core::ErrorKind;
use std::fs;

#[tokio::test]
async fn test_config_file_wins_per_key() -> Result<()> {
    let home = TestHome::new(
        "[default]\nregion = us-east-1\naws_access_key_id = FROM_CONFIG\n",
        "[default]\naws_access_key_id = FROM_CREDENTIALS\naws_secret_access_key = SECRET\n",
    );
    let shared = load_shared_config(&home.context(&[]), None).await?;

    let profile = shared.active_profile();
    assert_eq!(profile.name(), "default");
    assert_eq!(profile.get("aws_access_key_id"), Some("FROM_CONFIG"));
    assert_eq!(profile.get("aws_secret_access_key"), Some("SECRET"));
    assert_eq!(profile.get("region"), Some("us-east-1"));
    Ok(())
}

#[tokio::test]
async fn test_missing_files_are_empty() -> Result<()> {
    let home = TestHome::new("", "");
    let ctx = home.context(&[
        ("AWS_CONFIG_FILE", "/nonexistent/config"),
        ("AWS_SHARED_CREDENTIALS_FILE", "/nonexistent/credentials"),
        ("AWS_PROFILE", "ghost"),
    ]);
    let shared = load_shared_config(&ctx, None).await?;

    assert_eq!(shared.active_profile_name(), "ghost");
    assert!(shared.active_profile().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_custom_file_locations() -> Result<()> {
    let home = TestHome::new("", "");
    let custom = home.path().join("custom-config");
    fs::write(&custom, "[profile ci]\nregion = eu-north-1\n")?;
    let custom = custom.to_string_lossy().to_string();

    let ctx = home.context(&[("AWS_CONFIG_FILE", &custom), ("AWS_PROFILE", "ci")]);
    let source = ConfigurationSource::resolve(&ctx, None)?;
    assert_eq!(source.config_file, custom);
    assert_eq!(source.profile, "ci");

    let shared = load_shared_config(&ctx, None).await?;
    assert_eq!(shared.active_profile().get("region"), Some("eu-north-1"));
    Ok(())
}

#[tokio::test]
async fn test_parse_error_names_the_file() {
    let home = TestHome::new("region = us-east-1\n", "");
    let err = load_shared_config(&home.context(&[]), None)
        .await
        .expect_err("must fail");

    assert_eq!(err.kind(), ErrorKind::ConfigParse);
    assert!(err.context().iter().any(|c| c.starts_with("path: ")));
    assert!(err.context().iter().any(|c| c == "line: 1"));
}

#[tokio::test]
async fn test_services_section_endpoint() -> Result<()> {
    let home = TestHome::new(
        "[default]\nservices = local\n\n[services local]\ndynamodb =\n  endpoint_url = http://localhost:8000\n",
        "",
    );
    let ctx = home.context(&[]);
    let shared = load_shared_config(&ctx, None).await?;

    assert_eq!(
        resolve_endpoint_url(&ctx, &shared, "DynamoDB")?.as_deref(),
        Some("http://localhost:8000")
    );
    assert_eq!(resolve_endpoint_url(&ctx, &shared, "S3")?, None);

    let ctx = home.context(&[("AWS_IGNORE_CONFIGURED_ENDPOINT_URLS", "true")]);
    assert_eq!(resolve_endpoint_url(&ctx, &shared, "DynamoDB")?, None);
    Ok(())
}

#[tokio::test]
async fn test_dangling_services_reference() -> Result<()> {
    let home = TestHome::new("[default]\nservices = missing\n", "");
    let ctx = home.context(&[]);
    let shared = load_shared_config(&ctx, None).await?;

    let err = resolve_endpoint_url(&ctx, &shared, "S3").expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    Ok(())
}

#[tokio::test]
async fn test_aws_config_from_profile() -> Result<()> {
    let home = TestHome::new(
        "[profile dev]\nregion = ap-northeast-1\nretry_mode = legacy\nmax_attempts = 7\n",
        "",
    );
    let ctx = home.context(&[("AWS_PROFILE", "dev"), ("AWS_MAX_ATTEMPTS", "2")]);

    let resolved = AwsConfig::new().resolve(&ctx, "S3").await?;
    assert_eq!(resolved.region, "ap-northeast-1");
    assert_eq!(resolved.retry.retry_mode, RetryMode::Legacy);
    assert_eq!(resolved.retry.max_attempts, 2);
    Ok(())
}

#[tokio::test]
async fn test_aws_config_rejects_adaptive_retry() {
    let home = TestHome::new("[default]\nregion = us-east-1\nretry_mode = adaptive\n", "");
    let err = AwsConfig::new()
        .resolve(&home.context(&[]), "S3")
        .await
        .expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Unimplemented);
}
