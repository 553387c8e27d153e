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

//! AWS Signature Version 4.
//!
//! - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)

use super::config::{SignatureType, SignedBodyHeader, SigningAlgorithm, SigningConfig};
use crate::constants::*;
use http::request::Parts;
use http::{header, HeaderValue};
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use sdkgate_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use sdkgate_core::time::{format_date, format_iso8601, DateTime};
use sdkgate_core::{Error, Result, SigningRequest};
use std::fmt::Write;

/// Headers that proxies or the transport may rewrite, never signed.
const UNSIGNED_HEADERS: &[&str] = &["authorization", "user-agent", "x-amzn-trace-id", "expect"];

/// Sign `req` in place and return the hex signature.
pub fn sign_request(req: &mut Parts, config: &SigningConfig) -> Result<String> {
    if config.algorithm == SigningAlgorithm::SigV4Asymmetric {
        return Err(Error::unimplemented(
            "SigV4 asymmetric signing is not implemented yet",
        ));
    }

    // Building takes the uri and headers out of `req`; put them back on failure.
    let (uri, headers) = (req.uri.clone(), req.headers.clone());
    let result = match SigningRequest::build(req) {
        Ok(signed_req) => sign_built_request(signed_req, req, config),
        Err(err) => Err(err),
    };
    if result.is_err() {
        req.uri = uri;
        req.headers = headers;
    }
    result
}

fn sign_built_request(
    mut signed_req: SigningRequest,
    req: &mut Parts,
    config: &SigningConfig,
) -> Result<String> {
    let now = config.date;
    let cred = &config.credential;
    signed_req.headers.remove(header::AUTHORIZATION);

    // canonicalize context
    canonicalize_header(&mut signed_req, config, now)?;
    canonicalize_query(&mut signed_req, config, now)?;

    // build canonical request and string to sign.
    let creq = canonical_request_string(&signed_req, config)?;
    debug!("calculated canonical request: {creq}");
    let encoded_req = hex_sha256(creq.as_bytes());

    // Scope: "20220313/<region>/<service>/aws4_request"
    let scope = format!(
        "{}/{}/{}/aws4_request",
        format_date(now),
        config.region,
        config.service
    );
    debug!("calculated scope: {scope}");

    // StringToSign:
    //
    // AWS4-HMAC-SHA256
    // 20220313T072004Z
    // 20220313/<region>/<service>/aws4_request
    // <hashed_canonical_request>
    let string_to_sign = {
        let mut f = String::new();
        writeln!(f, "{AWS4_HMAC_SHA256}")?;
        writeln!(f, "{}", format_iso8601(now))?;
        writeln!(f, "{scope}")?;
        write!(f, "{encoded_req}")?;
        f
    };
    debug!("calculated string to sign: {string_to_sign}");

    let signing_key =
        generate_signing_key(&cred.secret_access_key, now, &config.region, &config.service);
    let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

    match config.signature_type {
        SignatureType::QueryParams => {
            signed_req
                .query
                .push((X_AMZ_SIGNATURE_QUERY.into(), signature.clone()));
            if config.omit_session_token {
                if let Some(token) = &cred.session_token {
                    signed_req.query.push((
                        X_AMZ_SECURITY_TOKEN_QUERY.into(),
                        utf8_percent_encode(token, &AWS_QUERY_ENCODE_SET).to_string(),
                    ));
                }
            }
        }
        SignatureType::Headers => {
            let mut authorization = HeaderValue::from_str(&format!(
                "{AWS4_HMAC_SHA256} Credential={}/{}, SignedHeaders={}, Signature={}",
                cred.access_key_id,
                scope,
                signed_header_names(&signed_req).join(";"),
                signature
            ))?;
            authorization.set_sensitive(true);
            signed_req
                .headers
                .insert(header::AUTHORIZATION, authorization);

            if config.omit_session_token {
                if let Some(token) = &cred.session_token {
                    signed_req
                        .headers
                        .insert(X_AMZ_SECURITY_TOKEN, session_token_header(token)?);
                }
            }
        }
    }

    // Apply to the request.
    signed_req.apply(req)?;
    Ok(signature)
}

fn session_token_header(token: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(token)?;
    // Set token value sensitive to avoid leaking.
    value.set_sensitive(true);
    Ok(value)
}

/// Header names that take part in the signature, sorted.
fn signed_header_names(req: &SigningRequest) -> Vec<&str> {
    req.header_name_to_vec_sorted()
        .into_iter()
        .filter(|name| !UNSIGNED_HEADERS.contains(name))
        .collect()
}

fn canonical_request_string(req: &SigningRequest, config: &SigningConfig) -> Result<String> {
    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);

    // Insert method
    writeln!(f, "{}", req.method)?;
    // Insert encoded path
    writeln!(f, "{}", canonical_path(&req.path, config)?)?;
    // Insert query
    writeln!(
        f,
        "{}",
        req.query
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    )?;
    // Insert signed headers
    let signed_headers = signed_header_names(req);
    for name in signed_headers.iter() {
        let values = req
            .headers
            .get_all(*name)
            .iter()
            .map(|v| v.to_str())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                Error::request_invalid("header value is not visible ascii")
                    .with_source(e)
                    .with_context(format!("header: {name}"))
            })?;
        writeln!(f, "{name}:{}", values.join(","))?;
    }
    writeln!(f)?;
    writeln!(f, "{}", signed_headers.join(";"))?;
    write!(f, "{}", config.signed_body_value.as_str())?;

    Ok(f)
}

fn canonical_path(path: &str, config: &SigningConfig) -> Result<String> {
    let path = if config.normalize_uri_path {
        normalize_path(path)
    } else {
        path.to_string()
    };

    if config.use_double_uri_encode {
        return Ok(utf8_percent_encode(&path, &AWS_URI_ENCODE_SET).to_string());
    }
    let decoded = percent_decode_str(&path).decode_utf8().map_err(|e| {
        Error::request_invalid("request path is not valid utf-8")
            .with_source(e)
            .with_context(format!("path: {path}"))
    })?;
    Ok(utf8_percent_encode(&decoded, &AWS_URI_ENCODE_SET).to_string())
}

/// Remove `.` and `..` segments, keeping a trailing slash.
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    let mut trailing_slash = path.ends_with('/');
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match segment {
            "." => trailing_slash = true,
            ".." => {
                segments.pop();
                trailing_slash = true;
            }
            s => {
                segments.push(s);
                trailing_slash = false;
            }
        }
    }
    if path.ends_with('/') {
        trailing_slash = true;
    }

    let mut normalized = String::with_capacity(path.len() + 1);
    for s in &segments {
        normalized.push('/');
        normalized.push_str(s);
    }
    if trailing_slash || normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

fn canonicalize_header(req: &mut SigningRequest, config: &SigningConfig, now: DateTime) -> Result<()> {
    // Header names and values need to be normalized according to Step 4 of https://docs.aws.amazon.com/general/latest/gr/sigv4-create-canonical-request.html
    for (_, value) in req.headers.iter_mut() {
        SigningRequest::header_value_normalize(value)?;
    }

    // Insert HOST header if not present.
    if req.headers.get(header::HOST).is_none() {
        req.headers
            .insert(header::HOST, req.authority.as_str().parse()?);
    }

    if config.signature_type == SignatureType::Headers {
        req.headers
            .insert(X_AMZ_DATE, HeaderValue::try_from(format_iso8601(now))?);

        if !config.omit_session_token {
            if let Some(token) = &config.credential.session_token {
                req.headers
                    .insert(X_AMZ_SECURITY_TOKEN, session_token_header(token)?);
            }
        }
    }

    if config.signed_body_header == SignedBodyHeader::XAmzContentSha256 {
        req.headers.insert(
            X_AMZ_CONTENT_SHA_256,
            HeaderValue::from_str(config.signed_body_value.as_str())?,
        );
    }

    Ok(())
}

fn canonicalize_query(req: &mut SigningRequest, config: &SigningConfig, now: DateTime) -> Result<()> {
    let cred = &config.credential;
    if let (SignatureType::QueryParams, Some(expires_in)) = (config.signature_type, config.expires_in)
    {
        req.query
            .push((X_AMZ_ALGORITHM_QUERY.into(), AWS4_HMAC_SHA256.into()));
        req.query.push((
            X_AMZ_CREDENTIAL_QUERY.into(),
            format!(
                "{}/{}/{}/{}/aws4_request",
                cred.access_key_id,
                format_date(now),
                config.region,
                config.service
            ),
        ));
        req.query.push((X_AMZ_DATE_QUERY.into(), format_iso8601(now)));
        req.query.push((
            X_AMZ_EXPIRES_QUERY.into(),
            expires_in.num_seconds().to_string(),
        ));
        let signed_headers = signed_header_names(req).join(";");
        req.query
            .push((X_AMZ_SIGNED_HEADERS_QUERY.into(), signed_headers));

        if !config.omit_session_token {
            if let Some(token) = &cred.session_token {
                req.query
                    .push((X_AMZ_SECURITY_TOKEN_QUERY.into(), token.into()));
            }
        }
    }

    // Return if query is empty.
    if req.query.is_empty() {
        return Ok(());
    }

    req.query = req
        .query
        .iter()
        .map(|(k, v)| {
            (
                utf8_percent_encode(k, &AWS_QUERY_ENCODE_SET).to_string(),
                utf8_percent_encode(v, &AWS_QUERY_ENCODE_SET).to_string(),
            )
        })
        .collect();
    // Sort by encoded param name, then value.
    req.query.sort();

    Ok(())
}

fn generate_signing_key(secret: &str, time: DateTime, region: &str, service: &str) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}
