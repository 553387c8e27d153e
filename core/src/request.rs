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

use std::mem;
use std::str::FromStr;

use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::Uri;

use crate::{Error, Result};

/// The parts of an outgoing request that take part in signing.
///
/// Built by taking the uri and headers out of `http::request::Parts`, and
/// applied back afterwards. Everything the signer doesn't look at (version,
/// extensions) stays on the original parts untouched.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, as it appears on the wire.
    pub path: String,
    /// HTTP query parameters, percent decoded.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing request from http::request::Parts.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        let uri = mem::take(&mut parts.uri).into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),

            // Take the headers out of the request to avoid copy.
            // They are returned in `apply`.
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Apply the signing request back to http::request::Parts.
    ///
    /// Query values must already be encoded at this point.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;
        parts.uri = {
            let mut uri_parts = mem::take(&mut parts.uri).into_parts();
            uri_parts.scheme = Some(self.scheme);
            uri_parts.authority = Some(self.authority);
            uri_parts.path_and_query = {
                let mut paq = self.path;
                if !self.query.is_empty() {
                    paq.push('?');
                    paq.push_str(&Self::query_to_string(self.query, "=", "&"));
                }
                Some(PathAndQuery::from_str(&paq)?)
            };
            Uri::from_parts(uri_parts)?
        };

        Ok(())
    }

    /// Join query pairs in their current order.
    ///
    /// ```shell
    /// [(a, b), (c, "")] => "a=b&c"
    /// ```
    pub fn query_to_string(query: Vec<(String, String)>, sep: &str, join: &str) -> String {
        let mut s = String::with_capacity(16);
        for (idx, (k, v)) in query.into_iter().enumerate() {
            if idx != 0 {
                s.push_str(join);
            }

            s.push_str(&k);
            if !v.is_empty() {
                s.push_str(sep);
                s.push_str(&v);
            }
        }
        s
    }

    /// Trim leading and trailing spaces, and collapse inner runs of spaces.
    pub fn header_value_normalize(v: &mut HeaderValue) -> Result<()> {
        let bs = v.as_bytes();
        let mut out = Vec::with_capacity(bs.len());
        let mut last_space = false;
        for &b in bs.iter().skip_while(|b| **b == b' ') {
            if b == b' ' {
                last_space = true;
                continue;
            }
            if last_space && !out.is_empty() {
                out.push(b' ');
            }
            last_space = false;
            out.push(b);
        }

        let sensitive = v.is_sensitive();
        *v = HeaderValue::from_bytes(&out)?;
        v.set_sensitive(sensitive);
        Ok(())
    }

    /// Get header names as sorted vector.
    pub fn header_name_to_vec_sorted(&self) -> Vec<&str> {
        let mut h = self
            .headers
            .keys()
            .map(|k| k.as_str())
            .collect::<Vec<&str>>();
        h.sort_unstable();

        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_and_apply_keeps_scheme_and_authority() -> Result<()> {
        let req = http::Request::builder()
            .method("PUT")
            .uri("https://bucket.s3.amazonaws.com:8443/a%20b?list-type=2&prefix=x")
            .header("x-custom", "1")
            .body(())?;
        let (mut parts, _) = req.into_parts();

        let mut sr = SigningRequest::build(&mut parts)?;
        assert_eq!(sr.path, "/a%20b");
        assert_eq!(
            sr.query,
            vec![
                ("list-type".to_string(), "2".to_string()),
                ("prefix".to_string(), "x".to_string())
            ]
        );
        assert!(parts.headers.is_empty());

        sr.headers.insert("x-added", HeaderValue::from_static("yes"));
        sr.apply(&mut parts)?;

        assert_eq!(
            parts.uri.to_string(),
            "https://bucket.s3.amazonaws.com:8443/a%20b?list-type=2&prefix=x"
        );
        assert_eq!(parts.method, Method::PUT);
        assert_eq!(parts.headers["x-custom"], "1");
        assert_eq!(parts.headers["x-added"], "yes");
        Ok(())
    }

    #[test]
    fn test_build_without_authority() {
        let (mut parts, _) = http::Request::builder()
            .uri("/only/path")
            .body(())
            .expect("request must be valid")
            .into_parts();
        let err = SigningRequest::build(&mut parts).expect_err("must fail");
        assert_eq!(err.kind(), crate::ErrorKind::RequestInvalid);
    }

    #[test]
    fn test_header_value_normalize() -> Result<()> {
        let mut v = HeaderValue::from_static("  a   b c  ");
        SigningRequest::header_value_normalize(&mut v)?;
        assert_eq!(v, "a b c");
        Ok(())
    }
}
