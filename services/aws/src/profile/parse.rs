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

//! Parser for the shared `config` and `credentials` files.
//!
//! Parsing happens in two passes. The first pass drops blank and comment lines
//! and folds continuation lines into the logical line they continue. The
//! second pass groups the logical lines into sections.

use super::Profile;
use log::warn;
use sdkgate_core::{Error, Result};
use std::collections::HashMap;

/// Which shared file is being parsed. The two use different section headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// `~/.aws/config`: `[default]`, `[profile name]`, `[services name]`, `[sso-session name]`.
    Config,
    /// `~/.aws/credentials`: `[name]`.
    Credentials,
}

/// Kind of a section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    /// A named profile.
    Profile,
    /// A `[services name]` block of per-service settings.
    Services,
    /// A `[sso-session name]` block.
    SsoSession,
}

/// Sections of one parsed file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedFile {
    /// Profiles by name.
    pub profiles: HashMap<String, Profile>,
    /// `[services name]` sections by name.
    pub services: HashMap<String, Profile>,
    /// `[sso-session name]` sections by name.
    pub sso_sessions: HashMap<String, Profile>,
}

/// One physical line that survived comment stripping, or several physical
/// lines folded together by continuation merging.
#[derive(Debug)]
struct Line {
    number: usize,
    content: String,
}

/// Parse raw file text into its sections.
pub fn parse(file_type: FileType, input: &str) -> Result<ParsedFile> {
    let lines = merge_continuations(input)?;
    group_sections(file_type, lines)
}

fn parse_error(message: &str, line: usize) -> Error {
    Error::config_parse(message).with_context(format!("line: {line}"))
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('#') || line.starts_with(';')
}

fn is_profile_line(line: &str) -> bool {
    line.starts_with('[')
}

fn is_continuation_line(line: &str) -> bool {
    line.starts_with(char::is_whitespace) && !line.trim().is_empty()
}

fn is_property_line(line: &str) -> bool {
    !is_profile_line(line) && !is_continuation_line(line) && line.contains('=')
}

/// A property whose value is empty opens a sub-property block.
fn has_blank_value(property: &str) -> bool {
    property
        .split_once('=')
        .is_some_and(|(_, value)| value.trim().is_empty())
}

/// `key = value` shaped, as required for lines under a blank-valued property.
fn is_sub_property_line(line: &str) -> bool {
    line.contains('=') && !line.trim().starts_with('=')
}

fn merge_continuations(input: &str) -> Result<Vec<Line>> {
    let mut lines: Vec<Line> = Vec::new();
    let mut seen_profile = false;
    let mut seen_property = false;
    // Set while folding lines under a property whose own value was blank.
    let mut in_sub_properties = false;

    for (idx, raw) in input.lines().enumerate() {
        let number = idx + 1;
        if raw.trim().is_empty() || is_comment_line(raw) {
            continue;
        }

        if is_profile_line(raw) {
            seen_profile = true;
            seen_property = false;
            in_sub_properties = false;
            lines.push(Line {
                number,
                content: raw.to_string(),
            });
        } else if is_continuation_line(raw) {
            if !seen_profile {
                return Err(parse_error("Expected a profile definition", number));
            }
            if !seen_property {
                return Err(parse_error("Expected a property definition", number));
            }
            let Some(last) = lines.last_mut() else {
                return Err(parse_error("Expected a property definition", number));
            };
            if has_blank_value(&last.content) {
                in_sub_properties = true;
            }
            if in_sub_properties && !is_sub_property_line(raw) {
                return Err(parse_error(
                    "Expected '=' specifying a sub-property",
                    number,
                ));
            }
            last.content.push('\n');
            last.content.push_str(raw.trim());
        } else {
            if is_property_line(raw) {
                seen_property = true;
            }
            in_sub_properties = false;
            lines.push(Line {
                number,
                content: raw.to_string(),
            });
        }
    }

    Ok(lines)
}

/// Characters allowed in profile names and property keys.
fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-/.%@:+".contains(c))
}

/// Drop a trailing ` # comment` or ` ; comment`.
fn strip_inline_comment(s: &str) -> &str {
    let bytes = s.as_bytes();
    for i in 1..bytes.len() {
        if (bytes[i] == b'#' || bytes[i] == b';') && bytes[i - 1].is_ascii_whitespace() {
            return s[..i].trim_end();
        }
    }
    s
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Header {
    kind: SectionKind,
    name: String,
    /// Whether the name came with its `profile` prefix.
    prefixed: bool,
}

fn parse_header(file_type: FileType, line: &Line) -> Result<Option<Header>> {
    let Some(end) = line.content.rfind(']') else {
        return Err(parse_error("Section definition must end with ']'", line.number));
    };
    let trailing = line.content[end + 1..].trim();
    if !trailing.is_empty() && !trailing.starts_with('#') && !trailing.starts_with(';') {
        return Err(parse_error(
            "Unexpected content after section definition",
            line.number,
        ));
    }
    let inner = line.content[1..end].trim();

    let header = match file_type {
        FileType::Credentials => Header {
            kind: SectionKind::Profile,
            name: inner.to_string(),
            prefixed: false,
        },
        FileType::Config => {
            let mut parts = inner.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some("default"), None, _) => Header {
                    kind: SectionKind::Profile,
                    name: "default".to_string(),
                    prefixed: false,
                },
                (Some(prefix), Some(name), None) => {
                    let kind = match prefix {
                        "profile" => SectionKind::Profile,
                        "services" => SectionKind::Services,
                        "sso-session" => SectionKind::SsoSession,
                        _ => {
                            warn!(
                                "Ignoring section with unknown kind '{prefix}' (line {})",
                                line.number
                            );
                            return Ok(None);
                        }
                    };
                    Header {
                        kind,
                        name: name.to_string(),
                        prefixed: true,
                    }
                }
                _ => {
                    warn!(
                        "Ignoring profile '{inner}' without 'profile' prefix (line {})",
                        line.number
                    );
                    return Ok(None);
                }
            }
        }
    };

    if !is_valid_identifier(&header.name) {
        warn!(
            "Ignoring invalid profile '{}' (line {})",
            header.name, line.number
        );
        return Ok(None);
    }
    Ok(Some(header))
}

/// Split a logical property line into key and value.
///
/// Inline comments are only stripped from the first physical line; continuation
/// and sub-property lines keep them as part of the value.
fn parse_property(line: &Line) -> (String, String) {
    let (first, rest) = match line.content.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (line.content.as_str(), None),
    };
    let (key, value) = first.split_once('=').unwrap_or((first, ""));
    let mut value = strip_inline_comment(value.trim()).to_string();
    if let Some(rest) = rest {
        value.push('\n');
        value.push_str(rest);
    }
    (key.trim().to_string(), value)
}

fn group_sections(file_type: FileType, lines: Vec<Line>) -> Result<ParsedFile> {
    // Profiles are keyed by header so `[default]` and `[profile default]` stay
    // apart until the end.
    let mut sections: Vec<(Header, Profile)> = Vec::new();
    let mut current: Option<usize> = None;
    let mut in_ignored_section = false;

    for line in lines {
        if is_profile_line(&line.content) {
            match parse_header(file_type, &line)? {
                Some(header) => {
                    let idx = match sections.iter().position(|(h, _)| *h == header) {
                        Some(idx) => idx,
                        None => {
                            let profile = Profile::new(header.name.clone());
                            sections.push((header, profile));
                            sections.len() - 1
                        }
                    };
                    current = Some(idx);
                    in_ignored_section = false;
                }
                None => {
                    current = None;
                    in_ignored_section = true;
                }
            }
            continue;
        }

        if !line.content.contains('=') {
            return Err(parse_error("Expected a property definition", line.number));
        }
        let Some(idx) = current else {
            if in_ignored_section {
                continue;
            }
            return Err(parse_error("Expected a profile definition", line.number));
        };

        let (key, value) = parse_property(&line);
        if !is_valid_identifier(&key) {
            warn!("Ignoring invalid property '{key}' (line {})", line.number);
            continue;
        }
        let profile = &mut sections[idx].1;
        if profile.get(&key).is_some() {
            warn!(
                "Overwriting previously-defined property '{key}' in profile '{}' (line {})",
                profile.name(),
                line.number
            );
        }
        profile.set(key, value);
    }

    let mut parsed = ParsedFile::default();
    for (header, profile) in sections {
        let target = match header.kind {
            SectionKind::Profile => &mut parsed.profiles,
            SectionKind::Services => &mut parsed.services,
            SectionKind::SsoSession => &mut parsed.sso_sessions,
        };
        // `[profile default]` wins over `[default]` in the config file.
        let prefixed_exists = header.kind == SectionKind::Profile
            && !header.prefixed
            && file_type == FileType::Config;
        if prefixed_exists && target.contains_key(&header.name) {
            warn!("Ignoring '[{}]' in favor of '[profile {}]'", header.name, header.name);
            continue;
        }
        target.insert(header.name, profile);
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sdkgate_core::ErrorKind;

    fn profile(parsed: &ParsedFile, name: &str) -> Vec<(String, String)> {
        parsed
            .profiles
            .get(name)
            .unwrap_or_else(|| panic!("profile {name} must exist"))
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn kv(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_continuation_merges_with_newline() -> Result<()> {
        let parsed = parse(FileType::Config, "[default]\nregion = us-\n    west-2\n")?;
        assert_eq!(profile(&parsed, "default"), vec![kv("region", "us-\nwest-2")]);
        Ok(())
    }

    #[test]
    fn test_comments_and_blank_lines() -> Result<()> {
        let input = "# leading comment\n\n[profile dev] # trailing\n; another\nregion = eu-west-1 # inline\noutput=json;not-a-comment\n";
        let parsed = parse(FileType::Config, input)?;
        assert_eq!(
            profile(&parsed, "dev"),
            vec![kv("region", "eu-west-1"), kv("output", "json;not-a-comment")]
        );
        Ok(())
    }

    #[test]
    fn test_sub_properties() -> Result<()> {
        let input = "[profile dev]\ns3 =\n  max_concurrent_requests = 10\n  addressing_style = path\nregion = us-east-1\n";
        let parsed = parse(FileType::Config, input)?;
        let dev = &parsed.profiles["dev"];
        assert_eq!(
            dev.get("s3"),
            Some("\nmax_concurrent_requests = 10\naddressing_style = path")
        );
        assert_eq!(
            dev.sub_property("s3", "addressing_style").as_deref(),
            Some("path")
        );
        assert_eq!(dev.get("region"), Some("us-east-1"));
        Ok(())
    }

    #[test]
    fn test_value_ending_in_equals_is_not_a_sub_property_block() -> Result<()> {
        let input = "[default]\nsecret = abc==\n  def\ntoken = xyz=\n";
        let parsed = parse(FileType::Config, input)?;
        assert_eq!(
            profile(&parsed, "default"),
            vec![kv("secret", "abc==\ndef"), kv("token", "xyz=")]
        );
        Ok(())
    }

    #[test]
    fn test_continuation_before_profile() {
        let err = parse(FileType::Config, "  region = us-east-1\n").expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::ConfigParse);
        assert_eq!(err.message(), "Expected a profile definition");
        assert_eq!(err.context(), ["line: 1"]);
    }

    #[test]
    fn test_continuation_before_property() {
        let err = parse(FileType::Config, "[default]\n   us-east-1\n").expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::ConfigParse);
        assert_eq!(err.message(), "Expected a property definition");
        assert_eq!(err.context(), ["line: 2"]);
    }

    #[test]
    fn test_bad_sub_property() {
        for input in [
            "[default]\ns3 =\n  not-a-sub-property\n",
            "[default]\ns3 =\n  = value\n",
            "[default]\ns3 =\n  a = 1\n  b\n",
        ] {
            let err = parse(FileType::Config, input).expect_err("must fail");
            assert_eq!(err.kind(), ErrorKind::ConfigParse, "{input}");
            assert_eq!(err.message(), "Expected '=' specifying a sub-property");
        }
    }

    #[test]
    fn test_property_before_profile() {
        let err = parse(FileType::Config, "region = us-east-1\n").expect_err("must fail");
        assert_eq!(err.message(), "Expected a profile definition");
    }

    #[test]
    fn test_duplicate_keys_last_wins() -> Result<()> {
        let input = "[default]\nregion = us-east-1\noutput = json\nregion = us-west-2\n[default]\noutput = text\n";
        let parsed = parse(FileType::Config, input)?;
        assert_eq!(
            profile(&parsed, "default"),
            vec![kv("region", "us-west-2"), kv("output", "text")]
        );
        Ok(())
    }

    #[test]
    fn test_profile_prefix_wins_over_bare_default() -> Result<()> {
        let input = "[profile default]\nregion = from-prefixed\n[default]\nregion = from-bare\n";
        let parsed = parse(FileType::Config, input)?;
        assert_eq!(
            profile(&parsed, "default"),
            vec![kv("region", "from-prefixed")]
        );
        Ok(())
    }

    #[test]
    fn test_config_file_sections() -> Result<()> {
        let input = "[foo]\nregion = ignored\n[profile bad name]\nregion = ignored\n[services dev-svc]\ns3 =\n  endpoint_url = http://localhost:9000\n[sso-session corp]\nsso_region = us-east-1\n";
        let parsed = parse(FileType::Config, input)?;
        assert!(parsed.profiles.is_empty());
        assert_eq!(
            parsed.services["dev-svc"]
                .sub_property("s3", "endpoint_url")
                .as_deref(),
            Some("http://localhost:9000")
        );
        assert_eq!(
            parsed.sso_sessions["corp"].get("sso_region"),
            Some("us-east-1")
        );
        Ok(())
    }

    #[test]
    fn test_credentials_file_sections() -> Result<()> {
        let input = "[default]\naws_access_key_id = AKID\n[profile dev]\naws_access_key_id = ignored\n[dev]\naws_secret_access_key = SECRET\n";
        let parsed = parse(FileType::Credentials, input)?;
        assert_eq!(profile(&parsed, "default"), vec![kv("aws_access_key_id", "AKID")]);
        assert_eq!(
            profile(&parsed, "dev"),
            vec![kv("aws_secret_access_key", "SECRET")]
        );
        assert_eq!(parsed.profiles.len(), 2);
        Ok(())
    }

    #[test]
    fn test_invalid_property_key_ignored() -> Result<()> {
        let parsed = parse(FileType::Config, "[default]\nbad key = 1\nregion = us-east-1\n")?;
        assert_eq!(profile(&parsed, "default"), vec![kv("region", "us-east-1")]);
        Ok(())
    }

    #[test]
    fn test_empty_input() -> Result<()> {
        assert_eq!(parse(FileType::Config, "")?, ParsedFile::default());
        assert_eq!(parse(FileType::Credentials, "\n  \n# only comments\n")?, ParsedFile::default());
        Ok(())
    }
}
