// Copyright 2021 Datafuse Labs
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{fmt, str::FromStr};

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0, multispace1},
    combinator::{all_consuming, map, value},
    error::{Error as NomError, context},
    multi::separated_list0,
    sequence::{delimited, separated_pair},
};
use thiserror::Error;

/// A literal `key=value` filter on an OpenTSDB metric.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagPair {
    key: String,
    value: String,
}

impl TagPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for TagPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl FromStr for TagPair {
    type Err = TagError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        all_consuming(delimited(multispace0, tag_pair, multispace0))
            .parse(input)
            .map(|(_, pair)| pair)
            .map_err(|err| TagError::Invalid(err.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum TagError {
    #[error("failed to parse tag pair: {0}")]
    Invalid(String),
}

/// Parses a list such as `scope=control response_code=400` or `app=cms,env=prod`.
///
/// Whitespace and commas are both accepted as separators; an empty input
/// yields no tags.
pub fn parse_tag_pairs(input: &str) -> Result<Vec<TagPair>, TagError> {
    all_consuming(delimited(multispace0, tag_list, multispace0))
        .parse(input)
        .map(|(_, pairs)| pairs)
        .map_err(|err| TagError::Invalid(err.to_string()))
}

type NomResult<'a, T> = IResult<&'a str, T, NomError<&'a str>>;

fn tag_list(input: &str) -> NomResult<'_, Vec<TagPair>> {
    context("tag list", separated_list0(separator, tag_pair)).parse(input)
}

fn separator(input: &str) -> NomResult<'_, ()> {
    alt((
        value((), delimited(multispace0, char(','), multispace0)),
        value((), multispace1),
    ))
    .parse(input)
}

fn tag_pair(input: &str) -> NomResult<'_, TagPair> {
    context(
        "tag pair",
        map(
            separated_pair(
                context("tag key", tag_key),
                char('='),
                context("tag value", tag_value),
            ),
            |(key, value)| TagPair::new(key, value),
        ),
    )
    .parse(input)
}

fn tag_key(input: &str) -> NomResult<'_, &str> {
    take_while1(is_key_char)(input)
}

fn tag_value(input: &str) -> NomResult<'_, &str> {
    take_while1(is_value_char)(input)
}

fn is_key_char(ch: char) -> bool {
    is_value_char(ch) && ch != '='
}

// values may carry `=`, only separators end them
fn is_value_char(ch: char) -> bool {
    !ch.is_whitespace() && ch != ','
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_pair() {
        let pair: TagPair = "uri=/v2/auth/iam-principal".parse().unwrap();
        assert_eq!(pair.key(), "uri");
        assert_eq!(pair.value(), "/v2/auth/iam-principal");
        assert_eq!(pair.to_string(), "uri=/v2/auth/iam-principal");
    }

    #[test]
    fn value_keeps_embedded_equals() {
        let pair: TagPair = "expr=a=b".parse().unwrap();
        assert_eq!(pair.key(), "expr");
        assert_eq!(pair.value(), "a=b");
    }

    #[test]
    fn parse_fail_on_missing_value() {
        let err = "app=".parse::<TagPair>().unwrap_err();
        assert!(matches!(err, TagError::Invalid(_)));
    }

    #[test]
    fn parse_fail_on_missing_key() {
        assert!("=cms".parse::<TagPair>().is_err());
        assert!("cms".parse::<TagPair>().is_err());
    }

    #[test]
    fn parse_space_separated_list() {
        let pairs = parse_tag_pairs("scope=control response_code=400").unwrap();
        assert_eq!(
            pairs,
            vec![
                TagPair::new("scope", "control"),
                TagPair::new("response_code", "400"),
            ]
        );
    }

    #[test]
    fn parse_comma_separated_list_keeps_order_and_duplicates() {
        let pairs = parse_tag_pairs(" app=cms , env=prod,app=web ").unwrap();
        let rendered: Vec<String> = pairs.iter().map(TagPair::to_string).collect();
        assert_eq!(rendered, ["app=cms", "env=prod", "app=web"]);
    }

    #[test]
    fn parse_empty_list() {
        assert!(parse_tag_pairs("").unwrap().is_empty());
        assert!(parse_tag_pairs("   ").unwrap().is_empty());
    }

    #[test]
    fn parse_list_fail_on_dangling_token() {
        let err = parse_tag_pairs("app=cms broken").unwrap_err();
        assert!(matches!(err, TagError::Invalid(_)));
    }
}
