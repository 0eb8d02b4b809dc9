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

use std::process::ExitCode;

use clap::Parser;
use indexmap::IndexMap;
use log::{LevelFilter, info};
use opentsdb_canary_query::{
    AppError, CanaryScope, MetricSetQuery, Scope, TagPair, parse_tag_pairs,
};

#[derive(Debug, Parser)]
#[command(author, version, about, disable_help_subcommand = true)]
struct Args {
    /// Metric to query, e.g. request.count
    #[arg(long = "metric", env = "OPENTSDB_METRIC")]
    metric: String,
    /// Aggregation function combining the matching series
    #[arg(long, env = "OPENTSDB_AGGREGATOR", default_value = "sum")]
    aggregator: String,
    /// Downsampling specifier such as 1m-sum; empty disables downsampling
    #[arg(long, env = "OPENTSDB_DOWNSAMPLE", default_value = "")]
    downsample: String,
    /// Query the rate of change instead of raw values
    #[arg(long, env = "OPENTSDB_RATE")]
    rate: bool,
    /// Literal tag filter, repeatable (e.g. --tag app=cms)
    #[arg(long = "tag")]
    tags: Vec<TagPair>,
    /// Whitespace or comma separated tag filters, appended after --tag values
    #[arg(long = "tags", env = "OPENTSDB_TAGS")]
    tag_list: Option<String>,
    /// Canary scope value, e.g. control or 1.0.0
    #[arg(long, env = "CANARY_SCOPE")]
    scope: String,
    /// Tag key for the scope value when no _scope_key param is given
    #[arg(long = "scope-key", env = "CANARY_SCOPE_KEY")]
    scope_key: Option<String>,
    /// Extended scope parameter, repeatable (e.g. --param env=production)
    #[arg(long = "param")]
    params: Vec<TagPair>,
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    match run(args) {
        Ok(query) => {
            println!("{query}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(err.exit_status())
        }
    }
}

fn run(args: Args) -> Result<String, AppError> {
    let mut tags = args.tags;
    if let Some(list) = args.tag_list.as_deref() {
        tags.extend(parse_tag_pairs(list)?);
    }
    let query = MetricSetQuery {
        metric_name: args.metric,
        aggregator: args.aggregator,
        downsample: args.downsample,
        rate: args.rate,
        tags,
    };
    query.validate()?;

    let mut extended_scope_params = IndexMap::new();
    for param in args.params {
        let previous =
            extended_scope_params.insert(param.key().to_string(), param.value().to_string());
        if previous.is_some() {
            return Err(AppError::BadRequest(format!(
                "extended scope param `{}` given more than once",
                param.key()
            )));
        }
    }
    let scope = Scope::from_canary_scope(
        CanaryScope {
            scope: args.scope,
            extended_scope_params,
        },
        args.scope_key.as_deref(),
    )?;
    info!(
        "building query for `{}` (scope {}={}, tags={})",
        query.metric_name,
        scope.scope_key(),
        scope.scope(),
        query.tags.len()
    );
    Ok(query.query_for(&scope)?)
}

fn init_logging() {
    if std::env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_default_env().init();
    } else {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Warn)
            .filter_module("opentsdb_canary_query", LevelFilter::Info)
            .filter_module("opentsdb_query", LevelFilter::Info)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(argv: &[&str]) -> Result<String, AppError> {
        let args = Args::try_parse_from(
            std::iter::once("opentsdb-query").chain(argv.iter().copied()),
        )
        .unwrap();
        run(args)
    }

    #[test]
    fn renders_query_from_flags() {
        let query = run_with(&[
            "--metric",
            "request.count",
            "--downsample",
            "1m-sum",
            "--rate",
            "--tag",
            "app=cms",
            "--tags",
            "response_code=400 uri=/v2/auth/iam-principal",
            "--scope",
            "1.0.0",
            "--param",
            "env=production",
            "--param",
            "_scope_key=version",
        ])
        .unwrap();
        assert_eq!(
            query,
            "sum:1m-sum:rate:request.count{app=cms,response_code=400,uri=/v2/auth/iam-principal,version=1.0.0,env=production}"
        );
    }

    #[test]
    fn scope_key_flag_used_without_marker() {
        let query = run_with(&[
            "--metric",
            "test.server.request",
            "--scope",
            "control",
            "--scope-key",
            "scope",
        ])
        .unwrap();
        assert_eq!(query, "sum:test.server.request{scope=control}");
    }

    #[test]
    fn missing_scope_key_is_an_error() {
        let err = run_with(&["--metric", "request.count", "--scope", "control"]).unwrap_err();
        assert!(matches!(err, AppError::Scope(_)));
    }

    #[test]
    fn duplicate_param_is_rejected() {
        let err = run_with(&[
            "--metric",
            "request.count",
            "--scope",
            "control",
            "--scope-key",
            "scope",
            "--param",
            "env=prod",
            "--param",
            "env=staging",
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn empty_aggregator_is_rejected() {
        let err = run_with(&[
            "--metric",
            "request.count",
            "--aggregator",
            "",
            "--scope",
            "control",
            "--scope-key",
            "scope",
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::Query(_)));
    }

    #[test]
    fn malformed_tag_list_is_rejected() {
        let err = run_with(&[
            "--metric",
            "request.count",
            "--tags",
            "app=",
            "--scope",
            "control",
            "--scope-key",
            "scope",
        ])
        .unwrap_err();
        assert!(matches!(err, AppError::Tag(_)));
    }
}
