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

use log::debug;
use thiserror::Error;

use super::{scope::Scope, tag::TagPair};

/// Renders `aggregator[:downsample][:rate]:metric{filters}` for the OpenTSDB
/// HTTP query API.
///
/// Nothing is validated or escaped here: metric names, tag keys and values
/// must already be legal OpenTSDB identifiers.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    metric_name: String,
    aggregator: String,
    downsample: String,
    rate: bool,
    tag_pairs: Vec<TagPair>,
    scope: Option<Scope>,
}

impl QueryBuilder {
    /// An empty `downsample` means no downsampling clause.
    pub fn create(
        metric_name: impl Into<String>,
        aggregator: impl Into<String>,
        downsample: impl Into<String>,
        rate: bool,
    ) -> Self {
        Self {
            metric_name: metric_name.into(),
            aggregator: aggregator.into(),
            downsample: downsample.into(),
            rate,
            tag_pairs: Vec::new(),
            scope: None,
        }
    }

    pub fn with_tag_pair(&mut self, tag_pair: TagPair) -> &mut Self {
        self.tag_pairs.push(tag_pair);
        self
    }

    /// Attaches the scope, replacing any scope attached earlier.
    pub fn with_scope(&mut self, scope: Scope) -> &mut Self {
        if let Some(previous) = self.scope.replace(scope) {
            debug!(
                "replacing scope `{}={}` on query for `{}`",
                previous.scope_key(),
                previous.scope(),
                self.metric_name
            );
        }
        self
    }

    pub fn build(&self) -> String {
        let mut program = self.aggregator.clone();
        if !self.downsample.is_empty() {
            program.push(':');
            program.push_str(&self.downsample);
        }
        if self.rate {
            program.push_str(":rate");
        }
        program.push(':');
        program.push_str(&self.metric_name);

        let mut filters: Vec<String> = self.tag_pairs.iter().map(TagPair::to_string).collect();
        if let Some(scope) = &self.scope {
            filters.extend(
                scope
                    .filter_pairs()
                    .map(|(key, value)| format!("{key}={value}")),
            );
        }

        let query = format!("{program}{{{}}}", filters.join(","));
        debug!("rendered OpenTSDB query: {query}");
        query
    }
}

/// Per-metric query settings carried by a canary metric set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricSetQuery {
    pub metric_name: String,
    pub aggregator: String,
    pub downsample: String,
    pub rate: bool,
    pub tags: Vec<TagPair>,
}

impl MetricSetQuery {
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.metric_name.is_empty() {
            return Err(QueryError::EmptyMetricName);
        }
        if self.aggregator.is_empty() {
            return Err(QueryError::EmptyAggregator(self.metric_name.clone()));
        }
        Ok(())
    }

    pub fn query_for(&self, scope: &Scope) -> Result<String, QueryError> {
        self.validate()?;
        let mut builder = QueryBuilder::create(
            self.metric_name.as_str(),
            self.aggregator.as_str(),
            self.downsample.as_str(),
            self.rate,
        );
        for tag in &self.tags {
            builder.with_tag_pair(tag.clone());
        }
        builder.with_scope(scope.clone());
        Ok(builder.build())
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("metric name must not be empty")]
    EmptyMetricName,
    #[error("aggregator for metric `{0}` must not be empty")]
    EmptyAggregator(String),
}
