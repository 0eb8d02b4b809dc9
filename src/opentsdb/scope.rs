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

use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

/// Extended parameter naming the tag key a scope is rendered under.
///
/// It is metadata only and never appears in a rendered filter block.
pub const SCOPE_KEY_KEY: &str = "_scope_key";

/// One side of a canary comparison as handed over by the canary request,
/// before it is specialised for OpenTSDB.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanaryScope {
    pub scope: String,
    pub extended_scope_params: IndexMap<String, String>,
}

impl CanaryScope {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            extended_scope_params: IndexMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extended_scope_params.insert(key.into(), value.into());
        self
    }
}

/// An OpenTSDB canary scope: `scope_key=scope` plus extra filter tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    scope: String,
    scope_key: String,
    extended_params: IndexMap<String, String>,
}

impl Scope {
    pub fn new(scope: impl Into<String>, scope_key: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            scope_key: scope_key.into(),
            extended_params: IndexMap::new(),
        }
    }

    pub fn with_extended_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.extended_params.insert(key.into(), value.into());
        self
    }

    pub fn with_extended_params<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.extended_params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn scope_key(&self) -> &str {
        &self.scope_key
    }

    pub fn extended_params(&self) -> &IndexMap<String, String> {
        &self.extended_params
    }

    /// Specialises a generic canary scope for OpenTSDB.
    ///
    /// The scope key comes from the `_scope_key` extended parameter when
    /// present, otherwise from `default_scope_key`. The `_scope_key` entry
    /// is removed from the remaining parameters, which keep their order.
    pub fn from_canary_scope(
        canary_scope: CanaryScope,
        default_scope_key: Option<&str>,
    ) -> Result<Self, ScopeError> {
        let CanaryScope {
            scope,
            mut extended_scope_params,
        } = canary_scope;
        if scope.is_empty() {
            return Err(ScopeError::EmptyScope);
        }

        let scope_key = extended_scope_params
            .shift_remove(SCOPE_KEY_KEY)
            .or_else(|| default_scope_key.map(str::to_string))
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ScopeError::MissingScopeKey(scope.clone()))?;
        debug!(
            "scope `{scope}` keyed by `{scope_key}` with {} extended params",
            extended_scope_params.len()
        );

        Ok(Self {
            scope,
            scope_key,
            extended_params: extended_scope_params,
        })
    }

    /// Filter entries contributed by this scope, in render order.
    pub(crate) fn filter_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        std::iter::once((self.scope_key.as_str(), self.scope.as_str())).chain(
            self.extended_params
                .iter()
                .filter(|(key, _)| key.as_str() != SCOPE_KEY_KEY)
                .map(|(key, value)| (key.as_str(), value.as_str())),
        )
    }
}

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("canary scope value is empty")]
    EmptyScope,
    #[error("no scope key for scope `{0}`; set `_scope_key` or provide a default")]
    MissingScopeKey(String),
}
