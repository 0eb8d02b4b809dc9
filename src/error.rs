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

use thiserror::Error;

use crate::opentsdb::{QueryError, ScopeError, TagError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Tag(#[from] TagError),
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl AppError {
    /// Exit status reported by the `opentsdb-query` binary.
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::BadRequest(_) | Self::Tag(_) => 2,
            Self::Scope(_) | Self::Query(_) => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_module_errors_transparently() {
        let err = AppError::from(QueryError::EmptyMetricName);
        assert_eq!(err.to_string(), "metric name must not be empty");

        let err = AppError::from(ScopeError::MissingScopeKey("control".into()));
        assert!(err.to_string().contains("`control`"));
    }

    #[test]
    fn exit_status_by_kind() {
        assert_eq!(AppError::BadRequest("x".into()).exit_status(), 2);
        assert_eq!(AppError::from(ScopeError::EmptyScope).exit_status(), 3);
    }
}
