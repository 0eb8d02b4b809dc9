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

//! Builds OpenTSDB HTTP API query expressions for canary analysis.
//!
//! ```
//! use opentsdb_canary_query::{QueryBuilder, Scope, TagPair};
//!
//! let mut builder = QueryBuilder::create("request.count", "sum", "1m-sum", true);
//! builder
//!     .with_tag_pair(TagPair::new("app", "cms"))
//!     .with_scope(Scope::new("1.0.0", "version").with_extended_param("env", "production"));
//! assert_eq!(
//!     builder.build(),
//!     "sum:1m-sum:rate:request.count{app=cms,version=1.0.0,env=production}"
//! );
//! ```

mod error;
pub mod opentsdb;

pub use error::AppError;
pub use opentsdb::{
    CanaryScope, MetricSetQuery, QueryBuilder, QueryError, SCOPE_KEY_KEY, Scope, ScopeError,
    TagError, TagPair, parse_tag_pairs,
};
