//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Oru.
//! The Oru project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//! http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Oru
//!
//! A component container and pipeline runtime. Components register into a
//! [`OruContainer`]; pipelines are small line-oriented DSL programs compiled
//! once into instruction vectors and executed against a context, an ambient
//! input value and the registered components:
//!
//! ```text
//! set input.count 0
//! label loop
//! inc input.count
//! lt input.count 3
//! je loop
//! get input
//! ```

pub mod component;
pub mod container;
pub mod dsl;
pub mod errors;
pub mod path;
pub mod pipeline;
pub mod wildcard;

pub use component::{
    invoke_component, OruClassFactory, OruComponent, OruComponentFactory, OruInstance,
};
pub use container::{OruContainer, OruContainerConfig};
pub use dsl::{
    OruCompiler, OruDefaultCompiler, OruExecutionContext, OruInstruction, OruOp, OruToken,
    DEFAULT_COMPILER,
};
pub use errors::{OruError, Result};
pub use path::{OruLiteralKind, OruResolved};
pub use pipeline::OruPipeline;
pub use wildcard::{compare_wildcards, matches_wildcard};
