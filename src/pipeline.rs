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

use serde::{Deserialize, Serialize};

use crate::dsl::ir::OruInstruction;

/// A stored pipeline: its source lines, the compiler that built it, and the
/// compiled instruction vector. Compiled once at registration and reused for
/// every run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OruPipeline {
    /// Registry tag. Empty for ad-hoc pipelines built outside the registry.
    pub tag: String,
    /// Source lines after `$super` expansion.
    pub lines: Vec<String>,
    /// Name of the compiler that produced `compiled`.
    pub compiler: String,
    /// The executable form.
    pub compiled: Vec<OruInstruction>,
}

/// Expands `$super` directives: a bare `$super` line is replaced in place by
/// the previous version's lines, dropping those that begin with `->`.
pub fn expand_super(lines: &[String], prev_lines: Option<&[String]>) -> Vec<String> {
    let mut expanded = Vec::with_capacity(lines.len());
    for line in lines {
        if line.trim() == "$super" {
            if let Some(prev) = prev_lines {
                for inherited in prev {
                    if !inherited.trim_start().starts_with("->") {
                        expanded.push(inherited.clone());
                    }
                }
            }
        } else {
            expanded.push(line.clone());
        }
    }
    expanded
}

/// Reads a `// compiler=NAME` directive from the first line.
pub fn compiler_directive(lines: &[String]) -> Option<String> {
    let first = lines.first()?.trim();
    let name = first.strip_prefix("// compiler=")?.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
