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

use serde_json::Value;

use crate::container::OruContainer;
use crate::dsl::interpreter;
use crate::dsl::ir::{OruInstruction, OruOp, OruToken};
use crate::errors::Result;
use crate::pipeline::OruPipeline;

/// Plug-in contract for pipeline compilers. A compiler owns both halves of a
/// pipeline's life: turning source lines into instructions and executing
/// them. Custom compilers register through
/// [`OruContainer::register_compiler`] and are selected per pipeline with a
/// leading `// compiler=NAME` line.
pub trait OruCompiler: std::fmt::Debug + Send + Sync {
    /// Registry name of the compiler.
    fn name(&self) -> &str;

    /// Tokenizes pipeline lines into instruction vectors.
    fn compile(&self, lines: &[String]) -> Result<Vec<OruInstruction>>;

    /// Executes a compiled pipeline. `depth` is zero for top-level runs and
    /// grows by one per nested `$call`.
    fn execute(
        &self,
        container: &OruContainer,
        pipeline: &OruPipeline,
        input: Value,
        src_object: &mut Value,
        depth: usize,
    ) -> Result<Value>;
}

/// Name under which the built-in compiler is always registered.
pub const DEFAULT_COMPILER: &str = "default";

/// The built-in line-oriented compiler and its cursor interpreter.
#[derive(Debug, Default)]
pub struct OruDefaultCompiler;

impl OruDefaultCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Classifies one word. Quoted words reach this function with their
    /// quotes intact and stay references; the resolver strips them.
    pub fn get_token_from_word(word: &str) -> OruToken {
        if word.starts_with("//") {
            OruToken::Comment(word.to_string())
        } else if let Some(op) = OruOp::parse(word) {
            OruToken::Op(op)
        } else if let Some(name) = word.strip_prefix('$') {
            OruToken::Call(name.to_string())
        } else {
            OruToken::Reference(word.to_string())
        }
    }

    /// Tokenizes one line: trim, split on spaces, and rejoin quoted runs
    /// with single spaces until a word ends with the opening quote.
    pub fn tokenize_line(line: &str) -> OruInstruction {
        let mut tokens = Vec::new();
        let mut pending: Option<(char, Vec<&str>)> = None;
        for word in line.trim().split(' ') {
            if word.is_empty() {
                continue;
            }
            if let Some((quote, mut words)) = pending.take() {
                words.push(word);
                if word.ends_with(quote) {
                    tokens.push(OruToken::Reference(words.join(" ")));
                } else {
                    pending = Some((quote, words));
                }
                continue;
            }
            let opens_quote = word
                .chars()
                .next()
                .filter(|first| *first == '"' || *first == '\'')
                .filter(|first| !(word.len() > 1 && word.ends_with(*first)));
            if let Some(quote) = opens_quote {
                pending = Some((quote, vec![word]));
            } else {
                tokens.push(Self::get_token_from_word(word));
            }
        }
        if let Some((_, words)) = pending {
            // unterminated quote: keep the run as a single token
            tokens.push(OruToken::Reference(words.join(" ")));
        }
        tokens
    }
}

impl OruCompiler for OruDefaultCompiler {
    fn name(&self) -> &str {
        DEFAULT_COMPILER
    }

    fn compile(&self, lines: &[String]) -> Result<Vec<OruInstruction>> {
        Ok(lines.iter().map(|line| Self::tokenize_line(line)).collect())
    }

    fn execute(
        &self,
        container: &OruContainer,
        pipeline: &OruPipeline,
        input: Value,
        src_object: &mut Value,
        depth: usize,
    ) -> Result<Value> {
        interpreter::execute_compiled(container, &pipeline.compiled, input, src_object, depth)
    }
}
