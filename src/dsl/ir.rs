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

//! # DSL Intermediate Representation
//!
//! The compiled form of a pipeline. Each source line becomes one
//! [`OruInstruction`], a (possibly empty) vector of tokens, and the first
//! token's kind fully determines operand arity and runtime semantics.
//!
//! ```text
//! Pipeline lines
//!       |
//!       v
//!   Compiler (tokenizer)
//!       |
//!       v
//!   Vec<OruInstruction>
//!       |
//!       v
//!   Interpreter (cursor loop)
//! ```

use serde::{Deserialize, Serialize};

/// Built-in operations of the pipeline DSL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OruOp {
    Set,
    Delete,
    Get,
    Inc,
    Dec,
    Eq,
    Neq,
    Gt,
    Ge,
    Lt,
    Le,
    Label,
    Goto,
    Je,
    Jne,
}

impl OruOp {
    /// Parses an op word, or `None` when the word is not an op.
    pub fn parse(word: &str) -> Option<OruOp> {
        match word {
            "set" => Some(OruOp::Set),
            "delete" => Some(OruOp::Delete),
            "get" => Some(OruOp::Get),
            "inc" => Some(OruOp::Inc),
            "dec" => Some(OruOp::Dec),
            "eq" => Some(OruOp::Eq),
            "neq" => Some(OruOp::Neq),
            "gt" => Some(OruOp::Gt),
            "ge" => Some(OruOp::Ge),
            "lt" => Some(OruOp::Lt),
            "le" => Some(OruOp::Le),
            "label" => Some(OruOp::Label),
            "goto" => Some(OruOp::Goto),
            "je" => Some(OruOp::Je),
            "jne" => Some(OruOp::Jne),
            _ => None,
        }
    }

    /// Source keyword of the op.
    pub fn as_str(&self) -> &'static str {
        match self {
            OruOp::Set => "set",
            OruOp::Delete => "delete",
            OruOp::Get => "get",
            OruOp::Inc => "inc",
            OruOp::Dec => "dec",
            OruOp::Eq => "eq",
            OruOp::Neq => "neq",
            OruOp::Gt => "gt",
            OruOp::Ge => "ge",
            OruOp::Lt => "lt",
            OruOp::Le => "le",
            OruOp::Label => "label",
            OruOp::Goto => "goto",
            OruOp::Je => "je",
            OruOp::Jne => "jne",
        }
    }
}

/// One token of a compiled instruction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum OruToken {
    /// A built-in operation.
    Op(OruOp),
    /// A pipeline invocation; the source word was prefixed with `$`.
    Call(String),
    /// A dotted path naming a component method or value. Literal forms are
    /// carried as references and classified at resolve time.
    Reference(String),
    /// A `//` comment; never executed.
    Comment(String),
}

impl OruToken {
    /// Source text of the token, as used for path resolution and labels.
    pub fn source(&self) -> &str {
        match self {
            OruToken::Op(op) => op.as_str(),
            OruToken::Call(name) => name,
            OruToken::Reference(text) => text,
            OruToken::Comment(text) => text,
        }
    }
}

/// One compiled source line. Empty lines compile to empty vectors, which the
/// interpreter treats as no-ops.
pub type OruInstruction = Vec<OruToken>;
