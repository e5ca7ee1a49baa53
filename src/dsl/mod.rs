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

//! # DSL Module
//!
//! The pipeline DSL of Oru: a line-oriented language whose programs compile
//! to instruction vectors and execute against a context, an ambient input
//! value, and the components of the owning container.
//!
//! - **IR** ([`ir`]): tokens and the compiled instruction form
//! - **Compiler** ([`compiler`]): the tokenizer and the plug-in trait
//! - **Interpreter** ([`interpreter`]): the cursor loop and instruction
//!   semantics

pub mod compiler;
pub mod interpreter;
pub mod ir;

pub use compiler::{OruCompiler, OruDefaultCompiler, DEFAULT_COMPILER};
pub use interpreter::OruExecutionContext;
pub use ir::{OruInstruction, OruOp, OruToken};
