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
use thiserror::Error;

/// Convenience result type used throughout Oru.
pub type Result<T> = std::result::Result<T, OruError>;

/// Canonical error enumeration for Oru.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum OruError {
    /// A pipeline invocation recursed past the configured depth limit.
    #[error("pipeline depth exceeded at depth {0}")]
    PipelineDepthExceeded(usize),

    /// Strict and wildcard pipeline lookup both failed.
    #[error("pipeline '{0}' not found")]
    PipelineNotFound(String),

    /// An intermediate token of a dotted path did not resolve.
    #[error("path not found: '{0}'")]
    PathNotFound(String),

    /// A reference resolved to nothing and was invoked.
    #[error("method not found for '{0}'")]
    MethodNotFound(String),

    /// A compiler was requested by name but is not registered.
    #[error("compiler '{0}' not found")]
    CompilerNotFound(String),

    /// Validation errors triggered by invalid parameters or inputs.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Any failure raised by a registered component.
    #[error("component '{component}' failed: {message}")]
    Component { component: String, message: String },

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl OruError {
    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        OruError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct component errors.
    pub fn component(name: impl Into<String>, message: impl Into<String>) -> Self {
        OruError::Component {
            component: name.into(),
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        OruError::Internal(message.into())
    }
}
