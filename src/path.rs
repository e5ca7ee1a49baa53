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

//! # Path Resolver
//!
//! Dotted paths are the addressing scheme of the pipeline DSL. A step like
//! `input.count` or `greeter.hello` is resolved against four roots:
//!
//! - `input` / `output`: the value flowing through the pipeline
//! - `this`: the caller-supplied source object
//! - `context`: the per-invocation scratch object (holds `floating`)
//! - any other head: the container registry, falling back to `context[head]`
//!
//! Literal forms (`3`, `1.5`, `"text"`, `'text'`, `true`, `false`) short
//! circuit resolution and keep their kind, so component methods can tell a
//! quoted argument from a walked reference.

use std::cmp::Ordering;
use std::sync::Arc;

use serde_json::Value;

use crate::component::{OruComponent, OruInstance};
use crate::container::OruContainer;
use crate::errors::{OruError, Result};

/// Context key written by comparison operations and read by `je`/`jne`.
pub const FLOATING_KEY: &str = "floating";

/// Literal subtypes recognized by [`build_literal`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OruLiteralKind {
    Number,
    String,
    Boolean,
}

/// Typed result of a path resolution.
#[derive(Clone, Debug)]
pub enum OruResolved {
    /// A literal form; resolution stops and remaining tokens are ignored.
    Literal {
        kind: OruLiteralKind,
        src: String,
        value: Value,
    },
    /// A walked value. `None` means the walk broke at the final token,
    /// which is permitted and yields "absent".
    Reference { src: String, value: Option<Value> },
    /// A component method, bound to its owning component.
    Method {
        src: String,
        component: Arc<dyn OruComponent>,
        method: String,
    },
    /// A bare registered component.
    Component {
        src: String,
        component: Arc<dyn OruComponent>,
    },
}

impl OruResolved {
    /// Source text the resolution started from.
    pub fn src(&self) -> &str {
        match self {
            OruResolved::Literal { src, .. }
            | OruResolved::Reference { src, .. }
            | OruResolved::Method { src, .. }
            | OruResolved::Component { src, .. } => src,
        }
    }

    /// Projects the resolution to a plain value. Absent references become
    /// null; bare components project to their JSON form; methods carry no
    /// value of their own.
    pub fn value(&self) -> Value {
        match self {
            OruResolved::Literal { value, .. } => value.clone(),
            OruResolved::Reference { value, .. } => value.clone().unwrap_or(Value::Null),
            OruResolved::Component { component, .. } => component.to_json(),
            OruResolved::Method { .. } => Value::Null,
        }
    }
}

/// Classifies a step as a literal form, if it is one. Numbers prefer the
/// integer representation and fall back to finite doubles; quoted strings
/// lose their outer quotes but keep inner spacing.
pub fn build_literal(step: &str) -> Option<OruResolved> {
    let trimmed = step.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(number) = trimmed.parse::<i64>() {
        return Some(OruResolved::Literal {
            kind: OruLiteralKind::Number,
            src: trimmed.to_string(),
            value: Value::from(number),
        });
    }
    if let Ok(number) = trimmed.parse::<f64>() {
        if number.is_finite() {
            return Some(OruResolved::Literal {
                kind: OruLiteralKind::Number,
                src: trimmed.to_string(),
                value: Value::from(number),
            });
        }
    }
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return Some(OruResolved::Literal {
                kind: OruLiteralKind::String,
                src: trimmed.to_string(),
                value: Value::String(trimmed[1..trimmed.len() - 1].to_string()),
            });
        }
    }
    if trimmed == "true" || trimmed == "false" {
        return Some(OruResolved::Literal {
            kind: OruLiteralKind::Boolean,
            src: trimmed.to_string(),
            value: Value::Bool(trimmed == "true"),
        });
    }
    None
}

/// Resolves a dotted step to a typed result.
pub fn resolve_path_with_type(
    container: &OruContainer,
    step: &str,
    context: &Value,
    input: &Value,
    src_object: &Value,
) -> Result<OruResolved> {
    let trimmed = step.trim();
    if let Some(literal) = build_literal(trimmed) {
        return Ok(literal);
    }
    let tokens: Vec<&str> = trimmed.split('.').map(str::trim).collect();
    let head = match tokens.first() {
        Some(&"") | None => {
            if trimmed.starts_with('.') {
                "this"
            } else {
                "context"
            }
        }
        Some(token) => *token,
    };
    let rest = &tokens[1..];
    match head {
        "input" | "output" => walk_value(trimmed, input, rest),
        "this" => walk_value(trimmed, src_object, rest),
        "context" => walk_value(trimmed, context, rest),
        _ => {
            if let Some(instance) = container.get(head) {
                match instance {
                    OruInstance::Component(component) => {
                        resolve_component(trimmed, component, rest)
                    }
                    OruInstance::Value(value) => walk_value(trimmed, &value, rest),
                }
            } else {
                walk_value(trimmed, context, &tokens)
            }
        }
    }
}

/// [`resolve_path_with_type`] projected to its value.
pub fn resolve_path(
    container: &OruContainer,
    step: &str,
    context: &Value,
    input: &Value,
    src_object: &Value,
) -> Result<Value> {
    Ok(resolve_path_with_type(container, step, context, input, src_object)?.value())
}

/// Reads a path, defaulting to the `floating` comparison slot.
pub fn get_value(
    container: &OruContainer,
    path: Option<&str>,
    context: &Value,
    input: &Value,
    src_object: &Value,
) -> Result<Value> {
    resolve_path(
        container,
        path.unwrap_or(FLOATING_KEY),
        context,
        input,
        src_object,
    )
}

fn resolve_component(
    step: &str,
    component: Arc<dyn OruComponent>,
    rest: &[&str],
) -> Result<OruResolved> {
    if rest.is_empty() {
        return Ok(OruResolved::Component {
            src: step.to_string(),
            component,
        });
    }
    if rest.len() == 1 && component.has_method(rest[0]) {
        return Ok(OruResolved::Method {
            src: step.to_string(),
            method: rest[0].to_string(),
            component,
        });
    }
    match component.field(rest[0]) {
        Some(value) => walk_value(step, &value, &rest[1..]),
        None if rest.len() == 1 => Ok(OruResolved::Reference {
            src: step.to_string(),
            value: None,
        }),
        None => Err(OruError::PathNotFound(step.to_string())),
    }
}

fn walk_value(step: &str, root: &Value, tokens: &[&str]) -> Result<OruResolved> {
    let mut current = Some(root);
    for (index, token) in tokens.iter().enumerate() {
        let next = current.and_then(|value| member(value, token));
        if next.is_none() && index + 1 < tokens.len() {
            return Err(OruError::PathNotFound(step.to_string()));
        }
        current = next;
    }
    Ok(OruResolved::Reference {
        src: step.to_string(),
        value: current.cloned(),
    })
}

fn member<'a>(value: &'a Value, token: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(token),
        Value::Array(items) => token.parse::<usize>().ok().and_then(|idx| items.get(idx)),
        _ => None,
    }
}

/// Resolves everything but the last token mutably and hands back the parent
/// together with the leaf key. Write roots are `input`/`output`, `this` and
/// the context; single-token paths assign into the context.
fn resolve_parent_mut<'a>(
    step: &str,
    context: &'a mut Value,
    input: &'a mut Value,
    src_object: &'a mut Value,
) -> Result<(&'a mut Value, String)> {
    let trimmed = step.trim();
    let mut tokens: Vec<&str> = trimmed.split('.').map(str::trim).collect();
    let leaf = match tokens.pop() {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => {
            return Err(OruError::validation(format!(
                "cannot assign through empty path '{step}'"
            )))
        }
    };
    let (root, walk): (&'a mut Value, &[&str]) = if tokens.is_empty() {
        (context, &[])
    } else {
        let head = if tokens[0].is_empty() {
            if trimmed.starts_with('.') {
                "this"
            } else {
                "context"
            }
        } else {
            tokens[0]
        };
        match head {
            "input" | "output" => (input, &tokens[1..]),
            "this" => (src_object, &tokens[1..]),
            "context" => (context, &tokens[1..]),
            _ => (context, &tokens[..]),
        }
    };
    let mut current = root;
    for token in walk {
        current = match current {
            Value::Object(map) => map.get_mut(*token),
            Value::Array(items) => token.parse::<usize>().ok().and_then(|idx| items.get_mut(idx)),
            _ => None,
        }
        .ok_or_else(|| OruError::PathNotFound(step.to_string()))?;
    }
    Ok((current, leaf))
}

fn assign_member(step: &str, parent: &mut Value, leaf: &str, value: Value) -> Result<()> {
    match parent {
        Value::Object(map) => {
            map.insert(leaf.to_string(), value);
            Ok(())
        }
        Value::Array(items) => match leaf.parse::<usize>() {
            Ok(idx) if idx < items.len() => {
                items[idx] = value;
                Ok(())
            }
            Ok(idx) if idx == items.len() => {
                items.push(value);
                Ok(())
            }
            _ => Err(OruError::PathNotFound(step.to_string())),
        },
        _ => Err(OruError::PathNotFound(step.to_string())),
    }
}

/// Assigns `value` at `step`.
pub fn set_value(
    step: &str,
    context: &mut Value,
    input: &mut Value,
    src_object: &mut Value,
    value: Value,
) -> Result<()> {
    let (parent, leaf) = resolve_parent_mut(step, context, input, src_object)?;
    assign_member(step, parent, &leaf, value)
}

/// Removes the leaf at `step`. Deleting an absent member is a no-op.
pub fn delete_value(
    step: &str,
    context: &mut Value,
    input: &mut Value,
    src_object: &mut Value,
) -> Result<()> {
    let (parent, leaf) = resolve_parent_mut(step, context, input, src_object)?;
    match parent {
        Value::Object(map) => {
            map.remove(&leaf);
        }
        Value::Array(items) => {
            if let Ok(idx) = leaf.parse::<usize>() {
                if idx < items.len() {
                    items.remove(idx);
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Increments the value at `step` by the resolution of `amount_path`.
/// Absent targets count from zero; integer representation is kept when both
/// operands are integers.
pub fn inc_value(
    container: &OruContainer,
    step: &str,
    amount_path: &str,
    context: &mut Value,
    input: &mut Value,
    src_object: &mut Value,
) -> Result<()> {
    let amount = resolve_path(container, amount_path, context, input, src_object)?;
    apply_numeric(step, &amount, 1, context, input, src_object)
}

/// Decrements the value at `step` by the resolution of `amount_path`.
pub fn dec_value(
    container: &OruContainer,
    step: &str,
    amount_path: &str,
    context: &mut Value,
    input: &mut Value,
    src_object: &mut Value,
) -> Result<()> {
    let amount = resolve_path(container, amount_path, context, input, src_object)?;
    apply_numeric(step, &amount, -1, context, input, src_object)
}

fn apply_numeric(
    step: &str,
    amount: &Value,
    sign: i64,
    context: &mut Value,
    input: &mut Value,
    src_object: &mut Value,
) -> Result<()> {
    let (parent, leaf) = resolve_parent_mut(step, context, input, src_object)?;
    let current = member(parent, &leaf).cloned().unwrap_or(Value::Null);
    let next = numeric_add(step, &current, amount, sign)?;
    assign_member(step, parent, &leaf, next)
}

fn numeric_parts(step: &str, value: &Value) -> Result<(Option<i64>, f64)> {
    match value {
        Value::Null => Ok((Some(0), 0.0)),
        Value::Number(number) => Ok((
            number.as_i64(),
            number.as_f64().unwrap_or(f64::NAN),
        )),
        other => Err(OruError::validation(format!(
            "cannot apply arithmetic to {other} at '{step}'"
        ))),
    }
}

fn numeric_add(step: &str, current: &Value, amount: &Value, sign: i64) -> Result<Value> {
    let (current_int, current_float) = numeric_parts(step, current)?;
    let (amount_int, amount_float) = numeric_parts(step, amount)?;
    if let (Some(a), Some(b)) = (current_int, amount_int) {
        if let Some(sum) = b.checked_mul(sign).and_then(|delta| a.checked_add(delta)) {
            return Ok(Value::from(sum));
        }
    }
    Ok(Value::from(current_float + sign as f64 * amount_float))
}

/// Structural equality with numeric comparison on number pairs, so `3` and
/// `3.0` are equal. Mismatched kinds are never equal.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(p), Some(q)) => p == q,
            _ => x == y,
        },
        _ => a == b,
    }
}

fn values_ordering(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Truthiness used by conditional jumps: null, `false`, zero, NaN and the
/// empty string are falsy; everything else is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number
            .as_f64()
            .map(|float| float != 0.0 && !float.is_nan())
            .unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn write_floating(context: &mut Value, result: bool) {
    if let Value::Object(map) = context {
        map.insert(FLOATING_KEY.to_string(), Value::Bool(result));
    }
}

macro_rules! comparison {
    ($(#[$doc:meta])* $name:ident, $test:expr) => {
        $(#[$doc])*
        pub fn $name(
            container: &OruContainer,
            path_a: &str,
            path_b: &str,
            context: &mut Value,
            input: &Value,
            src_object: &Value,
        ) -> Result<bool> {
            let a = resolve_path(container, path_a, context, input, src_object)?;
            let b = resolve_path(container, path_b, context, input, src_object)?;
            let test: fn(&Value, &Value) -> bool = $test;
            let result = test(&a, &b);
            write_floating(context, result);
            Ok(result)
        }
    };
}

comparison!(
    /// Writes `a == b` into `context.floating`.
    eq_value,
    |a, b| values_equal(a, b)
);
comparison!(
    /// Writes `a != b` into `context.floating`.
    neq_value,
    |a, b| !values_equal(a, b)
);
comparison!(
    /// Writes `a > b` into `context.floating`. Ordering exists on number
    /// pairs and string pairs only; mismatched kinds compare false.
    gt_value,
    |a, b| values_ordering(a, b) == Some(Ordering::Greater)
);
comparison!(
    /// Writes `a >= b` into `context.floating`.
    ge_value,
    |a, b| matches!(
        values_ordering(a, b),
        Some(Ordering::Greater) | Some(Ordering::Equal)
    )
);
comparison!(
    /// Writes `a < b` into `context.floating`.
    lt_value,
    |a, b| values_ordering(a, b) == Some(Ordering::Less)
);
comparison!(
    /// Writes `a <= b` into `context.floating`.
    le_value,
    |a, b| matches!(
        values_ordering(a, b),
        Some(Ordering::Less) | Some(Ordering::Equal)
    )
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn empty() -> (Value, Value, Value) {
        (json!({}), json!({}), json!({}))
    }

    #[test]
    fn literals_keep_their_kind() {
        match build_literal("42") {
            Some(OruResolved::Literal { kind, value, .. }) => {
                assert_eq!(kind, OruLiteralKind::Number);
                assert_eq!(value, json!(42));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
        match build_literal("2.5") {
            Some(OruResolved::Literal { value, .. }) => assert_eq!(value, json!(2.5)),
            other => panic!("unexpected resolution: {other:?}"),
        }
        match build_literal("\"Ada Lovelace\"") {
            Some(OruResolved::Literal { kind, value, .. }) => {
                assert_eq!(kind, OruLiteralKind::String);
                assert_eq!(value, json!("Ada Lovelace"));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
        match build_literal("false") {
            Some(OruResolved::Literal { kind, value, .. }) => {
                assert_eq!(kind, OruLiteralKind::Boolean);
                assert_eq!(value, json!(false));
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
        assert!(build_literal("input.count").is_none());
    }

    #[test]
    fn resolves_against_roots() {
        let container = OruContainer::new();
        let context = json!({"flag": true});
        let input = json!({"count": 3});
        let this = json!({"kind": "test"});

        let count = resolve_path(&container, "input.count", &context, &input, &this).unwrap();
        assert_eq!(count, json!(3));
        let flag = resolve_path(&container, "context.flag", &context, &input, &this).unwrap();
        assert_eq!(flag, json!(true));
        let kind = resolve_path(&container, "this.kind", &context, &input, &this).unwrap();
        assert_eq!(kind, json!("test"));
        // a leading dot roots at `this`
        let kind = resolve_path(&container, ".kind", &context, &input, &this).unwrap();
        assert_eq!(kind, json!("test"));
        // unregistered heads fall back to the context
        let flag = resolve_path(&container, "flag", &context, &input, &this).unwrap();
        assert_eq!(flag, json!(true));
    }

    #[test]
    fn broken_chain_before_final_token_fails() {
        let container = OruContainer::new();
        let (context, input, this) = empty();
        let err =
            resolve_path(&container, "input.a.b", &context, &input, &this).unwrap_err();
        assert!(matches!(err, OruError::PathNotFound(_)));
    }

    #[test]
    fn absent_final_token_is_permitted() {
        let container = OruContainer::new();
        let (context, input, this) = empty();
        match resolve_path_with_type(&container, "input.missing", &context, &input, &this) {
            Ok(OruResolved::Reference { value, .. }) => assert!(value.is_none()),
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn array_members_are_addressable_by_index() {
        let container = OruContainer::new();
        let context = json!({});
        let input = json!({"items": ["a", "b"]});
        let this = json!({});
        let item = resolve_path(&container, "input.items.1", &context, &input, &this).unwrap();
        assert_eq!(item, json!("b"));
    }

    #[test]
    fn single_token_writes_target_the_context() {
        let (mut context, mut input, mut this) = empty();
        set_value("x", &mut context, &mut input, &mut this, json!(5)).unwrap();
        assert_eq!(context, json!({"x": 5}));
        assert_eq!(input, json!({}));
    }

    #[test]
    fn set_and_delete_on_input() {
        let (mut context, mut input, mut this) = empty();
        set_value("input.name", &mut context, &mut input, &mut this, json!("ada")).unwrap();
        assert_eq!(input, json!({"name": "ada"}));
        delete_value("input.name", &mut context, &mut input, &mut this).unwrap();
        assert_eq!(input, json!({}));
        // deleting an absent leaf stays a no-op
        delete_value("input.name", &mut context, &mut input, &mut this).unwrap();
    }

    #[test]
    fn inc_counts_from_zero_and_keeps_integers() {
        let container = OruContainer::new();
        let (mut context, mut input, mut this) = empty();
        inc_value(&container, "input.count", "1", &mut context, &mut input, &mut this).unwrap();
        inc_value(&container, "input.count", "2", &mut context, &mut input, &mut this).unwrap();
        assert_eq!(input, json!({"count": 3}));
        dec_value(&container, "input.count", "1", &mut context, &mut input, &mut this).unwrap();
        assert_eq!(input, json!({"count": 2}));
    }

    #[test]
    fn inc_falls_back_to_floats() {
        let container = OruContainer::new();
        let (mut context, mut input, mut this) = empty();
        inc_value(&container, "input.score", "0.5", &mut context, &mut input, &mut this)
            .unwrap();
        assert_eq!(input, json!({"score": 0.5}));
    }

    #[test]
    fn comparison_table_is_frozen() {
        assert!(values_equal(&json!(3), &json!(3.0)));
        assert!(!values_equal(&json!(3), &json!("3")));
        assert_eq!(values_ordering(&json!(2), &json!(3)), Some(Ordering::Less));
        assert_eq!(
            values_ordering(&json!("abc"), &json!("abd")),
            Some(Ordering::Less)
        );
        assert_eq!(values_ordering(&json!(2), &json!("3")), None);
    }

    #[test]
    fn comparisons_write_floating() {
        let container = OruContainer::new();
        let mut context = json!({});
        let input = json!({"x": 5});
        let this = json!({});
        assert!(eq_value(&container, "input.x", "5", &mut context, &input, &this).unwrap());
        assert_eq!(context["floating"], json!(true));
        assert!(!lt_value(&container, "input.x", "5", &mut context, &input, &this).unwrap());
        assert_eq!(context["floating"], json!(false));
    }

    #[test]
    fn get_value_defaults_to_floating() {
        let container = OruContainer::new();
        let context = json!({"floating": true});
        let (_, input, this) = empty();
        let value = get_value(&container, None, &context, &input, &this).unwrap();
        assert_eq!(value, json!(true));
    }

    #[test]
    fn truthiness_matches_the_dsl() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!([])));
    }
}
