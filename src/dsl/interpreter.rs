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

//! # Interpreter
//!
//! Executes compiled instruction vectors with a program counter. Labels are
//! collected in a prescan, so forward jumps work; `goto`/`je`/`jne` set the
//! cursor onto the label instruction and rely on the loop's increment to
//! land on the one after it. The ambient `input` value is replaced by every
//! instruction that produces a result.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::component::invoke_component;
use crate::container::OruContainer;
use crate::dsl::compiler::OruDefaultCompiler;
use crate::dsl::ir::{OruInstruction, OruOp, OruToken};
use crate::errors::{OruError, Result};
use crate::path::{self, OruResolved, FLOATING_KEY};

/// Per-invocation execution state. Created fresh for every pipeline run;
/// the `vars` object is the `context` root of path resolution.
#[derive(Debug)]
pub struct OruExecutionContext {
    pub cursor: usize,
    pub labels: IndexMap<String, usize>,
    pub vars: Value,
}

impl OruExecutionContext {
    pub fn new() -> Self {
        Self {
            cursor: 0,
            labels: IndexMap::new(),
            vars: Value::Object(Map::new()),
        }
    }

    fn floating_truthy(&self) -> bool {
        self.vars
            .get(FLOATING_KEY)
            .map(path::is_truthy)
            .unwrap_or(false)
    }
}

impl Default for OruExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Records `labels[name] = index` for every `label` instruction.
pub fn find_labels(compiled: &[OruInstruction], context: &mut OruExecutionContext) {
    for (index, instruction) in compiled.iter().enumerate() {
        if let (Some(OruToken::Op(OruOp::Label)), Some(name)) =
            (instruction.first(), instruction.get(1))
        {
            context.labels.insert(name.source().to_string(), index);
        }
    }
}

/// Sets the cursor onto the instruction holding `label`.
pub fn do_goto(context: &mut OruExecutionContext, label: &str) -> Result<()> {
    let index = context.labels.get(label).copied().ok_or_else(|| {
        OruError::validation(format!("jump to undefined label '{label}'"))
    })?;
    context.cursor = index;
    Ok(())
}

/// Runs a compiled program to completion and returns the final input value.
pub fn execute_compiled(
    container: &OruContainer,
    compiled: &[OruInstruction],
    input: Value,
    src_object: &mut Value,
    depth: usize,
) -> Result<Value> {
    let mut context = OruExecutionContext::new();
    find_labels(compiled, &mut context);
    let mut input = input;
    while context.cursor < compiled.len() {
        let instruction = &compiled[context.cursor];
        if let Some(output) = execute_instruction(
            container,
            instruction,
            &mut context,
            &mut input,
            src_object,
            depth,
        )? {
            input = output;
        }
        context.cursor += 1;
    }
    Ok(input)
}

/// Executes one instruction. Returns the value that becomes the new ambient
/// input, or `None` when the instruction leaves it untouched.
pub fn execute_instruction(
    container: &OruContainer,
    instruction: &OruInstruction,
    context: &mut OruExecutionContext,
    input: &mut Value,
    src_object: &mut Value,
    depth: usize,
) -> Result<Option<Value>> {
    let Some(first) = instruction.first() else {
        return Ok(None);
    };
    // `->` marks a top-level-only instruction: skipped when running as a
    // callee, stripped and executed otherwise.
    if let OruToken::Reference(text) = first {
        if let Some(stripped) = text.strip_prefix("->") {
            if depth > 0 {
                return Ok(None);
            }
            let mut rewritten: OruInstruction = Vec::with_capacity(instruction.len());
            if !stripped.is_empty() {
                rewritten.push(OruDefaultCompiler::get_token_from_word(stripped));
            }
            rewritten.extend_from_slice(&instruction[1..]);
            return execute_instruction(
                container, &rewritten, context, input, src_object, depth,
            );
        }
    }
    match first {
        OruToken::Comment(_) => Ok(None),
        OruToken::Op(op) => {
            execute_action(container, *op, &instruction[1..], context, input, src_object)
        }
        OruToken::Call(name) => execute_call(container, name, input, src_object, depth),
        OruToken::Reference(text) => {
            execute_reference(container, text, &instruction[1..], context, input, src_object)
        }
    }
}

/// Dispatches a `$name` token: resolves the pipeline and runs it one level
/// deeper; its return value becomes the new ambient input.
pub fn execute_call(
    container: &OruContainer,
    name: &str,
    input: &Value,
    src_object: &mut Value,
    depth: usize,
) -> Result<Option<Value>> {
    let pipeline = container
        .get_pipeline(name)
        .ok_or_else(|| OruError::PipelineNotFound(name.to_string()))?;
    let result = container.run_pipeline_at_depth(&pipeline, input.clone(), src_object, depth + 1)?;
    Ok(Some(result))
}

/// Dispatches a reference token: component methods are invoked with the
/// resolved argument tokens, bare components run their `run` method when
/// they have one, and plain values pass through. A reference that resolves
/// to nothing is an error.
pub fn execute_reference(
    container: &OruContainer,
    text: &str,
    arg_tokens: &[OruToken],
    context: &mut OruExecutionContext,
    input: &mut Value,
    src_object: &mut Value,
) -> Result<Option<Value>> {
    let resolved =
        path::resolve_path_with_type(container, text, &context.vars, input, src_object)?;
    let args = arg_tokens
        .iter()
        .filter(|token| !matches!(token, OruToken::Comment(_)))
        .map(|token| {
            path::resolve_path_with_type(container, token.source(), &context.vars, input, src_object)
        })
        .collect::<Result<Vec<OruResolved>>>()?;
    match resolved {
        OruResolved::Method {
            component, method, ..
        } => Ok(Some(invoke_component(
            component.as_ref(),
            container,
            &method,
            input,
            &args,
        )?)),
        OruResolved::Component { component, .. } => {
            if component.has_method("run") {
                Ok(Some(invoke_component(
                    component.as_ref(),
                    container,
                    "run",
                    input,
                    &args,
                )?))
            } else {
                Ok(Some(component.to_json()))
            }
        }
        OruResolved::Literal { value, .. } => Ok(Some(value)),
        OruResolved::Reference {
            value: Some(value), ..
        } => Ok(Some(value)),
        OruResolved::Reference { value: None, .. } => {
            Err(OruError::MethodNotFound(text.to_string()))
        }
    }
}

/// Executes a built-in op with its operand tokens.
pub fn execute_action(
    container: &OruContainer,
    op: OruOp,
    operands: &[OruToken],
    context: &mut OruExecutionContext,
    input: &mut Value,
    src_object: &mut Value,
) -> Result<Option<Value>> {
    let operand = |index: usize| -> Result<&str> {
        operands
            .get(index)
            .map(OruToken::source)
            .ok_or_else(|| {
                OruError::validation(format!(
                    "'{}' requires {} operand(s)",
                    op.as_str(),
                    index + 1
                ))
            })
    };
    match op {
        OruOp::Set => {
            let target = operand(0)?;
            let value =
                path::resolve_path(container, operand(1)?, &context.vars, input, src_object)?;
            path::set_value(target, &mut context.vars, input, src_object, value)?;
            Ok(None)
        }
        OruOp::Delete => {
            path::delete_value(operand(0)?, &mut context.vars, input, src_object)?;
            Ok(None)
        }
        OruOp::Get => {
            let step = operands.first().map(OruToken::source);
            let value = path::get_value(container, step, &context.vars, input, src_object)?;
            Ok(Some(value))
        }
        OruOp::Inc => {
            let amount = operands.get(1).map(OruToken::source).unwrap_or("1");
            path::inc_value(
                container,
                operand(0)?,
                amount,
                &mut context.vars,
                input,
                src_object,
            )?;
            Ok(None)
        }
        OruOp::Dec => {
            let amount = operands.get(1).map(OruToken::source).unwrap_or("1");
            path::dec_value(
                container,
                operand(0)?,
                amount,
                &mut context.vars,
                input,
                src_object,
            )?;
            Ok(None)
        }
        OruOp::Eq | OruOp::Neq | OruOp::Gt | OruOp::Ge | OruOp::Lt | OruOp::Le => {
            let path_a = operand(0)?;
            let path_b = operand(1)?;
            let compare: fn(
                &OruContainer,
                &str,
                &str,
                &mut Value,
                &Value,
                &Value,
            ) -> Result<bool> = match op {
                OruOp::Eq => path::eq_value,
                OruOp::Neq => path::neq_value,
                OruOp::Gt => path::gt_value,
                OruOp::Ge => path::ge_value,
                OruOp::Lt => path::lt_value,
                _ => path::le_value,
            };
            compare(container, path_a, path_b, &mut context.vars, input, src_object)?;
            Ok(None)
        }
        OruOp::Label => Ok(None),
        OruOp::Goto => {
            do_goto(context, operand(0)?)?;
            Ok(None)
        }
        OruOp::Je => {
            if context.floating_truthy() {
                do_goto(context, operand(0)?)?;
            }
            Ok(None)
        }
        OruOp::Jne => {
            if !context.floating_truthy() {
                do_goto(context, operand(0)?)?;
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::compiler::OruCompiler;
    use serde_json::json;

    fn compile(lines: &[&str]) -> Vec<OruInstruction> {
        let compiler = OruDefaultCompiler::new();
        let lines: Vec<String> = lines.iter().map(|line| line.to_string()).collect();
        compiler.compile(&lines).unwrap()
    }

    #[test]
    fn prescan_collects_labels() {
        let compiled = compile(&["set input.x 1", "label loop", "label done"]);
        let mut context = OruExecutionContext::new();
        find_labels(&compiled, &mut context);
        assert_eq!(context.labels.get("loop"), Some(&1));
        assert_eq!(context.labels.get("done"), Some(&2));
    }

    #[test]
    fn goto_to_undefined_label_fails() {
        let mut context = OruExecutionContext::new();
        let err = do_goto(&mut context, "nowhere").unwrap_err();
        assert!(matches!(err, OruError::Validation { .. }));
    }

    #[test]
    fn arrow_prefix_runs_at_top_level_only() {
        let container = OruContainer::new();
        let compiled = compile(&["-> set input.debug true", "get input"]);
        let mut src = json!({});
        let top = execute_compiled(&container, &compiled, json!({}), &mut src, 0).unwrap();
        assert_eq!(top, json!({"debug": true}));
        let mut src = json!({});
        let nested = execute_compiled(&container, &compiled, json!({}), &mut src, 1).unwrap();
        assert_eq!(nested, json!({}));
    }

    #[test]
    fn arrow_prefix_sticks_to_the_first_word() {
        let container = OruContainer::new();
        let compiled = compile(&["->set input.debug true", "get input"]);
        let mut src = json!({});
        let top = execute_compiled(&container, &compiled, json!({}), &mut src, 0).unwrap();
        assert_eq!(top, json!({"debug": true}));
    }

    #[test]
    fn comparison_feeds_conditional_jump() {
        let container = OruContainer::new();
        let compiled = compile(&[
            "set input.x 5",
            "eq input.x 5",
            "jne skip",
            "set input.hit true",
            "label skip",
            "get input",
        ]);
        let mut src = json!({});
        let result = execute_compiled(&container, &compiled, json!({}), &mut src, 0).unwrap();
        assert_eq!(result, json!({"x": 5, "hit": true}));
    }

    #[test]
    fn get_without_operand_reads_floating() {
        let container = OruContainer::new();
        let compiled = compile(&["set input.x 5", "lt input.x 3", "get"]);
        let mut src = json!({});
        let result = execute_compiled(&container, &compiled, json!({}), &mut src, 0).unwrap();
        assert_eq!(result, json!(false));
    }
}
