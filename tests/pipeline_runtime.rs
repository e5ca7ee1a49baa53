//! Copyright © 2025-2026 Wenze Wei. All Rights Reserved.
//!
//! This file is part of Oru.
//! The Oru project belongs to the Dunimd project team.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

use std::sync::Arc;

use serde_json::{json, Value};

use oru::{
    OruCompiler, OruComponent, OruContainer, OruDefaultCompiler, OruError, OruInstruction,
    OruLiteralKind, OruPipeline, OruResolved,
};

#[derive(Debug)]
struct Greeter;

impl OruComponent for Greeter {
    fn name(&self) -> &str {
        "greeter"
    }

    fn has_method(&self, method: &str) -> bool {
        method == "hello"
    }

    fn invoke(
        &self,
        _container: &OruContainer,
        method: &str,
        _input: &Value,
        args: &[OruResolved],
    ) -> oru::Result<Value> {
        match method {
            "hello" => {
                let who = args
                    .first()
                    .map(OruResolved::value)
                    .unwrap_or(Value::Null);
                let who = who.as_str().unwrap_or_default().to_string();
                Ok(Value::String(format!("hi {who}")))
            }
            other => Err(OruError::MethodNotFound(format!("greeter.{other}"))),
        }
    }
}

#[derive(Debug)]
struct Doubler;

impl OruComponent for Doubler {
    fn name(&self) -> &str {
        "doubler"
    }

    fn has_method(&self, method: &str) -> bool {
        method == "run"
    }

    fn invoke(
        &self,
        _container: &OruContainer,
        _method: &str,
        input: &Value,
        _args: &[OruResolved],
    ) -> oru::Result<Value> {
        let doubled = input.as_f64().unwrap_or_default() * 2.0;
        Ok(json!(doubled))
    }
}

#[test]
fn counter_loop_counts_to_three() {
    let container = OruContainer::new();
    container
        .register_pipeline(
            "counter",
            "set input.count 0\n\
             label loop\n\
             inc input.count\n\
             lt input.count 3\n\
             je loop\n\
             get input",
            true,
        )
        .unwrap();

    let result = container.run_pipeline("counter", json!({})).unwrap();
    assert_eq!(result, json!({"count": 3}));
}

#[test]
fn quoted_literals_strip_quotes_and_keep_spaces() {
    let container = OruContainer::new();
    container
        .register_pipeline(
            "name",
            "set input.name \"Ada Lovelace\"\nget input.name",
            true,
        )
        .unwrap();

    let result = container.run_pipeline("name", json!({})).unwrap();
    assert_eq!(result, json!("Ada Lovelace"));
}

#[test]
fn references_invoke_component_methods() {
    let container = OruContainer::new();
    container.register("greeter", Arc::new(Greeter));
    container
        .register_pipeline("greet", "greeter.hello \"world\"", true)
        .unwrap();

    let result = container.run_pipeline("greet", json!({})).unwrap();
    assert_eq!(result, json!("hi world"));
}

#[test]
fn reference_arguments_keep_their_literal_kind() {
    #[derive(Debug)]
    struct KindProbe;

    impl OruComponent for KindProbe {
        fn name(&self) -> &str {
            "kinds"
        }

        fn has_method(&self, method: &str) -> bool {
            method == "classify"
        }

        fn invoke(
            &self,
            _container: &OruContainer,
            _method: &str,
            _input: &Value,
            args: &[OruResolved],
        ) -> oru::Result<Value> {
            let kinds: Vec<&str> = args
                .iter()
                .map(|arg| match arg {
                    OruResolved::Literal { kind, .. } => match kind {
                        OruLiteralKind::Number => "number",
                        OruLiteralKind::String => "string",
                        OruLiteralKind::Boolean => "boolean",
                    },
                    OruResolved::Reference { .. } => "reference",
                    OruResolved::Method { .. } => "method",
                    OruResolved::Component { .. } => "component",
                })
                .collect();
            Ok(json!(kinds))
        }
    }

    let container = OruContainer::new();
    container.register("kinds", Arc::new(KindProbe));
    container
        .register_pipeline("classify", "kinds.classify 42 \"txt\" true input.x", true)
        .unwrap();

    let result = container.run_pipeline("classify", json!({"x": 1})).unwrap();
    assert_eq!(result, json!(["number", "string", "boolean", "reference"]));
}

#[test]
fn bare_component_references_run_their_run_method() {
    let container = OruContainer::new();
    container.register("doubler", Arc::new(Doubler));
    container
        .register_pipeline("double", "get input.v\ndoubler", true)
        .unwrap();

    let result = container.run_pipeline("double", json!({"v": 21})).unwrap();
    assert_eq!(result, json!(42.0));
}

#[test]
fn conditional_jump_takes_and_skips() {
    let container = OruContainer::new();
    let source = "set input.x 5\n\
                  eq input.x 5\n\
                  jne skip\n\
                  set input.hit true\n\
                  label skip\n\
                  get input";
    container.register_pipeline("cond", source, true).unwrap();
    let result = container.run_pipeline("cond", json!({})).unwrap();
    assert_eq!(result, json!({"x": 5, "hit": true}));

    let container = OruContainer::new();
    container
        .register_pipeline("cond", &source.replace("eq input.x 5", "eq input.x 6"), true)
        .unwrap();
    let result = container.run_pipeline("cond", json!({})).unwrap();
    assert_eq!(result, json!({"x": 5}));
}

#[test]
fn nested_calls_thread_the_input() {
    let container = OruContainer::new();
    container.register_pipeline("child", "inc input.v", true).unwrap();
    container
        .register_pipeline("caller", "$child\n$child\nget input", true)
        .unwrap();

    let result = container.run_pipeline("caller", json!({"v": 0})).unwrap();
    assert_eq!(result, json!({"v": 2}));
}

#[test]
fn unbounded_recursion_is_cut_at_the_depth_limit() {
    let container = OruContainer::new();
    container.register_pipeline("recurse", "$recurse", true).unwrap();

    let err = container.run_pipeline("recurse", json!({})).unwrap_err();
    assert!(matches!(err, OruError::PipelineDepthExceeded(11)));
}

#[test]
fn missing_pipelines_are_reported() {
    let container = OruContainer::new();
    let err = container.run_pipeline("ghost", json!({})).unwrap_err();
    assert!(matches!(err, OruError::PipelineNotFound(tag) if tag == "ghost"));
}

#[test]
fn absent_references_fail_as_method_not_found() {
    let container = OruContainer::new();
    container.register_pipeline("bad", "ghost", true).unwrap();
    let err = container.run_pipeline("bad", json!({})).unwrap_err();
    assert!(matches!(err, OruError::MethodNotFound(step) if step == "ghost"));
}

#[test]
fn broken_paths_fail_before_the_final_token() {
    let container = OruContainer::new();
    container.register_pipeline("bad", "get input.a.b", true).unwrap();
    let err = container.run_pipeline("bad", json!({})).unwrap_err();
    assert!(matches!(err, OruError::PathNotFound(_)));
}

#[test]
fn super_expands_the_previous_version_without_arrow_lines() {
    let container = OruContainer::new();
    container
        .register_pipeline(
            "p",
            "set input.base true\n-> set input.debug true",
            true,
        )
        .unwrap();
    container
        .register_pipeline("p", "$super\nset input.derived true\nget input", true)
        .unwrap();

    let result = container.run_pipeline("p", json!({})).unwrap();
    assert_eq!(result, json!({"base": true, "derived": true}));
}

#[test]
fn arrow_lines_are_skipped_when_called_as_a_callee() {
    let container = OruContainer::new();
    container
        .register_pipeline(
            "traced",
            "-> set input.traced true\ninc input.v\nget input",
            true,
        )
        .unwrap();
    container.register_pipeline("caller", "$traced", true).unwrap();

    let direct = container.run_pipeline("traced", json!({"v": 0})).unwrap();
    assert_eq!(direct, json!({"v": 1, "traced": true}));

    let nested = container.run_pipeline("caller", json!({"v": 0})).unwrap();
    assert_eq!(nested, json!({"v": 1}));
}

#[test]
fn wildcard_pipeline_lookup_is_memoized_and_invalidated() {
    let container = OruContainer::new();
    assert!(container.get_pipeline("task-*").is_none());
    container.register_pipeline("task-one", "get input", true).unwrap();
    let found = container.get_pipeline("task-*").unwrap();
    assert_eq!(found.tag, "task-one");
}

#[test]
fn loader_splits_sections_and_pipelines() {
    let container = OruContainer::new();
    let text = "# Pipelines\n\
                ## greet\n\
                set input.msg \"hello\"\n\
                get input.msg\n\
                \n\
                ## count\n\
                inc input.v\n\
                get input\n\
                # Sentiment\n\
                ## analyze\n\
                get input\n";
    container.load_pipelines_from_string(text).unwrap();

    let result = container.run_pipeline("greet", json!({})).unwrap();
    assert_eq!(result, json!("hello"));
    let result = container.run_pipeline("count", json!({"v": 1})).unwrap();
    assert_eq!(result, json!({"v": 2}));

    // foreign sections defer to the named child
    assert!(container.get_pipeline("analyze").is_none());
    assert_eq!(
        container.child_pipelines("Sentiment"),
        vec![("analyze".to_string(), vec!["get input".to_string()])]
    );
}

#[test]
fn unknown_compiler_directive_falls_back_to_default() {
    let container = OruContainer::new();
    container
        .register_pipeline("p", "// compiler=missing\nset input.x 1\nget input", true)
        .unwrap();
    let result = container.run_pipeline("p", json!({})).unwrap();
    assert_eq!(result, json!({"x": 1}));
    assert_eq!(container.get_pipeline("p").unwrap().compiler, "default");
}

#[test]
fn custom_compilers_take_over_selected_pipelines() {
    #[derive(Debug)]
    struct ShoutCompiler;

    impl OruCompiler for ShoutCompiler {
        fn name(&self) -> &str {
            "shout"
        }

        fn compile(&self, lines: &[String]) -> oru::Result<Vec<OruInstruction>> {
            OruDefaultCompiler::new().compile(lines)
        }

        fn execute(
            &self,
            container: &OruContainer,
            pipeline: &OruPipeline,
            input: Value,
            src_object: &mut Value,
            depth: usize,
        ) -> oru::Result<Value> {
            let compiler = OruDefaultCompiler::new();
            let result = compiler.execute(container, pipeline, input, src_object, depth)?;
            match result {
                Value::String(text) => Ok(Value::String(text.to_uppercase())),
                other => Ok(other),
            }
        }
    }

    let container = OruContainer::new();
    container.register_compiler(Arc::new(ShoutCompiler));
    container
        .register_pipeline("p", "// compiler=shout\nget input.msg", true)
        .unwrap();
    let result = container.run_pipeline("p", json!({"msg": "quiet"})).unwrap();
    assert_eq!(result, json!("QUIET"));
}

#[test]
fn ad_hoc_line_slices_run_and_reuse_their_compiled_form() {
    let container = OruContainer::new();
    let lines = vec!["inc input.v".to_string(), "get input".to_string()];
    let mut src_object = Value::Null;
    let result = container
        .run_pipeline_lines(&lines, json!({"v": 0}), &mut src_object)
        .unwrap();
    assert_eq!(result, json!({"v": 1}));
    let result = container
        .run_pipeline_lines(&lines, json!({"v": 5}), &mut src_object)
        .unwrap();
    assert_eq!(result, json!({"v": 6}));
}

#[test]
fn comments_and_blank_lines_are_runtime_noops() {
    let container = OruContainer::new();
    container
        .register_pipeline(
            "p",
            "// counts one step\n\ninc input.v\n// done\nget input",
            true,
        )
        .unwrap();
    let result = container.run_pipeline("p", json!({"v": 0})).unwrap();
    assert_eq!(result, json!({"v": 1}));
}

#[test]
fn delete_removes_a_leaf() {
    let container = OruContainer::new();
    container
        .register_pipeline("p", "delete input.secret\nget input", true)
        .unwrap();
    let result = container
        .run_pipeline("p", json!({"keep": 1, "secret": 2}))
        .unwrap();
    assert_eq!(result, json!({"keep": 1}));
}

#[test]
fn src_object_is_reachable_through_this() {
    let container = OruContainer::new();
    container
        .register_pipeline("p", "set input.kind this.kind\nget input", true)
        .unwrap();
    let mut src_object = json!({"kind": "analyzer"});
    let result = container
        .run_pipeline_with("p", json!({}), &mut src_object)
        .unwrap();
    assert_eq!(result, json!({"kind": "analyzer"}));
}

#[test]
fn registered_values_resolve_as_reference_roots() {
    let container = OruContainer::new();
    container.register_value("limits", json!({"max": 3}));
    container
        .register_pipeline("p", "set input.cap limits.max\nget input", true)
        .unwrap();
    let result = container.run_pipeline("p", json!({})).unwrap();
    assert_eq!(result, json!({"cap": 3}));
}
