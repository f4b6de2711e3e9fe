//! Rust source generation for the compiled classes.
//!
//! `Codegen` accumulates one `payloads.rs` module: record structs, wrapper
//! newtypes, their `Validate` impls, callback aliases and the `topics` module.
//! Generated code leans on [`crate::support`] at runtime.
pub mod topics;
pub mod types;

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use crate::error::NameCollisionError;
use crate::ir::{ClassBody, ClassDefinition, ContainerKind, FieldDef, Literal, ScalarKind, TypeExpr};
use crate::registry::CallbackStub;
use crate::schema::MessageRegistry;

use types::{bare, doc_lines, field_ident, rust_type};

pub const HEADER: &str = "// This file is automatically @generated. DO NOT EDIT!\n";

/// Names the generated module imports; classes may not shadow them.
const IMPORTED: &[&str] = &[
    "Serialize", "Deserialize", "support", "ContainerKind", "ScalarKind", "Validate", "ValidationError", "topics",
];

/// Prelude items generated code refers to unqualified.
const PRELUDE: &[&str] = &[
    "String", "Option", "Some", "None", "Vec", "Result", "Ok", "Err", "Box", "Fn", "Send", "Sync",
    "TryFrom", "From", "Into", "Default",
];

#[derive(Debug)]
pub struct Codegen {
    support: String,
    out: String,
    wrappers: HashSet<String>,
}

/// A place expression plus whether it already evaluates to a reference.
#[derive(Debug, Clone)]
struct Access {
    expr: String,
    by_ref: bool,
}

impl Access {
    fn place(expr: impl Into<String>) -> Self {
        Access { expr: expr.into(), by_ref: false }
    }

    fn var(name: impl Into<String>) -> Self {
        Access { expr: name.into(), by_ref: true }
    }

    fn value(&self) -> String {
        if self.by_ref { format!("*{}", self.expr) } else { self.expr.clone() }
    }

    fn reference(&self) -> String {
        if self.by_ref { self.expr.clone() } else { format!("&{}", self.expr) }
    }
}

impl Codegen {
    /// `support_crate` is the crate path generated code imports `support` from.
    pub fn new(support_crate: &str) -> Self {
        Codegen { support: support_crate.to_string(), out: String::new(), wrappers: HashSet::new() }
    }

    /// Emit every class (already in definition-before-use order), the callback
    /// aliases and the topic constants.
    pub fn emit(
        &mut self,
        classes: &[&ClassDefinition],
        stubs: &[CallbackStub],
        registry: &MessageRegistry,
    ) -> Result<(), NameCollisionError> {
        self.wrappers = classes
            .iter()
            .filter(|c| matches!(c.body, ClassBody::Root(_)))
            .map(|c| c.name.clone())
            .collect();

        self.out.push_str(HEADER);
        self.out.push_str("#[allow(unused_imports)]\n");
        self.out.push_str("use serde::{Deserialize, Serialize};\n");
        self.out.push_str("#[allow(unused_imports)]\n");
        let _ = writeln!(
            self.out,
            "use {}::support::{{self, ContainerKind, ScalarKind, Validate, ValidationError}};",
            self.support
        );

        for class in classes {
            let taken_by = if IMPORTED.contains(&class.name.as_str()) {
                Some("generated imports")
            } else if PRELUDE.contains(&class.name.as_str()) {
                Some("the Rust prelude")
            } else if types::is_keyword(&class.name) {
                Some("a Rust keyword")
            } else {
                None
            };
            if let Some(first) = taken_by {
                return Err(NameCollisionError {
                    name: class.name.clone(),
                    first: first.into(),
                    second: class.name.clone(),
                });
            }
            self.out.push('\n');
            match &class.body {
                ClassBody::Record(fields) => self.emit_record(class, fields)?,
                ClassBody::Root(expr) => self.emit_wrapper(class, expr),
            }
        }

        self.emit_callbacks(classes, stubs)?;
        self.out.push('\n');
        self.out.push_str(&topics::emit_topics(registry.entries())?);
        Ok(())
    }

    pub fn into_string(self) -> String {
        self.out
    }

    // ------------------------------- records ------------------------------ //

    fn emit_record(&mut self, class: &ClassDefinition, fields: &[FieldDef]) -> Result<(), NameCollisionError> {
        let name = &class.name;
        if let Some(doc) = &class.description {
            self.out.push_str(&doc_lines(doc, ""));
        }

        if fields.is_empty() {
            self.out.push_str("#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]\n");
            self.out.push_str("#[serde(deny_unknown_fields)]\n");
            let _ = writeln!(self.out, "pub struct {name} {{}}\n");
            let _ = writeln!(self.out, "impl Validate for {name} {{");
            self.out.push_str("    fn validate_at(&self, _path: &str) -> Result<(), ValidationError> {\n");
            self.out.push_str("        Ok(())\n    }\n}\n");
            return Ok(());
        }

        let idents = unique_idents(name, fields)?;

        self.out.push_str("#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]\n");
        self.out.push_str("#[serde(deny_unknown_fields)]\n");
        let _ = writeln!(self.out, "pub struct {name} {{");
        for (field, ident) in fields.iter().zip(&idents) {
            if let Some(doc) = &field.doc {
                self.out.push_str(&doc_lines(doc, "    "));
            }
            let attrs = field_attrs(name, field, ident);
            if !attrs.is_empty() {
                let _ = writeln!(self.out, "    #[serde({})]", attrs.join(", "));
            }
            let _ = writeln!(self.out, "    pub {ident}: {},", rust_type(&field.descriptor.expression));
        }
        self.out.push_str("}\n");

        let helpers = self.record_helpers(fields, &idents);
        if !helpers.is_empty() {
            let _ = write!(self.out, "\nimpl {name} {{\n{helpers}}}\n");
        }

        let mut checks = String::new();
        for (field, ident) in fields.iter().zip(&idents) {
            let expr = &field.descriptor.expression;
            if !self.needs_check(expr) {
                continue;
            }
            let path_var = format!("p_{}", bare(ident));
            let _ = writeln!(
                checks,
                "        let {path_var} = format!({});",
                format_literal(&format!("{{path}}.{}", escape_braces(&field.name)))
            );
            self.checks(expr, &Access::place(format!("self.{ident}")), &format!("&{path_var}"), 0, 2, &mut checks);
        }
        let path_param = if checks.is_empty() { "_path" } else { "path" };
        let _ = writeln!(self.out, "\nimpl Validate for {name} {{");
        let _ = writeln!(self.out, "    fn validate_at(&self, {path_param}: &str) -> Result<(), ValidationError> {{");
        self.out.push_str(&checks);
        self.out.push_str("        Ok(())\n    }\n}\n");
        Ok(())
    }

    /// Default functions, coercion hooks and analysis accessors.
    fn record_helpers(&self, fields: &[FieldDef], idents: &[String]) -> String {
        let mut out = String::new();
        for (field, ident) in fields.iter().zip(idents) {
            let bare = bare(ident);
            let ty = rust_type(&field.descriptor.expression);

            if let Some(lit) = explicit_default(field) {
                let value = types::default_value(lit, &field.descriptor.expression);
                let _ = writeln!(out, "    fn default_{bare}() -> {ty} {{\n        {value}\n    }}\n");
            }

            if field.coerce() {
                let shape = &field.descriptor.coercion;
                let containers: Vec<String> = shape.containers.iter().map(|c| container_path(*c)).collect();
                let scalar = match shape.scalar {
                    Some(ScalarKind::Int) => "Some(ScalarKind::Int)",
                    Some(ScalarKind::Float) => "Some(ScalarKind::Float)",
                    None => "None",
                };
                let _ = writeln!(
                    out,
                    "    fn coerce_{bare}<'de, D: serde::Deserializer<'de>>(d: D) -> Result<{ty}, D::Error> {{\n        \
                     support::deserialize_coerced(d, &[{}], {scalar})\n    }}\n",
                    containers.join(", ")
                );
            }

            if let Some(analysis) = &field.descriptor.analysis {
                let is_wrapper = |n: &str| self.wrappers.contains(n);
                let body = types::to_analysis(&field.descriptor.expression, &format!("self.{ident}"), &is_wrapper);
                let _ = writeln!(
                    out,
                    "    /// `{}` with wrapper values unwrapped.\n    pub fn {bare}_values(&self) -> {} {{\n        {body}\n    }}\n",
                    field.name,
                    rust_type(analysis)
                );
            }
        }
        // drop the blank line after the last helper
        if out.ends_with("\n\n") {
            out.pop();
        }
        out
    }

    // ------------------------------- wrappers ----------------------------- //

    fn emit_wrapper(&mut self, class: &ClassDefinition, expr: &TypeExpr) {
        let name = &class.name;
        let inner = rust_type(expr);
        let copy = matches!(expr, TypeExpr::Numeric { .. });

        let mut checks = String::new();
        self.checks(expr, &Access::var("value"), "path", 0, 2, &mut checks);
        let (value_param, path_param) = if checks.is_empty() { ("_value", "_path") } else { ("value", "path") };

        let _ = writeln!(self.out, "/// `{expr}` held inside a container.");
        let derives = if copy { "Debug, Clone, Copy, PartialEq, PartialOrd" } else { "Debug, Clone, PartialEq, PartialOrd" };
        let _ = writeln!(self.out, "#[derive({derives}, Serialize, Deserialize)]");
        let _ = writeln!(self.out, "#[serde(try_from = \"{inner}\", into = \"{inner}\")]");
        let _ = writeln!(self.out, "pub struct {name}({inner});\n");

        let get = if copy { "self.0" } else { "self.0.clone()" };
        let _ = write!(
            self.out,
            "impl {name} {{\n    \
             pub fn new(value: {inner}) -> Result<Self, ValidationError> {{\n        \
             Self::check(&value, {name:?})?;\n        Ok(Self(value))\n    }}\n\n    \
             pub fn get(&self) -> {inner} {{\n        {get}\n    }}\n\n    \
             fn check({value_param}: &{inner}, {path_param}: &str) -> Result<(), ValidationError> {{\n\
             {checks}        Ok(())\n    }}\n}}\n\n"
        );
        let _ = write!(
            self.out,
            "impl TryFrom<{inner}> for {name} {{\n    type Error = ValidationError;\n\n    \
             fn try_from(value: {inner}) -> Result<Self, Self::Error> {{\n        Self::new(value)\n    }}\n}}\n\n"
        );
        let _ = write!(
            self.out,
            "impl From<{name}> for {inner} {{\n    fn from(value: {name}) -> Self {{\n        value.0\n    }}\n}}\n\n"
        );
        let _ = write!(
            self.out,
            "impl Validate for {name} {{\n    fn validate_at(&self, path: &str) -> Result<(), ValidationError> {{\n        \
             Self::check(&self.0, path)\n    }}\n}}\n"
        );
    }

    // ------------------------------- checks ------------------------------- //

    fn needs_check(&self, expr: &TypeExpr) -> bool {
        match expr {
            TypeExpr::Text { .. } | TypeExpr::Bool { .. } => false,
            TypeExpr::Literals { .. } => true,
            TypeExpr::Numeric { bounds, .. } => !bounds.is_empty(),
            TypeExpr::Class(name) => !self.wrappers.contains(name),
            TypeExpr::Sequence { item, min_items, max_items } => {
                min_items.is_some() || max_items.is_some() || self.needs_check(item)
            }
            TypeExpr::Tuple { item, arity } => !types::is_fixed_array(*arity) || self.needs_check(item),
            TypeExpr::Nullable(inner) => self.needs_check(inner),
        }
    }

    /// Append statements checking `access` against `expr`, failing under the
    /// `&str` expression `path`.
    fn checks(&self, expr: &TypeExpr, access: &Access, path: &str, depth: usize, indent: usize, out: &mut String) {
        if !self.needs_check(expr) {
            return;
        }
        let pad = "    ".repeat(indent);
        match expr {
            TypeExpr::Text { .. } | TypeExpr::Bool { .. } => {}
            TypeExpr::Literals { values, .. } => {
                let allowed: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
                let _ = writeln!(
                    out,
                    "{pad}support::check_literal({path}, {}.as_str(), &[{}])?;",
                    access.expr,
                    allowed.join(", ")
                );
            }
            TypeExpr::Numeric { scalar, bounds, .. } => {
                let value = access.value();
                for (op, lim) in bounds.constraints() {
                    let lhs = match (scalar, lim) {
                        (ScalarKind::Int, crate::ir::NumberLit::Float(_)) => format!("({value} as f64)"),
                        _ => value.clone(),
                    };
                    let _ = writeln!(
                        out,
                        "{pad}if !({lhs} {op} {}) {{\n{pad}    return Err(ValidationError::bound({path}, {value}, \"{op} {lim}\"));\n{pad}}}",
                        types::limit(lim, *scalar)
                    );
                }
            }
            TypeExpr::Class(_) => {
                let _ = writeln!(out, "{pad}{}.validate_at({path})?;", access.expr);
            }
            TypeExpr::Nullable(inner) => {
                let var = format!("v{depth}");
                let _ = writeln!(out, "{pad}if let Some({var}) = {} {{", access.reference());
                self.checks(inner, &Access::var(&var), path, depth + 1, indent + 1, out);
                let _ = writeln!(out, "{pad}}}");
            }
            TypeExpr::Sequence { item, min_items, max_items } => {
                if min_items.is_some() || max_items.is_some() {
                    let _ = writeln!(
                        out,
                        "{pad}support::check_len({path}, {}.len(), {}, {})?;",
                        access.expr,
                        opt_usize(*min_items),
                        opt_usize(*max_items)
                    );
                }
                self.item_checks(item, access, path, depth, indent, out);
            }
            TypeExpr::Tuple { item, arity } => {
                if !types::is_fixed_array(*arity) {
                    let _ = writeln!(
                        out,
                        "{pad}support::check_len({path}, {}.len(), Some({arity}), Some({arity}))?;",
                        access.expr
                    );
                }
                self.item_checks(item, access, path, depth, indent, out);
            }
        }
    }

    fn item_checks(&self, item: &TypeExpr, access: &Access, path: &str, depth: usize, indent: usize, out: &mut String) {
        if !self.needs_check(item) {
            return;
        }
        let pad = "    ".repeat(indent);
        let (i, v, p) = (format!("i{depth}"), format!("v{depth}"), format!("p{depth}"));
        let _ = writeln!(out, "{pad}for ({i}, {v}) in {}.iter().enumerate() {{", access.expr);
        let _ = writeln!(out, "{pad}    let {p} = format!(\"{{}}[{{{i}}}]\", {path});");
        self.checks(item, &Access::var(&v), &format!("&{p}"), depth + 1, indent + 1, out);
        let _ = writeln!(out, "{pad}}}");
    }

    // ------------------------------ callbacks ----------------------------- //

    fn emit_callbacks(&mut self, classes: &[&ClassDefinition], stubs: &[CallbackStub]) -> Result<(), NameCollisionError> {
        if stubs.is_empty() {
            return Ok(());
        }
        self.out.push_str("\n// Handler signatures for the pub/sub adapter.\n");
        for stub in stubs {
            let alias = stub.alias_name();
            if classes.iter().any(|c| c.name == alias) {
                return Err(NameCollisionError {
                    name: alias,
                    first: "class".into(),
                    second: format!("callback for `{}`", stub.message_type),
                });
            }
            let args = stub.payload.as_deref().unwrap_or("");
            let _ = writeln!(self.out, "pub type {alias} = Box<dyn Fn({args}) + Send + Sync>;");
        }
        Ok(())
    }
}

// ———————————————————————————————————————————————————————————————————————————
// HELPERS
// ———————————————————————————————————————————————————————————————————————————

fn unique_idents(class: &str, fields: &[FieldDef]) -> Result<Vec<String>, NameCollisionError> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    let mut idents = Vec::with_capacity(fields.len());
    for field in fields {
        let ident = field_ident(&field.name);
        if let Some(first) = seen.insert(bare(&ident).to_string(), &field.name) {
            return Err(NameCollisionError {
                name: ident,
                first: format!("{class}.{first}"),
                second: format!("{class}.{}", field.name),
            });
        }
        idents.push(ident);
    }
    Ok(idents)
}

fn field_attrs(class: &str, field: &FieldDef, ident: &str) -> Vec<String> {
    let mut attrs = Vec::new();
    if bare(ident) != field.name {
        attrs.push(format!("rename = {:?}", field.name));
    }
    if !field.required {
        match explicit_default(field) {
            Some(_) => attrs.push(format!("default = \"{class}::default_{}\"", bare(ident))),
            None => attrs.push("default".to_string()),
        }
    }
    if field.coerce() {
        attrs.push(format!("deserialize_with = \"{class}::coerce_{}\"", bare(ident)));
    }
    attrs
}

/// A non-null default; a null default is just `Option::default`.
fn explicit_default(field: &FieldDef) -> Option<&Literal> {
    field.default.as_ref().filter(|lit| **lit != Literal::Null)
}

fn container_path(c: ContainerKind) -> String {
    match c {
        ContainerKind::List => "ContainerKind::List".into(),
        ContainerKind::Tuple(n) => format!("ContainerKind::Tuple({n})"),
    }
}

fn opt_usize(v: Option<usize>) -> String {
    v.map(|n| format!("Some({n})")).unwrap_or_else(|| "None".into())
}

fn escape_braces(s: &str) -> String {
    s.replace('{', "{{").replace('}', "}}")
}

/// Quote `s` as a string literal for use as a format string.
fn format_literal(s: &str) -> String {
    format!("{s:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Direction, MessageRegistryEntry};
    use crate::schema::SchemaNode;
    use crate::synth::Synthesizer;
    use serde_json::json;

    fn generate(name: &str, payload: serde_json::Value) -> Result<String, NameCollisionError> {
        let node: SchemaNode = serde_json::from_value(payload).unwrap();
        let class = Synthesizer::new().emit_message(name, &node).unwrap();
        let classes = crate::hoist::flatten(std::slice::from_ref(&class));
        let registry = MessageRegistry::new(vec![MessageRegistryEntry {
            topic: "avr/pcm/set".into(),
            message_type: name.into(),
            direction: Direction::Subscribe,
        }]);
        let stubs = crate::registry::callback_stubs(&registry, classes.iter().copied()).unwrap();
        let mut cg = Codegen::new("mqtt_modelgen");
        cg.emit(&classes, &stubs, &registry)?;
        Ok(cg.into_string())
    }

    fn color_set() -> String {
        generate(
            "AVRPCMColorSet",
            json!({
                "type": "object",
                "additionalProperties": false,
                "required": ["wrgb"],
                "description": "Set an LED color",
                "properties": {
                    "wrgb": {
                        "type": "array", "minItems": 4, "maxItems": 4,
                        "description": "White, red, green, blue",
                        "items": {"type": "integer", "minimum": 0, "maximum": 255}
                    },
                    "fadeTime": {"type": "number", "minimum": 0, "default": 1},
                    "mode": {"type": "string", "enum": ["solid", "blink"]}
                }
            }),
        )
        .unwrap()
    }

    #[test]
    fn wrapper_precedes_record() {
        let src = color_set();
        assert!(src.starts_with(HEADER));
        let wrapper = src.find("pub struct AVRPCMColorSetWrgbItem(i64);").unwrap();
        let record = src.find("pub struct AVRPCMColorSet {").unwrap();
        assert!(wrapper < record);
        assert!(src.contains("#[serde(try_from = \"i64\", into = \"i64\")]"));
        assert!(src.contains("if !(*value <= 255) {"), "{src}");
    }

    #[test]
    fn record_fields_carry_serde_attributes() {
        let src = color_set();
        assert!(src.contains("/// Set an LED color\n"));
        assert!(src.contains("    /// White, red, green, blue\n"));
        assert!(src.contains("    #[serde(deserialize_with = \"AVRPCMColorSet::coerce_wrgb\")]\n    pub wrgb: [AVRPCMColorSetWrgbItem; 4],"), "{src}");
        assert!(src.contains(
            "    #[serde(rename = \"fadeTime\", default = \"AVRPCMColorSet::default_fade_time\")]\n    pub fade_time: Option<f64>,"
        ), "{src}");
        assert!(src.contains("Some(1.0_f64)"));
        assert!(src.contains("support::deserialize_coerced(d, &[ContainerKind::Tuple(4)], Some(ScalarKind::Int))"));
        assert!(src.contains("pub fn wrgb_values(&self) -> [i64; 4] {\n        self.wrgb.each_ref().map(|x| x.get())"));
    }

    #[test]
    fn validate_covers_inline_bounds_and_literals() {
        let src = color_set();
        assert!(src.contains("let p_fade_time = format!(\"{path}.fadeTime\");"), "{src}");
        assert!(src.contains("if let Some(v0) = &self.fade_time {"));
        assert!(src.contains("if !(*v0 >= 0.0_f64) {"), "{src}");
        assert!(src.contains("support::check_literal(&p_mode, v0.as_str(), &[\"solid\", \"blink\"])?;"), "{src}");
    }

    #[test]
    fn callbacks_and_topics() {
        let src = color_set();
        assert!(src.contains("pub type AVRPCMColorSetCallable = Box<dyn Fn(AVRPCMColorSet) + Send + Sync>;"));
        assert!(src.contains("pub const AVR_PCM_SET: &str = \"avr/pcm/set\";"));

        let empty = generate("AVREmptyMessage", json!({"type": "object", "additionalProperties": false})).unwrap();
        assert!(empty.contains("pub struct AVREmptyMessage {}"));
        assert!(empty.contains("Default, PartialEq, Eq, Hash"));
        assert!(empty.contains("pub type AVREmptyMessageCallable = Box<dyn Fn() + Send + Sync>;"));
    }

    #[test]
    fn nested_records_and_sequences_are_validated() {
        let src = generate(
            "Path",
            json!({
                "type": "object",
                "additionalProperties": false,
                "required": ["points"],
                "properties": {
                    "points": {
                        "type": "array", "minItems": 1,
                        "items": {"type": "object", "additionalProperties": false,
                                  "properties": {"type": {"type": "string"}}}
                    }
                }
            }),
        )
        .unwrap();
        assert!(src.contains("pub points: Vec<PathPoints>,"), "{src}");
        // serde strips the raw prefix on its own
        assert!(src.contains("    #[serde(default)]\n    pub r#type: Option<String>,"), "{src}");
        assert!(src.contains("support::check_len(&p_points, self.points.len(), Some(1), None)?;"));
        assert!(src.contains("for (i0, v0) in self.points.iter().enumerate() {"));
        assert!(src.contains("v0.validate_at(&p0)?;"));
    }

    #[test]
    fn integral_float_default_renders_as_integer() {
        let src = generate(
            "Counter",
            json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {"cnt": {"type": "integer", "default": 3.0, "maximum": 10.0}}
            }),
        )
        .unwrap();
        assert!(src.contains("fn default_cnt() -> Option<i64> {\n        Some(3)\n    }"), "{src}");
        assert!(src.contains("if !(*v0 <= 10) {"), "{src}");
    }

    #[test]
    fn classes_may_not_shadow_prelude_or_keywords() {
        for name in ["Result", "Option", "String", "Vec", "Box", "Self", "match"] {
            let class = ClassDefinition {
                name: name.into(),
                description: None,
                body: ClassBody::Record(Vec::new()),
                auxiliary: Vec::new(),
            };
            let err = Codegen::new("mqtt_modelgen")
                .emit(&[&class], &[], &MessageRegistry::new(Vec::new()))
                .unwrap_err();
            assert_eq!(err.name, name);
        }
    }

    #[test]
    fn snake_case_collisions_are_rejected() {
        let err = generate(
            "Msg",
            json!({
                "type": "object",
                "additionalProperties": false,
                "properties": {"fadeTime": {"type": "number"}, "fade_time": {"type": "number"}}
            }),
        )
        .unwrap_err();
        assert_eq!(err.name, "fade_time");
        assert_eq!(err.first, "Msg.fadeTime");
        assert_eq!(err.second, "Msg.fade_time");
    }
}
