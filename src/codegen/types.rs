//! Rust spellings for IR types, idents and literals.

use crate::ir::{Literal, NumberLit, ScalarKind, TypeExpr};

/// Fixed arities above this become `Vec<T>` plus a length check.
pub const MAX_ARRAY_ARITY: usize = 32;

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false",
    "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while",
    "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try", "typeof",
    "unsized", "virtual", "yield",
];

/// Keywords that cannot be raw identifiers.
const RESERVED: &[&str] = &["self", "Self", "super", "crate", "_"];

/// Words that cannot name a type in generated code.
pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name) || RESERVED.contains(&name)
}

pub fn scalar(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Int => "i64",
        ScalarKind::Float => "f64",
    }
}

pub fn is_fixed_array(arity: usize) -> bool {
    arity <= MAX_ARRAY_ARITY
}

pub fn rust_type(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Text { .. } | TypeExpr::Literals { .. } => "String".into(),
        TypeExpr::Bool { .. } => "bool".into(),
        TypeExpr::Numeric { scalar: k, .. } => scalar(*k).into(),
        TypeExpr::Class(name) => name.clone(),
        TypeExpr::Sequence { item, .. } => format!("Vec<{}>", rust_type(item)),
        TypeExpr::Tuple { item, arity } if is_fixed_array(*arity) => {
            format!("[{}; {arity}]", rust_type(item))
        }
        TypeExpr::Tuple { item, .. } => format!("Vec<{}>", rust_type(item)),
        TypeExpr::Nullable(inner) => format!("Option<{}>", rust_type(inner)),
    }
}

/// Expression converting `access` (a reference to a value of `runtime`) into
/// the analysis type. Wrapper classes in `wrappers` are unwrapped with `get()`.
pub fn to_analysis(runtime: &TypeExpr, access: &str, wrappers: &dyn Fn(&str) -> bool) -> String {
    match runtime {
        TypeExpr::Class(name) if wrappers(name) => format!("{access}.get()"),
        TypeExpr::Nullable(inner) => {
            format!("{access}.as_ref().map(|x| {})", to_analysis(inner, "x", wrappers))
        }
        TypeExpr::Tuple { item, arity } if is_fixed_array(*arity) => {
            format!("{access}.each_ref().map(|x| {})", to_analysis(item, "x", wrappers))
        }
        TypeExpr::Tuple { item, .. } | TypeExpr::Sequence { item, .. } => format!(
            "{access}.iter().map(|x| {}).collect::<Vec<_>>()",
            to_analysis(item, "x", wrappers)
        ),
        _ => format!("{access}.clone()"),
    }
}

/// Literal for a field default of type `expr` (already wrapped in `Some` when nullable).
pub fn default_value(lit: &Literal, expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Nullable(_) if *lit == Literal::Null => "None".into(),
        TypeExpr::Nullable(inner) => format!("Some({})", default_value(lit, inner)),
        TypeExpr::Numeric { scalar: ScalarKind::Float, .. } => match lit {
            Literal::Number(n) => float_lit(n.as_f64()),
            other => other.to_string(),
        },
        _ => match lit {
            Literal::Str(s) => format!("{s:?}.to_string()"),
            other => other.to_string(),
        },
    }
}

pub fn float_lit(x: f64) -> String {
    format!("{x:?}_f64")
}

/// A bound limit rendered for comparison against a value of kind `value_kind`.
pub fn limit(lim: NumberLit, value_kind: ScalarKind) -> String {
    match (value_kind, lim) {
        (ScalarKind::Int, NumberLit::Int(i)) => i.to_string(),
        (_, lim) => float_lit(lim.as_f64()),
    }
}

/// snake_case ident for a schema property name.
pub fn field_ident(name: &str) -> String {
    let snake = snake_case(name);
    if RESERVED.contains(&snake.as_str()) {
        format!("{snake}_")
    } else if KEYWORDS.contains(&snake.as_str()) {
        format!("r#{snake}")
    } else {
        snake
    }
}

/// The ident without a raw prefix, usable as a prefix for derived names.
pub fn bare(ident: &str) -> &str {
    ident.strip_prefix("r#").unwrap_or(ident)
}

pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            let boundary = c.is_ascii_uppercase()
                && prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit());
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        prev = Some(c);
    }
    while out.ends_with('_') && out.len() > 1 {
        out.pop();
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// SCREAMING_SNAKE constant name for a topic string.
pub fn const_name(topic: &str) -> String {
    let mut out = String::with_capacity(topic.len());
    for c in topic.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert_str(0, "TOPIC_");
    }
    out
}

pub fn doc_lines(text: &str, indent: &str) -> String {
    text.lines()
        .map(|l| {
            let l = l.trim_end();
            if l.is_empty() { format!("{indent}///\n") } else { format!("{indent}/// {l}\n") }
        })
        .collect()
}
