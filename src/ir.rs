// Strongly-typed IR for codegen. No serde_json::Value here.

use std::fmt;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// A numeric literal as written in the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberLit {
    Int(i64),
    Float(OrderedFloat<f64>),
}

impl NumberLit {
    pub fn as_f64(self) -> f64 {
        match self {
            NumberLit::Int(i) => i as f64,
            NumberLit::Float(f) => f.0,
        }
    }

    pub fn is_integral(self) -> bool {
        match self {
            NumberLit::Int(_) => true,
            NumberLit::Float(f) => f.0.is_finite() && f.0.fract() == 0.0,
        }
    }

    /// `3.0` → `3`; anything else unchanged.
    pub fn to_int(self) -> Self {
        match self {
            NumberLit::Float(f) if self.is_integral() && f.0.abs() < i64::MAX as f64 => NumberLit::Int(f.0 as i64),
            other => other,
        }
    }
}

impl fmt::Display for NumberLit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberLit::Int(i) => write!(f, "{i}"),
            NumberLit::Float(x) => write!(f, "{:?}", x.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Int,
    Float,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::Int => f.write_str("int"),
            ScalarKind::Float => f.write_str("float"),
        }
    }
}

/// The runtime container a value must live in at one nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    List,
    Tuple(usize),
}

/// Inclusive and exclusive numeric bounds, any subset of which may be present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub minimum: Option<NumberLit>,
    pub maximum: Option<NumberLit>,
    pub exclusive_minimum: Option<NumberLit>,
    pub exclusive_maximum: Option<NumberLit>,
}

impl Bounds {
    pub fn is_empty(&self) -> bool {
        self.minimum.is_none()
            && self.maximum.is_none()
            && self.exclusive_minimum.is_none()
            && self.exclusive_maximum.is_none()
    }

    /// Each bound as `(operator, limit)`, lower bounds first.
    pub fn constraints(&self) -> Vec<(&'static str, NumberLit)> {
        let mut out = Vec::new();
        if let Some(m) = self.minimum { out.push((">=", m)); }
        if let Some(m) = self.exclusive_minimum { out.push((">", m)); }
        if let Some(m) = self.maximum { out.push(("<=", m)); }
        if let Some(m) = self.exclusive_maximum { out.push(("<", m)); }
        out
    }

    /// First violated constraint for `value`, rendered as `"<= 255"`.
    /// Integral float limits rewritten as integer literals.
    pub fn to_int(self) -> Self {
        Bounds {
            minimum: self.minimum.map(NumberLit::to_int),
            maximum: self.maximum.map(NumberLit::to_int),
            exclusive_minimum: self.exclusive_minimum.map(NumberLit::to_int),
            exclusive_maximum: self.exclusive_maximum.map(NumberLit::to_int),
        }
    }

    pub fn violation(&self, value: NumberLit) -> Option<String> {
        self.constraints()
            .into_iter()
            .find(|(op, limit)| !satisfies(value, op, *limit))
            .map(|(op, limit)| format!("{op} {limit}"))
    }
}

fn satisfies(value: NumberLit, op: &str, limit: NumberLit) -> bool {
    let ord = match (value, limit) {
        (NumberLit::Int(a), NumberLit::Int(b)) => a.cmp(&b),
        (a, b) => OrderedFloat(a.as_f64()).cmp(&OrderedFloat(b.as_f64())),
    };
    match op {
        ">=" => ord.is_ge(),
        ">" => ord.is_gt(),
        "<=" => ord.is_le(),
        "<" => ord.is_lt(),
        _ => false,
    }
}

/// A schema-declared default value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(NumberLit),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::Str(s) => write!(f, "{s:?}"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TYPE EXPRESSIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    Text { default: Option<String> },
    /// Closed set of string literals, in declaration order.
    Literals { values: Vec<String>, default: Option<String> },
    Bool { default: Option<bool> },
    /// Plain when `bounds` is empty and there is no default.
    Numeric { scalar: ScalarKind, bounds: Bounds, default: Option<NumberLit> },
    /// Named composite or wrapper class.
    Class(String),
    Sequence { item: Box<TypeExpr>, min_items: Option<usize>, max_items: Option<usize> },
    Tuple { item: Box<TypeExpr>, arity: usize },
    Nullable(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn plain(scalar: ScalarKind) -> Self {
        TypeExpr::Numeric { scalar, bounds: Bounds::default(), default: None }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeExpr::Nullable(_))
    }

    /// The default embedded in the expression, looking through `Nullable`.
    pub fn default_literal(&self) -> Option<Literal> {
        match self {
            TypeExpr::Text { default } | TypeExpr::Literals { default, .. } => {
                default.clone().map(Literal::Str)
            }
            TypeExpr::Bool { default } => default.map(Literal::Bool),
            TypeExpr::Numeric { default, .. } => default.map(Literal::Number),
            TypeExpr::Nullable(inner) => inner.default_literal(),
            TypeExpr::Class(_) | TypeExpr::Sequence { .. } | TypeExpr::Tuple { .. } => None,
        }
    }

    pub fn nullable(self) -> Self {
        match self {
            TypeExpr::Nullable(_) => self,
            other => TypeExpr::Nullable(Box::new(other)),
        }
    }
}

/// Language-neutral rendering, used in logs and in the render context.
impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Text { .. } => f.write_str("str"),
            TypeExpr::Literals { values, .. } => {
                let quoted: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
                write!(f, "literal[{}]", quoted.join(", "))
            }
            TypeExpr::Bool { .. } => f.write_str("bool"),
            TypeExpr::Numeric { scalar, bounds, .. } => {
                write!(f, "{scalar}")?;
                let cs = bounds.constraints();
                if !cs.is_empty() {
                    let parts: Vec<String> = cs.iter().map(|(op, lim)| format!("{op} {lim}")).collect();
                    write!(f, "({})", parts.join(", "))?;
                }
                Ok(())
            }
            TypeExpr::Class(name) => f.write_str(name),
            TypeExpr::Sequence { item, min_items, max_items } => {
                write!(f, "list[{item}]")?;
                match (min_items, max_items) {
                    (None, None) => Ok(()),
                    (mn, mx) => write!(
                        f,
                        "({}..{})",
                        mn.map(|m| m.to_string()).unwrap_or_default(),
                        mx.map(|m| m.to_string()).unwrap_or_default()
                    ),
                }
            }
            TypeExpr::Tuple { item, arity } => write!(f, "tuple[{item}; {arity}]"),
            TypeExpr::Nullable(inner) => write!(f, "optional[{inner}]"),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// DESCRIPTORS & CLASSES
// ————————————————————————————————————————————————————————————————————————————

/// Target shape for the coercion procedure: containers outermost first, then the leaf scalar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CoercionShape {
    pub containers: Vec<ContainerKind>,
    pub scalar: Option<ScalarKind>,
}

impl CoercionShape {
    pub fn scalar(kind: ScalarKind) -> Self {
        CoercionShape { containers: Vec::new(), scalar: Some(kind) }
    }

    /// Wrap this shape in one more container level.
    pub fn within(mut self, container: ContainerKind) -> Self {
        self.containers.insert(0, container);
        self
    }
}

/// Synthesis output for one schema node in one naming context.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// The type enforced at runtime.
    pub expression: TypeExpr,
    /// The type seen by static analysis, when it differs from `expression`.
    pub analysis: Option<TypeExpr>,
    /// Classes that must be defined before the class embedding this type.
    pub auxiliary: Vec<ClassDefinition>,
    pub needs_coercion: bool,
    pub coercion: CoercionShape,
}

impl TypeDescriptor {
    pub fn plain(expression: TypeExpr) -> Self {
        TypeDescriptor {
            expression,
            analysis: None,
            auxiliary: Vec::new(),
            needs_coercion: false,
            coercion: CoercionShape::default(),
        }
    }

    pub fn has_static_runtime_split(&self) -> bool {
        self.analysis.is_some()
    }

    pub fn analysis_expression(&self) -> &TypeExpr {
        self.analysis.as_ref().unwrap_or(&self.expression)
    }

    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        self.coercion.scalar
    }

    pub fn container_kind(&self) -> Option<ContainerKind> {
        self.coercion.containers.first().copied()
    }

    pub fn make_nullable(&mut self) {
        self.expression = self.expression.clone().nullable();
        if let Some(analysis) = self.analysis.take() {
            self.analysis = Some(analysis.nullable());
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub descriptor: TypeDescriptor,
    pub required: bool,
    /// Value used when an optional field is omitted. Always `None` for required fields.
    pub default: Option<Literal>,
    pub doc: Option<String>,
}

impl FieldDef {
    pub fn coerce(&self) -> bool {
        self.descriptor.needs_coercion
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClassBody {
    /// Named fields; an empty list is the explicit "empty" marker.
    Record(Vec<FieldDef>),
    /// Single-value wrapper attaching a constraint to a contained scalar.
    Root(TypeExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDefinition {
    pub name: String,
    pub description: Option<String>,
    pub body: ClassBody,
    pub auxiliary: Vec<ClassDefinition>,
}

impl ClassDefinition {
    pub fn root(name: impl Into<String>, expression: TypeExpr) -> Self {
        ClassDefinition {
            name: name.into(),
            description: None,
            body: ClassBody::Root(expression),
            auxiliary: Vec::new(),
        }
    }

    pub fn fields(&self) -> &[FieldDef] {
        match &self.body {
            ClassBody::Record(fields) => fields,
            ClassBody::Root(_) => &[],
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields().iter().find(|f| f.name == name)
    }

    pub fn is_empty(&self) -> bool {
        matches!(&self.body, ClassBody::Record(fields) if fields.is_empty())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// REGISTRY
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Publish,
    Subscribe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRegistryEntry {
    pub topic: String,
    pub message_type: String,
    pub direction: Direction,
}
