use crate::error::CompileError;
use crate::ir::{ClassDefinition, CoercionShape, NumberLit, ScalarKind, TypeDescriptor, TypeExpr};
use crate::schema::NumericSchema;

use super::{naming, Synthesizer};

/// Integer/number nodes.
///
/// Unconstrained nodes map to the plain scalar. Constrained ones carry their
/// bounds inline, except inside a container where the constraint moves onto a
/// single-value wrapper class named `parent + name + "Item"`.
pub(super) fn synthesize(
    cx: &mut Synthesizer,
    n: &NumericSchema,
    scalar: ScalarKind,
    name: &str,
    parent_name: &str,
    nested: bool,
) -> Result<TypeDescriptor, CompileError> {
    check(cx, n, scalar)?;
    let (bounds, default) = match scalar {
        ScalarKind::Int => (n.bounds().to_int(), n.default.map(NumberLit::to_int)),
        ScalarKind::Float => (n.bounds(), n.default),
    };

    if bounds.is_empty() && default.is_none() {
        return Ok(TypeDescriptor {
            coercion: CoercionShape::scalar(scalar),
            ..TypeDescriptor::plain(TypeExpr::plain(scalar))
        });
    }

    let expression = TypeExpr::Numeric { scalar, bounds, default };
    if !nested {
        return Ok(TypeDescriptor {
            coercion: CoercionShape::scalar(scalar),
            ..TypeDescriptor::plain(expression)
        });
    }

    let wrapper = format!("{}Item", naming::create_name(parent_name, name));
    cx.claim_name(&wrapper)?;
    tracing::debug!(wrapper = %wrapper, "wrapping constrained scalar inside container");
    Ok(TypeDescriptor {
        expression: TypeExpr::Class(wrapper.clone()),
        analysis: Some(TypeExpr::plain(scalar)),
        auxiliary: vec![ClassDefinition::root(wrapper, expression)],
        needs_coercion: true,
        coercion: CoercionShape::scalar(scalar),
    })
}

fn check(cx: &Synthesizer, n: &NumericSchema, scalar: ScalarKind) -> Result<(), CompileError> {
    let bounds = n.bounds();
    let lower = bounds.minimum.or(bounds.exclusive_minimum);
    let upper = bounds.maximum.or(bounds.exclusive_maximum);
    if let (Some(lo), Some(hi)) = (lower, upper) {
        if lo.as_f64() > hi.as_f64() {
            return Err(cx.invalid(format!("lower bound {lo} exceeds upper bound {hi}")));
        }
    }
    if let Some(d) = n.default {
        if scalar == ScalarKind::Int && !d.is_integral() {
            return Err(cx.invalid(format!("default {d} is not an integer")));
        }
        if let Some(violated) = bounds.violation(d) {
            return Err(cx.invalid(format!("default {d} violates bound {violated}")));
        }
    }
    Ok(())
}
