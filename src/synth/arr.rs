use crate::error::CompileError;
use crate::ir::{ContainerKind, TypeDescriptor, TypeExpr};
use crate::schema::ArraySchema;

use super::Synthesizer;

/// Array nodes: recurse into the item with `nested = true`, then pick the container.
///
/// `minItems == maxItems` yields a fixed-arity tuple, anything else a sequence.
/// Coercion is needed when the item needs it or when any length bound is present.
pub(super) fn synthesize(
    cx: &mut Synthesizer,
    a: &ArraySchema,
    name: &str,
    parent_name: &str,
) -> Result<TypeDescriptor, CompileError> {
    if let (Some(mn), Some(mx)) = (a.min_items, a.max_items) {
        if mn > mx {
            return Err(cx.invalid(format!("minItems {mn} exceeds maxItems {mx}")));
        }
    }

    let item = cx.synthesize(&a.items, name, parent_name, true, true)?;

    let fixed = match (a.min_items, a.max_items) {
        (Some(mn), Some(mx)) if mn == mx => Some(mn),
        _ => None,
    };
    let bounded = a.min_items.is_some() || a.max_items.is_some();

    let wrap = |inner: TypeExpr| match fixed {
        Some(arity) => TypeExpr::Tuple { item: Box::new(inner), arity },
        None => TypeExpr::Sequence {
            item: Box::new(inner),
            min_items: a.min_items,
            max_items: a.max_items,
        },
    };
    let container = match fixed {
        Some(arity) => ContainerKind::Tuple(arity),
        None => ContainerKind::List,
    };

    Ok(TypeDescriptor {
        expression: wrap(item.expression),
        analysis: item.analysis.map(wrap),
        auxiliary: item.auxiliary,
        needs_coercion: item.needs_coercion || bounded,
        coercion: item.coercion.within(container),
    })
}
