//! Definition-before-use ordering.
//!
//! Each class carries the classes it embeds in `auxiliary`. Flattening is a
//! stable post-order walk: auxiliaries first, owner after, every name emitted
//! once at its first-discovered position.

use std::collections::HashSet;

use crate::ir::ClassDefinition;

pub fn flatten(classes: &[ClassDefinition]) -> Vec<&ClassDefinition> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for class in classes {
        visit(class, &mut seen, &mut out);
    }
    out
}

fn visit<'a>(
    class: &'a ClassDefinition,
    seen: &mut HashSet<&'a str>,
    out: &mut Vec<&'a ClassDefinition>,
) {
    if seen.contains(class.name.as_str()) {
        return;
    }
    for aux in &class.auxiliary {
        visit(aux, seen, out);
    }
    if seen.insert(&class.name) {
        tracing::trace!(class = %class.name, position = out.len(), "hoisted");
        out.push(class);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ClassBody, ScalarKind, TypeExpr};

    fn record(name: &str, auxiliary: Vec<ClassDefinition>) -> ClassDefinition {
        ClassDefinition {
            name: name.into(),
            description: None,
            body: ClassBody::Record(Vec::new()),
            auxiliary,
        }
    }

    fn names(classes: &[ClassDefinition]) -> Vec<&str> {
        flatten(classes).into_iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn auxiliaries_precede_owners() {
        let wrapper = ClassDefinition::root("AItem", TypeExpr::plain(ScalarKind::Int));
        let inner = record("AInner", vec![wrapper]);
        let a = record("A", vec![inner, record("AOther", vec![])]);
        let b = record("B", vec![]);
        assert_eq!(names(&[a, b]), ["AItem", "AInner", "AOther", "A", "B"]);
    }

    #[test]
    fn repeated_names_keep_first_position() {
        let shared = record("Shared", vec![]);
        let a = record("A", vec![shared.clone()]);
        let b = record("B", vec![shared]);
        assert_eq!(names(&[a, b]), ["Shared", "A", "B"]);
    }
}
