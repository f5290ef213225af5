//! Dependency analysis of derived fields
//!
//! Edges come from the placeholder tokens actually present in each formula.
//! Declared `parent_fields` are only checked against them.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::aggregates::FormSchema;
use crate::domain::value_objects::{referenced_fields, FieldId};

/// Authoring problem found in a schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaIssue {
    /// Formula token names a field that does not exist.
    UnknownReference { field: FieldId, reference: FieldId },
    /// Formula reads a field missing from `parent_fields`.
    UndeclaredParent { field: FieldId, parent: FieldId },
    /// `parent_fields` lists a field the formula never reads.
    UnusedParent { field: FieldId, parent: FieldId },
    /// Derived field reads another derived field. Recompute is a single
    /// pass, so the value may lag one change behind.
    ChainedDerivation { field: FieldId, source: FieldId },
    /// Derived fields that read each other, directly or transitively.
    Cycle { fields: Vec<FieldId> },
    /// Choice field with no options to pick from.
    MissingOptions { field: FieldId },
    /// Several fields share one `order` value.
    DuplicateOrder { order: u32, fields: Vec<FieldId> },
    /// Field flagged derived with a blank formula.
    EmptyFormula { field: FieldId },
}

impl SchemaIssue {
    /// Unknown references and cycles make derived values meaningless.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::UnknownReference { .. } | Self::Cycle { .. })
    }
}

fn join(ids: &[FieldId]) -> String {
    ids.iter().map(FieldId::as_str).collect::<Vec<_>>().join(" -> ")
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaIssue::UnknownReference { field, reference } => {
                write!(f, "{}: formula references unknown field '{}'", field, reference)
            }
            SchemaIssue::UndeclaredParent { field, parent } => {
                write!(f, "{}: formula reads '{}' but it is not a declared parent", field, parent)
            }
            SchemaIssue::UnusedParent { field, parent } => {
                write!(f, "{}: declared parent '{}' is not used by the formula", field, parent)
            }
            SchemaIssue::ChainedDerivation { field, source } => {
                write!(f, "{}: reads derived field '{}'", field, source)
            }
            SchemaIssue::Cycle { fields } => write!(f, "derivation cycle: {}", join(fields)),
            SchemaIssue::MissingOptions { field } => write!(f, "{}: choice field has no options", field),
            SchemaIssue::DuplicateOrder { order, fields } => {
                let ids: Vec<&str> = fields.iter().map(FieldId::as_str).collect();
                write!(f, "order {} is shared by {}", order, ids.join(", "))
            }
            SchemaIssue::EmptyFormula { field } => write!(f, "{}: derived field has no formula", field),
        }
    }
}

/// Which derived fields read which fields.
#[derive(Clone, Debug, Default)]
pub struct DependencyGraph {
    references: BTreeMap<FieldId, Vec<FieldId>>,
    dependents: BTreeMap<FieldId, Vec<FieldId>>,
    issues: Vec<SchemaIssue>,
}

impl DependencyGraph {
    pub fn build(form: &FormSchema) -> Self {
        let mut graph = Self::default();
        let sorted = form.sorted_fields();

        for field in &sorted {
            if field.field_type.is_choice() && field.options().is_empty() {
                graph.issues.push(SchemaIssue::MissingOptions { field: field.id.clone() });
            }
            if field.is_derived && field.formula().is_none() {
                graph.issues.push(SchemaIssue::EmptyFormula { field: field.id.clone() });
            }
        }

        let mut by_order: BTreeMap<u32, Vec<FieldId>> = BTreeMap::new();
        for field in &sorted {
            by_order.entry(field.order).or_default().push(field.id.clone());
        }
        for (order, fields) in by_order {
            if fields.len() > 1 {
                graph.issues.push(SchemaIssue::DuplicateOrder { order, fields });
            }
        }

        let derived: BTreeSet<&str> = form.derived_fields().map(|f| f.id.as_str()).collect();

        for field in form.derived_fields() {
            let Some(formula) = field.formula() else { continue };
            let refs = referenced_fields(formula);
            let declared: &[FieldId] = field
                .derived_logic
                .as_ref()
                .map(|logic| logic.parent_fields.as_slice())
                .unwrap_or_default();

            for reference in &refs {
                if form.field(reference.as_str()).is_none() {
                    graph.issues.push(SchemaIssue::UnknownReference {
                        field: field.id.clone(),
                        reference: reference.clone(),
                    });
                }
                if !declared.contains(reference) {
                    graph.issues.push(SchemaIssue::UndeclaredParent {
                        field: field.id.clone(),
                        parent: reference.clone(),
                    });
                }
                if reference != &field.id && derived.contains(reference.as_str()) {
                    graph.issues.push(SchemaIssue::ChainedDerivation {
                        field: field.id.clone(),
                        source: reference.clone(),
                    });
                }
                graph
                    .dependents
                    .entry(reference.clone())
                    .or_default()
                    .push(field.id.clone());
            }
            for parent in declared {
                if !refs.contains(parent) {
                    graph.issues.push(SchemaIssue::UnusedParent {
                        field: field.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
            graph.references.insert(field.id.clone(), refs);
        }

        let cycles = graph.find_cycles(&derived);
        graph.issues.extend(cycles.into_iter().map(|fields| SchemaIssue::Cycle { fields }));
        graph
    }

    /// Derived fields whose formula reads `field_id`, in render order.
    pub fn dependents_of(&self, field_id: &str) -> &[FieldId] {
        self.dependents.get(field_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Fields read by the formula of derived field `field_id`.
    pub fn references(&self, field_id: &str) -> &[FieldId] {
        self.references.get(field_id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn issues(&self) -> &[SchemaIssue] {
        &self.issues
    }

    pub fn has_cycles(&self) -> bool {
        self.issues.iter().any(|issue| matches!(issue, SchemaIssue::Cycle { .. }))
    }

    pub fn has_blocking_issues(&self) -> bool {
        self.issues.iter().any(SchemaIssue::is_blocking)
    }

    /// Depth-first search over derived-to-derived edges. Each back edge
    /// found yields one cycle.
    fn find_cycles(&self, derived: &BTreeSet<&str>) -> Vec<Vec<FieldId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Active,
            Done,
        }

        fn visit(
            graph: &DependencyGraph,
            derived: &BTreeSet<&str>,
            node: &FieldId,
            marks: &mut BTreeMap<FieldId, Mark>,
            stack: &mut Vec<FieldId>,
            found: &mut Vec<Vec<FieldId>>,
        ) {
            marks.insert(node.clone(), Mark::Active);
            stack.push(node.clone());

            for next in graph.references(node.as_str()) {
                if !derived.contains(next.as_str()) {
                    continue;
                }
                match marks.get(next) {
                    Some(Mark::Active) => {
                        if let Some(start) = stack.iter().position(|id| id == next) {
                            found.push(stack[start..].to_vec());
                        }
                    }
                    Some(Mark::Done) => {}
                    None => visit(graph, derived, next, marks, stack, found),
                }
            }

            stack.pop();
            marks.insert(node.clone(), Mark::Done);
        }

        let mut marks = BTreeMap::new();
        let mut found = Vec::new();
        let mut stack = Vec::new();
        for node in self.references.keys() {
            if !marks.contains_key(node) {
                visit(self, derived, node, &mut marks, &mut stack, &mut found);
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{DerivedLogic, FieldDefinition, FieldType};

    fn input(id: &str, order: u32) -> FieldDefinition {
        FieldDefinition::new(FieldType::Number, order).with_id(id)
    }

    fn derived(id: &str, order: u32, logic: DerivedLogic) -> FieldDefinition {
        FieldDefinition::new(FieldType::Number, order).with_id(id).derived(logic)
    }

    fn form(fields: Vec<FieldDefinition>) -> FormSchema {
        let mut form = FormSchema::untitled();
        for field in fields {
            form.add_field(field).unwrap();
        }
        form
    }

    #[test]
    fn test_clean_schema() {
        let form = form(vec![
            input("qty", 0),
            input("price", 1),
            derived("total", 2, DerivedLogic::inferred("{qty} * {price}")),
        ]);
        let graph = DependencyGraph::build(&form);
        assert!(graph.issues().is_empty(), "{:?}", graph.issues());
        assert_eq!(graph.dependents_of("qty"), &[FieldId::from("total")]);
        assert_eq!(graph.references("total"), &[FieldId::from("qty"), FieldId::from("price")]);
        assert!(graph.dependents_of("total").is_empty());
    }

    #[test]
    fn test_parent_mismatch() {
        let form = form(vec![
            input("a", 0),
            input("b", 1),
            derived("sum", 2, DerivedLogic::new("{a} + {a}").with_parents(["b"])),
        ]);
        let issues = DependencyGraph::build(&form).issues().to_vec();
        assert!(issues.contains(&SchemaIssue::UndeclaredParent {
            field: "sum".into(),
            parent: "a".into()
        }));
        assert!(issues.contains(&SchemaIssue::UnusedParent {
            field: "sum".into(),
            parent: "b".into()
        }));
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_unknown_reference_is_blocking() {
        let form = form(vec![derived("x", 0, DerivedLogic::inferred("{ghost} + 1"))]);
        let graph = DependencyGraph::build(&form);
        assert_eq!(
            graph.issues(),
            &[SchemaIssue::UnknownReference {
                field: "x".into(),
                reference: "ghost".into()
            }]
        );
        assert!(graph.has_blocking_issues());
    }

    #[test]
    fn test_chain_without_cycle() {
        let form = form(vec![
            input("a", 0),
            derived("b", 1, DerivedLogic::inferred("{a} + 1")),
            derived("c", 2, DerivedLogic::inferred("{b} * 2")),
        ]);
        let graph = DependencyGraph::build(&form);
        assert_eq!(
            graph.issues(),
            &[SchemaIssue::ChainedDerivation {
                field: "c".into(),
                source: "b".into()
            }]
        );
        assert!(!graph.has_cycles());
        assert!(!graph.has_blocking_issues());
    }

    #[test]
    fn test_cycle_detected_once() {
        let form = form(vec![
            derived("x", 0, DerivedLogic::inferred("{y} + 1")),
            derived("y", 1, DerivedLogic::inferred("{x} + 1")),
        ]);
        let graph = DependencyGraph::build(&form);
        assert!(graph.has_cycles());
        let cycles: Vec<&SchemaIssue> = graph
            .issues()
            .iter()
            .filter(|i| matches!(i, SchemaIssue::Cycle { .. }))
            .collect();
        assert_eq!(
            cycles,
            vec![&SchemaIssue::Cycle {
                fields: vec!["x".into(), "y".into()]
            }]
        );
    }

    #[test]
    fn test_self_reference_is_cycle() {
        let form = form(vec![derived("x", 0, DerivedLogic::inferred("{x} + 1"))]);
        let graph = DependencyGraph::build(&form);
        assert_eq!(graph.issues(), &[SchemaIssue::Cycle { fields: vec!["x".into()] }]);
    }

    #[test]
    fn test_structural_issues() {
        let form = form(vec![
            FieldDefinition::new(FieldType::Select, 0).with_id("pick").with_options(vec![]),
            input("a", 0),
            FieldDefinition::new(FieldType::Text, 1)
                .with_id("blank")
                .derived(DerivedLogic::new("   ")),
        ]);
        let issues = DependencyGraph::build(&form).issues().to_vec();
        assert!(issues.contains(&SchemaIssue::MissingOptions { field: "pick".into() }));
        assert!(issues.contains(&SchemaIssue::EmptyFormula { field: "blank".into() }));
        assert!(issues.contains(&SchemaIssue::DuplicateOrder {
            order: 0,
            fields: vec!["pick".into(), "a".into()]
        }));
    }

    #[test]
    fn test_display() {
        let issue = SchemaIssue::Cycle {
            fields: vec!["x".into(), "y".into()],
        };
        assert_eq!(issue.to_string(), "derivation cycle: x -> y");
    }
}
