//! Conversion between the named input model and the index model.
//!
//! Constraint predicates are turned into tuple lists by enumerating the
//! cartesian product of the constraint's own parameters: every value tuple
//! the predicate rejects becomes a tuple of the list. Ids are assigned in
//! declaration order, exclusions first, starting at 1.

use std::collections::BTreeMap;

use crate::combination::Combination;
use crate::combinator::cartesian_product;
use crate::error::ModelError;
use crate::input::{Constraint, InputParameterModel, NamedCombination, ParameterValue};
use crate::types::{TestModel, TupleList, TupleListId};

#[derive(Debug, Clone)]
pub struct IndexModelConverter {
    input: InputParameterModel,
    index: TestModel,
    constraint_names: BTreeMap<TupleListId, String>,
}

impl IndexModelConverter {
    pub fn new(input: &InputParameterModel) -> Result<Self, ModelError> {
        let mut seen = std::collections::HashSet::new();
        for parameter in &input.parameters {
            if !seen.insert(parameter.name.as_str()) {
                return Err(ModelError::DuplicateParameter {
                    name: parameter.name.clone(),
                });
            }
            if parameter.values.is_empty() {
                return Err(ModelError::EmptyParameter {
                    name: parameter.name.clone(),
                });
            }
        }

        let sizes: Vec<u32> = input
            .parameters
            .iter()
            .map(|p| p.values.len() as u32)
            .collect();

        let mut constraint_names = BTreeMap::new();
        let mut next_id = 1u32;
        let mut exclusions = Vec::new();
        for constraint in &input.exclusion_constraints {
            let id = TupleListId(next_id);
            next_id += 1;
            constraint_names.insert(id, constraint.name.clone());
            if let Some(list) = convert_constraint(input, &sizes, id, constraint)? {
                exclusions.push(list);
            }
        }
        let mut errors = Vec::new();
        for constraint in &input.error_constraints {
            let id = TupleListId(next_id);
            next_id += 1;
            constraint_names.insert(id, constraint.name.clone());
            if let Some(list) = convert_constraint(input, &sizes, id, constraint)? {
                errors.push(list);
            }
        }

        let index = TestModel::new(input.strength, sizes, exclusions, errors)?;
        Ok(Self {
            input: input.clone(),
            index,
            constraint_names,
        })
    }

    pub fn index_model(&self) -> &TestModel {
        &self.index
    }

    pub fn input_model(&self) -> &InputParameterModel {
        &self.input
    }

    pub fn parameter_name(&self, parameter: usize) -> Option<&str> {
        self.input
            .parameters
            .get(parameter)
            .map(|p| p.name.as_str())
    }

    pub fn value(&self, parameter: usize, value: u32) -> Option<&ParameterValue> {
        self.input
            .parameters
            .get(parameter)
            .and_then(|p| p.values.get(value as usize))
    }

    pub fn constraint_name(&self, id: TupleListId) -> Option<&str> {
        self.constraint_names.get(&id).map(String::as_str)
    }

    pub fn convert_combination(&self, combination: &Combination) -> NamedCombination {
        let assignments = combination
            .assigned_positions()
            .filter_map(|p| {
                let value = combination.get(p)?;
                let parameter = self.input.parameters.get(p)?;
                let named = parameter.values.get(value as usize)?;
                Some((parameter.name.clone(), named.clone()))
            })
            .collect();
        NamedCombination { assignments }
    }

    /// Inverse of [`Self::convert_combination`].
    pub fn convert_named(&self, named: &NamedCombination) -> Result<Combination, ModelError> {
        let mut combination = Combination::empty(self.input.parameters.len());
        for (name, value) in &named.assignments {
            let index = self
                .input
                .parameter_index(name)
                .ok_or_else(|| ModelError::UnknownParameter { name: name.clone() })?;
            let position = self.input.parameters[index]
                .values
                .iter()
                .position(|v| v == value)
                .ok_or_else(|| ModelError::UnknownValue {
                    parameter: name.clone(),
                    value: value.to_string(),
                })?;
            combination.set(index, position as u32);
        }
        Ok(combination)
    }
}

fn convert_constraint(
    input: &InputParameterModel,
    sizes: &[u32],
    id: TupleListId,
    constraint: &Constraint,
) -> Result<Option<TupleList>, ModelError> {
    let involved = constraint
        .parameter_names
        .iter()
        .map(|name| {
            input
                .parameter_index(name)
                .ok_or_else(|| ModelError::UnknownParameter { name: name.clone() })
        })
        .collect::<Result<Vec<usize>, ModelError>>()?;

    let involved_sizes: Vec<u32> = involved.iter().map(|&p| sizes[p]).collect();
    let rejected: Vec<Vec<u32>> = cartesian_product(&involved_sizes)
        .into_iter()
        .filter(|tuple| {
            let values: Vec<&ParameterValue> = involved
                .iter()
                .zip(tuple)
                .map(|(&p, &v)| &input.parameters[p].values[v as usize])
                .collect();
            !(constraint.predicate)(&values)
        })
        .collect();

    // A predicate that accepts everything constrains nothing.
    if rejected.is_empty() {
        return Ok(None);
    }
    let list = TupleList::new(id, involved, rejected)?;
    Ok(Some(if constraint.marked_as_correct {
        list.mark_as_correct()
    } else {
        list
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Parameter;

    fn browser_model() -> InputParameterModel {
        InputParameterModel::new(
            "browsers",
            2,
            vec![
                Parameter::new("os", ["linux", "windows", "mac"]),
                Parameter::new("browser", ["firefox", "edge", "safari"]),
                Parameter::new("ping", [10i64, 100]),
            ],
        )
        .with_exclusion(Constraint::new("no-safari-off-mac", &["os", "browser"], |v| {
            !(v[1] == &ParameterValue::from("safari") && v[0] != &ParameterValue::from("mac"))
        }))
        .with_error(Constraint::new("slow-ping", &["ping"], |v| {
            v[0] != &ParameterValue::Int(100)
        }))
    }

    #[test]
    fn test_converts_sizes_and_ids() {
        let converter = IndexModelConverter::new(&browser_model()).unwrap();
        let model = converter.index_model();
        assert_eq!(model.sizes(), &[3, 3, 2]);
        assert_eq!(model.exclusions().len(), 1);
        assert_eq!(model.errors().len(), 1);
        assert_eq!(model.exclusions()[0].id(), TupleListId(1));
        assert_eq!(model.errors()[0].id(), TupleListId(2));
        assert_eq!(converter.constraint_name(TupleListId(2)), Some("slow-ping"));
    }

    #[test]
    fn test_rejected_tuples_become_list() {
        let converter = IndexModelConverter::new(&browser_model()).unwrap();
        let exclusion = &converter.index_model().exclusions()[0];
        assert_eq!(exclusion.involved(), &[0, 1]);
        assert_eq!(exclusion.tuples(), &[vec![0, 2], vec![1, 2]]);
        let error = &converter.index_model().errors()[0];
        assert_eq!(error.tuples(), &[vec![1]]);
    }

    #[test]
    fn test_combination_round_trip_with_wildcards() {
        let converter = IndexModelConverter::new(&browser_model()).unwrap();
        let mut c = Combination::empty(3);
        c.set(0, 2);
        c.set(2, 1);
        let named = converter.convert_combination(&c);
        assert_eq!(named.to_string(), "{os=mac, ping=100}");
        assert_eq!(converter.convert_named(&named).unwrap(), c);
    }

    #[test]
    fn test_unknown_parameter_in_constraint() {
        let model = browser_model().with_exclusion(Constraint::new("bad", &["gpu"], |_| true));
        assert!(matches!(
            IndexModelConverter::new(&model),
            Err(ModelError::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_tautological_constraint_is_dropped_but_keeps_id() {
        let model = browser_model().with_error(Constraint::new("never", &["os"], |_| true));
        let converter = IndexModelConverter::new(&model).unwrap();
        assert_eq!(converter.index_model().errors().len(), 1);
        assert_eq!(converter.constraint_name(TupleListId(3)), Some("never"));
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let model = InputParameterModel::new(
            "dup",
            1,
            vec![Parameter::new("a", [1i64]), Parameter::new("a", [2i64])],
        );
        assert!(matches!(
            IndexModelConverter::new(&model),
            Err(ModelError::DuplicateParameter { .. })
        ));
    }
}
