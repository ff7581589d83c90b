/*!

A [`Substitution`] is a partial map from variables to terms, together with a union-find structure
over variables that have been identified with each other but not yet bound to a constant.

The source this engine is modeled on keeps two dictionaries in sync by hand to represent variable
equivalence classes, which is fragile — the mirror update can desync under the wrong sequence of
operations. This implementation instead keeps a single union-find with path compression: a
variable is either bound (present in `bindings`), or it is a member of an equivalence class whose
root is tracked by the union-find, or it is wholly unconstrained (absent from both).

*/

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::abstractions::errors::RuntimeError;
use crate::api::term::{Constant, Term, Variable};
use crate::api::literal::Literal;

#[derive(Clone, Debug, Default)]
struct UnionFind {
  parent: HashMap<Variable, Variable>,
}

impl UnionFind {
  fn has(&self, variable: &Variable) -> bool {
    self.parent.contains_key(variable)
  }

  /// Finds the representative of `variable`'s class, inserting a trivial singleton class for it
  /// if it has never been unioned before. Compresses the path it walks.
  fn find(&mut self, variable: &Variable) -> Variable {
    if !self.parent.contains_key(variable) {
      self.parent.insert(variable.clone(), variable.clone());
      return variable.clone();
    }

    let mut path = Vec::new();
    let mut current = variable.clone();
    loop {
      let next = self.parent.get(&current).expect("checked above").clone();
      if next == current {
        break;
      }
      path.push(current);
      current = next;
    }

    for node in path {
      self.parent.insert(node, current.clone());
    }

    current
  }

  /// Merges the classes of `a` and `b`. A no-op if they are already in the same class.
  fn union(&mut self, a: &Variable, b: &Variable) {
    let root_a = self.find(a);
    let root_b = self.find(b);
    if root_a != root_b {
      self.parent.insert(root_a, root_b);
    }
  }

  fn class_members(&mut self, root: &Variable) -> Vec<Variable> {
    let keys: Vec<Variable> = self.parent.keys().cloned().collect();
    keys.into_iter().filter(|v| self.find(v) == *root).collect()
  }

  fn remove_members(&mut self, members: &[Variable]) {
    for member in members {
      self.parent.remove(member);
    }
  }

  /// All distinct classes that currently have more than one member, as representative ->
  /// members-excluding-the-representative. Used by `extend_with` to replay another
  /// substitution's unions.
  fn nontrivial_classes(&mut self) -> Vec<(Variable, Vec<Variable>)> {
    let roots: Vec<Variable> = self.parent.keys().cloned().map(|v| self.find(&v)).collect();
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::new();
    for root in roots {
      if !seen.insert(root.clone()) {
        continue;
      }
      let mut members = self.class_members(&root);
      members.retain(|m| *m != root);
      if !members.is_empty() {
        result.push((root, members));
      }
    }
    result
  }
}

/// A partial map from variables to terms, plus a variable-equivalence structure for variables
/// identified with each other but not yet bound. See [`crate::api::rule::Rule::match_context`]
/// for the primary consumer.
#[derive(Clone, Debug, Default)]
pub struct Substitution {
  bindings: HashMap<Variable, Term>,
  equiv: UnionFind,
}

impl Substitution {
  pub fn new() -> Self {
    Substitution::default()
  }

  pub fn is_empty(&self) -> bool {
    self.bindings.is_empty() && self.equiv.parent.is_empty()
  }

  pub fn len(&self) -> usize {
    self.bindings.len()
  }

  /// The term `variable` is bound to, if any. Variables that are only identified with other
  /// unbound variables (an equivalence class with no constant yet) return `None`, same as a
  /// wholly unconstrained variable.
  pub fn get(&self, variable: &Variable) -> Option<&Term> {
    self.bindings.get(variable)
  }

  pub fn bindings(&self) -> impl Iterator<Item = (&Variable, &Term)> {
    self.bindings.iter()
  }

  /// Extends this substitution with `variable = term`, per the engine's extend semantics (§4.1):
  ///
  /// - `term` a constant: if `variable` is in an equivalence class, every member of the class is
  ///   bound to `term` and the class is dissolved; else if `variable` is unbound, the binding is
  ///   added; else if it is already bound to an equal term, this is a no-op; otherwise this fails
  ///   with `DuplicateValue`.
  /// - `term` a variable: if either side is already bound to a constant, this delegates to the
  ///   constant case using the other side's binding; otherwise the two variables' equivalence
  ///   classes are merged (creating singleton classes as needed).
  pub fn extend(&mut self, variable: Variable, term: Term) -> Result<(), RuntimeError> {
    match term {
      Term::Constant(_) => self.bind_constant(variable, term),
      Term::Variable(other) => self.bind_variable(variable, other),
    }
  }

  fn bind_constant(&mut self, variable: Variable, term: Term) -> Result<(), RuntimeError> {
    if self.equiv.has(&variable) {
      let root = self.equiv.find(&variable);
      let members = self.equiv.class_members(&root);
      for member in &members {
        self.bindings.insert(member.clone(), term.clone());
      }
      self.equiv.remove_members(&members);
      return Ok(());
    }

    match self.bindings.get(&variable) {
      None => {
        self.bindings.insert(variable, term);
        Ok(())
      }
      Some(existing) if *existing == term => Ok(()),
      Some(existing) => Err(RuntimeError::duplicate_value(
        variable.name.to_string(),
        existing.to_string(),
        term.to_string(),
      )),
    }
  }

  fn bind_variable(&mut self, a: Variable, b: Variable) -> Result<(), RuntimeError> {
    if a == b {
      return Ok(());
    }

    if let Some(term) = self.bindings.get(&a).cloned() {
      return self.bind_constant(b, term);
    }
    if let Some(term) = self.bindings.get(&b).cloned() {
      return self.bind_constant(a, term);
    }

    self.equiv.union(&a, &b);
    Ok(())
  }

  /// Applies every binding and every equivalence union from `other` to `self` in turn, failing as
  /// soon as one is inconsistent with what `self` already holds.
  pub fn extend_with(&mut self, other: &Substitution) -> Result<(), RuntimeError> {
    for (variable, term) in other.bindings.iter() {
      self.extend(variable.clone(), term.clone())?;
    }

    let mut scratch = other.equiv.clone();
    for (root, members) in scratch.nontrivial_classes() {
      for member in members {
        self.extend(member, Term::Variable(root.clone()))?;
      }
    }

    Ok(())
  }

  /// Returns a copy of `literal` with every variable argument replaced by its bound term, if it
  /// has one; unbound variables (including those only in an equivalence class) pass through
  /// unchanged. The empty substitution is the identity.
  pub fn apply(&self, literal: &Literal) -> Literal {
    let mut result = literal.clone();
    for argument in result.arguments.iter_mut() {
      if let Term::Variable(variable) = argument {
        if let Some(term) = self.bindings.get(variable) {
          *argument = term.clone();
        }
      }
    }
    result
  }

  /// Applies this substitution to a bare term (used when evaluating a computed variable's
  /// expression arguments, or by callers outside literal application).
  pub fn apply_term(&self, term: &Term) -> Term {
    match term {
      Term::Variable(variable) => self.bindings.get(variable).cloned().unwrap_or_else(|| term.clone()),
      Term::Constant(_) => term.clone(),
    }
  }

  /// The round-trippable dictionary form (§6): `bindings` as a variable-name-keyed object of term
  /// dicts, `equiv` as a list of equivalence classes (each a sorted list of variable names) for
  /// variables identified with each other but not yet bound to a constant.
  pub fn to_dict(&self) -> serde_json::Value {
    let mut bindings = serde_json::Map::new();
    for (variable, term) in &self.bindings {
      bindings.insert(variable.name.to_string(), term.to_dict());
    }

    let mut scratch = self.equiv.clone();
    let equiv: Vec<Vec<String>> = scratch
        .nontrivial_classes()
        .into_iter()
        .map(|(root, members)| {
          let mut class: Vec<String> = members.iter().map(|variable| variable.name.to_string()).collect();
          class.push(root.name.to_string());
          class.sort();
          class
        })
        .collect();

    serde_json::json!({"bindings": bindings, "equiv": equiv})
  }

  pub fn from_dict(value: &serde_json::Value) -> Result<Self, RuntimeError> {
    let malformed = || RuntimeError::malformed_dict(value.to_string());
    let mut substitution = Substitution::new();

    let bindings = value.get("bindings").and_then(serde_json::Value::as_object).ok_or_else(malformed)?;
    for (name, term_dict) in bindings {
      let term = Term::from_dict(term_dict)?;
      substitution.extend(Variable::new(name.as_str()), term)?;
    }

    let equiv = value.get("equiv").and_then(serde_json::Value::as_array).ok_or_else(malformed)?;
    for class in equiv {
      let names = class.as_array().ok_or_else(malformed)?;
      let mut members = names.iter();
      if let Some(first) = members.next() {
        let first_name = first.as_str().ok_or_else(malformed)?;
        for rest in members {
          let rest_name = rest.as_str().ok_or_else(malformed)?;
          substitution.extend(Variable::new(first_name), Term::Variable(Variable::new(rest_name)))?;
        }
      }
    }

    Ok(substitution)
  }
}

impl Display for Substitution {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let mut entries: Vec<String> = self
        .bindings
        .iter()
        .map(|(variable, term)| format!("{variable} = {term}"))
        .collect();
    entries.sort();
    write!(f, "{{{}}}", entries.join(", "))
  }
}

impl PartialEq for Substitution {
  fn eq(&self, other: &Self) -> bool {
    self.bindings == other.bindings
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn var(name: &str) -> Variable {
    Variable::new(name)
  }

  fn int(value: i64) -> Term {
    Term::Constant(Constant::Integer(value))
  }

  #[test]
  fn identity_is_empty() {
    let substitution = Substitution::new();
    assert!(substitution.is_empty());
  }

  #[test]
  fn extend_binds_unbound_variable() {
    let mut substitution = Substitution::new();
    substitution.extend(var("X"), int(1)).unwrap();
    assert_eq!(substitution.get(&var("X")), Some(&int(1)));
  }

  #[test]
  fn extend_with_equal_value_is_noop() {
    let mut substitution = Substitution::new();
    substitution.extend(var("X"), int(1)).unwrap();
    assert!(substitution.extend(var("X"), int(1)).is_ok());
  }

  #[test]
  fn extend_with_conflicting_value_fails() {
    let mut substitution = Substitution::new();
    substitution.extend(var("X"), int(1)).unwrap();
    assert!(substitution.extend(var("X"), int(2)).is_err());
  }

  #[test]
  fn unioned_variables_share_binding_when_one_is_grounded() {
    let mut substitution = Substitution::new();
    substitution.extend(var("X"), Term::Variable(var("Y"))).unwrap();
    substitution.extend(var("Y"), int(7)).unwrap();
    assert_eq!(substitution.get(&var("X")), Some(&int(7)));
    assert_eq!(substitution.get(&var("Y")), Some(&int(7)));
  }

  #[test]
  fn union_then_conflicting_constants_fails() {
    let mut substitution = Substitution::new();
    substitution.extend(var("X"), Term::Variable(var("Y"))).unwrap();
    substitution.extend(var("X"), int(1)).unwrap();
    assert!(substitution.extend(var("Y"), int(2)).is_err());
  }

  #[test]
  fn apply_is_identity_on_empty_substitution() {
    let substitution = Substitution::new();
    let literal = Literal::new("p", true, vec![Term::Variable(var("X"))]);
    assert_eq!(substitution.apply(&literal), literal);
  }

  #[test]
  fn extend_with_merges_another_substitution() {
    let mut a = Substitution::new();
    a.extend(var("X"), int(1)).unwrap();

    let mut b = Substitution::new();
    b.extend(var("Y"), int(2)).unwrap();

    a.extend_with(&b).unwrap();
    assert_eq!(a.get(&var("X")), Some(&int(1)));
    assert_eq!(a.get(&var("Y")), Some(&int(2)));
  }

  #[test]
  fn dict_round_trips_bindings() {
    let mut substitution = Substitution::new();
    substitution.extend(var("X"), int(1)).unwrap();
    substitution.extend(var("Y"), int(2)).unwrap();

    let dict = substitution.to_dict();
    let restored = Substitution::from_dict(&dict).unwrap();
    assert_eq!(restored.get(&var("X")), Some(&int(1)));
    assert_eq!(restored.get(&var("Y")), Some(&int(2)));
  }

  #[test]
  fn apply_is_idempotent_once_every_variable_is_ground() {
    let mut substitution = Substitution::new();
    substitution.extend(var("X"), int(1)).unwrap();
    substitution.extend(var("Y"), int(2)).unwrap();

    let literal = Literal::new("p", true, vec![Term::Variable(var("X")), Term::Variable(var("Y"))]);
    let once = substitution.apply(&literal);
    let twice = substitution.apply(&once);
    assert_eq!(once, twice);
  }

  #[test]
  fn dict_round_trips_unbound_equivalence_classes() {
    let mut substitution = Substitution::new();
    substitution.extend(var("X"), Term::Variable(var("Y"))).unwrap();

    let dict = substitution.to_dict();
    let mut restored = Substitution::from_dict(&dict).unwrap();
    restored.extend(var("Y"), int(9)).unwrap();
    assert_eq!(restored.get(&var("X")), Some(&int(9)));
  }
}
