/*!

[`PriorityRelation`] is the conflict-resolution referee (§4.6): a directed "defeats" relation over
rule names, plus the derived map of which rules are *candidate* conflicts (same head predicate,
opposite sign) for a given rule. `is_prior` decides whether one rule instance survives against
every other currently-matching rule instance it actually conflicts with.

*/

use std::collections::{HashMap, HashSet};

use crate::IString;
use crate::abstractions::errors::RuntimeError;
use crate::api::literal::Literal;
use crate::api::rule::Rule;
use crate::api::substitution::Substitution;

#[derive(Clone, Debug, Default)]
pub struct PriorityRelation {
  heads: HashMap<IString, Literal>,
  /// `(high, low)`: `high` defeats `low` when they actually conflict.
  priorities: HashSet<(IString, IString)>,
  /// `candidate_conflicts[r]` is every rule whose head predicate matches `r`'s head predicate
  /// with the opposite sign — a *candidate* conflict, not yet checked against any substitution.
  candidate_conflicts: HashMap<IString, HashSet<IString>>,
  default: bool,
}

impl PriorityRelation {
  /// Builds the relation from explicit `(high, low)` pairs over rule names.
  pub fn new(rules: &HashMap<IString, Rule>, priorities: HashSet<(IString, IString)>) -> Self {
    PriorityRelation {
      heads: rules.iter().map(|(name, rule)| (name.clone(), rule.head.clone())).collect(),
      priorities,
      candidate_conflicts: candidate_conflicts(rules),
      default: false,
    }
  }

  /// "Default" mode (§4.6): declaration order is priority order. For every pair of rules whose
  /// heads are candidate conflicts, the later-declared rule defeats the earlier one.
  pub fn default_order(rules: &HashMap<IString, Rule>, declaration_order: &[IString]) -> Self {
    let candidate_conflicts = candidate_conflicts(rules);
    let mut priorities = HashSet::new();
    for (later_position, later) in declaration_order.iter().enumerate() {
      let Some(conflicts) = candidate_conflicts.get(later) else { continue };
      for earlier in conflicts {
        let earlier_position = declaration_order.iter().position(|name| name == earlier).unwrap_or(0);
        if earlier_position < later_position {
          priorities.insert((later.clone(), earlier.clone()));
        }
      }
    }
    PriorityRelation {
      heads: rules.iter().map(|(name, rule)| (name.clone(), rule.head.clone())).collect(),
      priorities,
      candidate_conflicts,
      default: true,
    }
  }

  pub fn is_default(&self) -> bool {
    self.default
  }

  pub fn pairs(&self) -> impl Iterator<Item = &(IString, IString)> {
    self.priorities.iter()
  }

  fn defeats(&self, high: &IString, low: &IString) -> bool {
    self.priorities.contains(&(high.clone(), low.clone()))
  }

  /// Decides whether the instance `(rule_name, sub)` survives conflict resolution against every
  /// other rule currently matching the same context (§4.6).
  ///
  /// Scans every candidate-conflicting rule; for each one that *actually* conflicts (some
  /// matching substitution of the candidate produces a head instance that conflicts with this
  /// instance's head), consults `priorities`. A pair with no declared order is recorded as a
  /// dilemma and scanning continues, so every simultaneous dilemma is collected before reporting
  /// (§4.6 step 5) — rather than aborting on the first one found.
  pub fn is_prior(
    &self,
    rule_name: &IString,
    all_matching_rules: &HashMap<IString, Vec<Substitution>>,
    sub: &Substitution,
  ) -> Result<bool, RuntimeError> {
    let Some(head) = self.heads.get(rule_name) else {
      return Err(RuntimeError::rule_not_found(rule_name.to_string()));
    };
    let target_head = sub.apply(head);

    let candidates = self.candidate_conflicts.get(rule_name);
    let mut is_prior = true;
    let mut dilemmas: HashSet<(IString, IString)> = HashSet::new();

    if let Some(candidates) = candidates {
      for candidate_name in candidates {
        if candidate_name == rule_name {
          continue;
        }
        let Some(candidate_subs) = all_matching_rules.get(candidate_name) else { continue };
        let Some(candidate_head) = self.heads.get(candidate_name) else { continue };

        let actually_conflicts = candidate_subs
            .iter()
            .any(|candidate_sub| candidate_sub.apply(candidate_head).is_conflicting_with(&target_head));
        if !actually_conflicts {
          continue;
        }

        if self.defeats(rule_name, candidate_name) {
          continue;
        }
        if self.defeats(candidate_name, rule_name) {
          return Ok(false);
        }

        let mut pair = [rule_name.clone(), candidate_name.clone()];
        pair.sort();
        dilemmas.insert((pair[0].clone(), pair[1].clone()));
        is_prior = false;
      }
    }

    if !dilemmas.is_empty() {
      let pairs: Vec<(String, String)> = dilemmas
          .into_iter()
          .map(|(a, b)| (a.to_string(), b.to_string()))
          .collect();
      return Err(RuntimeError::unresolved_conflicts(target_head.to_string(), pairs.len(), pairs));
    }

    Ok(is_prior)
  }

  /// The round-trippable dictionary form (§6): each rule's head literal (so `candidate_conflicts`
  /// can be recomputed on load rather than stored redundantly), the explicit `(high, low)` pairs,
  /// and whether this relation is in `default` mode.
  pub fn to_dict(&self) -> serde_json::Value {
    let mut heads = serde_json::Map::new();
    for (name, head) in &self.heads {
      heads.insert(name.to_string(), head.to_dict());
    }
    let pairs: Vec<Vec<String>> = self.priorities.iter().map(|(high, low)| vec![high.to_string(), low.to_string()]).collect();
    serde_json::json!({"heads": heads, "priorities": pairs, "default": self.default})
  }

  pub fn from_dict(value: &serde_json::Value) -> Result<Self, RuntimeError> {
    let malformed = || RuntimeError::malformed_dict(value.to_string());

    let heads_obj = value.get("heads").and_then(serde_json::Value::as_object).ok_or_else(malformed)?;
    let mut heads: HashMap<IString, Literal> = HashMap::new();
    for (name, head_dict) in heads_obj {
      heads.insert(IString::from(name.as_str()), Literal::from_dict(head_dict)?);
    }

    let mut priorities: HashSet<(IString, IString)> = HashSet::new();
    for pair in value.get("priorities").and_then(serde_json::Value::as_array).ok_or_else(malformed)? {
      let pair = pair.as_array().ok_or_else(malformed)?;
      if pair.len() != 2 {
        return Err(malformed());
      }
      let high = pair[0].as_str().ok_or_else(malformed)?;
      let low = pair[1].as_str().ok_or_else(malformed)?;
      priorities.insert((IString::from(high), IString::from(low)));
    }

    let default = value.get("default").and_then(serde_json::Value::as_bool).ok_or_else(malformed)?;
    let candidate_conflicts = candidate_conflicts_from_heads(&heads);

    Ok(PriorityRelation { heads, priorities, candidate_conflicts, default })
  }
}

fn candidate_conflicts(rules: &HashMap<IString, Rule>) -> HashMap<IString, HashSet<IString>> {
  let heads: HashMap<IString, Literal> = rules.iter().map(|(name, rule)| (name.clone(), rule.head.clone())).collect();
  candidate_conflicts_from_heads(&heads)
}

fn candidate_conflicts_from_heads(heads: &HashMap<IString, Literal>) -> HashMap<IString, HashSet<IString>> {
  let mut result: HashMap<IString, HashSet<IString>> = HashMap::new();
  for (name, head) in heads {
    let mut conflicts = HashSet::new();
    for (other_name, other_head) in heads {
      if name == other_name {
        continue;
      }
      if head.name == other_head.name && head.sign != other_head.sign {
        conflicts.insert(other_name.clone());
      }
    }
    result.insert(name.clone(), conflicts);
  }
  result
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::term::{Constant, Term, Variable};

  fn var(name: &str) -> Term {
    Term::Variable(Variable::new(name))
  }

  fn entity(name: &str) -> Term {
    Term::Constant(Constant::entity(name))
  }

  fn penguin_rules() -> HashMap<IString, Rule> {
    let mut rules = HashMap::new();
    rules.insert(
      "R1".into(),
      Rule::new("R1", vec![Literal::new("bird", true, vec![var("X")])], Literal::new("flies", true, vec![var("X")])),
    );
    rules.insert(
      "R2".into(),
      Rule::new("R2", vec![Literal::new("penguin", true, vec![var("X")])], Literal::new("flies", false, vec![var("X")])),
    );
    rules
  }

  #[test]
  fn priority_defeats_the_losing_rule() {
    let rules = penguin_rules();
    let mut priorities = HashSet::new();
    priorities.insert(("R2".into(), "R1".into()));
    let relation = PriorityRelation::new(&rules, priorities);

    let mut sub = Substitution::new();
    sub.extend(Variable::new("X"), entity("tweety")).unwrap();

    let mut matching = HashMap::new();
    matching.insert(IString::from("R1"), vec![sub.clone()]);
    matching.insert(IString::from("R2"), vec![sub.clone()]);

    assert!(!relation.is_prior(&"R1".into(), &matching, &sub).unwrap());
    assert!(relation.is_prior(&"R2".into(), &matching, &sub).unwrap());
  }

  #[test]
  fn no_priority_between_conflicting_rules_is_a_dilemma() {
    let rules = penguin_rules();
    let relation = PriorityRelation::new(&rules, HashSet::new());

    let mut sub = Substitution::new();
    sub.extend(Variable::new("X"), entity("tweety")).unwrap();

    let mut matching = HashMap::new();
    matching.insert(IString::from("R1"), vec![sub.clone()]);
    matching.insert(IString::from("R2"), vec![sub.clone()]);

    let err = relation.is_prior(&"R1".into(), &matching, &sub).unwrap_err();
    assert!(matches!(err, RuntimeError::UnresolvedConflicts { .. }));
  }

  #[test]
  fn non_conflicting_rules_never_produce_a_dilemma() {
    let mut rules = HashMap::new();
    rules.insert(
      "R1".into(),
      Rule::new("R1", vec![Literal::new("a", true, vec![])], Literal::new("b", true, vec![])),
    );
    let relation = PriorityRelation::new(&rules, HashSet::new());
    let sub = Substitution::new();
    let mut matching = HashMap::new();
    matching.insert(IString::from("R1"), vec![sub.clone()]);
    assert!(relation.is_prior(&"R1".into(), &matching, &sub).unwrap());
  }

  #[test]
  fn default_order_favours_later_declared_rule() {
    let rules = penguin_rules();
    let declaration_order = vec![IString::from("R1"), IString::from("R2")];
    let relation = PriorityRelation::default_order(&rules, &declaration_order);

    let mut sub = Substitution::new();
    sub.extend(Variable::new("X"), entity("tweety")).unwrap();
    let mut matching = HashMap::new();
    matching.insert(IString::from("R1"), vec![sub.clone()]);
    matching.insert(IString::from("R2"), vec![sub.clone()]);

    assert!(!relation.is_prior(&"R1".into(), &matching, &sub).unwrap());
    assert!(relation.is_prior(&"R2".into(), &matching, &sub).unwrap());
  }

  #[test]
  fn priority_relation_dict_round_trips() {
    let rules = penguin_rules();
    let mut priorities = HashSet::new();
    priorities.insert(("R2".into(), "R1".into()));
    let relation = PriorityRelation::new(&rules, priorities);

    let dict = relation.to_dict();
    let restored = PriorityRelation::from_dict(&dict).unwrap();

    assert_eq!(relation.priorities, restored.priorities);
    assert_eq!(relation.default, restored.default);
    assert_eq!(relation.candidate_conflicts, restored.candidate_conflicts);
  }
}
