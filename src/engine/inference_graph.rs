/*!

[`InferenceGraph`] is the bulk closure of every rule instance a policy's rules produce against a
context, ignoring conflicts entirely (§4.7): the fixpoint of `rule.trigger` driven by a
[`HasseDiagram`]'s pruning iterator. Its `consistent` view starts as a clone of that closure and
only ever shrinks, under repeated calls to [`InferenceGraph::remove_conflicts_with`] as the
saturation loop accepts more facts into the caller's marked context.

*/

use std::collections::HashMap;

use crate::IString;
use crate::api::context::Context;
use crate::api::literal::Literal;
use crate::api::rule::{Rule, RuleMatchTrigger};
use crate::api::substitution::Substitution;
use crate::engine::hasse::HasseDiagram;

/// Provenance: for each inferred literal, which rules (and under which substitutions) produced
/// it. A `Vec` rather than a `HashSet` of substitutions, since `Substitution` has no total hash —
/// membership is checked by the same equality every other "set over non-hashable keys" in this
/// crate uses (see `Context`'s bucket lookups).
pub type Provenance = HashMap<Literal, HashMap<IString, Vec<Substitution>>>;

#[derive(Clone, Debug)]
pub struct InferenceGraph {
  all: Context,
  consistent: Context,
  inferred_by: Provenance,
}

impl InferenceGraph {
  /// Computes the full, conflict-blind closure of `rules` over `context` (§4.7): repeatedly
  /// drives the Hasse iterator over every rule, triggering it against the closure built so far,
  /// until a full pass adds nothing new. `consistent` starts as a clone of the finished closure.
  pub fn build(rules: &HashMap<IString, Rule>, hasse: &HasseDiagram, context: &Context) -> Self {
    let mut all = context.clone();
    let mut inferred_by: Provenance = HashMap::new();

    loop {
      let mut added_this_pass = false;
      let mut cursor = hasse.iter();

      while let Some(rule_name) = cursor.next_rule() {
        let Some(rule) = rules.get(rule_name) else {
          cursor.update_last_call(false);
          continue;
        };

        match rule.trigger(&all) {
          RuleMatchTrigger::NoBucket => cursor.update_last_call(false),
          RuleMatchTrigger::Inferences(inferences) => {
            let mut matched_anything = false;
            for (instance, sub) in inferences {
              matched_anything = true;
              let is_new = all.add(instance.clone()).is_ok();
              if is_new {
                added_this_pass = true;
              }
              record_provenance(&mut inferred_by, instance, rule_name, sub);
            }
            cursor.update_last_call(matched_anything);
          }
        }
      }

      if !added_this_pass {
        break;
      }
    }

    let consistent = all.clone();
    InferenceGraph { all, consistent, inferred_by }
  }

  /// Every fact ever derived, conflicts included (§4.7's "bulk closure ignoring conflicts").
  pub fn all(&self) -> &Context {
    &self.all
  }

  /// The current surviving view: shrinks every time a new round of accepted facts defeats
  /// opposing ones.
  pub fn consistent(&self) -> &Context {
    &self.consistent
  }

  pub fn inferred_by(&self) -> &Provenance {
    &self.inferred_by
  }

  /// Removes from the consistent view every fact that conflicts with something in `marked`.
  pub fn remove_conflicts_with(&mut self, marked: &Context) {
    self.consistent.remove_conflicts_with(marked);
  }

  /// `{rule_name → substitutions}` for every rule whose body is currently satisfied by the
  /// consistent view (§4.7's `surviving`).
  pub fn consistent_rule_instances(&self, rules: &HashMap<IString, Rule>) -> HashMap<IString, Vec<Substitution>> {
    let mut surviving = HashMap::new();
    for (name, rule) in rules {
      if let crate::api::rule::RuleMatch::Substitutions(subs) = rule.match_context(&self.consistent) {
        if !subs.is_empty() {
          surviving.insert(name.clone(), subs);
        }
      }
    }
    surviving
  }
}

pub(crate) fn record_provenance(inferred_by: &mut Provenance, instance: Literal, rule_name: &IString, sub: Substitution) {
  let by_rule = inferred_by.entry(instance).or_default();
  let subs = by_rule.entry(rule_name.clone()).or_default();
  if !subs.contains(&sub) {
    subs.push(sub);
  }
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

  #[test]
  fn closure_derives_transitively() {
    let mut rules = HashMap::new();
    rules.insert(
      IString::from("R1"),
      Rule::new(
        "R1",
        vec![Literal::new("penguin", true, vec![var("X")])],
        Literal::new("bird", true, vec![var("X")]),
      ),
    );
    rules.insert(
      IString::from("R2"),
      Rule::new(
        "R2",
        vec![Literal::new("bird", true, vec![var("X")])],
        Literal::new("flies", true, vec![var("X")]),
      ),
    );

    let mut context = Context::new();
    context.add(Literal::new("penguin", true, vec![entity("tweety")])).unwrap();

    let hasse = HasseDiagram::build(rules.values());
    let graph = InferenceGraph::build(&rules, &hasse, &context);

    assert!(graph.all().contains(&Literal::new("bird", true, vec![entity("tweety")])));
    assert!(graph.all().contains(&Literal::new("flies", true, vec![entity("tweety")])));
  }

  #[test]
  fn remove_conflicts_with_shrinks_consistent_but_not_all() {
    let mut rules = HashMap::new();
    rules.insert(
      IString::from("R1"),
      Rule::new(
        "R1",
        vec![Literal::new("bird", true, vec![var("X")])],
        Literal::new("flies", true, vec![var("X")]),
      ),
    );

    let mut context = Context::new();
    context.add(Literal::new("bird", true, vec![entity("tweety")])).unwrap();

    let hasse = HasseDiagram::build(rules.values());
    let mut graph = InferenceGraph::build(&rules, &hasse, &context);

    let mut marked = Context::new();
    marked.add(Literal::new("flies", false, vec![entity("tweety")])).unwrap();
    graph.remove_conflicts_with(&marked);

    assert!(!graph.consistent().contains(&Literal::new("flies", true, vec![entity("tweety")])));
    assert!(graph.all().contains(&Literal::new("flies", true, vec![entity("tweety")])));
  }

  #[test]
  fn inferred_by_records_rule_and_substitution() {
    let mut rules = HashMap::new();
    rules.insert(
      IString::from("R1"),
      Rule::new(
        "R1",
        vec![Literal::new("bird", true, vec![var("X")])],
        Literal::new("flies", true, vec![var("X")]),
      ),
    );

    let mut context = Context::new();
    context.add(Literal::new("bird", true, vec![entity("tweety")])).unwrap();

    let hasse = HasseDiagram::build(rules.values());
    let graph = InferenceGraph::build(&rules, &hasse, &context);

    let flies = Literal::new("flies", true, vec![entity("tweety")]);
    let by_rule = graph.inferred_by().get(&flies).expect("flies should have provenance");
    assert!(by_rule.contains_key(&IString::from("R1")));
  }
}
