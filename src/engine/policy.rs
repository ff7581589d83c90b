/*!

[`Policy`] is the engine's public entry point: an immutable rule set, priority relation, and Hasse
diagram built once by [`Policy::parse`]/[`Policy::new`], driven by [`Policy::infer`]'s saturation
loop (§4.7) against a caller-supplied context.

*/

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Display, Formatter};

use crate::DEFAULT_MAX_DEPTH;
use crate::IString;
use crate::abstractions::errors::{RuntimeError, SyntaxError};
use crate::abstractions::join_string;
use crate::api::context::Context;
use crate::api::literal::Literal;
use crate::api::rule::Rule;
use crate::engine::dilemma::{Dilemma, RulePair};
use crate::engine::hasse::HasseDiagram;
use crate::engine::inference_graph::{record_provenance, InferenceGraph, Provenance};
use crate::engine::priority::PriorityRelation;

/// How a policy's `@Priorities` section resolves conflicts between candidate-conflicting rules.
#[derive(Clone, Debug)]
pub enum PriorityMode {
  /// `default`: declaration order is priority order (§4.6).
  Default,
  /// Explicit `high > low;` declarations, as `(high, low)` rule-name pairs.
  Explicit(HashSet<(IString, IString)>),
}

#[derive(Clone, Debug)]
pub struct Policy {
  rules: HashMap<IString, Rule>,
  declaration_order: Vec<IString>,
  priorities: PriorityRelation,
  hasse: HasseDiagram,
  pub inferences: Context,
  pub dilemmas: HashMap<Literal, Dilemma>,
  pub inferred_by: Provenance,
}

impl Policy {
  /// Builds a policy from its rules (in declaration order) and its priority mode. The Hasse
  /// diagram and priority relation are both built once, here, and never touched again (§9).
  pub fn new(rules: Vec<Rule>, priority_mode: PriorityMode) -> Self {
    let declaration_order: Vec<IString> = rules.iter().map(|rule| rule.name.clone()).collect();
    let by_name: HashMap<IString, Rule> = rules.into_iter().map(|rule| (rule.name.clone(), rule)).collect();
    let hasse = HasseDiagram::build(by_name.values());
    let priorities = match priority_mode {
      PriorityMode::Default => PriorityRelation::default_order(&by_name, &declaration_order),
      PriorityMode::Explicit(pairs) => PriorityRelation::new(&by_name, pairs),
    };

    Policy {
      rules: by_name,
      declaration_order,
      priorities,
      hasse,
      inferences: Context::new(),
      dilemmas: HashMap::new(),
      inferred_by: HashMap::new(),
    }
  }

  /// Builds a policy from an already-built [`PriorityRelation`] (used by [`Policy::from_dict`],
  /// whose dict form carries a fully-specified priority relation rather than a [`PriorityMode`]
  /// to recompute one from).
  fn from_parts(rules: Vec<Rule>, priorities: PriorityRelation) -> Self {
    let declaration_order: Vec<IString> = rules.iter().map(|rule| rule.name.clone()).collect();
    let by_name: HashMap<IString, Rule> = rules.into_iter().map(|rule| (rule.name.clone(), rule)).collect();
    let hasse = HasseDiagram::build(by_name.values());

    Policy {
      rules: by_name,
      declaration_order,
      priorities,
      hasse,
      inferences: Context::new(),
      dilemmas: HashMap::new(),
      inferred_by: HashMap::new(),
    }
  }

  pub fn parse(source: &str) -> Result<Self, SyntaxError> {
    crate::parser::policy::parse_policy(source)
  }

  pub fn rules(&self) -> impl Iterator<Item = &Rule> {
    self.declaration_order.iter().map(|name| &self.rules[name])
  }

  pub fn priorities(&self) -> &PriorityRelation {
    &self.priorities
  }

  /// Runs the saturation loop (§4.7) against `context` until a round adds nothing new or
  /// `max_depth` rounds have run (default [`DEFAULT_MAX_DEPTH`]), populating `inferences`,
  /// `dilemmas`, and `inferred_by`. Consumes `context`: the marked working copy the loop mutates
  /// in place *is* the caller's context, not a borrowed clone of it (§5 still deep-copies before
  /// this point happens internally, in `InferenceGraph::build`'s read of the initial state).
  pub fn infer(&mut self, context: Context, max_depth: Option<u32>) {
    let max_depth = max_depth.unwrap_or(DEFAULT_MAX_DEPTH);
    let starting_size = context.len();
    crate::log::info!(0, "infer: {} rule(s), {} starting fact(s), max_depth={}", self.rules.len(), starting_size, max_depth);

    let mut marked = context;
    let mut dilemmas: HashMap<Literal, Dilemma> = HashMap::new();
    let mut inferred_by: Provenance = HashMap::new();

    let mut graph = InferenceGraph::build(&self.rules, &self.hasse, &marked);

    for round in 0..max_depth {
      graph.remove_conflicts_with(&marked);
      let surviving = graph.consistent_rule_instances(&self.rules);

      let mut new_added = false;
      let mut cursor = self.hasse.iter();

      while let Some(rule_name) = cursor.next_rule() {
        let Some(subs) = surviving.get(rule_name) else {
          cursor.update_last_call(false);
          continue;
        };
        let rule = &self.rules[rule_name];

        let mut matched_any = false;
        for sub in subs {
          if !rule.is_triggered(&marked, sub) {
            crate::log::trace!(1, "round {round}: {rule_name} under {sub} no longer triggered, skipping");
            continue;
          }
          matched_any = true;

          let instance = sub.apply(&rule.head);

          let is_prior = match self.priorities.is_prior(rule_name, &surviving, sub) {
            Ok(decision) => decision,
            Err(err) => {
              let (_, pairs) = err
                  .as_unresolved_conflicts()
                  .expect("is_prior only ever fails with unresolved-conflicts once every rule it names is known to exist");
              crate::log::debug!(1, "round {round}: {rule_name} -> {instance} is an unresolved dilemma against {} rule(s)", pairs.len());
              record_dilemma(&mut dilemmas, &instance, pairs);
              false
            }
          };

          if !is_prior {
            crate::log::trace!(1, "round {round}: {rule_name} -> {instance} defeated by priority");
            continue;
          }

          if marked.add(instance.clone()).is_err() {
            continue;
          }
          crate::log::debug!(1, "round {round}: {rule_name} -> {instance} accepted");
          record_provenance(&mut inferred_by, instance, rule_name, sub.clone());
          new_added = true;
        }

        cursor.update_last_call(matched_any);
      }

      if !new_added {
        crate::log::trace!(1, "round {round}: no new facts, saturation complete");
        break;
      }
    }

    crate::log::info!(
      0,
      "infer: done, {} fact(s) derived beyond the {} starting fact(s), {} dilemma(s)",
      marked.len() - starting_size,
      starting_size,
      dilemmas.len(),
    );

    self.inferences = marked;
    self.dilemmas = dilemmas;
    self.inferred_by = inferred_by;
  }

  /// The round-trippable dictionary form (§6): a policy's *definition* — its rules and priority
  /// relation — not the transient `inferences`/`dilemmas`/`inferred_by` state `infer` populates,
  /// matching what `Policy::parse` itself builds.
  pub fn to_dict(&self) -> serde_json::Value {
    serde_json::json!({
      "rules": self.rules().map(Rule::to_dict).collect::<Vec<_>>(),
      "priorities": self.priorities.to_dict(),
    })
  }

  pub fn from_dict(value: &serde_json::Value) -> Result<Self, RuntimeError> {
    let malformed = || RuntimeError::malformed_dict(value.to_string());
    let rules = value
        .get("rules")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(malformed)?
        .iter()
        .map(Rule::from_dict)
        .collect::<Result<Vec<_>, _>>()?;
    let priorities = PriorityRelation::from_dict(value.get("priorities").ok_or_else(malformed)?)?;
    Ok(Policy::from_parts(rules, priorities))
  }
}

fn record_dilemma(dilemmas: &mut HashMap<Literal, Dilemma>, instance: &Literal, pairs: &[(String, String)]) {
  let positive = if instance.sign { instance.clone() } else { instance.with_flipped_sign() };
  let rule_pairs = pairs.iter().map(|(a, b)| RulePair::new(a.clone(), b.clone()));
  let incoming = Dilemma::new(positive.clone(), rule_pairs);
  dilemmas
      .entry(positive.clone())
      .or_insert_with(|| Dilemma::new(positive, std::iter::empty()))
      .union(&incoming);
}

impl Display for Policy {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    writeln!(f, "@Policy")?;
    for rule in self.rules() {
      writeln!(f, "{rule};")?;
    }
    write!(f, "@Priorities ")?;
    if self.priorities.is_default() {
      write!(f, "default;")
    } else {
      write!(f, "{}", join_string(self.priorities.pairs().map(|(high, low)| format!("{high} > {low}")), "; "))
    }
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

  fn penguin_policy() -> Policy {
    let mut priorities = HashSet::new();
    priorities.insert((IString::from("R2"), IString::from("R1")));
    Policy::new(
      vec![
        Rule::new("R1", vec![Literal::new("bird", true, vec![var("X")])], Literal::new("flies", true, vec![var("X")])),
        Rule::new("R2", vec![Literal::new("penguin", true, vec![var("X")])], Literal::new("flies", false, vec![var("X")])),
      ],
      PriorityMode::Explicit(priorities),
    )
  }

  #[test]
  fn priority_resolves_the_penguin_dilemma() {
    let mut policy = penguin_policy();
    let mut context = Context::new();
    context.add(Literal::new("bird", true, vec![entity("tweety")])).unwrap();
    context.add(Literal::new("penguin", true, vec![entity("tweety")])).unwrap();

    policy.infer(context, None);

    assert!(policy.inferences.contains(&Literal::new("flies", false, vec![entity("tweety")])));
    assert!(!policy.inferences.contains(&Literal::new("flies", true, vec![entity("tweety")])));
    assert!(policy.dilemmas.is_empty());
  }

  #[test]
  fn missing_priority_is_recorded_as_a_dilemma_and_neither_side_is_inferred() {
    let mut policy = Policy::new(
      vec![
        Rule::new("R1", vec![Literal::new("p", true, vec![])], Literal::new("q", true, vec![])),
        Rule::new("R2", vec![Literal::new("p", true, vec![])], Literal::new("q", false, vec![])),
      ],
      PriorityMode::Explicit(HashSet::new()),
    );

    let mut context = Context::new();
    context.add(Literal::propositional("p", true)).unwrap();

    policy.infer(context, None);

    assert!(!policy.inferences.contains(&Literal::propositional("q", true)));
    assert!(!policy.inferences.contains(&Literal::propositional("q", false)));
    assert_eq!(policy.dilemmas.len(), 1);
  }

  #[test]
  fn default_priority_mode_prefers_later_declared_rule() {
    let policy = Policy::new(
      vec![
        Rule::new("R1", vec![Literal::new("bird", true, vec![var("X")])], Literal::new("flies", true, vec![var("X")])),
        Rule::new("R2", vec![Literal::new("penguin", true, vec![var("X")])], Literal::new("flies", false, vec![var("X")])),
      ],
      PriorityMode::Default,
    );
    assert!(policy.priorities().is_default());
  }

  #[test]
  fn transitive_chain_saturates_fully() {
    let mut policy = Policy::new(
      vec![
        Rule::new("R1", vec![Literal::new("a", true, vec![])], Literal::new("b", true, vec![])),
        Rule::new("R2", vec![Literal::new("b", true, vec![])], Literal::new("c", true, vec![])),
        Rule::new("R3", vec![Literal::new("c", true, vec![])], Literal::new("d", true, vec![])),
      ],
      PriorityMode::Default,
    );
    let mut context = Context::new();
    context.add(Literal::propositional("a", true)).unwrap();

    policy.infer(context, None);

    assert!(policy.inferences.contains(&Literal::propositional("d", true)));
  }

  #[test]
  fn policy_dict_round_trips_rules_and_priorities() {
    let policy = penguin_policy();
    let dict = policy.to_dict();
    let mut restored = Policy::from_dict(&dict).unwrap();

    assert_eq!(restored.rules().count(), policy.rules().count());

    let mut context = Context::new();
    context.add(Literal::new("bird", true, vec![entity("tweety")])).unwrap();
    context.add(Literal::new("penguin", true, vec![entity("tweety")])).unwrap();
    restored.infer(context, None);

    assert!(restored.inferences.contains(&Literal::new("flies", false, vec![entity("tweety")])));
  }
}
