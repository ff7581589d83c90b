//! Hasse-diagram pruning (§4.5): a one-literal rule body that fails to match should prune every
//! rule whose body is a strict supersequence of it, without the cursor ever visiting them.

use defeasible_core::api::Rule;
use defeasible_core::engine::HasseDiagram;

fn rules() -> Vec<Rule> {
  let mut rules = vec![Rule::parse("R1:: a implies x").expect("R1 parses")];
  for index in 2..=10 {
    let text = format!("R{index}:: a, b{index} implies y{index}");
    rules.push(Rule::parse(&text).expect("generated rule parses"));
  }
  rules
}

#[test]
fn failing_root_prunes_every_supersignature_rule() {
  let rules = rules();
  let diagram = HasseDiagram::build(&rules);
  assert_eq!(diagram.node_count(), 10);

  let mut cursor = diagram.iter();
  let mut visited = Vec::new();

  // R1's body (just `a`) is a subsignature of every other rule's body (`a, b_i`), so failing it
  // should prune the other nine in one step: the cursor must stop after R1 alone.
  let first = cursor.next_rule().expect("at least one rule").to_string();
  visited.push(first.clone());
  assert_eq!(first, "R1");
  cursor.update_last_call(false);

  assert!(cursor.next_rule().is_none(), "R1 failing should have pruned every R2..R10 candidate");
}

#[test]
fn matching_root_leaves_every_supersignature_rule_reachable() {
  let rules = rules();
  let diagram = HasseDiagram::build(&rules);

  let mut cursor = diagram.iter();
  let first = cursor.next_rule().expect("at least one rule").to_string();
  assert_eq!(first, "R1");
  cursor.update_last_call(true);

  let mut remaining = Vec::new();
  while let Some(name) = cursor.next_rule() {
    remaining.push(name.to_string());
  }
  remaining.sort();
  let expected: Vec<String> = (2..=10).map(|index| format!("R{index}")).collect();
  assert_eq!(remaining, expected, "a match should not prune any node");
}
