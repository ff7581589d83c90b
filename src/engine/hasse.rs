/*!

The Hasse diagram over rule body-signatures (§4.5): a partial order by literal-signature
subsequence containment, used to skip whole families of rules whose bodies are supersets of a
body that already failed to match the current context.

Unlike the source this engine is modeled on — a dense `dok_matrix` of floats resized at
inference time — adjacency here is [`NatSet`]s of node indices, built once at policy load and
never touched again during inference (§9). The iteration protocol is a value, not an exception:
[`HasseIter`] is a reentrant cursor with an explicit `update_last_call` feedback method, so two
saturation rounds never share cursor state.

*/

use std::collections::BTreeMap;

use crate::IString;
use crate::abstractions::NatSet;
use crate::api::rule::{Rule, RuleSignature};

/// One node per distinct rule body-signature. Several rules may share a node; `rule_names`
/// records all of them, in declaration order.
#[derive(Clone, Debug)]
struct Node {
  signature: RuleSignature,
  rule_names: Vec<IString>,
}

#[derive(Clone, Debug, Default)]
pub struct HasseDiagram {
  nodes: Vec<Node>,
  /// `order[i]` is a node index; `order` is sorted by `(signature length, node index)` ascending
  /// so the initial frontier visits the smallest (most pruning-effective) bodies first (§4.5).
  order: Vec<usize>,
  /// Covering edges: `super_edges[i]` is the set of nodes that directly cover node `i` (the
  /// smallest supersignatures with nothing in between). Transitive reachability over this
  /// adjacency is the full set of supersignatures of `i`, which is exactly what pruning needs to
  /// remove in one pass.
  super_edges: Vec<NatSet>,
}

impl HasseDiagram {
  /// Builds the diagram from a policy's rules, keyed by name. Construction is append-only and
  /// never revisited at inference time (§9).
  pub fn build<'a>(rules: impl IntoIterator<Item = &'a Rule>) -> Self {
    let mut nodes: Vec<Node> = Vec::new();
    let mut index_by_signature: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for rule in rules {
      let index = *index_by_signature.entry(rule.signature.clone()).or_insert_with(|| {
        nodes.push(Node {
          signature: rule.rule_signature(),
          rule_names: Vec::new(),
        });
        nodes.len() - 1
      });
      nodes[index].rule_names.push(rule.name.clone());
    }

    let mut layers: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (index, node) in nodes.iter().enumerate() {
      layers.entry(node.signature.len()).or_default().push(index);
    }

    let super_edges = build_covering_edges(&nodes, &layers);

    let mut order: Vec<usize> = (0..nodes.len()).collect();
    order.sort_by_key(|&index| (nodes[index].signature.len(), index));

    HasseDiagram { nodes, order, super_edges }
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn node_count(&self) -> usize {
    self.nodes.len()
  }

  /// All transitive supersignature nodes of `node`: every node reachable by following covering
  /// edges outward. In a Hasse diagram these edges' transitive closure is exactly the `≤`
  /// relation's upset, so this is the full set pruning needs to discard in one pass (§4.5).
  fn transitive_supersets(&self, node: usize) -> NatSet {
    let mut visited = NatSet::new();
    let mut stack = vec![node];
    while let Some(current) = stack.pop() {
      for parent in self.super_edges[current].iter() {
        if visited.insert(parent) {
          stack.push(parent);
        }
      }
    }
    visited
  }

  /// A fresh, reentrant iteration cursor over this diagram (§4.5/§9). Each outer saturation round
  /// gets its own cursor; the diagram itself carries no iteration state.
  pub fn iter(&self) -> HasseIter<'_> {
    HasseIter {
      diagram: self,
      active: (0..self.nodes.len()).collect(),
      cursor: 0,
      current_node: None,
      current_rule_index: 0,
    }
  }
}

fn build_covering_edges(nodes: &[Node], layers: &BTreeMap<usize, Vec<usize>>) -> Vec<NatSet> {
  let mut super_edges = vec![NatSet::new(); nodes.len()];
  let layer_lengths: Vec<usize> = layers.keys().copied().collect();

  for &length in &layer_lengths {
    for &node_index in &layers[&length] {
      let mut added_supers: Vec<usize> = Vec::new();
      for &larger_length in layer_lengths.iter().filter(|&&candidate_length| candidate_length > length) {
        for &candidate in &layers[&larger_length] {
          let dominated = added_supers
              .iter()
              .any(|&added| nodes[added].signature.is_subsignature(&nodes[candidate].signature));
          if dominated {
            continue;
          }
          if nodes[node_index].signature.is_subsignature(&nodes[candidate].signature) {
            super_edges[node_index].insert(candidate);
            added_supers.push(candidate);
          }
        }
      }
    }
  }

  super_edges
}

/// A reentrant cursor over a [`HasseDiagram`]'s rule names, sorted smallest-body-first, with
/// subsumption pruning driven by [`HasseIter::update_last_call`] (§4.5). Call `next_rule`, then
/// call `update_last_call` once with whether that rule's body matched before calling `next_rule`
/// again.
pub struct HasseIter<'a> {
  diagram: &'a HasseDiagram,
  active: NatSet,
  cursor: usize,
  current_node: Option<usize>,
  current_rule_index: usize,
}

impl<'a> HasseIter<'a> {
  /// Advances to the next rule name, or `None` at end of iteration. Rules sharing the current
  /// node's signature are exhausted before a new node is popped off the (pruning-filtered)
  /// frontier.
  pub fn next_rule(&mut self) -> Option<&'a IString> {
    if let Some(node) = self.current_node {
      let rule_names = &self.diagram.nodes[node].rule_names;
      if self.current_rule_index + 1 < rule_names.len() {
        self.current_rule_index += 1;
        return Some(&rule_names[self.current_rule_index]);
      }
    }

    while self.cursor < self.diagram.order.len() {
      let candidate = self.diagram.order[self.cursor];
      self.cursor += 1;
      if self.active.remove(candidate) {
        self.current_node = Some(candidate);
        self.current_rule_index = 0;
        return Some(&self.diagram.nodes[candidate].rule_names[0]);
      }
    }

    self.current_node = None;
    None
  }

  /// Feedback for the rule name just returned by `next_rule` (§4.5): `true` leaves the frontier
  /// intact; `false` prunes every node that is a transitive supersignature of the current node's
  /// body signature, since those rule bodies strictly extend one that already failed to match.
  pub fn update_last_call(&mut self, matched: bool) {
    if matched {
      return;
    }
    if let Some(node) = self.current_node {
      let supersets = self.diagram.transitive_supersets(node);
      self.active.remove_all(&supersets);
    }
  }
}
