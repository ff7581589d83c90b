/*!

A [`Context`] is a hash-bucketed multiset of ground literals: a map from a literal's signature to
the set of facts sharing that signature.

Unlike the source this engine is modeled on, iteration state never lives on the `Context` itself
(§9 design notes): `Context::iter` returns a fresh, reified iterator value each call, so nested
iteration over the same context — which the saturation loop and the Hasse diagram's rule matching
both need — is always safe.

*/

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use crate::abstractions::errors::RuntimeError;
use crate::abstractions::join_string;
use crate::api::literal::Literal;
use crate::api::substitution::Substitution;
use crate::parser;

/// The result of looking up a literal's bucket. A missing bucket is not an error: it is the
/// ordinary "this rule body literal cannot match" outcome, consumed by the Hasse diagram's
/// pruning feedback (`update_last_call(false)`), never thrown (§9).
#[derive(Debug, Clone)]
pub enum ContextLookup {
  /// No fact in the context shares this literal's signature.
  NoBucket,
  /// The (possibly empty) list of substitutions produced by unifying against every fact in the
  /// matching bucket.
  Matches(Vec<Substitution>),
}

impl ContextLookup {
  pub fn is_no_bucket(&self) -> bool {
    matches!(self, ContextLookup::NoBucket)
  }

  pub fn into_substitutions(self) -> Vec<Substitution> {
    match self {
      ContextLookup::NoBucket => Vec::new(),
      ContextLookup::Matches(substitutions) => substitutions,
    }
  }
}

#[derive(Clone, Debug, Default)]
pub struct Context {
  buckets: HashMap<String, Vec<Literal>>,
  size: usize,
}

impl Context {
  pub fn new() -> Self {
    Context::default()
  }

  pub fn parse(source: &str) -> Result<Self, crate::abstractions::errors::SyntaxError> {
    parser::context::parse_context(source)
  }

  pub fn len(&self) -> usize {
    self.size
  }

  pub fn is_empty(&self) -> bool {
    self.size == 0
  }

  pub fn contains(&self, literal: &Literal) -> bool {
    self.buckets
        .get(&literal.signature())
        .map(|bucket| bucket.contains(literal))
        .unwrap_or(false)
  }

  /// Inserts `literal`. Fails with `LiteralAlreadyInContext` if an identical (up to variable
  /// renaming) literal is already present.
  pub fn add(&mut self, literal: Literal) -> Result<(), RuntimeError> {
    let bucket = self.buckets.entry(literal.signature()).or_default();
    if bucket.contains(&literal) {
      return Err(RuntimeError::literal_already_in_context(literal.to_string()));
    }
    bucket.push(literal);
    self.size += 1;
    Ok(())
  }

  /// Removes `literal` if present, pruning the bucket if it becomes empty. Returns whether
  /// anything was removed.
  pub fn remove(&mut self, literal: &Literal) -> bool {
    let signature = literal.signature();
    let Some(bucket) = self.buckets.get_mut(&signature) else { return false };
    let before = bucket.len();
    bucket.retain(|candidate| candidate != literal);
    let removed = bucket.len() != before;
    if removed {
      self.size -= before - bucket.len();
    }
    if bucket.is_empty() {
      self.buckets.remove(&signature);
    }
    removed
  }

  /// Attempts to unify `query` against every fact sharing its signature. A truism unifies
  /// vacuously, without a lookup. A missing bucket reports `ContextLookup::NoBucket` rather than
  /// an empty match list, so callers can distinguish "no facts of this shape exist" from "facts
  /// exist but none unify" — the Hasse diagram's pruning feedback depends on that distinction.
  pub fn unify(&self, query: &Literal) -> ContextLookup {
    if query.is_truism() {
      return ContextLookup::Matches(vec![Substitution::new()]);
    }

    match self.buckets.get(&query.signature()) {
      None => ContextLookup::NoBucket,
      Some(bucket) => {
        let substitutions = bucket
            .iter()
            .filter_map(|fact| fact.unify(query))
            .collect();
        ContextLookup::Matches(substitutions)
      }
    }
  }

  /// The defeat operation (§4.3): for every literal `m` in `marked`, removes from `self` every
  /// fact conflicting with `m`. Looks up the bucket keyed by `m`'s sign-flipped signature, since
  /// a conflict always has the opposite sign.
  pub fn remove_conflicts_with(&mut self, marked: &Context) {
    for m in marked.iter() {
      let flipped_signature = m.with_flipped_sign().signature();
      let Some(bucket) = self.buckets.get_mut(&flipped_signature) else { continue };
      let before = bucket.len();
      bucket.retain(|fact| !fact.is_conflicting_with(m));
      self.size -= before - bucket.len();
      if bucket.is_empty() {
        self.buckets.remove(&flipped_signature);
      }
    }
  }

  /// A fresh, reified iterator over every fact in the context, across all buckets. Order is
  /// unspecified but stable for the lifetime of a single borrow.
  pub fn iter(&self) -> ContextIter<'_> {
    ContextIter { buckets: self.buckets.values(), current: None }
  }

  /// The round-trippable dictionary form (§6): a flat list of fact dicts. Bucketing by signature
  /// is an index, not attribute data, so it is not reflected in the dict form; `from_dict`
  /// rebuilds the buckets from scratch as each fact is re-added.
  pub fn to_dict(&self) -> serde_json::Value {
    serde_json::json!({"facts": self.iter().map(Literal::to_dict).collect::<Vec<_>>()})
  }

  pub fn from_dict(value: &serde_json::Value) -> Result<Self, RuntimeError> {
    let malformed = || RuntimeError::malformed_dict(value.to_string());
    let facts = value.get("facts").and_then(serde_json::Value::as_array).ok_or_else(malformed)?;
    let mut context = Context::new();
    for fact in facts {
      let literal = Literal::from_dict(fact)?;
      let _ = context.add(literal);
    }
    Ok(context)
  }
}

impl<'a> IntoIterator for &'a Context {
  type Item = &'a Literal;
  type IntoIter = ContextIter<'a>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

/// A reified, reentrancy-safe iterator over a [`Context`]'s facts. Unlike the source this engine
/// is modeled on, no cursor state is stored on `Context` itself, so two `ContextIter`s over the
/// same context can be advanced independently (e.g. one nested inside the other).
pub struct ContextIter<'a> {
  buckets: std::collections::hash_map::Values<'a, String, Vec<Literal>>,
  current: Option<std::slice::Iter<'a, Literal>>,
}

impl<'a> Iterator for ContextIter<'a> {
  type Item = &'a Literal;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      if let Some(current) = self.current.as_mut() {
        if let Some(literal) = current.next() {
          return Some(literal);
        }
      }
      self.current = Some(self.buckets.next()?.iter());
    }
  }
}

impl Display for Context {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let rendered = join_string(self.iter(), "; ");
    write!(f, "{rendered}")
  }
}

impl PartialEq for Context {
  fn eq(&self, other: &Self) -> bool {
    if self.size != other.size {
      return false;
    }
    self.iter().all(|literal| other.contains(literal))
  }
}

impl Eq for Context {}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::term::{Constant, Term};

  fn entity_literal(name: &str, arg: &str) -> Literal {
    Literal::new(name, true, vec![Term::Constant(Constant::entity(arg))])
  }

  #[test]
  fn add_remove_round_trip() {
    let mut context = Context::new();
    let literal = entity_literal("bird", "tweety");
    context.add(literal.clone()).unwrap();
    assert!(context.contains(&literal));
    assert!(context.remove(&literal));
    assert!(!context.contains(&literal));
    assert!(context.is_empty());
  }

  #[test]
  fn add_duplicate_fails() {
    let mut context = Context::new();
    let literal = entity_literal("bird", "tweety");
    context.add(literal.clone()).unwrap();
    assert!(context.add(literal).is_err());
  }

  #[test]
  fn unify_missing_bucket_reports_no_bucket() {
    let context = Context::new();
    let lookup = context.unify(&entity_literal("bird", "tweety"));
    assert!(lookup.is_no_bucket());
  }

  #[test]
  fn unify_existing_bucket_reports_matches() {
    let mut context = Context::new();
    context.add(entity_literal("bird", "tweety")).unwrap();
    let pattern = Literal::new(
      "bird",
      true,
      vec![Term::Variable(crate::api::term::Variable::new("X"))],
    );
    let lookup = context.unify(&pattern);
    match lookup {
      ContextLookup::Matches(substitutions) => assert_eq!(substitutions.len(), 1),
      ContextLookup::NoBucket => panic!("expected a bucket"),
    }
  }

  #[test]
  fn remove_conflicts_with_defeats_opposing_facts() {
    let mut context = Context::new();
    context.add(entity_literal("flies", "tweety")).unwrap();

    let mut marked = Context::new();
    marked.add(Literal::new(
      "flies",
      false,
      vec![Term::Constant(Constant::entity("tweety"))],
    )).unwrap();

    context.remove_conflicts_with(&marked);
    assert!(context.is_empty());
  }

  #[test]
  fn nested_iteration_is_reentrant() {
    let mut context = Context::new();
    context.add(entity_literal("bird", "alice")).unwrap();
    context.add(entity_literal("penguin", "alice")).unwrap();

    let mut outer_count = 0;
    for _ in context.iter() {
      outer_count += 1;
      let inner_count = context.iter().count();
      assert_eq!(inner_count, 2);
    }
    assert_eq!(outer_count, 2);
  }

  #[test]
  fn dict_round_trips_facts() {
    let mut context = Context::new();
    context.add(entity_literal("bird", "alice")).unwrap();
    context.add(entity_literal("penguin", "alice")).unwrap();

    let dict = context.to_dict();
    let restored = Context::from_dict(&dict).unwrap();
    assert_eq!(context, restored);
  }
}
