/*!

A [`Rule`] is a named `body ⇒ head` implication: an ordered list of body [`Literal`]s together
with a single head literal. Rules are matched against a [`Context`] by a worklist search over
partial substitutions (§4.4): one substitution set per body literal processed so far, extended
literal by literal.

[`RuleSignature`] is the `|`-joined, sorted signature the [`super::super::engine::hasse::HasseDiagram`]
groups rules by; its `is_subsignature` is the order-preserving subsequence test the diagram's
partial order is built from.

*/

use std::fmt::{self, Display, Formatter};

use crate::IString;
use crate::abstractions::errors::RuntimeError;
use crate::abstractions::join_string;
use crate::api::context::{Context, ContextLookup};
use crate::api::literal::Literal;
use crate::api::substitution::Substitution;

/// A rule's body signature: the sorted list of its body literals' signatures. Two rules whose
/// bodies have the same literal-signature multiset (regardless of literal order or argument
/// identity) share a `RuleSignature` and therefore a node in the Hasse diagram.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RuleSignature {
  literal_signatures: Vec<String>,
}

impl RuleSignature {
  pub fn new(literal_signatures: Vec<String>) -> Self {
    RuleSignature { literal_signatures }
  }

  /// Parses the `|`-joined textual form produced by [`Rule::compute_signature`].
  pub fn parse(signature: &str) -> Self {
    let literal_signatures = signature
        .split('|')
        .filter(|piece| !piece.is_empty())
        .map(str::to_string)
        .collect();
    RuleSignature { literal_signatures }
  }

  pub fn len(&self) -> usize {
    self.literal_signatures.len()
  }

  pub fn is_empty(&self) -> bool {
    self.literal_signatures.is_empty()
  }

  pub fn as_text(&self) -> String {
    self.literal_signatures.join("|")
  }

  /// The ordered literal-signatures making up this body signature.
  pub fn literal_signatures(&self) -> &[String] {
    &self.literal_signatures
  }

  /// Whether `self`'s literal-signatures occur, in order, as a (not necessarily contiguous)
  /// subsequence of `other`'s. This is the partial order the Hasse diagram orders rule bodies by
  /// (§4.5): `self ≤ other`.
  pub fn is_subsignature(&self, other: &RuleSignature) -> bool {
    let mut start = 0usize;
    for literal_signature in &self.literal_signatures {
      match other.literal_signatures[start..].iter().position(|candidate| candidate == literal_signature) {
        Some(relative) => start += relative + 1,
        None => return false,
      }
    }
    true
  }
}

impl Display for RuleSignature {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_text())
  }
}

/// The result of matching a rule's body against a context: either some body literal has no
/// matching bucket at all (the rule is dead on this context, §4.4/§9 — the Hasse diagram's
/// pruning feedback is driven by this, never by a thrown exception), or the (possibly empty) set
/// of substitutions that satisfy the whole body.
#[derive(Clone, Debug)]
pub enum RuleMatch {
  NoBucket,
  Substitutions(Vec<Substitution>),
}

impl RuleMatch {
  pub fn is_no_bucket(&self) -> bool {
    matches!(self, RuleMatch::NoBucket)
  }
}

#[derive(Clone, Debug)]
pub struct Rule {
  pub original_string: String,
  pub name: IString,
  pub body: Vec<Literal>,
  pub head: Literal,
  pub signature: String,
}

impl Rule {
  pub fn new(name: impl Into<IString>, body: Vec<Literal>, head: Literal) -> Self {
    let signature = Rule::compute_signature(&body);
    let name = name.into();
    Rule {
      original_string: String::new(),
      name,
      body,
      head,
      signature,
    }
  }

  pub fn parse(text: &str) -> Result<Self, crate::abstractions::errors::SyntaxError> {
    crate::parser::rule::parse_rule(text)
  }

  /// `|`-join of sorted body-literal signatures (§4.4). Two rules with identical bodies up to
  /// literal reordering share a signature.
  pub fn compute_signature(body: &[Literal]) -> String {
    let mut signatures: Vec<String> = body.iter().map(Literal::signature).collect();
    signatures.sort();
    signatures.join("|")
  }

  pub fn rule_signature(&self) -> RuleSignature {
    RuleSignature::parse(&self.signature)
  }

  /// Matches this rule's body against `context` (§4.4): a worklist of partial substitutions,
  /// extended one body literal at a time. If any body literal (under the substitutions
  /// accumulated so far) has no matching bucket in `context`, the whole match is
  /// `RuleMatch::NoBucket` — the rule cannot fire here regardless of the remaining body, and the
  /// caller (the Hasse iterator's feedback) treats this as a pruning signal. If some literal's
  /// bucket exists but no branch survives unification, the match is a silent empty result, not
  /// `NoBucket` (§7).
  pub fn match_context(&self, context: &Context) -> RuleMatch {
    search(&self.body, context, vec![Substitution::new()])
  }

  /// Applies the head to every substitution produced by [`Rule::match_context`], pairing each
  /// head instance with the substitution that produced it.
  pub fn trigger(&self, context: &Context) -> RuleMatchTrigger {
    match self.match_context(context) {
      RuleMatch::NoBucket => RuleMatchTrigger::NoBucket,
      RuleMatch::Substitutions(substitutions) => {
        let inferences = substitutions
            .into_iter()
            .map(|sub| {
              let instance = sub.apply(&self.head);
              (instance, sub)
            })
            .collect();
        RuleMatchTrigger::Inferences(inferences)
      }
    }
  }

  /// Whether the body, specialised by `sub`, is still satisfied by `context` (§4.4). Used by the
  /// saturation loop to re-validate a cached rule instance after the context has shrunk under
  /// `remove_conflicts_with`. Matches the source's behaviour of applying `sub` to every body
  /// literal first and then re-running the ordinary search with a fresh substitution, rather than
  /// seeding the search with `sub` itself — any variables `sub` left unbound are free to bind to
  /// whatever the (possibly now-smaller) context still offers.
  pub fn is_triggered(&self, context: &Context, sub: &Substitution) -> bool {
    let instantiated_body: Vec<Literal> = self.body.iter().map(|literal| sub.apply(literal)).collect();
    match search(&instantiated_body, context, vec![Substitution::new()]) {
      RuleMatch::NoBucket => false,
      RuleMatch::Substitutions(substitutions) => !substitutions.is_empty(),
    }
  }

  /// The round-trippable dictionary form (§6): `name`, `body` (a list of literal dicts), `head`
  /// (a literal dict), and `body_signature` (the precomputed `|`-joined signature, kept alongside
  /// rather than only recomputed, since it is named as an attribute in §3).
  pub fn to_dict(&self) -> serde_json::Value {
    serde_json::json!({
      "name": self.name.to_string(),
      "body": self.body.iter().map(Literal::to_dict).collect::<Vec<_>>(),
      "head": self.head.to_dict(),
      "body_signature": self.signature,
    })
  }

  pub fn from_dict(value: &serde_json::Value) -> Result<Self, RuntimeError> {
    let malformed = || RuntimeError::malformed_dict(value.to_string());
    let name = value.get("name").and_then(serde_json::Value::as_str).ok_or_else(malformed)?;
    let body = value
        .get("body")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(malformed)?
        .iter()
        .map(Literal::from_dict)
        .collect::<Result<Vec<_>, _>>()?;
    let head = Literal::from_dict(value.get("head").ok_or_else(malformed)?)?;
    Ok(Rule::new(name, body, head))
  }
}

/// The result of [`Rule::trigger`]: propagates `NoBucket` the same way [`RuleMatch`] does, so
/// callers driving the Hasse iterator can tell "no bucket at all" (prune) from "zero inferences"
/// (no signal either way beyond having matched).
#[derive(Clone, Debug)]
pub enum RuleMatchTrigger {
  NoBucket,
  Inferences(Vec<(Literal, Substitution)>),
}

/// The worklist search shared by [`Rule::match_context`] and [`Rule::is_triggered`]: processes
/// `body` literal by literal, carrying forward the set of partial substitutions that satisfy
/// every literal seen so far.
///
/// Per §5, a substitution is only cloned when a body literal's unification against `context`
/// yields more than one extension; the last extension reuses the incoming substitution rather
/// than cloning it.
fn search(body: &[Literal], context: &Context, initial: Vec<Substitution>) -> RuleMatch {
  let mut current = initial;

  for literal in body {
    let mut next: Vec<Substitution> = Vec::new();

    for sub in current.drain(..) {
      let instance = sub.apply(literal);
      let extensions = match context.unify(&instance) {
        ContextLookup::NoBucket => return RuleMatch::NoBucket,
        ContextLookup::Matches(extensions) => extensions,
      };

      let count = extensions.len();
      let mut carrier = Some(sub);
      for (index, extension) in extensions.into_iter().enumerate() {
        let is_last = index + 1 == count;
        let mut candidate = if is_last {
          carrier.take().expect("carrier consumed at most once before the last extension")
        } else {
          carrier.clone().expect("carrier still present before the last extension")
        };
        if candidate.extend_with(&extension).is_ok() {
          next.push(candidate);
        }
      }
    }

    if next.is_empty() {
      return RuleMatch::Substitutions(Vec::new());
    }
    current = next;
  }

  RuleMatch::Substitutions(current)
}

impl Display for Rule {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} :: {} implies {}", self.name, join_string(self.body.iter(), ", "), self.head)
  }
}

impl PartialEq for Rule {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name && self.body == other.body && self.head == other.head
  }
}

impl Eq for Rule {}
