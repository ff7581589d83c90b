/*!

A [`Dilemma`] is the record of an unresolved priority conflict over a single positive head
literal (§4.6/§4.7): the set of unordered rule-name pairs that simultaneously matched, conflicted,
and had no declared priority between them.

*/

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

use crate::IString;
use crate::abstractions::errors::RuntimeError;
use crate::abstractions::join_string;
use crate::api::literal::Literal;

/// An unordered pair of rule names, normalised so `(a, b)` and `(b, a)` compare and hash equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RulePair(IString, IString);

impl RulePair {
  pub fn new(a: impl Into<IString>, b: impl Into<IString>) -> Self {
    let (a, b) = (a.into(), b.into());
    if a <= b { RulePair(a, b) } else { RulePair(b, a) }
  }
}

impl Display for RulePair {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{{{}, {}}}", self.0, self.1)
  }
}

impl RulePair {
  pub fn to_dict(&self) -> serde_json::Value {
    serde_json::json!([self.0.to_string(), self.1.to_string()])
  }

  pub fn from_dict(value: &serde_json::Value) -> Result<Self, RuntimeError> {
    let malformed = || RuntimeError::malformed_dict(value.to_string());
    let pair = value.as_array().ok_or_else(malformed)?;
    if pair.len() != 2 {
      return Err(malformed());
    }
    let a = pair[0].as_str().ok_or_else(malformed)?;
    let b = pair[1].as_str().ok_or_else(malformed)?;
    Ok(RulePair::new(a, b))
  }
}

/// Recorded against the positive literal (§4.6 step 3 always builds the dilemma key from the
/// *positive* head literal, regardless of which side of the conflict was negative). Accumulates
/// across saturation rounds via [`Dilemma::union`], since the same head may become the subject of
/// a fresh dilemma in a later round as the context grows.
#[derive(Clone, Debug)]
pub struct Dilemma {
  pub literal: Literal,
  pub conflicts: HashSet<RulePair>,
}

impl Dilemma {
  pub fn new(literal: Literal, conflicts: impl IntoIterator<Item = RulePair>) -> Self {
    Dilemma { literal, conflicts: conflicts.into_iter().collect() }
  }

  /// Merges another dilemma's conflict pairs into this one. Panics in debug builds if the two
  /// dilemmas are not in fact about the same head literal, since that would indicate a bookkeeping
  /// bug in the saturation loop rather than a legitimate case to silently ignore.
  pub fn union(&mut self, other: &Dilemma) {
    debug_assert_eq!(self.literal, other.literal, "merged dilemmas must share a head literal");
    self.conflicts.extend(other.conflicts.iter().cloned());
  }

  /// The round-trippable dictionary form (§6): the positive head `literal` and the set of
  /// conflicting rule-name pairs, each as a two-element list.
  pub fn to_dict(&self) -> serde_json::Value {
    serde_json::json!({
      "literal": self.literal.to_dict(),
      "conflicts": self.conflicts.iter().map(RulePair::to_dict).collect::<Vec<_>>(),
    })
  }

  pub fn from_dict(value: &serde_json::Value) -> Result<Self, RuntimeError> {
    let malformed = || RuntimeError::malformed_dict(value.to_string());
    let literal = Literal::from_dict(value.get("literal").ok_or_else(malformed)?)?;
    let conflicts = value
        .get("conflicts")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(malformed)?
        .iter()
        .map(RulePair::from_dict)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Dilemma::new(literal, conflicts))
  }
}

impl Display for Dilemma {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}: [{}]", self.literal, join_string(self.conflicts.iter(), ", "))
  }
}

impl PartialEq for Dilemma {
  fn eq(&self, other: &Self) -> bool {
    self.literal == other.literal && self.conflicts == other.conflicts
  }
}

impl Eq for Dilemma {}
