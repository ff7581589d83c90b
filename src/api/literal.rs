/*!

A [`Literal`] is a signed, optionally-marked predicate application: `[-][?|!]name(arg, ..)`.

Marks participate in identity (§3): a literal differs from another of the same name, sign, and
arity if their marks differ, and such literals neither unify nor conflict with each other — `-?p`
is not the negation of `p`.

*/

use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

use enumflags2::{bitflags, BitFlags};

use crate::IString;
use crate::abstractions::errors::RuntimeError;
use crate::abstractions::join_string;
use crate::api::substitution::Substitution;
use crate::api::term::{Term, Variable};

/// The two independent marks a literal's name may carry: `?` (external, intended as
/// externally-resolved or query-like) and `!` (action).
#[bitflags]
#[repr(u8)]
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum LiteralMark {
  External,
  Action,
}

pub type LiteralMarks = BitFlags<LiteralMark, u8>;

#[derive(Clone, Debug)]
pub struct Literal {
  pub name: IString,
  pub sign: bool,
  pub marks: LiteralMarks,
  pub arguments: Vec<Term>,
}

impl Literal {
  pub fn new(name: impl Into<IString>, sign: bool, arguments: Vec<Term>) -> Self {
    Literal { name: name.into(), sign, marks: LiteralMarks::empty(), arguments }
  }

  pub fn propositional(name: impl Into<IString>, sign: bool) -> Self {
    Literal::new(name, sign, Vec::new())
  }

  pub fn with_marks(mut self, marks: LiteralMarks) -> Self {
    self.marks = marks;
    self
  }

  pub fn arity(&self) -> usize {
    self.arguments.len()
  }

  pub fn is_propositional(&self) -> bool {
    self.arity() == 0
  }

  pub fn is_external(&self) -> bool {
    self.marks.contains(LiteralMark::External)
  }

  pub fn is_action(&self) -> bool {
    self.marks.contains(LiteralMark::Action)
  }

  /// The truism is the positive, unmarked, propositional literal named `true`. It unifies
  /// vacuously with anything and is never stored as an ordinary fact.
  pub fn is_truism(&self) -> bool {
    self.sign && self.marks.is_empty() && self.is_propositional() && &*self.name == "true"
  }

  pub fn truism() -> Self {
    Literal::propositional("true", true)
  }

  /// A copy of this literal with its sign flipped. Used by `is_conflicting_with` as a pure,
  /// non-mutating substitute for the source's mutate-then-restore approach.
  pub fn with_flipped_sign(&self) -> Self {
    Literal { sign: !self.sign, ..self.clone() }
  }

  /// `[sign][?][!]name|arity|`, the stable textual key used for hash bucketing and the
  /// Hasse diagram's subsequence containment test.
  pub fn signature(&self) -> String {
    let mut out = String::new();
    if !self.sign {
      out.push('-');
    }
    if self.is_external() {
      out.push('?');
    }
    if self.is_action() {
      out.push('!');
    }
    out.push_str(&self.name);
    out.push('|');
    out.push_str(&self.arity().to_string());
    out.push('|');
    out
  }

  /// Attempts to unify `self` with `other`. Fails unless `name`, `sign`, `arity`, and both marks
  /// agree; then pairwise-unifies arguments, collecting the bindings a variable-bearing side
  /// needs in order to equal the other side. A `DuplicateValue` while collecting those bindings
  /// turns into unification failure, not a propagated error (§7).
  pub fn unify(&self, other: &Literal) -> Option<Substitution> {
    if self.name != other.name
        || self.sign != other.sign
        || self.marks != other.marks
        || self.arity() != other.arity()
    {
      return None;
    }

    if self.is_truism() {
      return Some(Substitution::new());
    }

    let mut substitution = Substitution::new();
    for (left, right) in self.arguments.iter().zip(other.arguments.iter()) {
      let extension: Option<(Variable, Term)> = match (left, right) {
        (Term::Variable(a), Term::Variable(b)) if a == b => None,
        (Term::Variable(a), _) => Some((a.clone(), right.clone())),
        (_, Term::Variable(b)) => Some((b.clone(), left.clone())),
        (Term::Constant(a), Term::Constant(b)) => {
          if a == b {
            None
          } else {
            return None;
          }
        }
      };

      if let Some((variable, term)) = extension {
        if substitution.extend(variable, term).is_err() {
          return None;
        }
      }
    }

    Some(substitution)
  }

  pub fn unifies(&self, other: &Literal) -> bool {
    self.unify(other).is_some()
  }

  /// Two literals conflict iff they have opposite signs and their sign-flipped forms unify.
  /// Marks are part of the signature comparison inside `unify`, so this is asymmetric by
  /// construction: a marked literal never conflicts with an unmarked literal of the same
  /// predicate and opposite sign.
  pub fn is_conflicting_with(&self, other: &Literal) -> bool {
    self.sign != other.sign && self.with_flipped_sign().unify(other).is_some()
  }

  /// The round-trippable dictionary form (§6): attribute names from §3 as keys, `marks` split
  /// into its two independent booleans, `arguments` a list of nested term dicts.
  pub fn to_dict(&self) -> serde_json::Value {
    serde_json::json!({
      "name": self.name.to_string(),
      "sign": self.sign,
      "marks": {
        "external": self.is_external(),
        "action": self.is_action(),
      },
      "arguments": self.arguments.iter().map(Term::to_dict).collect::<Vec<_>>(),
      "arity": self.arity(),
      "signature": self.signature(),
    })
  }

  pub fn from_dict(value: &serde_json::Value) -> Result<Self, RuntimeError> {
    let malformed = || RuntimeError::malformed_dict(value.to_string());
    let name = value.get("name").and_then(serde_json::Value::as_str).ok_or_else(malformed)?;
    let sign = value.get("sign").and_then(serde_json::Value::as_bool).ok_or_else(malformed)?;
    let marks_value = value.get("marks").ok_or_else(malformed)?;
    let external = marks_value.get("external").and_then(serde_json::Value::as_bool).ok_or_else(malformed)?;
    let action = marks_value.get("action").and_then(serde_json::Value::as_bool).ok_or_else(malformed)?;

    let mut marks = LiteralMarks::empty();
    if external {
      marks |= LiteralMark::External;
    }
    if action {
      marks |= LiteralMark::Action;
    }

    let arguments = value
        .get("arguments")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(malformed)?
        .iter()
        .map(Term::from_dict)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Literal::new(name, sign, arguments).with_marks(marks))
  }
}

impl Display for Literal {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    if !self.sign {
      write!(f, "-")?;
    }
    if self.is_external() {
      write!(f, "?")?;
    }
    if self.is_action() {
      write!(f, "!")?;
    }
    write!(f, "{}", self.name)?;
    if !self.is_propositional() {
      write!(f, "({})", join_string(self.arguments.iter(), ", "))?;
    }
    Ok(())
  }
}

/// Literal equality is up to consistent variable renaming (§3): same signature, constants equal
/// position-wise, and each variable in one side maps consistently to a variable in the other by
/// first-occurrence index (so `p(X, X)` equals `p(Y, Y)` but not `p(X, Y)`).
impl PartialEq for Literal {
  fn eq(&self, other: &Self) -> bool {
    if self.signature() != other.signature() {
      return false;
    }

    let mut self_first_seen: Vec<&Variable> = Vec::new();
    let mut other_first_seen: Vec<&Variable> = Vec::new();

    for (a, b) in self.arguments.iter().zip(other.arguments.iter()) {
      match (a, b) {
        (Term::Constant(x), Term::Constant(y)) => {
          if x != y {
            return false;
          }
        }
        (Term::Variable(x), Term::Variable(y)) => {
          let self_index = self_first_seen.iter().position(|v| *v == x);
          let other_index = other_first_seen.iter().position(|v| *v == y);
          match (self_index, other_index) {
            (Some(i), Some(j)) if i == j => {}
            (None, None) => {
              self_first_seen.push(x);
              other_first_seen.push(y);
            }
            _ => return false,
          }
        }
        _ => return false,
      }
    }

    true
  }
}

impl Eq for Literal {}

impl Hash for Literal {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.signature().hash(state);
    let mut seen: Vec<&Variable> = Vec::new();
    for argument in &self.arguments {
      match argument {
        Term::Constant(constant) => constant.hash(state),
        Term::Variable(variable) => {
          let index = match seen.iter().position(|v| *v == variable) {
            Some(i) => i,
            None => {
              seen.push(variable);
              seen.len() - 1
            }
          };
          index.hash(state);
        }
      }
    }
  }
}
