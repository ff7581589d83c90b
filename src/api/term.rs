/*!

`Term = Variable | Constant`, a tagged sum type (no inheritance: see the engine's design notes).

A [`Variable`] unifies unconditionally with anything, subject to substitution consistency. A
[`Constant`] unifies only with an identical constant. Two constants of different runtime type
(an integer and a string, say) never unify even if their textual forms coincide.

*/

use std::fmt::{self, Display, Formatter};
use total_float_wrap::TotalF64;

use crate::IString;
use crate::abstractions::errors::RuntimeError;

#[cfg(feature = "expr")]
use crate::api::substitution::Substitution;

/// A ground value: an integer, a float, a quoted string, or a bare symbolic "entity" name
/// (an identifier used as a value rather than as a predicate or variable).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
  Integer(i64),
  Float(TotalF64),
  Str(IString),
  Entity(IString),
}

impl Constant {
  pub fn integer(value: i64) -> Self {
    Constant::Integer(value)
  }

  pub fn float(value: f64) -> Self {
    Constant::Float(TotalF64::from(value))
  }

  pub fn string(value: impl Into<IString>) -> Self {
    Constant::Str(value.into())
  }

  pub fn entity(value: impl Into<IString>) -> Self {
    Constant::Entity(value.into())
  }

  /// The round-trippable dictionary form (§6): `{"type": <variant name>, "value": ..}`.
  pub fn to_dict(&self) -> serde_json::Value {
    match self {
      Constant::Integer(value) => serde_json::json!({"type": "Integer", "value": value}),
      Constant::Float(value)   => serde_json::json!({"type": "Float", "value": value.0}),
      Constant::Str(value)     => serde_json::json!({"type": "Str", "value": value.to_string()}),
      Constant::Entity(value)  => serde_json::json!({"type": "Entity", "value": value.to_string()}),
    }
  }

  pub fn from_dict(value: &serde_json::Value) -> Result<Self, RuntimeError> {
    let malformed = || RuntimeError::malformed_dict(value.to_string());
    let kind = value.get("type").and_then(serde_json::Value::as_str).ok_or_else(malformed)?;
    let payload = value.get("value").ok_or_else(malformed)?;
    match kind {
      "Integer" => Ok(Constant::Integer(payload.as_i64().ok_or_else(malformed)?)),
      "Float" => Ok(Constant::Float(TotalF64::from(payload.as_f64().ok_or_else(malformed)?))),
      "Str" => Ok(Constant::Str(payload.as_str().ok_or_else(malformed)?.into())),
      "Entity" => Ok(Constant::Entity(payload.as_str().ok_or_else(malformed)?.into())),
      _ => Err(malformed()),
    }
  }
}

impl Display for Constant {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Constant::Integer(value) => write!(f, "{value}"),
      Constant::Float(value)   => write!(f, "{}", value.0),
      Constant::Str(value)     => write!(f, "\"{value}\""),
      Constant::Entity(value)  => write!(f, "{value}"),
    }
  }
}

/// A restricted arithmetic expression over integer constants and variables, evaluated under a
/// substitution to produce a "computed" variable's value. Gated behind the `expr` feature;
/// the source this engine is modeled on evaluates expressions with an unrestricted `eval`, which
/// this type deliberately does not reproduce (see the engine's design notes).
#[cfg(feature = "expr")]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
  Constant(i64),
  Var(IString),
  Add(Box<Expr>, Box<Expr>),
  Sub(Box<Expr>, Box<Expr>),
  Mul(Box<Expr>, Box<Expr>),
  Div(Box<Expr>, Box<Expr>),
}

#[cfg(feature = "expr")]
impl Expr {
  /// Evaluates the expression under a substitution, resolving each `Var` to its bound integer
  /// constant. Fails with `UnassignedVariable` if a referenced variable has no binding, or with
  /// `InvalidEvaluation` on a non-integer binding or division by zero.
  pub fn eval(&self, substitution: &Substitution) -> Result<i64, RuntimeError> {
    match self {
      Expr::Constant(value) => Ok(*value),

      Expr::Var(name) => {
        let variable = Variable::new(name.clone());
        match substitution.get(&variable) {
          Some(Term::Constant(Constant::Integer(value))) => Ok(*value),
          Some(_) => Err(RuntimeError::invalid_evaluation(name.to_string())),
          None => Err(RuntimeError::unassigned_variable(name.to_string())),
        }
      }

      Expr::Add(lhs, rhs) => Ok(lhs.eval(substitution)? + rhs.eval(substitution)?),
      Expr::Sub(lhs, rhs) => Ok(lhs.eval(substitution)? - rhs.eval(substitution)?),
      Expr::Mul(lhs, rhs) => Ok(lhs.eval(substitution)? * rhs.eval(substitution)?),

      Expr::Div(lhs, rhs) => {
        let denominator = rhs.eval(substitution)?;
        if denominator == 0 {
          return Err(RuntimeError::invalid_evaluation(format!("{self}")));
        }
        Ok(lhs.eval(substitution)? / denominator)
      }
    }
  }
}

#[cfg(feature = "expr")]
impl Display for Expr {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Expr::Constant(value) => write!(f, "{value}"),
      Expr::Var(name)       => write!(f, "{name}"),
      Expr::Add(l, r)       => write!(f, "({l} + {r})"),
      Expr::Sub(l, r)       => write!(f, "({l} - {r})"),
      Expr::Mul(l, r)       => write!(f, "({l} * {r})"),
      Expr::Div(l, r)       => write!(f, "({l} / {r})"),
    }
  }
}

/// A symbolic name that may be bound to a term by a substitution, optionally paired with a
/// computed-variable expression (see [`Expr`]).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Variable {
  pub name: IString,
  #[cfg(feature = "expr")]
  pub expression: Option<Expr>,
}

impl Variable {
  pub fn new(name: impl Into<IString>) -> Self {
    Variable {
      name: name.into(),
      #[cfg(feature = "expr")]
      expression: None,
    }
  }

  #[cfg(feature = "expr")]
  pub fn computed(name: impl Into<IString>, expression: Expr) -> Self {
    Variable { name: name.into(), expression: Some(expression) }
  }

  /// The round-trippable dictionary form (§6). The `expr` feature's computed-expression payload
  /// is not part of this form: it is a derived, re-evaluatable artifact of parsing, not ground
  /// data, so a variable round-trips as its bare name.
  pub fn to_dict(&self) -> serde_json::Value {
    serde_json::json!({"name": self.name.to_string()})
  }

  pub fn from_dict(value: &serde_json::Value) -> Result<Self, RuntimeError> {
    let name = value
        .get("name")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| RuntimeError::malformed_dict(value.to_string()))?;
    Ok(Variable::new(name))
  }
}

impl Display for Variable {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

/// `Term = Variable | Constant`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
  Variable(Variable),
  Constant(Constant),
}

impl Term {
  pub fn is_variable(&self) -> bool {
    matches!(self, Term::Variable(_))
  }

  pub fn as_variable(&self) -> Option<&Variable> {
    match self {
      Term::Variable(variable) => Some(variable),
      Term::Constant(_) => None,
    }
  }

  /// Whether two ground constants (no variables involved) are identical. Only meaningful for
  /// `Term::Constant` vs `Term::Constant`; callers needing full unification semantics (variables
  /// included) go through `Literal::unify`, since producing the resulting bindings requires a
  /// `Substitution` to extend.
  pub fn constants_equal(a: &Term, b: &Term) -> bool {
    matches!((a, b), (Term::Constant(x), Term::Constant(y)) if x == y)
  }

  /// The round-trippable dictionary form (§6): `{"type": "Variable"|"Constant", "value": ..}`,
  /// the nested value being the variable's or constant's own dict.
  pub fn to_dict(&self) -> serde_json::Value {
    match self {
      Term::Variable(variable) => serde_json::json!({"type": "Variable", "value": variable.to_dict()}),
      Term::Constant(constant) => serde_json::json!({"type": "Constant", "value": constant.to_dict()}),
    }
  }

  pub fn from_dict(value: &serde_json::Value) -> Result<Self, RuntimeError> {
    let malformed = || RuntimeError::malformed_dict(value.to_string());
    let kind = value.get("type").and_then(serde_json::Value::as_str).ok_or_else(malformed)?;
    let payload = value.get("value").ok_or_else(malformed)?;
    match kind {
      "Variable" => Ok(Term::Variable(Variable::from_dict(payload)?)),
      "Constant" => Ok(Term::Constant(Constant::from_dict(payload)?)),
      _ => Err(malformed()),
    }
  }
}

impl Display for Term {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Term::Variable(variable) => Display::fmt(variable, f),
      Term::Constant(constant) => Display::fmt(constant, f),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn constants_of_different_type_are_not_equal() {
    let int_term = Term::Constant(Constant::Integer(3));
    let str_term = Term::Constant(Constant::Str("3".into()));
    assert!(!Term::constants_equal(&int_term, &str_term));
  }

  #[test]
  fn identical_constants_are_equal() {
    let a = Term::Constant(Constant::entity("alice"));
    let b = Term::Constant(Constant::entity("alice"));
    assert!(Term::constants_equal(&a, &b));
  }

  #[cfg(feature = "expr")]
  #[test]
  fn expr_evaluates_under_substitution() {
    use crate::api::substitution::Substitution;

    let mut substitution = Substitution::new();
    substitution.extend(Variable::new("X"), Term::Constant(Constant::Integer(2))).unwrap();

    let expr = Expr::Add(
      Box::new(Expr::Var("X".into())),
      Box::new(Expr::Constant(3)),
    );
    assert_eq!(expr.eval(&substitution).unwrap(), 5);
  }

  #[cfg(feature = "expr")]
  #[test]
  fn expr_division_by_zero_is_invalid() {
    let substitution = Substitution::new();
    let expr = Expr::Div(Box::new(Expr::Constant(1)), Box::new(Expr::Constant(0)));
    assert!(expr.eval(&substitution).is_err());
  }

  #[test]
  fn constant_dict_round_trips() {
    for constant in [Constant::Integer(7), Constant::float(2.5), Constant::string("hi"), Constant::entity("alice")] {
      let dict = constant.to_dict();
      assert_eq!(Constant::from_dict(&dict).unwrap(), constant);
    }
  }

  #[test]
  fn term_dict_round_trips() {
    let terms = [Term::Variable(Variable::new("X")), Term::Constant(Constant::entity("alice"))];
    for term in terms {
      let dict = term.to_dict();
      assert_eq!(Term::from_dict(&dict).unwrap(), term);
    }
  }
}
