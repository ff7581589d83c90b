/*!

Parses a single literal argument into a [`Term`] (§6): variables start with an uppercase ASCII
letter, constants are lowercase-starting identifiers ("entities"), integers, floats, or
double-quoted strings.

*/

use crate::abstractions::errors::SyntaxError;
use crate::api::term::{Constant, Term, Variable};

fn is_identifier_tail(character: char) -> bool {
  character.is_ascii_alphanumeric() || character == '_'
}

fn is_identifier(text: &str, first: impl Fn(char) -> bool) -> bool {
  let mut chars = text.chars();
  match chars.next() {
    Some(c) if first(c) => chars.all(is_identifier_tail),
    _ => false,
  }
}

/// Parses one literal argument (§6: "arguments are identifiers; variables start uppercase,
/// constants lowercase or numeric or `"…"`").
pub fn parse_term(text: &str) -> Result<Term, SyntaxError> {
  let text = text.trim();
  if text.is_empty() {
    return Err(SyntaxError::invalid_argument(text.to_string()));
  }

  if is_identifier(text, |c| c.is_ascii_uppercase()) {
    return Ok(Term::Variable(Variable::new(text)));
  }

  parse_constant(text).map(Term::Constant)
}

/// Parses a single constant: integer, float, quoted string, or bare lowercase-starting entity
/// name.
pub fn parse_constant(text: &str) -> Result<Constant, SyntaxError> {
  let text = text.trim();

  if let Ok(value) = text.parse::<i64>() {
    return Ok(Constant::Integer(value));
  }
  if text.contains('.') {
    if let Ok(value) = text.parse::<f64>() {
      return Ok(Constant::Float(total_float_wrap::TotalF64::from(value)));
    }
  }

  if let Some(first) = text.chars().next() {
    if first == '"' || first == '\'' {
      if text.len() < 2 || !text.ends_with(first) {
        return Err(SyntaxError::unmatched_quote(text.to_string(), 0));
      }
      return Ok(Constant::Str(text[1..text.len() - 1].into()));
    }
  }

  if is_identifier(text, |c| c.is_ascii_lowercase()) {
    return Ok(Constant::Entity(text.into()));
  }

  Err(SyntaxError::invalid_argument(text.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_variable() {
    assert!(matches!(parse_term("X").unwrap(), Term::Variable(_)));
  }

  #[test]
  fn parses_entity() {
    match parse_term("tweety").unwrap() {
      Term::Constant(Constant::Entity(name)) => assert_eq!(&*name, "tweety"),
      other => panic!("expected entity, got {other:?}"),
    }
  }

  #[test]
  fn parses_integer() {
    assert_eq!(parse_term("42").unwrap(), Term::Constant(Constant::Integer(42)));
  }

  #[test]
  fn parses_float() {
    assert_eq!(parse_term("4.5").unwrap(), Term::Constant(Constant::Float(total_float_wrap::TotalF64::from(4.5))));
  }

  #[test]
  fn parses_quoted_string() {
    match parse_term("\"hello world\"").unwrap() {
      Term::Constant(Constant::Str(value)) => assert_eq!(&*value, "hello world"),
      other => panic!("expected string, got {other:?}"),
    }
  }

  #[test]
  fn unmatched_quote_is_an_error() {
    assert!(parse_term("\"hello").is_err());
  }

  #[test]
  fn invalid_argument_is_rejected() {
    assert!(parse_term("3X").is_err());
  }
}
