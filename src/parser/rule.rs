/*!

Parses a single rule (§6): `name :: lit1, lit2, … implies head;`. The `::` separates the rule name
from the body, `implies` separates the body from the head, and the body's `,` splitter respects
parenthesis nesting ([`super::split_top_level`]).

*/

use crate::abstractions::errors::SyntaxError;
use crate::api::literal::Literal;
use crate::api::rule::Rule;
use crate::parser::literal::parse_literal;
use crate::parser::split_top_level;

const IMPLIES: &str = "implies";

/// Parses one rule declaration. `text` may carry a trailing `;`, which is stripped before
/// anything else is inspected.
pub fn parse_rule(text: &str) -> Result<Rule, SyntaxError> {
  let original_string = text.trim().trim_end_matches(';').trim().to_string();
  let text = original_string.as_str();

  let mut name_and_rest = text.splitn(2, "::");
  let name = name_and_rest.next().unwrap_or("").trim();
  let Some(rest) = name_and_rest.next() else {
    return Err(SyntaxError::keyword_not_found("::".to_string()));
  };
  if name_and_rest.next().is_some() {
    // splitn(2, ..) cannot yield a third piece; kept only so a future change to `splitn`'s
    // bound doesn't silently swallow a second `::`.
    return Err(SyntaxError::multiple_delimiter("::".chars().next().unwrap(), text.to_string()));
  }

  if name.is_empty() || !name.chars().next().unwrap().is_ascii_alphabetic()
      || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
  {
    return Err(SyntaxError::invalid_rule_name(name.to_string()));
  }

  let implies_positions: Vec<usize> = find_top_level_keyword(rest, IMPLIES);
  if implies_positions.is_empty() {
    return Err(SyntaxError::keyword_not_found(IMPLIES.to_string()));
  }
  if implies_positions.len() > 1 {
    return Err(SyntaxError::multiple_keyword(IMPLIES.to_string()));
  }

  let split_at = implies_positions[0];
  let body_text = rest[..split_at].trim();
  let head_text = rest[split_at + IMPLIES.len()..].trim();

  if body_text.is_empty() {
    return Err(SyntaxError::empty_rule_body(name.to_string()));
  }
  if head_text.is_empty() {
    return Err(SyntaxError::invalid_literal(head_text.to_string()));
  }

  let body: Vec<Literal> = split_top_level(body_text, ',')
      .iter()
      .map(|piece| piece.trim())
      .filter(|piece| !piece.is_empty())
      .map(parse_literal)
      .collect::<Result<Vec<_>, _>>()?;

  if body.is_empty() {
    return Err(SyntaxError::empty_rule_body(name.to_string()));
  }

  let head = parse_literal(head_text)?;

  let mut rule = Rule::new(name, body, head);
  rule.original_string = original_string;
  Ok(rule)
}

/// Finds every top-level (not inside parens) occurrence of `keyword` as a standalone word in
/// `text`, returning their byte offsets.
fn find_top_level_keyword(text: &str, keyword: &str) -> Vec<usize> {
  let bytes = text.as_bytes();
  let keyword_bytes = keyword.as_bytes();
  let mut depth: i32 = 0;
  let mut positions = Vec::new();

  let mut index = 0;
  while index < bytes.len() {
    match bytes[index] {
      b'(' => depth += 1,
      b')' => depth -= 1,
      _ => {}
    }
    if depth == 0 && bytes[index..].starts_with(keyword_bytes) {
      let before_ok = index == 0 || !(bytes[index - 1] as char).is_ascii_alphanumeric();
      let after = index + keyword_bytes.len();
      let after_ok = after >= bytes.len() || !(bytes[after] as char).is_ascii_alphanumeric();
      if before_ok && after_ok {
        positions.push(index);
      }
    }
    index += 1;
  }

  positions
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_simple_rule() {
    let rule = parse_rule("R1:: bird(X) implies flies(X);").unwrap();
    assert_eq!(rule.name.as_ref(), "R1");
    assert_eq!(rule.body.len(), 1);
  }

  #[test]
  fn parses_a_multi_literal_body() {
    let rule = parse_rule(
      "R1:: friends(X,Y), -enemies(Y,X) implies trust(X,Y)",
    ).unwrap();
    assert_eq!(rule.body.len(), 2);
  }

  #[test]
  fn missing_implies_is_an_error() {
    assert!(parse_rule("R1:: bird(X)").is_err());
  }

  #[test]
  fn missing_double_colon_is_an_error() {
    assert!(parse_rule("R1 bird(X) implies flies(X);").is_err());
  }

  #[test]
  fn empty_body_is_an_error() {
    assert!(parse_rule("R1:: implies flies(X);").is_err());
  }

  #[test]
  fn invalid_rule_name_is_rejected() {
    assert!(parse_rule("1R:: bird(X) implies flies(X);").is_err());
  }
}
