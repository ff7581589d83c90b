/*!

Parses a single literal (§6): `[-][?|!]name` or `[-][?|!]name(a1, a2, …)`. Arguments are split on
top-level commas (nesting inside a literal's own parens is not possible since arguments are bare
terms, but [`super::split_top_level`] is reused anyway for the one splitter this module needs).

*/

use crate::abstractions::errors::SyntaxError;
use crate::api::literal::{Literal, LiteralMark, LiteralMarks};
use crate::parser::split_top_level;
use crate::parser::term::parse_term;

/// Parses one literal. The optional leading `-` is the sign; `?` and `!` are independent marks
/// and may appear in either order directly in front of the predicate name.
pub fn parse_literal(text: &str) -> Result<Literal, SyntaxError> {
  let text = text.trim();
  if text.is_empty() {
    return Err(SyntaxError::invalid_literal(text.to_string()));
  }

  let mut rest = text;
  let sign = if let Some(stripped) = rest.strip_prefix('-') {
    rest = stripped;
    false
  } else {
    true
  };

  let mut marks = LiteralMarks::empty();
  loop {
    if let Some(stripped) = rest.strip_prefix('?') {
      marks |= LiteralMark::External;
      rest = stripped;
      continue;
    }
    if let Some(stripped) = rest.strip_prefix('!') {
      marks |= LiteralMark::Action;
      rest = stripped;
      continue;
    }
    break;
  }

  let (name, arguments_text) = match rest.find('(') {
    None => (rest, None),
    Some(open) => {
      if !rest.ends_with(')') {
        return Err(SyntaxError::missing_delimiter(')', text.to_string()));
      }
      (&rest[..open], Some(&rest[open + 1..rest.len() - 1]))
    }
  };

  if name.is_empty() || !name.chars().next().unwrap().is_ascii_lowercase()
      || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
  {
    return Err(SyntaxError::invalid_literal(text.to_string()));
  }

  let arguments = match arguments_text {
    None => Vec::new(),
    Some(body) if body.trim().is_empty() => Vec::new(),
    Some(body) => split_top_level(body, ',')
        .iter()
        .map(|piece| parse_term(piece))
        .collect::<Result<Vec<_>, _>>()?,
  };

  Ok(Literal::new(name, sign, arguments).with_marks(marks))
}
