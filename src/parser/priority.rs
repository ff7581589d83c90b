/*!

Parses a policy's `@Priorities` section (§6): either the bare keyword `default`, or a `;`-separated
list of `high > low` rule-name pairs. Each referenced rule name is checked against the policy's
declared rules; an unknown name is a `ReferenceError` (§7), aborting policy construction.

*/

use std::collections::HashSet;

use crate::IString;
use crate::abstractions::errors::SyntaxError;
use crate::engine::policy::PriorityMode;
use crate::parser::split_top_level;

/// Parses the body of `@Priorities` (everything after the keyword, up to the end of the policy
/// source). `declared_rules` is every rule name the policy has already parsed, used to validate
/// each side of a `high > low` pair.
pub fn parse_priorities(text: &str, declared_rules: &[IString]) -> Result<PriorityMode, SyntaxError> {
  let text = text.trim();
  if text.is_empty() || text.eq_ignore_ascii_case("default") {
    return Ok(PriorityMode::Default);
  }

  let mut pairs: HashSet<(IString, IString)> = HashSet::new();

  for piece in split_top_level(text, ';') {
    let piece = piece.trim();
    if piece.is_empty() {
      continue;
    }
    if piece.eq_ignore_ascii_case("default") {
      return Err(SyntaxError::malformed_priority(
        "`default` cannot be combined with explicit priority declarations".to_string(),
      ));
    }

    let sides: Vec<&str> = piece.split('>').collect();
    if sides.len() != 2 {
      return Err(SyntaxError::malformed_priority(piece.to_string()));
    }
    let high = sides[0].trim();
    let low = sides[1].trim();
    if high.is_empty() || low.is_empty() {
      return Err(SyntaxError::malformed_priority(piece.to_string()));
    }

    for name in [high, low] {
      if !declared_rules.iter().any(|declared| declared.as_ref() == name) {
        return Err(SyntaxError::reference_error(name.to_string()));
      }
    }

    pairs.insert((IString::from(high), IString::from(low)));
  }

  Ok(PriorityMode::Explicit(pairs))
}
