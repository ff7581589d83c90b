/*!

Parses a whole policy (§6): `@Policy` followed by `;`-terminated rule declarations, then
`@Priorities` followed by either `default` or a `;`-separated list of `high > low` declarations.

*/

use std::collections::HashSet;

use crate::abstractions::errors::SyntaxError;
use crate::engine::policy::{Policy, PriorityMode};
use crate::parser::priority::parse_priorities;
use crate::parser::rule::parse_rule;
use crate::parser::split_top_level;

const POLICY_KEYWORD: &str = "@Policy";
const PRIORITIES_KEYWORD: &str = "@Priorities";

/// Parses a complete policy source. `@Policy` must appear exactly once, followed eventually by
/// exactly one `@Priorities`; both keywords are mandatory (§7: `KeywordNotFound`/`MultipleKeyword`).
pub fn parse_policy(source: &str) -> Result<Policy, SyntaxError> {
  let policy_count = source.matches(POLICY_KEYWORD).count();
  if policy_count == 0 {
    return Err(SyntaxError::keyword_not_found(POLICY_KEYWORD.to_string()));
  }
  if policy_count > 1 {
    return Err(SyntaxError::multiple_keyword(POLICY_KEYWORD.to_string()));
  }

  let priorities_count = source.matches(PRIORITIES_KEYWORD).count();
  if priorities_count == 0 {
    return Err(SyntaxError::keyword_not_found(PRIORITIES_KEYWORD.to_string()));
  }
  if priorities_count > 1 {
    return Err(SyntaxError::multiple_keyword(PRIORITIES_KEYWORD.to_string()));
  }

  let after_policy = source
      .split_once(POLICY_KEYWORD)
      .map(|(_, rest)| rest)
      .expect("counted above");
  let (rules_text, priorities_text) = after_policy
      .split_once(PRIORITIES_KEYWORD)
      .expect("counted above");

  let mut rules = Vec::new();
  let mut seen_names: HashSet<String> = HashSet::new();
  for piece in split_top_level(rules_text, ';') {
    let piece = piece.trim();
    if piece.is_empty() {
      continue;
    }
    let rule = parse_rule(piece)?;
    if !seen_names.insert(rule.name.to_string()) {
      return Err(SyntaxError::multiple_rule_name(rule.name.to_string()));
    }
    rules.push(rule);
  }

  let declared_names: Vec<crate::IString> = rules.iter().map(|rule| rule.name.clone()).collect();
  let priority_mode = match parse_priorities(priorities_text, &declared_names)? {
    PriorityMode::Default => PriorityMode::Default,
    PriorityMode::Explicit(pairs) => PriorityMode::Explicit(pairs),
  };

  Ok(Policy::new(rules, priority_mode))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_penguin_policy() {
    let policy = parse_policy(
      "@Policy \
       R1:: bird(X) implies flies(X); \
       R2:: penguin(X) implies -flies(X); \
       R3:: super(X) implies flies(X); \
       @Priorities \
       R2 > R1; \
       R3 > R2;"
    ).unwrap();
    assert_eq!(policy.rules().count(), 3);
    assert!(!policy.priorities().is_default());
  }

  #[test]
  fn parses_default_priority_mode() {
    let policy = parse_policy(
      "@Policy R1::a implies b; R2::b implies c; @Priorities default"
    ).unwrap();
    assert!(policy.priorities().is_default());
  }

  #[test]
  fn parses_policy_with_no_explicit_priorities() {
    let policy = parse_policy("@Policy R1::p implies q; R2::p implies -q; @Priorities ;").unwrap();
    assert!(!policy.priorities().is_default());
  }

  #[test]
  fn missing_policy_keyword_is_an_error() {
    assert!(parse_policy("R1:: a implies b; @Priorities default").is_err());
  }

  #[test]
  fn missing_priorities_keyword_is_an_error() {
    assert!(parse_policy("@Policy R1:: a implies b;").is_err());
  }

  #[test]
  fn duplicate_rule_name_is_an_error() {
    let result = parse_policy(
      "@Policy R1:: a implies b; R1:: c implies d; @Priorities default"
    );
    assert!(result.is_err());
  }

  #[test]
  fn unknown_rule_in_priorities_is_a_reference_error() {
    let result = parse_policy("@Policy R1:: a implies b; @Priorities R9 > R1;");
    assert!(result.is_err());
  }
}
