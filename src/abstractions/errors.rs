/*!

Error kinds for the two layers described in the engine's design: syntax errors (surfaced by the
parsers in [`crate::parser`]) and runtime errors (surfaced by the kernel types in [`crate::api`]
and [`crate::engine`]).

Both enums are written by hand, not derived with `thiserror`: one `Display` arm per variant with a
descriptive message, a `Debug` impl that defers to `Display`, and an empty `std::error::Error` impl
since every variant here is a leaf (none wrap another error). The `paste!` macro concatenates
`<Variant>` onto a lowercase constructor name so each variant gets a `SyntaxError::<variant_name>(..)`
free function without spelling the pairing out by hand.

*/

use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use paste::paste;

/// Generates, for each `$Variant { $($field: $ty),* }`, a constructor function
/// `$snake_name(field, ..) -> $enum` alongside the enum definition itself.
macro_rules! error_enum {
  (
    $(#[$enum_meta:meta])*
    pub enum $Enum:ident {
      $(
        $(#[$variant_meta:meta])*
        $Variant:ident { $($field:ident : $ty:ty),* $(,)? } => $display:expr
      ),* $(,)?
    }
  ) => {
    $(#[$enum_meta])*
    #[derive(Clone, PartialEq)]
    pub enum $Enum {
      $(
        $(#[$variant_meta])*
        $Variant { $($field: $ty),* }
      ),*
    }

    impl $Enum {
      paste! {
        $(
          /// Constructs the like-named variant.
          pub fn [<$Variant:snake>]($($field: $ty),*) -> Self {
            $Enum::$Variant { $($field),* }
          }
        )*
      }
    }

    impl Display for $Enum {
      fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
          $(
            $Enum::$Variant { $($field),* } => write!(f, $display, $($field = $field),*)
          ),*
        }
      }
    }

    impl Debug for $Enum {
      fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
      }
    }

    impl Error for $Enum {}
  };
}

error_enum! {
  /// An error raised while parsing surface syntax for a literal, rule, context, or policy.
  ///
  /// Syntax errors always abort the parse they occur in (§7): there is no recovery path, the
  /// caller receives the earliest error and the offending substring.
  pub enum SyntaxError {
    UnmatchedQuote { source: String, position: usize } =>
      "unmatched quote in {source:?} starting at byte {position}",
    IllegalCharacter { character: char, position: usize } =>
      "illegal character {character:?} at byte {position}",
    InvalidArgument { argument: String } =>
      "invalid argument {argument:?}: arguments must be variables, constants, or quoted strings",
    InvalidLiteral { text: String } =>
      "invalid literal syntax: {text:?}",
    InvalidRuleName { name: String } =>
      "invalid rule name {name:?}: rule names must be non-empty identifiers",
    MultipleKeyword { keyword: String } =>
      "keyword {keyword:?} appears more than once",
    KeywordNotFound { keyword: String } =>
      "expected keyword {keyword:?} but did not find it",
    MissingDelimiter { delimiter: char, text: String } =>
      "missing delimiter {delimiter:?} in {text:?}",
    MultipleDelimiter { delimiter: char, text: String } =>
      "delimiter {delimiter:?} appears more than once in {text:?}",
    MultipleRuleName { name: String } =>
      "rule name {name:?} is declared more than once in this policy",
    MalformedPriority { text: String } =>
      "malformed priority declaration: {text:?}",
    EmptyContext { } =>
      "a context must contain at least one literal",
    EmptyRuleBody { rule_name: String } =>
      "rule {rule_name:?} has an empty body",
    ReferenceError { rule_name: String } =>
      "priority declaration refers to undeclared rule {rule_name:?}",
  }
}

error_enum! {
  /// An error raised by the kernel at inference time.
  ///
  /// Most of these are not propagated to a caller as an `Err`; §7/§9 describe which ones are
  /// consumed internally as plain control values (`literal-not-in-context`,
  /// `literal-already-in-context`, `duplicate-value`) versus the one genuinely exceptional
  /// condition the saturation loop catches and converts into a [`crate::engine::Dilemma`]
  /// (`unresolved-conflicts`).
  pub enum RuntimeError {
    VariableNotFoundInSubstitution { variable: String } =>
      "variable {variable:?} has no binding in this substitution",
    DuplicateValue { variable: String, first: String, second: String } =>
      "variable {variable:?} would be bound to both {first:?} and {second:?}",
    InvalidEvaluation { expression: String } =>
      "expression {expression:?} could not be evaluated",
    UnassignedVariable { variable: String } =>
      "expression references unassigned variable {variable:?}",
    MalformedExpression { expression: String } =>
      "malformed arithmetic expression: {expression:?}",
    RuleNotFound { rule_name: String } =>
      "no rule named {rule_name:?} in this policy",
    LiteralNotInContext { literal: String } =>
      "literal {literal:?} has no matching bucket in this context",
    LiteralAlreadyInContext { literal: String } =>
      "literal {literal:?} is already present in this context",
    UnresolvedConflicts { head_name: String, conflict_count: usize, pairs: Vec<(String, String)> } =>
      "{conflict_count} unresolved priority conflict(s) over head predicate {head_name:?}",
    MalformedDict { text: String } =>
      "malformed dictionary form: {text:?}",
  }
}

impl RuntimeError {
  /// The `(head_name, pairs)` payload of an `UnresolvedConflicts`, for callers (the saturation
  /// loop) that need to fold it into a [`crate::engine::Dilemma`] rather than just display it.
  pub fn as_unresolved_conflicts(&self) -> Option<(&str, &[(String, String)])> {
    match self {
      RuntimeError::UnresolvedConflicts { head_name, pairs, .. } => Some((head_name, pairs)),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn syntax_error_display_includes_payload() {
    let err = SyntaxError::invalid_rule_name("".to_string());
    assert!(err.to_string().contains("invalid rule name"));
  }

  #[test]
  fn runtime_error_duplicate_value_names_both_values() {
    let err = RuntimeError::duplicate_value("X".to_string(), "1".to_string(), "2".to_string());
    let rendered = err.to_string();
    assert!(rendered.contains('1'));
    assert!(rendered.contains('2'));
  }

  #[test]
  fn debug_matches_display() {
    let err = RuntimeError::rule_not_found("R9".to_string());
    assert_eq!(format!("{}", err), format!("{:?}", err));
  }
}
