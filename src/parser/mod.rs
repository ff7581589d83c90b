/*!

Hand-rolled recursive-descent parsers for the surface syntax (§6): no parser-combinator crate, in
keeping with the rest of the kernel's preference for direct, inspectable control flow over a
generic abstraction. Each submodule parses one syntactic level and returns the matching
[`SyntaxError`](crate::abstractions::errors::SyntaxError) variant on the earliest malformed input,
never attempting recovery (§7).

*/

pub mod context;
pub mod literal;
pub mod policy;
pub mod priority;
pub mod rule;
pub mod term;

/// Splits `text` on `delim`, skipping any `delim` that occurs inside parentheses. Grounded on the
/// rule-body splitter this engine's rule syntax is modeled on: a single running paren-depth
/// counter, no lookahead.
pub(crate) fn split_top_level(text: &str, delim: char) -> Vec<String> {
  let mut depth: i32 = 0;
  let mut parts = Vec::new();
  let mut current = String::new();

  for character in text.chars() {
    match character {
      '(' => depth += 1,
      ')' => depth -= 1,
      _ => {}
    }
    if character == delim && depth == 0 {
      parts.push(current);
      current = String::new();
      continue;
    }
    current.push(character);
  }
  parts.push(current);
  parts
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn split_top_level_ignores_delimiters_inside_parens() {
    let parts = split_top_level("bird(X), friends(X, Y), flies(X)", ',');
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[0].trim(), "bird(X)");
    assert_eq!(parts[1].trim(), "friends(X, Y)");
  }
}
