#![allow(dead_code)]

/*!

A defeasible reasoning engine: given a set of named, prioritized defeasible rules (a
[`Policy`](engine::Policy)) and a set of ground facts (a [`Context`](api::Context)), compute the
literals that are sceptically derivable under a conflict-resolution semantics based on rule
priorities, together with a record of unresolved conflicts ([`Dilemma`](engine::Dilemma)) and
provenance (which rule, under which binding, produced each inference).

```
use defeasible_core::engine::Policy;
use defeasible_core::api::Context;

let mut policy = Policy::parse(
  "@Policy \
   R1:: bird(X) implies flies(X); \
   R2:: penguin(X) implies -flies(X); \
   @Priorities \
   R2 > R1;"
).expect("policy parses");

let context = Context::parse("bird(tweety); penguin(tweety);").expect("context parses");

policy.infer(context, None);
assert!(policy.inferences.iter().any(|l| l.to_string() == "-flies(tweety)"));
```

*/

pub mod abstractions;
pub mod api;
pub mod engine;
pub mod parser;

// Re-exported so callers write `defeasible_core::log::info!(...)` and `defeasible_core::IString`,
// matching the shape of the abstraction layer they come from.
pub use abstractions::{log, IString};

/// Default bound on saturation depth when a caller does not supply one. Unbounded saturation is
/// not guaranteed to terminate (see the engine's design notes), so `infer` never runs forever by
/// accident.
pub const DEFAULT_MAX_DEPTH: u32 = 64;

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::Context;
  use crate::engine::Policy;

  #[test]
  fn penguin_classic_smoke_test() {
    let mut policy = Policy::parse(
      "@Policy \
       R1:: bird(X) implies flies(X); \
       R2:: penguin(X) implies -flies(X); \
       R3:: super(X) implies flies(X); \
       @Priorities \
       R2 > R1; \
       R3 > R2;"
    ).expect("policy parses");

    let context = Context::parse(
      "bird(alice); bird(bob); bird(charlie); penguin(alice); penguin(bob); super(alice);"
    ).expect("context parses");

    policy.infer(context, None);

    let rendered: Vec<String> = policy.inferences.iter().map(|l| l.to_string()).collect();
    assert!(rendered.contains(&"flies(alice)".to_string()));
    assert!(rendered.contains(&"flies(charlie)".to_string()));
    assert!(rendered.contains(&"-flies(bob)".to_string()));
    assert!(policy.dilemmas.is_empty());
  }
}
