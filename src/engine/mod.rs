/*!

The saturation engine: combines the [`api`](crate::api) vocabulary (terms, literals,
substitutions, contexts, rules) into the inference kernel described in §2/§4.7 — an
[`InferenceGraph`](inference_graph::InferenceGraph) (the bulk closure of every rule instance,
ignoring conflicts) driven by a [`HasseDiagram`](hasse::HasseDiagram)'s pruning iterator, refereed
instance by instance by a [`PriorityRelation`](priority::PriorityRelation), with surviving
conflicts recorded as [`Dilemma`](dilemma::Dilemma)s.

[`Policy`](policy::Policy) is the public entry point: `Policy::parse` builds the immutable rule
set, priority relation, and Hasse diagram once; `Policy::infer` runs the saturation loop against a
caller-supplied [`Context`](crate::api::Context) and populates `inferences`, `dilemmas`, and
`inferred_by`.

*/

pub mod dilemma;
pub mod hasse;
pub mod inference_graph;
pub mod policy;
pub mod priority;

pub use dilemma::{Dilemma, RulePair};
pub use hasse::HasseDiagram;
pub use inference_graph::InferenceGraph;
pub use policy::Policy;
pub use priority::PriorityRelation;
