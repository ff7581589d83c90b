/*!

A minimal CLI front-end (§12/§13 of the engine's design): load a policy and a context from files,
run saturation, and print the results. This binary is ambient glue around the kernel, not part of
it — it is gated behind the `cli` feature so a library consumer never pulls in `clap`.

*/

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use defeasible_core::api::Context;
use defeasible_core::engine::Policy;
use defeasible_core::log::set_global_logging_threshold;
use defeasible_core::{critical, info};

/// Loads a defeasible-logic policy and a context, runs saturation, and prints the inferences,
/// dilemmas, and (with `--provenance`) the rule/substitution pairs that produced each inference.
#[derive(Parser, Debug)]
#[command(name = "defeasible", version, about)]
struct Args {
  /// Path to a `@Policy ... @Priorities ...` source file.
  policy: PathBuf,

  /// Path to a `lit1; lit2; ...` context source file.
  context: PathBuf,

  /// Maximum saturation rounds. Defaults to the crate's built-in bound.
  #[arg(long)]
  max_depth: Option<u32>,

  /// Print provenance (which rule, under which substitution, produced each inference).
  #[arg(long)]
  provenance: bool,

  /// Increase logging verbosity; repeatable (`-v`, `-vv`, `-vvv`, ...).
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn main() -> ExitCode {
  let args = Args::parse();
  set_global_logging_threshold(args.verbose);

  let policy_source = match fs::read_to_string(&args.policy) {
    Ok(source) => source,
    Err(error) => {
      critical!(0, "could not read policy file {:?}: {error}", args.policy);
      return ExitCode::FAILURE;
    }
  };
  let context_source = match fs::read_to_string(&args.context) {
    Ok(source) => source,
    Err(error) => {
      critical!(0, "could not read context file {:?}: {error}", args.context);
      return ExitCode::FAILURE;
    }
  };

  let mut policy = match Policy::parse(&policy_source) {
    Ok(policy) => policy,
    Err(error) => {
      critical!("failed to parse policy: {error}");
      return ExitCode::FAILURE;
    }
  };
  let context = match Context::parse(&context_source) {
    Ok(context) => context,
    Err(error) => {
      critical!("failed to parse context: {error}");
      return ExitCode::FAILURE;
    }
  };

  info!(1, "loaded {} rule(s), {} fact(s)", policy.rules().count(), context.len());

  policy.infer(context, args.max_depth);

  println!("Inferences:");
  for literal in policy.inferences.iter() {
    println!("  {literal}");
  }

  if !policy.dilemmas.is_empty() {
    println!("Dilemmas:");
    for dilemma in policy.dilemmas.values() {
      println!("  {dilemma}");
    }
  }

  if args.provenance {
    println!("Provenance:");
    for (literal, by_rule) in &policy.inferred_by {
      for (rule_name, subs) in by_rule {
        for sub in subs {
          println!("  {literal} <- {rule_name} {sub}");
        }
      }
    }
  }

  ExitCode::SUCCESS
}
