use clap::builder::{PossibleValuesParser, TypedValueParser};
use clap::Parser;
use eyre::{Report, WrapErr};
use graftree::api::compute::{compute_distance_matrix, compute_tree};
use graftree::io::fasta::read_fasta_str;
use graftree::make_error;
use graftree::profile::nuc::sequences_to_profile;
use graftree::utils::global_init::{global_init, setup_logger};
use log::LevelFilter;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Computes minimum spanning trees from allelic profiles (MLST/cgMLST)
/// or aligned DNA sequences and writes them in Newick format.
#[derive(Parser, Debug)]
#[clap(name = "graftree", author, version)]
pub struct GraftreeArgs {
  /// Input file with profile JSON ({"strains": [...], "profiles": [[...], ...]}),
  /// or aligned FASTA when --fasta is set. Use "-" to read from standard input.
  #[clap(value_name = "INPUT")]
  pub input: PathBuf,

  /// Treat the input as aligned FASTA and convert it to allelic profiles
  #[clap(long)]
  pub fasta: bool,

  /// Tree-building method: MSTree or MSTreeV2
  #[clap(long, default_value = "MSTree")]
  pub method: String,

  /// Distance matrix type: symmetric or asymmetric
  #[clap(long, default_value = "symmetric")]
  pub matrix_type: String,

  /// Missing-data handler: 0=ignore, 1=remove column, 2=treat as allele, 3=absolute difference
  #[clap(long, default_value_t = 0)]
  pub missing_handler: i64,

  /// Tie-breaking heuristic for MSTree: eBurst or harmonic
  #[clap(long, default_value = "eBurst")]
  pub heuristic: String,

  /// Emit only the distance matrix instead of a tree
  #[clap(long)]
  pub matrix_only: bool,

  /// Print only the Newick string instead of the full JSON response
  #[clap(long, conflicts_with = "matrix_only")]
  pub newick_only: bool,

  /// Output file; standard output when omitted
  #[clap(long, short = 'o')]
  pub output: Option<PathBuf>,

  /// Set verbosity level of console output
  #[clap(long, value_parser = PossibleValuesParser::new(["off", "error", "warn", "info", "debug", "trace"])
      .map(|s| s.parse::<LevelFilter>().unwrap()))]
  #[clap(default_value = "warn")]
  pub verbosity: LevelFilter,
}

fn read_input(args: &GraftreeArgs) -> Result<String, Report> {
  let raw = if args.input == Path::new("-") {
    let mut buf = String::new();
    std::io::stdin()
      .read_to_string(&mut buf)
      .wrap_err("When reading standard input")?;
    buf
  } else {
    fs::read_to_string(&args.input).wrap_err_with(|| format!("When reading {:?}", args.input))?
  };

  if args.fasta {
    let records = read_fasta_str(&raw)?;
    let data = sequences_to_profile(&records)?;
    return serde_json::to_string(&data).wrap_err("When converting sequences to a profile request");
  }

  Ok(raw)
}

fn extract_newick(response: &str) -> Result<String, Report> {
  let value: serde_json::Value = serde_json::from_str(response).wrap_err("When parsing response envelope")?;
  match value.get("newick").and_then(serde_json::Value::as_str) {
    Some(newick) => Ok(newick.to_owned()),
    None => {
      let error = value.get("error").and_then(serde_json::Value::as_str).unwrap_or("unknown error");
      make_error!("{error}")
    }
  }
}

fn main() -> Result<(), Report> {
  let args = GraftreeArgs::parse();
  global_init();
  setup_logger(args.verbosity);

  let profile_json = read_input(&args)?;

  let response = if args.matrix_only {
    compute_distance_matrix(&profile_json, &args.matrix_type, args.missing_handler)
  } else {
    compute_tree(
      &profile_json,
      &args.method,
      &args.matrix_type,
      args.missing_handler,
      &args.heuristic,
    )
  };

  let output = if args.newick_only {
    extract_newick(&response)?
  } else {
    response
  };

  match &args.output {
    None => println!("{output}"),
    Some(path) => {
      fs::write(path, format!("{output}\n")).wrap_err_with(|| format!("When writing {path:?}"))?;
    }
  }

  Ok(())
}
