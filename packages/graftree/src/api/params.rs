use crate::make_error;
use eyre::Report;
use std::str::FromStr;

/// Tree-building algorithm selector as it appears on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
  /// Undirected minimum spanning tree (Prim with tie-break heuristics).
  MsTree,
  /// Directed minimum arborescence with cycle contraction.
  MsTreeV2,
}

impl FromStr for Method {
  type Err = Report;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "MSTree" => Ok(Self::MsTree),
      "MSTreeV2" => Ok(Self::MsTreeV2),
      "NJ" => make_error!("Method 'NJ' is not implemented"),
      _ => make_error!("Unknown method: '{s}'"),
    }
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MatrixType {
  Symmetric,
  Asymmetric,
}

impl FromStr for MatrixType {
  type Err = Report;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "symmetric" => Ok(Self::Symmetric),
      "asymmetric" => Ok(Self::Asymmetric),
      _ => make_error!("Unknown matrix type: '{s}'"),
    }
  }
}
