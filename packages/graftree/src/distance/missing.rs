use crate::make_error;
use eyre::Report;

/// Policy for loci where one or both allele calls are missing.
///
/// Wire values are stable: 0=IGNORE, 1=REMOVE_COLUMN, 2=TREAT_AS_ALLELE,
/// 3=ABSOLUTE_DIFF. REMOVE_COLUMN skips affected loci per pair and is
/// therefore an alias of IGNORE.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MissingHandler {
  /// Skip loci where either call is missing.
  Ignore,
  /// Alias of [`MissingHandler::Ignore`].
  RemoveColumn,
  /// Missing is a distinct allele state: present-vs-missing differs,
  /// missing-vs-missing matches.
  TreatAsAllele,
  /// Every locus touched by missing data counts as a difference.
  AbsoluteDiff,
}

impl MissingHandler {
  pub fn from_wire(value: i64) -> Result<Self, Report> {
    match value {
      0 => Ok(Self::Ignore),
      1 => Ok(Self::RemoveColumn),
      2 => Ok(Self::TreatAsAllele),
      3 => Ok(Self::AbsoluteDiff),
      _ => make_error!("Unknown missing-data handler: {value}"),
    }
  }
}
