use crate::io::fasta::FastaRecord;
use crate::make_error;
use crate::profile::profile_data::ProfileData;
use eyre::Report;
use itertools::Itertools;

/// Maps an aligned nucleotide to a nominal allele identifier. Gaps,
/// `N`, ambiguity codes and any other character map to 0 (missing).
pub const fn nuc_to_allele(nuc: char) -> i32 {
  match nuc {
    'A' | 'a' => 1,
    'C' | 'c' => 2,
    'G' | 'g' => 3,
    'T' | 't' => 4,
    _ => 0,
  }
}

/// Converts aligned sequences into an allelic profile batch, one locus
/// per alignment column. All sequences must have the same length.
pub fn sequences_to_profile(records: &[FastaRecord]) -> Result<ProfileData, Report> {
  if records.is_empty() {
    return make_error!("Profile data must contain at least one strain");
  }

  let n_genes = records[0].seq.len();
  for record in records {
    if record.seq.len() != n_genes {
      return make_error!(
        "Sequence '{}' has length {}, expected {n_genes}",
        record.seq_name,
        record.seq.len()
      );
    }
  }

  let strain_names = records.iter().map(|record| record.seq_name.clone()).collect_vec();
  let profiles = records
    .iter()
    .map(|record| record.seq.chars().map(nuc_to_allele).collect_vec())
    .collect_vec();

  ProfileData::new(strain_names, profiles)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::utils::error::report_to_string;
  use pretty_assertions::assert_eq;
  use rstest::rstest;

  fn record(name: &str, seq: &str) -> FastaRecord {
    FastaRecord {
      seq_name: name.to_owned(),
      seq: seq.to_owned(),
      index: 0,
    }
  }

  #[rstest]
  #[case('A', 1)]
  #[case('c', 2)]
  #[case('G', 3)]
  #[case('t', 4)]
  #[case('-', 0)]
  #[case('N', 0)]
  #[case('R', 0)]
  fn maps_nucleotides_to_alleles(#[case] nuc: char, #[case] allele: i32) {
    assert_eq!(nuc_to_allele(nuc), allele);
  }

  #[test]
  fn converts_aligned_sequences() -> Result<(), Report> {
    let records = vec![record("A", "ACGT"), record("B", "AC-T")];
    let data = sequences_to_profile(&records)?;
    assert_eq!(data.strain_names, vec!["A", "B"]);
    assert_eq!(data.profiles, vec![vec![1, 2, 3, 4], vec![1, 2, 0, 4]]);
    Ok(())
  }

  #[test]
  fn rejects_unequal_lengths() {
    let records = vec![record("A", "ACGT"), record("B", "AC")];
    let message = report_to_string(&sequences_to_profile(&records).unwrap_err());
    assert_eq!(message, "Sequence 'B' has length 2, expected 4");
  }

  #[test]
  fn rejects_empty_batch() {
    let message = report_to_string(&sequences_to_profile(&[]).unwrap_err());
    assert_eq!(message, "Profile data must contain at least one strain");
  }
}
