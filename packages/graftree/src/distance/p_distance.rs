use crate::distance::matrix::DistanceMatrix;
use crate::make_error;
use eyre::Report;
use ndarray::Array2;

const fn is_unambiguous(nuc: char) -> bool {
  matches!(nuc, 'A' | 'C' | 'G' | 'T')
}

/// Fraction of aligned positions at which two sequences disagree.
/// Positions where either sequence carries a gap, an `N`, or any other
/// non-ACGT character are excluded from numerator and denominator; with
/// no valid positions at all the distance is 0.
pub fn p_distance(seq1: &str, seq2: &str) -> Result<f64, Report> {
  if seq1.len() != seq2.len() {
    return make_error!("Sequence length mismatch: {} vs {}", seq1.len(), seq2.len());
  }

  let mut differences = 0_u64;
  let mut valid_positions = 0_u64;

  for (c1, c2) in seq1.chars().zip(seq2.chars()) {
    let c1 = c1.to_ascii_uppercase();
    let c2 = c2.to_ascii_uppercase();

    if !is_unambiguous(c1) || !is_unambiguous(c2) {
      continue;
    }
    if c1 != c2 {
      differences += 1;
    }
    valid_positions += 1;
  }

  if valid_positions == 0 {
    return Ok(0.0);
  }

  Ok(differences as f64 / valid_positions as f64)
}

pub fn p_distance_matrix(sequences: &[String]) -> Result<DistanceMatrix, Report> {
  let n = sequences.len();
  let mut matrix = Array2::<f64>::zeros((n, n));

  for i in 0..n {
    for j in (i + 1)..n {
      let dist = p_distance(&sequences[i], &sequences[j])?;
      matrix[[i, j]] = dist;
      matrix[[j, i]] = dist;
    }
  }

  Ok(DistanceMatrix::from_array(matrix))
}
