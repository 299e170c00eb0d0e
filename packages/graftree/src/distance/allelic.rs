use crate::distance::matrix::DistanceMatrix;
use crate::distance::missing::MissingHandler;
use crate::profile::profile_data::ProfileData;
use ndarray::Array2;

/// Number of loci at which two profiles disagree, under the given
/// missing-data policy. The count is a raw Hamming-style distance, not
/// normalized by the number of loci compared.
fn pairwise_distance(profile1: &[i32], profile2: &[i32], handler: MissingHandler) -> f64 {
  let mut differences = 0_u64;

  for (&a, &b) in profile1.iter().zip(profile2) {
    let missing_a = a <= 0;
    let missing_b = b <= 0;

    if missing_a || missing_b {
      match handler {
        MissingHandler::Ignore | MissingHandler::RemoveColumn => {}
        MissingHandler::TreatAsAllele => {
          if missing_a != missing_b {
            differences += 1;
          }
        }
        MissingHandler::AbsoluteDiff => {
          differences += 1;
        }
      }
    } else if a != b {
      differences += 1;
    }
  }

  differences as f64
}

/// Directional distance for rooted-tree construction: loci where both
/// calls are present and differ, plus a half-unit penalty per locus
/// missing in the prospective parent. The penalty biases tree growth
/// away from incompletely characterized parents.
fn directional_distance(from_profile: &[i32], to_profile: &[i32]) -> f64 {
  let mut differences = 0_u64;
  let mut missing_in_from = 0_u64;

  for (&a, &b) in from_profile.iter().zip(to_profile) {
    if a <= 0 {
      missing_in_from += 1;
    } else if b > 0 && a != b {
      differences += 1;
    }
  }

  differences as f64 + 0.5 * missing_in_from as f64
}

pub fn symmetric_distances(data: &ProfileData, handler: MissingHandler) -> DistanceMatrix {
  let n = data.n_strains();
  let mut matrix = Array2::<f64>::zeros((n, n));

  for i in 0..n {
    for j in (i + 1)..n {
      let dist = pairwise_distance(&data.profiles[i], &data.profiles[j], handler);
      matrix[[i, j]] = dist;
      matrix[[j, i]] = dist;
    }
  }

  DistanceMatrix::from_array(matrix)
}

pub fn asymmetric_distances(data: &ProfileData) -> DistanceMatrix {
  let n = data.n_strains();
  let mut matrix = Array2::<f64>::zeros((n, n));

  for i in 0..n {
    for j in 0..n {
      if i != j {
        matrix[[i, j]] = directional_distance(&data.profiles[i], &data.profiles[j]);
      }
    }
  }

  DistanceMatrix::from_array(matrix)
}
