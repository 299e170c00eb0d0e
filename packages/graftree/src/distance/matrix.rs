use crate::make_internal_error;
use eyre::Report;
use ndarray::Array2;

/// Square matrix of pairwise distances, indexed by strain order.
/// Symmetric for the undirected tree builder, directional for the
/// arborescence builder. Immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
  matrix: Array2<f64>,
}

impl DistanceMatrix {
  pub fn from_array(matrix: Array2<f64>) -> Self {
    debug_assert_eq!(matrix.nrows(), matrix.ncols());
    Self { matrix }
  }

  pub fn n_nodes(&self) -> usize {
    self.matrix.nrows()
  }

  pub fn get(&self, from: usize, to: usize) -> f64 {
    self.matrix[[from, to]]
  }

  pub fn to_rows(&self) -> Vec<Vec<f64>> {
    self.matrix.rows().into_iter().map(|row| row.to_vec()).collect()
  }

  pub fn ensure_finite(&self) -> Result<(), Report> {
    for ((from, to), dist) in self.matrix.indexed_iter() {
      if !dist.is_finite() {
        return make_internal_error!("Non-finite distance {dist} between strains {from} and {to}");
      }
    }
    Ok(())
  }

  /// Harmonic mean of the vertex's positive outgoing distances,
  /// `count / sum(1/d)`. Vertices globally close to many others score
  /// high; a vertex with no positive distances scores 0.
  pub fn harmonic_mean_score(&self, node: usize) -> f64 {
    let mut sum_reciprocals = 0.0;
    let mut count = 0_usize;

    for other in 0..self.n_nodes() {
      if other == node {
        continue;
      }
      let dist = self.get(node, other);
      if dist > 0.0 {
        sum_reciprocals += 1.0 / dist;
        count += 1;
      }
    }

    if count == 0 {
      0.0
    } else {
      count as f64 / sum_reciprocals
    }
  }
}
