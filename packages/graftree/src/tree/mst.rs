use crate::distance::matrix::DistanceMatrix;
use crate::make_error;
use crate::tree::edge::Edge;
use eyre::Report;
use std::str::FromStr;

/// Absolute tolerance for distance equality. Tie-break selection is
/// sensitive to this value; changing it changes tree topology.
pub const TIE_TOLERANCE: f64 = 1e-10;

/// Tie-breaking rule applied when several vertices sit at the same
/// minimum distance from the growing tree.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Heuristic {
  /// Prefer the candidate connected to the most in-tree vertices at the
  /// tied minimum distance.
  Eburst,
  /// Prefer the candidate with the highest harmonic mean of its
  /// positive distances to all other vertices.
  Harmonic,
}

impl FromStr for Heuristic {
  type Err = Report;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "eBurst" => Ok(Self::Eburst),
      "harmonic" => Ok(Self::Harmonic),
      _ => make_error!("Unknown heuristic: '{s}'"),
    }
  }
}

/// Prim's algorithm over the full matrix, starting at vertex 0. The
/// result is a list of exactly `n - 1` edges in construction order.
pub fn build_mstree(distances: &DistanceMatrix, heuristic: Heuristic) -> Vec<Edge> {
  let n = distances.n_nodes();
  if n == 0 {
    return Vec::new();
  }

  let mut tree_edges = Vec::with_capacity(n.saturating_sub(1));

  let mut in_tree = vec![false; n];
  let mut min_distance = vec![f64::MAX; n];
  let mut parent = vec![0_usize; n];

  in_tree[0] = true;
  min_distance[0] = 0.0;
  for i in 1..n {
    min_distance[i] = distances.get(0, i);
  }

  for _ in 1..n {
    let mut min_dist = f64::MAX;
    for i in 0..n {
      if !in_tree[i] && min_distance[i] < min_dist {
        min_dist = min_distance[i];
      }
    }

    let chosen = select_with_tiebreak(distances, &min_distance, &in_tree, min_dist, heuristic);

    in_tree[chosen] = true;
    tree_edges.push(Edge::new(parent[chosen], chosen, min_dist));

    for i in 0..n {
      if !in_tree[i] && distances.get(chosen, i) < min_distance[i] {
        min_distance[i] = distances.get(chosen, i);
        parent[i] = chosen;
      }
    }
  }

  tree_edges
}

fn select_with_tiebreak(
  distances: &DistanceMatrix,
  min_distance: &[f64],
  in_tree: &[bool],
  min_dist: f64,
  heuristic: Heuristic,
) -> usize {
  let candidates: Vec<usize> = (0..min_distance.len())
    .filter(|&i| !in_tree[i] && (min_distance[i] - min_dist).abs() < TIE_TOLERANCE)
    .collect();

  if candidates.len() == 1 {
    return candidates[0];
  }

  match heuristic {
    Heuristic::Eburst => eburst_tiebreak(distances, &candidates, in_tree, min_dist),
    Heuristic::Harmonic => harmonic_tiebreak(distances, &candidates),
  }
}

/// Counts, for each candidate, the in-tree vertices reachable at the
/// tied minimum distance; the best-connected candidate wins, lower index
/// on a further tie.
fn eburst_tiebreak(distances: &DistanceMatrix, candidates: &[usize], in_tree: &[bool], min_dist: f64) -> usize {
  let mut best_node = candidates[0];
  let mut max_connections = 0_usize;

  for &node in candidates {
    let connections = (0..distances.n_nodes())
      .filter(|&j| in_tree[j] && (distances.get(node, j) - min_dist).abs() < TIE_TOLERANCE)
      .count();

    if connections > max_connections {
      max_connections = connections;
      best_node = node;
    } else if connections == max_connections && node < best_node {
      best_node = node;
    }
  }

  best_node
}

fn harmonic_tiebreak(distances: &DistanceMatrix, candidates: &[usize]) -> usize {
  let mut best_node = candidates[0];
  let mut best_score = -1.0;

  for &node in candidates {
    let score = distances.harmonic_mean_score(node);
    if score > best_score {
      best_score = score;
      best_node = node;
    } else if (score - best_score).abs() < TIE_TOLERANCE && node < best_node {
      best_node = node;
    }
  }

  best_node
}
