use crate::distance::matrix::DistanceMatrix;
use crate::tree::edge::Edge;
use crate::tree::mst::TIE_TOLERANCE;

const MAX_ITERATIONS: usize = 10;

/// Greedy local improvement on a built tree: for every pair of edges
/// sharing a vertex, try exchanging their child endpoints and keep the
/// exchange when it lowers the summed branch length. An exchange that
/// would produce a self-loop is rejected, so the in-degree-1 invariant
/// of an arborescence survives the pass. Stops after a full pass without
/// improvement or after 10 passes.
pub fn recraft_branches(distances: &DistanceMatrix, tree: &mut [Edge]) {
  let mut improved = true;
  let mut iteration = 0;

  while improved && iteration < MAX_ITERATIONS {
    improved = false;
    iteration += 1;

    for i in 0..tree.len() {
      for j in (i + 1)..tree.len() {
        if !share_endpoint(&tree[i], &tree[j]) {
          continue;
        }

        let current_cost = tree[i].distance + tree[j].distance;
        let swap_cost = swapped_cost(distances, &tree[i], &tree[j]);

        if swap_cost < current_cost - TIE_TOLERANCE && swap_keeps_tree_shape(&tree[i], &tree[j]) {
          perform_swap(distances, tree, i, j);
          improved = true;
        }
      }
    }
  }
}

fn share_endpoint(e1: &Edge, e2: &Edge) -> bool {
  e1.from == e2.from || e1.from == e2.to || e1.to == e2.from || e1.to == e2.to
}

fn swapped_cost(distances: &DistanceMatrix, e1: &Edge, e2: &Edge) -> f64 {
  let cost1 = distances.get(e1.from, e2.to) + distances.get(e2.from, e1.to);
  let cost2 = distances.get(e1.to, e2.from) + distances.get(e2.to, e1.from);
  cost1.min(cost2)
}

/// Exchanging child endpoints keeps the multiset of children intact, so
/// in-degrees are preserved; the exchange is only unsound when one of
/// the rewritten edges would become a self-loop.
fn swap_keeps_tree_shape(e1: &Edge, e2: &Edge) -> bool {
  e1.from != e2.to && e2.from != e1.to
}

fn perform_swap(distances: &DistanceMatrix, tree: &mut [Edge], idx1: usize, idx2: usize) {
  let to1 = tree[idx1].to;
  tree[idx1].to = tree[idx2].to;
  tree[idx2].to = to1;
  tree[idx1].distance = distances.get(tree[idx1].from, tree[idx1].to);
  tree[idx2].distance = distances.get(tree[idx2].from, tree[idx2].to);
}
