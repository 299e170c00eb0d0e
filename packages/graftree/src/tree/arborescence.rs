use crate::distance::matrix::DistanceMatrix;
use crate::tree::edge::Edge;
use crate::tree::mst::TIE_TOLERANCE;
use crate::tree::recraft::recraft_branches;
use crate::tree::union_find::UnionFind;
use log::debug;
use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet};

/// Builds a minimum arborescence rooted at vertex 0 from a directional
/// distance matrix: every other vertex ends up with exactly one incoming
/// edge. Cycles among the per-vertex minimum incoming edges are
/// contracted and the reduced problem is solved recursively, then the
/// solution is expanded back onto the original vertices. Each level
/// finishes with a local recrafting pass.
pub fn build_arborescence(distances: &DistanceMatrix) -> Vec<Edge> {
  let mut edges = minimum_incoming_edges(distances);

  let cycle_id = detect_cycles(distances.n_nodes(), &edges);

  if cycle_id.iter().any(Option::is_some) {
    edges = contract_and_solve(distances, &edges, &cycle_id);
  }

  recraft_branches(distances, &mut edges);

  edges
}

/// Minimum incoming edge per non-root vertex. Ties within the absolute
/// tolerance go to the origin with the larger harmonic-mean score.
fn minimum_incoming_edges(distances: &DistanceMatrix) -> Vec<Edge> {
  let n = distances.n_nodes();
  let mut edges = Vec::with_capacity(n.saturating_sub(1));

  for to in 1..n {
    let mut min_dist = f64::MAX;
    let mut best_from = None;
    let mut best_score = -1.0;

    for from in 0..n {
      if from == to {
        continue;
      }

      let dist = distances.get(from, to);
      if dist < min_dist {
        min_dist = dist;
        best_from = Some(from);
        best_score = distances.harmonic_mean_score(from);
      } else if (dist - min_dist).abs() < TIE_TOLERANCE {
        let score = distances.harmonic_mean_score(from);
        if score > best_score {
          best_from = Some(from);
          best_score = score;
        }
      }
    }

    if let Some(from) = best_from {
      edges.push(Edge::new(from, to, min_dist));
    }
  }

  edges
}

/// Walks the picked edges in order through a union-find; an edge whose
/// endpoints already share a component closes a cycle, which is then
/// traced backward through the unique predecessors and labeled with a
/// fresh identifier.
fn detect_cycles(n_nodes: usize, edges: &[Edge]) -> Vec<Option<usize>> {
  let mut components = UnionFind::new(n_nodes);
  let mut cycle_id: Vec<Option<usize>> = vec![None; n_nodes];
  let mut next_cycle_id = 0_usize;

  let predecessor: BTreeMap<usize, usize> = edges.iter().map(|edge| (edge.to, edge.from)).collect();

  for edge in edges {
    let root_from = components.find(edge.from);
    let root_to = components.find(edge.to);

    if root_from == root_to && cycle_id[edge.to].is_none() {
      mark_cycle(&predecessor, edge.to, &mut cycle_id, next_cycle_id);
      next_cycle_id += 1;
    }

    components.link(root_from, root_to);
  }

  cycle_id
}

fn mark_cycle(predecessor: &BTreeMap<usize, usize>, start: usize, cycle_id: &mut [Option<usize>], id: usize) {
  let mut visited = BTreeSet::new();
  let mut current = start;

  while visited.insert(current) {
    cycle_id[current] = Some(id);
    match predecessor.get(&current) {
      Some(&from) => current = from,
      None => break,
    }
  }
}

/// Collapses every cycle into a single vertex, solves the contracted
/// problem recursively, and expands the solution. The cost of entering
/// a cycle is discounted by the weight of the picked edge it displaces.
fn contract_and_solve(distances: &DistanceMatrix, edges: &[Edge], cycle_id: &[Option<usize>]) -> Vec<Edge> {
  let n = distances.n_nodes();
  let n_cycles = cycle_id.iter().flatten().max().map_or(0, |max_id| max_id + 1);

  // Non-cycle vertices receive fresh contracted indices in input order,
  // then each cycle collapses into one contracted index.
  let mut node_mapping = vec![usize::MAX; n];
  let mut cycles: Vec<Vec<usize>> = vec![Vec::new(); n_cycles];
  let mut next_node = 0_usize;

  for (node, id) in cycle_id.iter().enumerate() {
    match id {
      None => {
        node_mapping[node] = next_node;
        next_node += 1;
      }
      Some(id) => cycles[*id].push(node),
    }
  }
  for cycle in &cycles {
    for &node in cycle {
      node_mapping[node] = next_node;
    }
    next_node += 1;
  }

  let n_contracted = next_node;

  let incoming_weight: BTreeMap<usize, f64> = edges.iter().map(|edge| (edge.to, edge.distance)).collect();

  // For each contracted pair keep the smallest reduced distance together
  // with the original endpoints achieving it.
  let mut contracted = Array2::<f64>::from_elem((n_contracted, n_contracted), f64::MAX);
  let mut edge_mapping: BTreeMap<(usize, usize), Edge> = BTreeMap::new();

  for i in 0..n {
    for j in 0..n {
      if i == j {
        continue;
      }
      let (ci, cj) = (node_mapping[i], node_mapping[j]);
      if ci == cj {
        continue;
      }

      let dist = distances.get(i, j);
      let reduced = if cycle_id[j].is_some() {
        dist - incoming_weight.get(&j).copied().unwrap_or(0.0)
      } else {
        dist
      };

      if reduced < contracted[[ci, cj]] {
        contracted[[ci, cj]] = reduced;
        edge_mapping.insert((ci, cj), Edge::new(i, j, dist));
      }
    }
  }

  debug!("Contracting {n_cycles} cycle(s): {n} vertices down to {n_contracted}");

  let contracted_edges = build_arborescence(&DistanceMatrix::from_array(contracted));

  // Inter-component winners first, then the original picks for every
  // vertex still lacking an incoming edge. Cycles are thereby broken at
  // the vertex the recursive solution enters through.
  let mut final_edges = Vec::new();
  let mut covered = BTreeSet::new();

  for edge in &contracted_edges {
    if let Some(original) = edge_mapping.get(&(edge.from, edge.to)) {
      final_edges.push(*original);
      covered.insert(original.to);
    }
  }

  for edge in edges {
    if !covered.contains(&edge.to) {
      final_edges.push(*edge);
      covered.insert(edge.to);
    }
  }

  final_edges
}
