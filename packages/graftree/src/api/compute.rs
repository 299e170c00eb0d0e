use crate::api::params::{MatrixType, Method};
use crate::distance::allelic::{asymmetric_distances, symmetric_distances};
use crate::distance::matrix::DistanceMatrix;
use crate::distance::missing::MissingHandler;
use crate::io::json::stringify_response;
use crate::io::nwk::{write_nwk_str, NwkWriteOptions};
use crate::profile::profile_data::ProfileData;
use crate::tree::arborescence::build_arborescence;
use crate::tree::edge::Edge;
use crate::tree::mst::{build_mstree, Heuristic};
use crate::utils::error::report_to_string;
use eyre::Report;
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TreeResponse {
  pub success: bool,
  pub newick: String,
  pub edges: Vec<EdgeJson>,
  pub n_nodes: usize,
  pub n_edges: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EdgeJson {
  pub from: usize,
  pub to: usize,
  pub from_name: String,
  pub to_name: String,
  pub distance: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatrixResponse {
  pub success: bool,
  pub matrix: Vec<Vec<f64>>,
  pub strain_names: Vec<String>,
  pub n_strains: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
  pub success: bool,
  pub error: String,
}

/// Computes a spanning tree over the given allelic profiles and returns
/// the JSON response envelope. Failures of any kind are reported inside
/// the envelope; this function does not panic on malformed requests.
pub fn compute_tree(
  profile_json: &str,
  method: &str,
  matrix_type: &str,
  missing_handler: i64,
  heuristic: &str,
) -> String {
  match try_compute_tree(profile_json, method, matrix_type, missing_handler, heuristic) {
    Ok(response) => stringify_response(&response),
    Err(report) => error_response(&report),
  }
}

/// Computes only the distance matrix and returns the JSON response
/// envelope.
pub fn compute_distance_matrix(profile_json: &str, matrix_type: &str, missing_handler: i64) -> String {
  match try_compute_distance_matrix(profile_json, matrix_type, missing_handler) {
    Ok(response) => stringify_response(&response),
    Err(report) => error_response(&report),
  }
}

fn error_response(report: &Report) -> String {
  stringify_response(&ErrorResponse {
    success: false,
    error: report_to_string(report),
  })
}

fn distances_for(data: &ProfileData, matrix_type: MatrixType, missing_handler: i64) -> Result<DistanceMatrix, Report> {
  let handler = MissingHandler::from_wire(missing_handler)?;
  let distances = match matrix_type {
    MatrixType::Symmetric => symmetric_distances(data, handler),
    MatrixType::Asymmetric => asymmetric_distances(data),
  };
  distances.ensure_finite()?;
  Ok(distances)
}

fn try_compute_tree(
  profile_json: &str,
  method: &str,
  matrix_type: &str,
  missing_handler: i64,
  heuristic: &str,
) -> Result<TreeResponse, Report> {
  let method: Method = method.parse()?;
  let matrix_type: MatrixType = matrix_type.parse()?;
  let heuristic: Heuristic = heuristic.parse()?;

  let data = ProfileData::from_json_str(profile_json)?;
  let distances = distances_for(&data, matrix_type, missing_handler)?;

  debug!(
    "Building {method:?} tree over {} strains with {} loci",
    data.n_strains(),
    data.n_genes()
  );

  let edges = match method {
    Method::MsTree => build_mstree(&distances, heuristic),
    Method::MsTreeV2 => build_arborescence(&distances),
  };

  let newick = write_nwk_str(&edges, &data.strain_names, &NwkWriteOptions::default())?;

  Ok(TreeResponse {
    success: true,
    newick,
    edges: edges_to_json(&edges, &data.strain_names),
    n_nodes: data.n_strains(),
    n_edges: edges.len(),
  })
}

fn try_compute_distance_matrix(
  profile_json: &str,
  matrix_type: &str,
  missing_handler: i64,
) -> Result<MatrixResponse, Report> {
  let matrix_type: MatrixType = matrix_type.parse()?;

  let data = ProfileData::from_json_str(profile_json)?;
  let distances = distances_for(&data, matrix_type, missing_handler)?;

  Ok(MatrixResponse {
    success: true,
    matrix: distances.to_rows(),
    n_strains: data.n_strains(),
    strain_names: data.strain_names,
  })
}

fn edges_to_json(edges: &[Edge], strain_names: &[String]) -> Vec<EdgeJson> {
  edges
    .iter()
    .map(|edge| EdgeJson {
      from: edge.from,
      to: edge.to,
      from_name: strain_names[edge.from].clone(),
      to_name: strain_names[edge.to].clone(),
      distance: edge.distance,
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use indoc::indoc;
  use pretty_assertions::assert_eq;
  use rstest::rstest;
  use std::collections::BTreeSet;

  const THREE_STRAINS: &str = indoc! {r#"
    {
      "strains": ["A", "B", "C"],
      "profiles": [[1, 2, 3], [1, 2, 4], [1, 3, 3]]
    }
  "#};

  fn assert_error(response: &str, expected_fragment: &str) {
    let value: serde_json::Value = serde_json::from_str(response).unwrap();
    assert_eq!(value["success"], false, "expected a failure envelope: {response}");
    let error = value["error"].as_str().unwrap();
    assert!(error.contains(expected_fragment), "error '{error}' does not contain '{expected_fragment}'");
  }

  #[test]
  fn arborescence_over_three_strains() {
    let response = compute_tree(THREE_STRAINS, "MSTreeV2", "asymmetric", 0, "harmonic");
    let response: TreeResponse = serde_json::from_str(&response).unwrap();

    assert!(response.success);
    assert_eq!(response.n_nodes, 3);
    assert_eq!(response.n_edges, 2);
    assert_eq!(response.newick, "(B:1.000000,C:1.000000)A;");

    let from_names: Vec<&str> = response.edges.iter().map(|e| e.from_name.as_str()).collect();
    assert_eq!(from_names, vec!["A", "A"]);
    assert!(response.edges.iter().all(|e| e.distance == 1.0));
  }

  #[test]
  fn mstree_over_three_strains_is_a_star() {
    let response = compute_tree(THREE_STRAINS, "MSTree", "symmetric", 0, "eBurst");
    let response: TreeResponse = serde_json::from_str(&response).unwrap();

    assert!(response.success);
    assert_eq!(response.n_edges, 2);
    assert_eq!(response.newick, "(B:1.000000,C:1.000000)A;");
    let total_weight: f64 = response.edges.iter().map(|e| e.distance).sum();
    assert_eq!(total_weight, 2.0);
  }

  #[test]
  fn identical_profiles_yield_zero_length_branches() {
    let profile_json = indoc! {r#"
      {
        "strains": ["A", "B", "C", "D", "E"],
        "profiles": [[7, 7], [7, 7], [7, 7], [7, 7], [7, 7]]
      }
    "#};
    let response = compute_tree(profile_json, "MSTree", "symmetric", 0, "eBurst");
    let response: TreeResponse = serde_json::from_str(&response).unwrap();

    assert_eq!(response.n_edges, 4);
    assert!(response.edges.iter().all(|e| e.distance == 0.0));
    assert_eq!(response.newick.matches("0.000000").count(), 4);
  }

  #[test]
  fn asymmetric_distances_root_at_the_complete_profile() {
    let profile_json = r#"{"strains": ["A", "B"], "profiles": [[0, 0, 0], [1, 2, 3]]}"#;
    let response = compute_tree(profile_json, "MSTreeV2", "asymmetric", 0, "harmonic");
    let response: TreeResponse = serde_json::from_str(&response).unwrap();

    assert_eq!(response.n_edges, 1);
    assert_eq!(response.edges[0].from, 0);
    assert_eq!(response.edges[0].to, 1);
    assert_eq!(response.edges[0].distance, 1.5);
    assert_eq!(response.newick, "(B:1.500000)A;");
  }

  #[test]
  fn quotes_names_with_metacharacters() {
    let profile_json = r#"{"strains": ["S 1", "S:2"], "profiles": [[1], [1]]}"#;
    let response = compute_tree(profile_json, "MSTree", "symmetric", 0, "eBurst");
    let response: TreeResponse = serde_json::from_str(&response).unwrap();

    assert_eq!(response.newick, "('S:2':0.000000)'S 1';");
  }

  #[test]
  fn single_strain_is_a_degenerate_tree() {
    let profile_json = r#"{"strains": ["only"], "profiles": [[1, 2]]}"#;
    let response = compute_tree(profile_json, "MSTree", "symmetric", 0, "eBurst");
    let response: TreeResponse = serde_json::from_str(&response).unwrap();

    assert!(response.success);
    assert_eq!(response.n_nodes, 1);
    assert_eq!(response.n_edges, 0);
    assert!(response.edges.is_empty());
    assert_eq!(response.newick, "only;");
  }

  #[test]
  fn responses_are_deterministic() {
    let first = compute_tree(THREE_STRAINS, "MSTreeV2", "asymmetric", 0, "harmonic");
    let second = compute_tree(THREE_STRAINS, "MSTreeV2", "asymmetric", 0, "harmonic");
    assert_eq!(first, second);
  }

  fn undirected_edge_set(response: &TreeResponse) -> BTreeSet<(String, String, String)> {
    response
      .edges
      .iter()
      .map(|edge| {
        let (a, b) = if edge.from_name <= edge.to_name {
          (edge.from_name.clone(), edge.to_name.clone())
        } else {
          (edge.to_name.clone(), edge.from_name.clone())
        };
        (a, b, format!("{:.6}", edge.distance))
      })
      .collect()
  }

  #[test]
  fn tree_topology_is_invariant_under_strain_permutation() {
    let original = compute_tree(
      r#"{"strains": ["A", "B", "C", "D"], "profiles": [[1, 1, 1, 1], [1, 1, 1, 2], [2, 2, 1, 1], [2, 2, 2, 2]]}"#,
      "MSTree",
      "symmetric",
      0,
      "eBurst",
    );
    let permuted = compute_tree(
      r#"{"strains": ["D", "C", "B", "A"], "profiles": [[2, 2, 2, 2], [2, 2, 1, 1], [1, 1, 1, 2], [1, 1, 1, 1]]}"#,
      "MSTree",
      "symmetric",
      0,
      "eBurst",
    );

    let original: TreeResponse = serde_json::from_str(&original).unwrap();
    let permuted: TreeResponse = serde_json::from_str(&permuted).unwrap();
    assert_eq!(undirected_edge_set(&original), undirected_edge_set(&permuted));
  }

  #[rstest]
  #[case::bad_json("not json", "MSTree", "symmetric", 0, "eBurst", "When parsing profile JSON")]
  #[case::nj(THREE_STRAINS, "NJ", "symmetric", 0, "eBurst", "Method 'NJ' is not implemented")]
  #[case::unknown_method(THREE_STRAINS, "UPGMA", "symmetric", 0, "eBurst", "Unknown method: 'UPGMA'")]
  #[case::unknown_matrix(THREE_STRAINS, "MSTree", "diagonal", 0, "eBurst", "Unknown matrix type: 'diagonal'")]
  #[case::bad_handler(THREE_STRAINS, "MSTree", "symmetric", 7, "eBurst", "Unknown missing-data handler: 7")]
  #[case::bad_heuristic(THREE_STRAINS, "MSTree", "symmetric", 0, "random", "Unknown heuristic: 'random'")]
  fn tree_request_failures(
    #[case] profile_json: &str,
    #[case] method: &str,
    #[case] matrix_type: &str,
    #[case] missing_handler: i64,
    #[case] heuristic: &str,
    #[case] expected_fragment: &str,
  ) {
    let response = compute_tree(profile_json, method, matrix_type, missing_handler, heuristic);
    assert_error(&response, expected_fragment);
  }

  #[test]
  fn malformed_batches_are_rejected() {
    let ragged = r#"{"strains": ["A", "B"], "profiles": [[1, 2], [1]]}"#;
    assert_error(
      &compute_tree(ragged, "MSTree", "symmetric", 0, "eBurst"),
      "Profile for strain 'B' has 1 loci, expected 2",
    );

    let empty = r#"{"strains": [], "profiles": []}"#;
    assert_error(
      &compute_tree(empty, "MSTree", "symmetric", 0, "eBurst"),
      "Profile data must contain at least one strain",
    );

    let mismatched = r#"{"strains": ["A", "B"], "profiles": [[1, 2]]}"#;
    assert_error(
      &compute_tree(mismatched, "MSTree", "symmetric", 0, "eBurst"),
      "Number of profiles (1) does not match number of strains (2)",
    );
  }

  #[test]
  fn distance_matrix_under_missing_data_policies() {
    let profile_json = r#"{"strains": ["A", "B", "C"], "profiles": [[1, 2, 0], [1, 2, 3], [1, 2, 3]]}"#;

    let ignored = compute_distance_matrix(profile_json, "symmetric", 0);
    let ignored: MatrixResponse = serde_json::from_str(&ignored).unwrap();
    assert_eq!(ignored.matrix, vec![vec![0.0; 3]; 3]);
    assert_eq!(ignored.n_strains, 3);
    assert_eq!(ignored.strain_names, vec!["A", "B", "C"]);

    let absolute = compute_distance_matrix(profile_json, "symmetric", 3);
    let absolute: MatrixResponse = serde_json::from_str(&absolute).unwrap();
    assert_eq!(
      absolute.matrix,
      vec![vec![0.0, 1.0, 1.0], vec![1.0, 0.0, 0.0], vec![1.0, 0.0, 0.0]]
    );
  }

  #[test]
  fn asymmetric_distance_matrix_is_directional() {
    let profile_json = r#"{"strains": ["A", "B"], "profiles": [[0, 0, 0], [1, 2, 3]]}"#;
    let response = compute_distance_matrix(profile_json, "asymmetric", 0);
    let response: MatrixResponse = serde_json::from_str(&response).unwrap();
    assert_eq!(response.matrix, vec![vec![0.0, 1.5], vec![0.0, 0.0]]);
  }

  #[test]
  fn distance_matrix_request_failures() {
    assert_error(
      &compute_distance_matrix(THREE_STRAINS, "diagonal", 0),
      "Unknown matrix type: 'diagonal'",
    );
    assert_error(
      &compute_distance_matrix(THREE_STRAINS, "symmetric", -1),
      "Unknown missing-data handler: -1",
    );
  }
}
