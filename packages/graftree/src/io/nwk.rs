use crate::make_error;
use crate::tree::edge::Edge;
use crate::utils::string::quote_single;
use eyre::{Report, WrapErr};
use log::warn;
use smart_default::SmartDefault;
use std::io::Write;

/// Characters that force a label into single quotes.
const QUOTE_TRIGGERS: &[char] = &[' ', ':', ';', '(', ')', ',', '[', ']', '\''];

#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct NwkWriteOptions {
  /// Branch lengths are written with this many digits after the decimal
  /// point.
  #[default = 6]
  pub decimal_digits: usize,
}

pub fn write_nwk_str(edges: &[Edge], names: &[String], options: &NwkWriteOptions) -> Result<String, Report> {
  let mut buf = Vec::new();
  write_nwk_writer(&mut buf, edges, names, options)?;
  Ok(String::from_utf8(buf)?)
}

/// Serializes an edge list as a rooted Newick tree. Every vertex is a
/// taxon, so internal vertices carry labels too. Trees without edges
/// degenerate to `();` (no taxa) or `name;` (a single taxon).
pub fn write_nwk_writer(
  writer: &mut impl Write,
  edges: &[Edge],
  names: &[String],
  options: &NwkWriteOptions,
) -> Result<(), Report> {
  if edges.is_empty() {
    match names.first() {
      None => write!(writer, "();")?,
      Some(name) => write!(writer, "{};", sanitize_name(name))?,
    }
    return Ok(());
  }

  let n_nodes = names.len();
  let mut children: Vec<Vec<usize>> = vec![Vec::new(); n_nodes];
  let mut parent: Vec<Option<usize>> = vec![None; n_nodes];
  let mut branch_length = vec![0.0; n_nodes];

  for edge in edges {
    if edge.from >= n_nodes || edge.to >= n_nodes {
      return make_error!(
        "When writing Newick: edge {} -> {} references a vertex outside of the {n_nodes} known strains",
        edge.from,
        edge.to
      );
    }
    if !edge.distance.is_finite() {
      warn!("When writing Newick: branch length {} of vertex {} is not finite", edge.distance, edge.to);
    }
    children[edge.from].push(edge.to);
    parent[edge.to] = Some(edge.from);
    branch_length[edge.to] = edge.distance;
  }

  let root = find_root(&parent, &children);
  let mut visited = vec![false; n_nodes];
  node_to_nwk(writer, root, &children, &branch_length, names, &mut visited, options)?;
  write!(writer, ";")?;

  Ok(())
}

/// First vertex with no parent. If every vertex has one the input is
/// cyclic; fall back to the vertex with the most children. Well-formed
/// builder output never takes the fallback.
fn find_root(parent: &[Option<usize>], children: &[Vec<usize>]) -> usize {
  if let Some(root) = parent.iter().position(Option::is_none) {
    return root;
  }

  let mut best_root = 0;
  let mut max_children = 0;
  for (node, node_children) in children.iter().enumerate() {
    if node_children.len() > max_children {
      max_children = node_children.len();
      best_root = node;
    }
  }
  best_root
}

#[allow(clippy::too_many_arguments)]
fn node_to_nwk(
  writer: &mut impl Write,
  node: usize,
  children: &[Vec<usize>],
  branch_length: &[f64],
  names: &[String],
  visited: &mut [bool],
  options: &NwkWriteOptions,
) -> Result<(), Report> {
  if visited[node] {
    return make_error!("When writing Newick: cycle detected at vertex {node}");
  }
  visited[node] = true;

  if !children[node].is_empty() {
    write!(writer, "(")?;
    for (i, &child) in children[node].iter().enumerate() {
      if i > 0 {
        write!(writer, ",")?;
      }
      node_to_nwk(writer, child, children, branch_length, names, visited, options)?;
      write!(writer, ":{:.digits$}", branch_length[child], digits = options.decimal_digits)?;
    }
    write!(writer, ")")?;
  }

  write!(writer, "{}", sanitize_name(&names[node]))?;
  Ok(())
}

/// Labels containing Newick metacharacters are wrapped in single quotes.
/// Inner quotes are not escaped; naming hygiene is the caller's concern.
pub fn sanitize_name(name: &str) -> String {
  if name.contains(QUOTE_TRIGGERS) {
    quote_single(name)
  } else {
    name.to_owned()
  }
}

/// Tree produced by [`parse_nwk_str`]. Nodes are stored in the order
/// they open in the input; node 0 is the root.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NwkTree {
  pub nodes: Vec<NwkNode>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NwkNode {
  pub name: String,
  pub parent: Option<usize>,
  pub branch_length: Option<f64>,
  pub children: Vec<usize>,
}

pub fn parse_nwk_str(input: &str) -> Result<NwkTree, Report> {
  NwkParser::new(input).parse()
}

/// Recursive-descent reader for the Newick subset emitted by
/// [`write_nwk_writer`]: nested parenthesized child lists, optional
/// labels (bare or single-quoted) on every node, optional `:length`
/// annotations, `;` terminator.
struct NwkParser<'a> {
  bytes: &'a [u8],
  pos: usize,
  nodes: Vec<NwkNode>,
}

impl<'a> NwkParser<'a> {
  fn new(input: &'a str) -> Self {
    Self {
      bytes: input.as_bytes(),
      pos: 0,
      nodes: Vec::new(),
    }
  }

  fn peek(&self) -> Option<u8> {
    self.bytes.get(self.pos).copied()
  }

  fn bump(&mut self) -> Option<u8> {
    let byte = self.peek();
    if byte.is_some() {
      self.pos += 1;
    }
    byte
  }

  fn skip_whitespace(&mut self) {
    while matches!(self.peek(), Some(byte) if byte.is_ascii_whitespace()) {
      self.pos += 1;
    }
  }

  fn parse(mut self) -> Result<NwkTree, Report> {
    self.skip_whitespace();
    self.parse_node(None)?;
    self.skip_whitespace();
    match self.bump() {
      Some(b';') => Ok(NwkTree { nodes: self.nodes }),
      _ => make_error!("When parsing Newick: expected ';' at position {}", self.pos),
    }
  }

  fn parse_node(&mut self, parent: Option<usize>) -> Result<usize, Report> {
    let index = self.nodes.len();
    self.nodes.push(NwkNode {
      parent,
      ..NwkNode::default()
    });

    self.skip_whitespace();
    if self.peek() == Some(b'(') {
      self.pos += 1;
      loop {
        let child = self.parse_node(Some(index))?;
        self.nodes[index].children.push(child);
        self.skip_whitespace();
        match self.bump() {
          Some(b',') => {}
          Some(b')') => break,
          _ => return make_error!("When parsing Newick: expected ',' or ')' at position {}", self.pos),
        }
      }
    }

    self.skip_whitespace();
    self.nodes[index].name = self.parse_label()?;

    self.skip_whitespace();
    if self.peek() == Some(b':') {
      self.pos += 1;
      self.nodes[index].branch_length = Some(self.parse_number()?);
    }

    Ok(index)
  }

  fn parse_label(&mut self) -> Result<String, Report> {
    if self.peek() == Some(b'\'') {
      self.pos += 1;
      let start = self.pos;
      while matches!(self.peek(), Some(byte) if byte != b'\'') {
        self.pos += 1;
      }
      if self.peek() != Some(b'\'') {
        return make_error!("When parsing Newick: unterminated quoted label at position {start}");
      }
      let label = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
      self.pos += 1;
      return Ok(label);
    }

    let start = self.pos;
    while let Some(byte) = self.peek() {
      if matches!(byte, b'(' | b')' | b',' | b':' | b';' | b'[' | b']') || byte.is_ascii_whitespace() {
        break;
      }
      self.pos += 1;
    }
    Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
  }

  fn parse_number(&mut self) -> Result<f64, Report> {
    self.skip_whitespace();
    let start = self.pos;
    while matches!(self.peek(), Some(byte) if matches!(byte, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E')) {
      self.pos += 1;
    }
    let text = std::str::from_utf8(&self.bytes[start..self.pos])?;
    text
      .parse::<f64>()
      .wrap_err_with(|| format!("When parsing Newick: invalid branch length '{text}' at position {start}"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::o;
  use approx::assert_relative_eq;
  use maplit::btreemap;
  use pretty_assertions::assert_eq;
  use std::collections::BTreeMap;

  fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| (*name).to_owned()).collect()
  }

  /// Child name -> (parent name, branch length).
  fn parent_map(tree: &NwkTree) -> BTreeMap<String, (String, f64)> {
    tree
      .nodes
      .iter()
      .filter_map(|node| {
        node.parent.map(|parent| {
          (
            node.name.clone(),
            (tree.nodes[parent].name.clone(), node.branch_length.unwrap_or_default()),
          )
        })
      })
      .collect()
  }

  #[test]
  fn writes_star_tree() -> Result<(), Report> {
    let edges = vec![Edge::new(0, 1, 1.0), Edge::new(0, 2, 1.0)];
    let nwk = write_nwk_str(&edges, &names(&["A", "B", "C"]), &NwkWriteOptions::default())?;
    assert_eq!(nwk, "(B:1.000000,C:1.000000)A;");
    Ok(())
  }

  #[test]
  fn writes_chain_tree() -> Result<(), Report> {
    let edges = vec![Edge::new(0, 1, 1.0), Edge::new(1, 2, 2.5)];
    let nwk = write_nwk_str(&edges, &names(&["A", "B", "C"]), &NwkWriteOptions::default())?;
    assert_eq!(nwk, "((C:2.500000)B:1.000000)A;");
    Ok(())
  }

  #[test]
  fn quotes_labels_with_metacharacters() -> Result<(), Report> {
    let edges = vec![Edge::new(0, 1, 0.0)];
    let nwk = write_nwk_str(&edges, &names(&["S 1", "S:2"]), &NwkWriteOptions::default())?;
    assert_eq!(nwk, "('S:2':0.000000)'S 1';");
    Ok(())
  }

  #[test]
  fn degenerate_trees() -> Result<(), Report> {
    assert_eq!(write_nwk_str(&[], &[], &NwkWriteOptions::default())?, "();");
    assert_eq!(write_nwk_str(&[], &names(&["only"]), &NwkWriteOptions::default())?, "only;");
    Ok(())
  }

  #[test]
  fn rejects_out_of_range_edges() {
    let edges = vec![Edge::new(0, 5, 1.0)];
    let result = write_nwk_str(&edges, &names(&["A", "B"]), &NwkWriteOptions::default());
    let message = format!("{}", result.unwrap_err());
    assert!(message.contains("outside of the 2 known strains"), "unexpected message: {message}");
  }

  #[test]
  fn falls_back_to_the_busiest_vertex_when_all_have_parents() {
    let parent = vec![Some(1), Some(0), Some(0)];
    let children = vec![vec![1, 2], vec![0], vec![]];
    assert_eq!(find_root(&parent, &children), 0);
  }

  #[test]
  fn parses_labels_lengths_and_structure() -> Result<(), Report> {
    let tree = parse_nwk_str("(B:1.000000,(D:0.500000)C:2.000000)A;")?;
    let root = &tree.nodes[0];
    assert_eq!(root.name, "A");
    assert_eq!(root.parent, None);
    assert_eq!(root.children.len(), 2);

    let expected = btreemap! {
      o!("B") => (o!("A"), 1.0),
      o!("C") => (o!("A"), 2.0),
      o!("D") => (o!("C"), 0.5),
    };
    assert_eq!(parent_map(&tree), expected);
    Ok(())
  }

  #[test]
  fn parses_quoted_labels() -> Result<(), Report> {
    let tree = parse_nwk_str("('S:2':0.250000)'S 1';")?;
    assert_eq!(tree.nodes[0].name, "S 1");
    assert_eq!(tree.nodes[1].name, "S:2");
    assert_relative_eq!(tree.nodes[1].branch_length.unwrap(), 0.25);
    Ok(())
  }

  #[test]
  fn rejects_missing_terminator() {
    let result = parse_nwk_str("(B:1.0)A");
    let message = format!("{}", result.unwrap_err());
    assert!(message.contains("expected ';'"), "unexpected message: {message}");
  }

  #[test]
  fn round_trips_through_the_writer() -> Result<(), Report> {
    let edges = vec![
      Edge::new(0, 2, 1.0),
      Edge::new(2, 1, 3.0),
      Edge::new(2, 3, 0.125),
      Edge::new(0, 4, 7.0),
    ];
    let strain_names = names(&["root strain", "B", "C", "D", "E"]);

    let nwk = write_nwk_str(&edges, &strain_names, &NwkWriteOptions::default())?;
    let tree = parse_nwk_str(&nwk)?;

    let expected = btreemap! {
      o!("B") => (o!("C"), 3.0),
      o!("C") => (o!("root strain"), 1.0),
      o!("D") => (o!("C"), 0.125),
      o!("E") => (o!("root strain"), 7.0),
    };
    assert_eq!(parent_map(&tree), expected);
    Ok(())
  }
}
