/// A connection between two taxa in a spanning tree. The undirected
/// builder records construction order in `from`/`to`; the arborescence
/// builder directs edges from parent to child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Edge {
  pub from: usize,
  pub to: usize,
  pub distance: f64,
}

impl Edge {
  pub const fn new(from: usize, to: usize, distance: f64) -> Self {
    Self { from, to, distance }
  }
}
