pub mod api;
pub mod distance;
pub mod io;
pub mod profile;
pub mod tree;
pub mod utils;
