pub mod fasta;
pub mod json;
pub mod nwk;
