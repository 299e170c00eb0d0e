use crate::make_error;
use eyre::Report;
use serde::{Deserialize, Serialize};
use std::io::BufRead;

#[derive(Clone, Default, Debug, Deserialize, Serialize)]
pub struct FastaRecord {
  pub seq_name: String,
  pub seq: String,
  pub index: usize,
}

/// Reads all records from FASTA input. Sequence fragments are
/// concatenated and uppercased; alignment is the caller's concern.
pub fn read_fasta(reader: impl BufRead) -> Result<Vec<FastaRecord>, Report> {
  let mut records: Vec<FastaRecord> = Vec::new();

  for line in reader.lines() {
    let line = line?;
    let line = line.trim_end();
    if line.is_empty() {
      continue;
    }

    if let Some(name) = line.strip_prefix('>') {
      records.push(FastaRecord {
        seq_name: name.trim().to_owned(),
        seq: String::new(),
        index: records.len(),
      });
    } else if let Some(record) = records.last_mut() {
      record.seq.extend(line.chars().map(|c| c.to_ascii_uppercase()));
    } else {
      return make_error!("Expected character '>' at record start");
    }
  }

  if records.is_empty() {
    return make_error!("No FASTA records found");
  }

  Ok(records)
}

pub fn read_fasta_str(contents: &str) -> Result<Vec<FastaRecord>, Report> {
  read_fasta(contents.as_bytes())
}
