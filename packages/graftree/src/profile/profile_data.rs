use crate::make_error;
use eyre::{Report, WrapErr};
use serde::{Deserialize, Serialize};

/// A batch of strains, each characterized by an integer vector of allele
/// calls over a fixed schema of loci. Allele identifiers are nominal:
/// equality is the only meaningful comparison. Values less than or equal
/// to zero denote missing data.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileData {
  #[serde(rename = "strains")]
  pub strain_names: Vec<String>,
  pub profiles: Vec<Vec<i32>>,
}

impl ProfileData {
  pub fn new(strain_names: Vec<String>, profiles: Vec<Vec<i32>>) -> Result<Self, Report> {
    let data = Self { strain_names, profiles };
    data.validate()?;
    Ok(data)
  }

  /// Parses the wire format `{"strains": [...], "profiles": [[...], ...]}`.
  pub fn from_json_str(json_str: &str) -> Result<Self, Report> {
    let data: Self = serde_json::from_str(json_str).wrap_err("When parsing profile JSON")?;
    data.validate()?;
    Ok(data)
  }

  pub fn n_strains(&self) -> usize {
    self.strain_names.len()
  }

  pub fn n_genes(&self) -> usize {
    self.profiles.first().map_or(0, Vec::len)
  }

  fn validate(&self) -> Result<(), Report> {
    if self.strain_names.is_empty() {
      return make_error!("Profile data must contain at least one strain");
    }

    if self.profiles.len() != self.strain_names.len() {
      return make_error!(
        "Number of profiles ({}) does not match number of strains ({})",
        self.profiles.len(),
        self.strain_names.len()
      );
    }

    let n_genes = self.n_genes();
    for (name, profile) in self.strain_names.iter().zip(&self.profiles) {
      if profile.len() != n_genes {
        return make_error!("Profile for strain '{name}' has {} loci, expected {n_genes}", profile.len());
      }
    }

    Ok(())
  }
}
