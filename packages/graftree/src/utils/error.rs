use eyre::Report;
use itertools::Itertools;

/// Flattens an error report chain into a single `:`-separated line,
/// suitable for embedding into a JSON response envelope.
pub fn report_to_string(report: &Report) -> String {
  report.chain().map(ToString::to_string).join(": ")
}

#[macro_export(local_inner_macros)]
macro_rules! make_error {
  ($($arg:tt)*) => {
    {
      Err(eyre::eyre!(std::format!($($arg)*)))
    }
  };
}

pub use make_error;

#[macro_export(local_inner_macros)]
macro_rules! make_internal_error {
  ($($arg:tt)*) => {
    {
      let msg_external = std::format!($($arg)*);
      let msg = std::format!("{msg_external}. This is an internal error. Please report it to developers.");
      Err(eyre::eyre!(msg))
    }
  };
}

pub use make_internal_error;

#[cfg(test)]
mod tests {
  use super::*;
  use eyre::WrapErr;
  use pretty_assertions::assert_eq;

  #[test]
  fn flattens_report_chain() {
    let result: Result<(), Report> = make_error!("inner failure");
    let report = result.wrap_err("outer context").unwrap_err();
    assert_eq!(report_to_string(&report), "outer context: inner failure");
  }
}
