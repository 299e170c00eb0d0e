use env_logger::Env;
use log::{Level, LevelFilter, Record};
use owo_colors::OwoColorize;
use std::io::Write;

fn color_log_level(record: &Record) -> String {
  let mut level_str = record.level().to_string();
  level_str.truncate(1);
  let level_str = match record.level() {
    Level::Error => level_str.red().to_string(),
    Level::Warn => level_str.yellow().to_string(),
    Level::Info => level_str.cyan().dimmed().to_string(),
    Level::Debug => level_str.green().dimmed().to_string(),
    Level::Trace => level_str.dimmed().to_string(),
  };
  format!("{:}{level_str}{:}", "[".dimmed(), "]".dimmed())
}

pub fn setup_logger(filter_level: LevelFilter) {
  env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
    .filter_level(filter_level)
    .format(|buf, record| {
      let level = color_log_level(record);
      let args = record.args();
      writeln!(buf, "{level:} {args}")?;
      Ok(())
    })
    .init();
}

pub fn global_init() {
  color_eyre::install().expect("color_eyre initialization failed");
}
