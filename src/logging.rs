/// log4rs setup for the worker binary
///
use anyhow::Result;
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

pub const PATTERN: &str = "{d(%Y-%m-%dT%H:%M:%S%.3f)} {h({l})} {T} {t} - {m}{n}";

pub fn console_config(level: LevelFilter) -> Result<Config> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;

    Ok(config)
}

/// install a console logger; fails if a logger is already set
pub fn init(level: LevelFilter) -> Result<()> {
    log4rs::init_config(console_config(level)?)?;
    Ok(())
}

/// install the logger described by a log4rs yaml file
pub fn init_file<P: AsRef<Path>>(path: P) -> Result<()> {
    log4rs::init_file(path, Default::default())?;
    Ok(())
}
