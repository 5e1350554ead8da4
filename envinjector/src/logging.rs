use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context as _, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    fmt::{format::FmtSpan, writer::BoxMakeWriter, Layer as FmtLayer},
    layer::SubscriberExt as _,
    Layer as _, Registry,
};

pub(crate) struct Options {
    pub debug: bool,
    /// `-` logs to stderr
    pub log_file: PathBuf,
}

pub(crate) fn set_up(options: &Options) -> Result<()> {
    let filter = if options.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let span_events = if options.debug {
        // include enter/exit events for detailed tracing
        FmtSpan::FULL
    } else {
        // announce what we do and when we're done
        FmtSpan::NEW | FmtSpan::CLOSE
    };

    let (writer, ansi) = make_writer(&options.log_file)?;
    let fmt_layer = FmtLayer::new()
        .with_writer(writer)
        .with_span_events(span_events)
        .with_ansi(ansi)
        .with_filter(filter);
    let subscriber = Registry::default().with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("failed to set up tracing: {}", e))?;

    Ok(())
}

fn make_writer(log_file: &Path) -> Result<(BoxMakeWriter, bool)> {
    if log_file == Path::new("-") {
        return Ok((BoxMakeWriter::new(std::io::stderr), true));
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("cannot open log file {}", log_file.display()))?;
    Ok((BoxMakeWriter::new(Mutex::new(file)), false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_created_and_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("envinjector.log");
        std::fs::write(&path, "earlier run\n").unwrap();
        let (_, ansi) = make_writer(&path).unwrap();
        assert!(!ansi);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "earlier run\n");
    }

    #[test]
    fn unwritable_log_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("envinjector.log");
        let err = make_writer(&path).err().unwrap();
        assert!(format!("{:#}", err).contains("cannot open log file"));
    }
}
