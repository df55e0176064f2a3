use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialise logging. When `debug` is set the default level is `debug` and
/// the `RUST_LOG` environment variable may override it; otherwise the level is
/// forced to `info`.
///
/// If `log_file` is given, output is appended to that file instead of stderr.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // Ignore `RUST_LOG` unless debug logging was requested so a stray
    // variable in the host's environment cannot flood the log.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file.as_deref().and_then(split_log_path) {
        Some((dir, name)) => {
            let appender = tracing_appender::rolling::never(dir, name);
            let _ = builder.with_ansi(false).with_writer(appender).try_init();
        }
        None => {
            let _ = builder.try_init();
        }
    }
}

fn split_log_path(path: &std::path::Path) -> Option<(PathBuf, std::ffi::OsString)> {
    let name = path.file_name()?.to_os_string();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."));
    Some((dir, name))
}

#[cfg(test)]
mod tests {
    use super::split_log_path;
    use std::path::{Path, PathBuf};

    #[test]
    fn bare_file_name_logs_to_current_dir() {
        let (dir, name) = split_log_path(Path::new("toolbar.log")).expect("split");
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "toolbar.log");
    }

    #[test]
    fn directory_only_path_is_rejected() {
        assert!(split_log_path(Path::new("/")).is_none());
    }
}
