use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::core::config::AppPaths;

const LOG_FILE_PREFIX: &str = "websearch.log";

/// Answer streaming polls the HTTP clients per chunk; keep their
/// connection chatter out of the default output.
const DEFAULT_DIRECTIVES: &str = "info,hyper=warn,hyper_util=warn,reqwest=warn,h2=warn";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// `RUST_LOG` wins when set and parseable.
fn build_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

pub fn init(paths: &AppPaths) {
    if let Err(err) = std::fs::create_dir_all(&paths.log_dir) {
        eprintln!(
            "Cannot create log dir {}: {}; file logging disabled",
            paths.log_dir.display(),
            err
        );
    }

    let file_appender = tracing_appender::rolling::daily(&paths.log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);

    // The host process may already own the global subscriber.
    let _ = tracing_subscriber::registry()
        .with(build_filter())
        .with(stdout_layer)
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        let filter = EnvFilter::try_new(DEFAULT_DIRECTIVES).expect("valid directives");
        assert!(filter.to_string().contains("reqwest=warn"));
    }

    #[test]
    fn init_writes_into_log_dir() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let paths = AppPaths::with_dirs(tmp.path().to_path_buf(), tmp.path().join("data"));

        init(&paths);
        // A second call must not panic.
        init(&paths);

        assert!(paths.log_dir.is_dir());
    }
}
