use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,polyclaim=debug";

/// Console logging on stderr (stdout carries the command's output), plus a
/// daily-rotated file when `POLYCLAIM_LOG_DIR` is set and writable.
pub fn init_logging(level: &str, json: bool) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if level.eq_ignore_ascii_case("info") {
            EnvFilter::new(DEFAULT_FILTER)
        } else {
            EnvFilter::new(level)
        }
    });

    let log_dir = std::env::var("POLYCLAIM_LOG_DIR")
        .ok()
        .filter(|d| !d.trim().is_empty());

    // `rolling::daily` panics if it cannot create its first file, so check
    // the directory is writable before handing it over.
    let file_layer = log_dir.as_deref().and_then(|dir| {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Warning: Could not create log directory {} ({}), file logging disabled", dir, e);
            return None;
        }
        let probe = std::path::Path::new(dir).join(".polyclaim_write_test");
        match std::fs::OpenOptions::new().create(true).append(true).open(&probe) {
            Ok(_) => {
                let _ = std::fs::remove_file(&probe);
                let appender = tracing_appender::rolling::daily(dir, "polyclaim.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                // The process exits right after one command; keep the flush guard alive until then.
                Box::leak(Box::new(guard));
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!("Warning: Could not write to log directory {} ({}), file logging disabled", dir, e);
                None
            }
        }
    });

    let text_layer = (!json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
    });
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
    });

    let file_logging_enabled = file_layer.is_some();
    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("Warning: logging already initialized ({})", e);
        return;
    }

    if let (true, Some(dir)) = (file_logging_enabled, log_dir) {
        tracing::debug!("Logging to {}/polyclaim.log", dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_text_then_json() {
        init_logging("info", false);
        // The global subscriber is already set; a second call only warns.
        init_logging("debug", true);
        tracing::info!("logging initialized");
    }
}
