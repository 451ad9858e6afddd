use crate::error::SnowError;
use env_logger::{Builder, Env, Target};
use std::fs::OpenOptions;
use std::path::Path;

/// Level used when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "info";

/// Route `log` output to a file. The terminal is in raw mode while the app
/// runs, so without a log file nothing is logged.
pub fn init_file_logger(path: &Path) -> Result<(), SnowError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| SnowError::Write {
            path: path.to_path_buf(),
            source,
        })?;

    Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unwritable_path_is_reported() {
        let result = init_file_logger(Path::new("/nonexistent/dir/snow.log"));
        assert!(matches!(result, Err(SnowError::Write { .. })));
    }
}
