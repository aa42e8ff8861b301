//! Small formatting helpers shared by logging call sites.

use std::path::Path;
use std::time::Duration;

/// Replace the home directory prefix with `~` so logs don't leak usernames.
pub fn private_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return format!("~/{}", stripped.display());
    }
    path.display().to_string()
}

/// Human-friendly duration such as `5h 02m`, `3m 15s` or `42s`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(195)), "3m 15s");
        assert_eq!(format_duration(Duration::from_secs(5 * 3600 + 120)), "5h 02m");
    }

    #[test]
    fn test_private_path_outside_home() {
        assert_eq!(
            private_path(Path::new("/var/log/birdorsquirrel.log")),
            "/var/log/birdorsquirrel.log"
        );
    }
}
