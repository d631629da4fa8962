//! Time labels for the seek bar.

/// Render seconds as `M:SS`.
///
/// Both fields are floored, seconds are zero-padded, and there is no hour
/// component (`3725.0` renders as `"62:05"`). Negative or non-finite input
/// renders as `"0:00"`.
///
/// ```
/// use core_playback::format::format_time;
///
/// assert_eq!(format_time(65.0), "1:05");
/// assert_eq!(format_time(59.9), "0:59");
/// ```
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "0:00".to_string();
    }

    let minutes = (seconds / 60.0).floor() as u64;
    let secs = (seconds % 60.0).floor() as u64;
    format!("{}:{:02}", minutes, secs)
}
