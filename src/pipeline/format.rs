/// Formats whole seconds as `HH:MM:SS`. Hours are not wrapped at 24.
pub fn format_duration(duration_seconds: u64) -> String {
    let hours = duration_seconds / 3600;
    let minutes = (duration_seconds % 3600) / 60;
    let seconds = duration_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

pub fn format_number(value: Option<f64>, fraction_digits: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", fraction_digits, v),
        None => "N/A".to_string(),
    }
}

/// Formats a pace given in seconds per kilometer as `M:SS`.
pub fn format_pace(seconds_per_km: f64) -> String {
    if !seconds_per_km.is_finite() || seconds_per_km <= 0.0 {
        return "--:--".to_string();
    }
    let total = seconds_per_km.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
