use std::path::PathBuf;

pub const APP_DIR_NAME: &str = "nutriscope";

/// Formats an optional f64 to 2 decimal places, or returns "NaN" if None or non-finite.
pub fn fmt_opt(v: Option<f64>) -> String {
    match v {
        Some(x) if x.is_finite() => format!("{x:.2}"),
        Some(x) if x.is_infinite() => if x > 0.0 { "inf" } else { "-inf" }.to_owned(),
        _ => "NaN".to_owned(),
    }
}

/// Platform directories used by the application.
pub struct StandardPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

/// Config and data directories, falling back to the working directory when
/// the platform does not report one.
pub fn standard_paths() -> StandardPaths {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME);
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME);
    StandardPaths {
        config_dir,
        data_dir,
    }
}
