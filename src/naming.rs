//! Output file naming.
//!
//! Every framed photo is written as
//! `{original name without extension}_watermark_{unix millis}.jpg`, so
//! re-running a batch never overwrites earlier output.
//!
//! ## Joining
//!
//! The output directory comes from user input and may be written in either
//! separator style. [`join_output_path`] keeps whatever the user typed:
//!
//! - `out/` or `out\` → appended directly
//! - `C:\Users\me\out` → joined with `\`
//! - anything else → [`Path::join`]

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Suffix inserted between the stem and the timestamp.
pub const WATERMARK_SUFFIX: &str = "_watermark_";

/// Strip the last extension from a file name.
///
/// - `"IMG_0001.JPG"` → `"IMG_0001"`
/// - `"pano.final.tif"` → `"pano.final"`
/// - `"README"` → `"README"`
/// - `".jpg"` → `""`
pub fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains(['/', '\\']) => {
            &name[..dot]
        }
        _ => name,
    }
}

/// Output file name for a photo rendered at `timestamp_millis`.
pub fn output_file_name(original_name: &str, timestamp_millis: u64) -> String {
    format!(
        "{}{}{}.jpg",
        file_stem(original_name),
        WATERMARK_SUFFIX,
        timestamp_millis
    )
}

/// Join `file_name` onto `dir`, keeping the separator style of `dir`.
pub fn join_output_path(dir: &Path, file_name: &str) -> PathBuf {
    let dir_str = dir.to_string_lossy();
    if dir_str.ends_with(['/', '\\']) {
        return PathBuf::from(format!("{dir_str}{file_name}"));
    }
    if dir_str.contains('\\') && !dir_str.contains('/') {
        return PathBuf::from(format!("{dir_str}\\{file_name}"));
    }
    dir.join(file_name)
}

/// Milliseconds since the Unix epoch (0 if the clock is before 1970).
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
