//! Package version normalization.
//!
//! The global packages folder is keyed by the normalized version, so a
//! manifest declaring `1.0` or `1.0.0+sha.5` must still land in `1.0.0`.

/// Normalize a declared version the way restore looks it up.
///
/// - build metadata (`+...`) is dropped
/// - missing minor/patch parts are filled with `0`
/// - a fourth part is kept only when it is non-zero
/// - leading zeros in numeric parts are removed
///
/// The release label is kept as declared. Returns `None` for anything that
/// is not a version.
pub fn normalize_version(version: &str) -> Option<String> {
    let version = version.trim();
    let without_metadata = match version.split_once('+') {
        Some((version, metadata)) if is_label(metadata) => version,
        Some(_) => return None,
        None => version,
    };
    let (core, release) = match without_metadata.split_once('-') {
        Some((core, release)) => (core, Some(release)),
        None => (without_metadata, None),
    };

    let mut parts = core
        .split('.')
        .map(parse_number)
        .collect::<Option<Vec<u64>>>()?;
    if parts.is_empty() || parts.len() > 4 {
        return None;
    }
    parts.resize(parts.len().max(3), 0);

    let mut normalized = format!("{}.{}.{}", parts[0], parts[1], parts[2]);
    if let Some(revision) = parts.get(3).filter(|revision| **revision != 0) {
        normalized.push_str(&format!(".{}", revision));
    }

    if let Some(release) = release {
        if !is_label(release) {
            return None;
        }
        normalized.push('-');
        normalized.push_str(release);
    }

    Some(normalized)
}

fn parse_number(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Dot-separated, non-empty identifiers of `[0-9A-Za-z-]`.
fn is_label(label: &str) -> bool {
    label.split('.').all(|identifier| {
        !identifier.is_empty()
            && identifier
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}
