//! HL7 version ordering

use crate::{Error, Result};

/// Map a dotted HL7 version onto a comparable three digit integer.
///
/// `"2.5.1"` becomes 251 and two-part versions are scaled, so `"2.3"` becomes
/// 230 and sorts before `"2.3.1"`.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] when the version contains anything other
/// than digits and dots.
pub fn sortable_version(version: &str) -> Result<u32> {
    let digits = version.replace('.', "");
    let mut n: u32 = digits
        .parse()
        .map_err(|_| Error::InvalidVersion(version.to_string()))?;
    if n < 200 {
        n *= 10;
    }
    Ok(n)
}

/// Inverse of [`sortable_version`] for display, e.g. 251 becomes `"2.5.1"`.
pub fn version_name(version: u32) -> String {
    version
        .to_string()
        .chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(".")
}
