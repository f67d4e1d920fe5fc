//! Pure aggregation rules applied by the container cache

use catalog_api::{ContainerStatus, InvalidVersionFormat, SemanticVersion};

/// Roll up a container's status from its active/total service counts
///
/// An empty container counts as fully active.
pub fn rollup_status(active: usize, total: usize) -> ContainerStatus {
    if active == total {
        ContainerStatus::Up
    } else if active == 0 {
        ContainerStatus::Down
    } else {
        ContainerStatus::Warning
    }
}

/// Decide whether a registration's version supersedes the stored one
///
/// Returns the parsed version when it strictly exceeds the stored version
/// (baseline 0.0.0 when none is stored), `None` when the update carries no
/// version or a lower/equal one, and `InvalidVersionFormat` for a malformed
/// string. The caller skips only the merge sub-step on error.
pub fn adopted_version(
    update_version: Option<&str>,
    current: Option<&SemanticVersion>,
) -> Result<Option<SemanticVersion>, InvalidVersionFormat> {
    let Some(raw) = update_version else {
        return Ok(None);
    };

    let candidate: SemanticVersion = raw.parse()?;
    let stored = current.copied().unwrap_or(SemanticVersion::BASELINE);
    Ok((candidate > stored).then_some(candidate))
}
