// pickshot/src/permissions.rs
use crate::core::{Capability, MissingPermissions};

/// Message shown when the host wants rationale messaging before the
/// actual permission prompt.
pub const RATIONALE_MESSAGE: &str =
    "Camera and storage access are needed to take and save pictures.";

/// Checks the host-reported grants against the fixed set of required
/// capabilities and returns the ones still missing.
///
/// Storage read and write are treated as a pair: if either is missing
/// both are reported, so a single combined request covers them. The
/// rationale flag is copied verbatim from the host. Pure, never fails;
/// an empty `required` list means proceed.
pub fn missing_capabilities(
    granted: &[Capability],
    needs_rationale: bool,
) -> MissingPermissions {
    let mut required = Vec::new();

    if !granted.contains(&Capability::CaptureDevice) {
        required.push(Capability::CaptureDevice);
    }

    if !granted.contains(&Capability::StorageRead)
        || !granted.contains(&Capability::StorageWrite)
    {
        required.push(Capability::StorageRead);
        required.push(Capability::StorageWrite);
    }

    if !required.is_empty() {
        log::debug!(
            "missing capabilities: {:?} (rationale: {})",
            required.iter().map(Capability::id).collect::<Vec<_>>(),
            needs_rationale
        );
    }

    MissingPermissions {
        required,
        needs_rationale,
    }
}
