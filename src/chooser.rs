// pickshot/src/chooser.rs
use crate::core::{HandlerRef, Location, PickError, Result};

/// Handler id of the platform's generic document picker. It is excluded
/// from the gallery options because it returns inconsistent content-URI
/// semantics across platform versions.
pub const EXCLUDED_DOCUMENT_PICKER_ID: &str = "com.android.documentsui.DocumentsActivity";

/// What launching a selector entry asks the handler to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchRequest {
    /// Capture a new picture into the bound output location.
    Capture { output: Location },
    /// Pick an existing picture; the handler reports the location back.
    Gallery,
}

/// One launchable option of the selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchEntry {
    pub handler: HandlerRef,
    pub request: LaunchRequest,
}

/// The composed selector handed to the host for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChooserSpec {
    /// Present only on platforms without a native multi-option chooser,
    /// where one handler has to act as the primary target.
    pub default_target: Option<LaunchEntry>,
    pub extras: Vec<LaunchEntry>,
}

impl ChooserSpec {
    /// All options in presentation order, default target first.
    pub fn entries(&self) -> impl Iterator<Item = &LaunchEntry> {
        self.default_target.iter().chain(self.extras.iter())
    }
}

/// Puts the capture and gallery options together into the selector shown
/// to the user.
///
/// Every capture entry is bound to the same output location so whichever
/// camera application the user picks writes to the same destination.
pub fn build_chooser(
    capture_handlers: &[HandlerRef],
    gallery_handlers: &[HandlerRef],
    include_gallery: bool,
    output: &Location,
    native_chooser: bool,
) -> Result<ChooserSpec> {
    let mut entries: Vec<LaunchEntry> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for handler in capture_handlers {
        if seen.contains(&handler.id.as_str()) {
            continue;
        }
        seen.push(handler.id.as_str());
        entries.push(LaunchEntry {
            handler: handler.clone(),
            request: LaunchRequest::Capture {
                output: output.clone(),
            },
        });
    }

    if include_gallery {
        for handler in gallery_handlers {
            if handler.id == EXCLUDED_DOCUMENT_PICKER_ID {
                log::debug!("excluding document picker {} from gallery options", handler.id);
                continue;
            }
            if seen.contains(&handler.id.as_str()) {
                continue;
            }
            seen.push(handler.id.as_str());
            entries.push(LaunchEntry {
                handler: handler.clone(),
                request: LaunchRequest::Gallery,
            });
        }
    }

    if entries.is_empty() {
        return Err(PickError::NoHandlersAvailable);
    }

    log::debug!("built chooser with {} options", entries.len());

    if native_chooser {
        Ok(ChooserSpec {
            default_target: None,
            extras: entries,
        })
    } else {
        // Without a native chooser one handler must be the primary
        // target; the last option takes that role.
        let default_target = entries.pop();
        Ok(ChooserSpec {
            default_target,
            extras: entries,
        })
    }
}
