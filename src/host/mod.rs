// pickshot/src/host/mod.rs
mod fs;

pub use fs::{FsContent, FsStorage};

use crate::chooser::ChooserSpec;
use crate::core::{Capability, HandlerRef, Location};
use std::io::Read;
use std::path::PathBuf;

/// Host failures are opaque to the core; they get wrapped into
/// [`crate::PickError::Host`] at the boundary.
pub type HostResult<T> = anyhow::Result<T>;

/// The UI-context flavored side of the host: permission state and
/// requests, installed handler enumeration and selector launching.
///
/// A single orchestrator implementation is generic over this trait; the
/// platform binding supplies one thin adapter per context flavor.
pub trait PickerHost {
    /// Capabilities currently granted, as reported by the platform.
    fn granted_capabilities(&self) -> Vec<Capability>;

    /// True when the platform previously denied without a "never ask
    /// again" signal and wants an explanation shown first. Reported by
    /// the host, never computed here.
    fn needs_rationale(&self) -> bool;

    /// Presents the rationale message and returns whether the user
    /// accepted. Hosts without a presentation surface should fall back
    /// to a blocking modal confirmation.
    fn show_rationale(&mut self, message: &str) -> bool;

    /// Issues the actual permission request; the answer comes back
    /// through `Picker::on_permission_result` with the same code.
    fn request_capabilities(
        &mut self,
        capabilities: &[Capability],
        request_code: u32,
    ) -> HostResult<()>;

    /// Installed applications able to capture a new picture.
    fn capture_handlers(&self) -> Vec<HandlerRef>;

    /// Installed applications able to provide an existing picture.
    fn gallery_handlers(&self) -> Vec<HandlerRef>;

    /// Whether the platform offers a native multi-option chooser. Older
    /// platforms need one handler promoted to default target instead.
    fn has_native_chooser(&self) -> bool;

    /// Shows the selector; the outcome comes back through
    /// `Picker::on_selection_result` with the same code.
    fn launch_chooser(&mut self, spec: &ChooserSpec, request_code: u32) -> HostResult<()>;
}

/// Read access to picked picture locations. Shared with the background
/// processing task, hence `Send + Sync`.
pub trait ContentAccess: Send + Sync {
    fn open(&self, location: &Location) -> HostResult<Box<dyn Read + Send>>;

    fn delete(&self, location: &Location) -> HostResult<()>;
}

/// Allocation of temporary capture targets and final output files.
pub trait Storage: Send + Sync {
    /// Creates an empty temporary file the capture application writes
    /// into, named after the hint.
    fn create_temp_output(&self, name_hint: &str) -> HostResult<Location>;

    /// Resolves the final output path for the hint. Always overwrites an
    /// existing file of the same name.
    fn create_final_output(&self, name_hint: &str) -> HostResult<PathBuf>;
}
