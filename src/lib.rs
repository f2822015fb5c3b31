mod chooser;
mod core;
mod host;
mod permissions;
mod process;
mod transform;

pub use crate::chooser::{
    build_chooser, ChooserSpec, LaunchEntry, LaunchRequest, EXCLUDED_DOCUMENT_PICKER_ID,
};
pub use crate::core::picker::Picker;
pub use crate::core::{
    Capability, HandlerRef, ImageSource, Location, MissingPermissions, OutputMode, PickConfig,
    PickError, PickerResult, PickerState, Result, ScalePolicy, SelectionOutcome,
    DEFAULT_FILE_NAME, DEFAULT_PERMISSION_CODE, DEFAULT_REQUEST_CODE,
};
pub use crate::host::{ContentAccess, FsContent, FsStorage, HostResult, PickerHost, Storage};
pub use crate::permissions::{missing_capabilities, RATIONALE_MESSAGE};
pub use crate::process::ProcessHandle;
pub use crate::transform::{Decoder, Encoder, Orientation, Scaler, TransformEngine};

pub mod prelude {
    pub use crate::{
        ContentAccess, OutputMode, PickConfig, Picker, PickerHost, PickerResult, ScalePolicy,
        Storage,
    };
}

// Re-export commonly used types
pub use image::DynamicImage;
