// pickshot/src/core/mod.rs
pub mod picker;

use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_FILE_NAME: &str = "pickshot_picture";
pub const DEFAULT_REQUEST_CODE: u32 = 300;
pub const DEFAULT_PERMISSION_CODE: u32 = 345;

/// How the processed picture is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Image,
    Bytes,
    File,
}

/// How the picture is scaled down to the requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalePolicy {
    KeepRatio,
    Crop,
    StretchXy,
}

/// Capabilities the host must grant before a capture can be started.
///
/// Storage read and write are requested as a pair: if either is missing
/// both are reported so a single combined request is issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    CaptureDevice,
    StorageRead,
    StorageWrite,
}

impl Capability {
    pub fn id(&self) -> &'static str {
        match self {
            Capability::CaptureDevice => "capture-device-access",
            Capability::StorageRead => "media-storage-read",
            Capability::StorageWrite => "media-storage-write",
        }
    }
}

/// Capabilities still missing before the selector can be shown, plus
/// whether the host asked for rationale messaging first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingPermissions {
    pub required: Vec<Capability>,
    pub needs_rationale: bool,
}

/// Opaque reference to a picture location (content URI, file path, ...).
/// The core never interprets it; only the host collaborators do.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location(pub String);

impl Location {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An installed application able to capture or provide a picture,
/// as enumerated by the host registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRef {
    pub id: String,
    pub name: String,
}

impl HandlerRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Where the picked picture came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Camera(Location),
    Gallery(Location),
}

impl ImageSource {
    pub fn location(&self) -> &Location {
        match self {
            ImageSource::Camera(location) | ImageSource::Gallery(location) => location,
        }
    }
}

/// Outcome of the selector reported back by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Success {
        /// Location returned by the handler, if any. Camera apps writing to
        /// the pre-allocated output often return none.
        location: Option<Location>,
        /// True when the returned intent carried the platform capture
        /// action, marking the result camera-sourced.
        capture_action: bool,
    },
    Cancelled,
}

/// Lifecycle of a single pick request. Terminal states accept a new
/// `show()`, which starts a fresh session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerState {
    Idle,
    AwaitingPermission,
    AwaitingSelection,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl PickerState {
    /// A new request may only start from `Idle` or a terminal state.
    pub fn accepts_new_request(&self) -> bool {
        matches!(
            self,
            PickerState::Idle
                | PickerState::Completed
                | PickerState::Failed
                | PickerState::Cancelled
        )
    }
}

/// The processed picture in the representations the caller asked for.
/// Only the fields matching the configured [`OutputMode`]s are populated.
#[derive(Debug, Default)]
pub struct PickerResult {
    pub image: Option<image::DynamicImage>,
    pub bytes: Option<Vec<u8>>,
    pub file: Option<PathBuf>,
}

/// Immutable configuration of a picker, built once by the caller.
#[derive(Debug, Clone)]
pub struct PickConfig {
    pub modes: Vec<OutputMode>,
    pub scale_policy: ScalePolicy,
    pub target_size: u32,
    pub file_name: String,
    pub show_gallery: bool,
    pub request_code: u32,
    pub permission_code: u32,
}

impl Default for PickConfig {
    fn default() -> Self {
        Self {
            modes: vec![OutputMode::Image],
            scale_policy: ScalePolicy::KeepRatio,
            target_size: 0,
            file_name: DEFAULT_FILE_NAME.to_string(),
            show_gallery: false,
            request_code: DEFAULT_REQUEST_CODE,
            permission_code: DEFAULT_PERMISSION_CODE,
        }
    }
}

impl PickConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how the resulting picture is returned. Declaration order is
    /// preserved; duplicates collapse at processing time.
    pub fn with_modes(mut self, modes: &[OutputMode]) -> Self {
        self.modes = modes.to_vec();
        self
    }

    pub fn with_scale_policy(mut self, policy: ScalePolicy) -> Self {
        self.scale_policy = policy;
        self
    }

    /// Requested size for the output picture, 0 if no resizing is wanted.
    pub fn with_target_size(mut self, size: u32) -> Self {
        self.target_size = size;
        self
    }

    /// Name of the output file. Blank falls back to the default name and a
    /// trailing ".jpg" is stripped, the extension is appended on write.
    pub fn with_file_name(mut self, name: &str) -> Self {
        self.file_name = if name.trim().is_empty() {
            DEFAULT_FILE_NAME.to_string()
        } else {
            name.strip_suffix(".jpg").unwrap_or(name).to_string()
        };
        self
    }

    /// Adds the gallery applications to the selector options.
    pub fn show_gallery(mut self) -> Self {
        self.show_gallery = true;
        self
    }

    pub fn with_request_code(mut self, code: u32) -> Self {
        self.request_code = code;
        self
    }

    pub fn with_permission_code(mut self, code: u32) -> Self {
        self.permission_code = code;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.modes.is_empty() {
            return Err(PickError::InvalidConfig(
                "at least one output mode must be configured".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum PickError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to encode output: {0}")]
    Encode(String),

    #[error("picture source is unreadable: {0}")]
    SourceUnreadable(String),

    #[error("no capture or gallery handlers available")]
    NoHandlersAvailable,

    #[error("required permissions were denied")]
    PermissionDenied,

    #[error("a pick request is already in flight")]
    RequestAlreadyInFlight,

    #[error("the picker has been torn down")]
    TornDown,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("host error: {0}")]
    Host(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PickError>;
