// pickshot/src/core/picker.rs
use super::{
    Capability, ImageSource, Location, PickConfig, PickError, PickerResult, PickerState, Result,
    SelectionOutcome,
};
use crate::host::{ContentAccess, PickerHost, Storage};
use crate::permissions::{self, RATIONALE_MESSAGE};
use crate::process::{self, OnFailure, OnSuccess, ProcessHandle, TaskContext};
use crate::chooser;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Orchestrates a single pick request at a time: permission gating,
/// selector dispatch and asynchronous result correlation.
///
/// The picker runs entirely on the caller's control thread; only the
/// result processing happens on a background worker. Exactly one of the
/// success/failure callbacks fires per accepted `show()` — cancellation
/// and permission denial are silent by design.
pub struct Picker<H: PickerHost> {
    config: PickConfig,
    /// Non-owning in spirit: `teardown` drops it and the picker never
    /// uses it again.
    host: Option<H>,
    content: Arc<dyn ContentAccess>,
    storage: Arc<dyn Storage>,
    state: Arc<Mutex<PickerState>>,
    /// Output location pre-allocated for the camera before the selector
    /// is shown; every capture handler writes into it.
    pending_output: Option<Location>,
    task: Option<ProcessHandle>,
    /// Cleared synchronously on teardown; the background task checks it
    /// before firing any callback.
    alive: Arc<AtomicBool>,
    on_success: OnSuccess,
    on_failure: OnFailure,
}

impl<H: PickerHost> Picker<H> {
    pub fn new(
        config: PickConfig,
        host: H,
        content: Arc<dyn ContentAccess>,
        storage: Arc<dyn Storage>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            host: Some(host),
            content,
            storage,
            state: Arc::new(Mutex::new(PickerState::Idle)),
            pending_output: None,
            task: None,
            alive: Arc::new(AtomicBool::new(true)),
            on_success: Arc::new(|_| {}),
            on_failure: Arc::new(|_| {}),
        })
    }

    /// Sets the method invoked when the picture has been successfully
    /// processed.
    pub fn on_success(&mut self, callback: impl Fn(PickerResult) + Send + Sync + 'static) {
        self.on_success = Arc::new(callback);
    }

    /// Sets the method invoked when the pick process fails.
    pub fn on_failure(&mut self, callback: impl Fn(PickError) + Send + Sync + 'static) {
        self.on_failure = Arc::new(callback);
    }

    pub fn state(&self) -> PickerState {
        *self.lock_state()
    }

    /// Entry point: checks permissions and shows the selector, or asks
    /// for the missing capabilities first.
    ///
    /// Fails synchronously with [`PickError::RequestAlreadyInFlight`]
    /// while a previous request is still pending, leaving it untouched.
    pub fn show(&mut self) -> Result<()> {
        if !self.lock_state().accepts_new_request() {
            return Err(PickError::RequestAlreadyInFlight);
        }

        let host = match self.host.as_ref() {
            Some(host) => host,
            None => return Err(PickError::TornDown),
        };

        let missing =
            permissions::missing_capabilities(&host.granted_capabilities(), host.needs_rationale());

        if missing.required.is_empty() {
            return self.open_selector().map_err(|err| {
                *self.lock_state() = PickerState::Idle;
                err
            });
        }

        *self.lock_state() = PickerState::AwaitingPermission;
        log::debug!("requesting capabilities: {:?}", missing.required);

        if let Err(err) = self.request_capabilities(&missing.required, missing.needs_rationale) {
            *self.lock_state() = PickerState::Idle;
            return Err(err);
        }
        Ok(())
    }

    fn request_capabilities(&mut self, required: &[Capability], rationale: bool) -> Result<()> {
        let host = match self.host.as_mut() {
            Some(host) => host,
            None => return Err(PickError::TornDown),
        };

        if rationale && !host.show_rationale(RATIONALE_MESSAGE) {
            // The user dismissed the explanation; the request simply
            // does not proceed and a later show() starts over.
            log::debug!("rationale dismissed, dropping the request");
            *self.lock_state() = PickerState::Idle;
            return Ok(());
        }

        host.request_capabilities(required, self.config.permission_code)?;
        Ok(())
    }

    /// Feeds back the host's answer to a capability request. Stale or
    /// foreign request codes are ignored.
    ///
    /// Denial is silent: the state moves to `Failed` and no callback
    /// fires, the picker simply does not proceed.
    pub fn on_permission_result(&mut self, request_code: u32, results: &[(Capability, bool)]) {
        if request_code != self.config.permission_code {
            log::debug!("ignoring permission result with code {}", request_code);
            return;
        }
        if *self.lock_state() != PickerState::AwaitingPermission {
            return;
        }

        // An interrupted request is delivered as an empty result set and
        // must not count as a grant.
        let granted = !results.is_empty() && results.iter().all(|(_, granted)| *granted);
        if granted {
            if let Err(err) = self.open_selector() {
                log::error!("failed to open the selector: {}", err);
                *self.lock_state() = PickerState::Failed;
                (self.on_failure)(err);
            }
        } else {
            log::info!("required capabilities denied, not proceeding");
            *self.lock_state() = PickerState::Failed;
        }
    }

    /// Allocates a fresh capture target, builds the chooser and hands it
    /// to the host for display.
    fn open_selector(&mut self) -> Result<()> {
        let host = match self.host.as_mut() {
            Some(host) => host,
            None => return Err(PickError::TornDown),
        };

        let temp_name = format!("temp_{}", self.config.file_name);
        let request_code = self.config.request_code;
        let output = self.storage.create_temp_output(&temp_name)?;

        let launched = chooser::build_chooser(
            &host.capture_handlers(),
            &host.gallery_handlers(),
            self.config.show_gallery,
            &output,
            host.has_native_chooser(),
        )
        .and_then(|spec| {
            host.launch_chooser(&spec, request_code)?;
            Ok(())
        });

        if let Err(err) = launched {
            // The capture target was already allocated; do not leak it.
            if let Err(delete_err) = self.content.delete(&output) {
                log::warn!("failed to delete capture target {}: {}", output, delete_err);
            }
            self.pending_output = None;
            return Err(err);
        }

        self.pending_output = Some(output);
        *self.state.lock().unwrap_or_else(|err| err.into_inner()) = PickerState::AwaitingSelection;
        Ok(())
    }

    /// Feeds back the selector outcome. Stale or foreign request codes
    /// are ignored. A successful outcome hands the source off to the
    /// background processor; cancellation cleans up the capture target
    /// silently.
    pub fn on_selection_result(&mut self, request_code: u32, outcome: SelectionOutcome) {
        if request_code != self.config.request_code {
            log::debug!("ignoring selection result with code {}", request_code);
            return;
        }
        if *self.lock_state() != PickerState::AwaitingSelection {
            return;
        }

        match outcome {
            SelectionOutcome::Cancelled => {
                if let Some(output) = self.pending_output.take() {
                    if let Err(err) = self.content.delete(&output) {
                        log::warn!("failed to delete capture target {}: {}", output, err);
                    }
                }
                log::debug!("selection cancelled");
                *self.lock_state() = PickerState::Cancelled;
            }
            SelectionOutcome::Success {
                location,
                capture_action,
            } => {
                let pending = match self.pending_output.take() {
                    Some(pending) => pending,
                    None => {
                        log::warn!("selection result without a pending session, ignoring");
                        return;
                    }
                };

                // A capture action marks the result camera-sourced even
                // when a location came back; without one the returned
                // location wins, and the pre-allocated target is the
                // last resort.
                let source = if capture_action {
                    ImageSource::Camera(pending)
                } else if let Some(location) = location {
                    ImageSource::Gallery(location)
                } else {
                    ImageSource::Camera(pending)
                };

                self.start_processing(source);
            }
        }
    }

    fn start_processing(&mut self, source: ImageSource) {
        log::debug!("processing source {:?}", source);
        *self.lock_state() = PickerState::Processing;

        let ctx = TaskContext {
            source,
            modes: self.config.modes.clone(),
            scale_policy: self.config.scale_policy,
            target_size: self.config.target_size,
            file_name: self.config.file_name.clone(),
            content: Arc::clone(&self.content),
            storage: Arc::clone(&self.storage),
            alive: Arc::clone(&self.alive),
            state: Arc::clone(&self.state),
            on_success: Arc::clone(&self.on_success),
            on_failure: Arc::clone(&self.on_failure),
        };

        match process::spawn(ctx) {
            Ok(handle) => self.task = Some(handle),
            Err(err) => {
                log::error!("failed to start the processing task: {}", err);
                *self.lock_state() = PickerState::Failed;
                (self.on_failure)(PickError::Io(err));
            }
        }
    }

    /// Invalidates the host reference and cancels any in-flight work
    /// without invoking its callback. Must be called when the owning
    /// context goes away.
    pub fn teardown(&mut self) {
        {
            // Clearing the flag under the state lock keeps it ordered
            // against the worker's pre-callback check.
            let mut state = self.lock_state();
            self.alive.store(false, Ordering::SeqCst);
            *state = PickerState::Idle;
        }
        if let Some(mut task) = self.task.take() {
            task.cancel();
        }
        self.host = None;
        self.pending_output = None;
        log::debug!("picker torn down");
    }

    fn lock_state(&self) -> MutexGuard<'_, PickerState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chooser::ChooserSpec;
    use crate::core::{HandlerRef, OutputMode};
    use crate::host::HostResult;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::io::Read;
    use std::path::PathBuf;
    use std::rc::Rc;

    #[derive(Default)]
    struct HostLog {
        permission_requests: Vec<Vec<Capability>>,
        launched: Vec<ChooserSpec>,
        rationale_shown: usize,
    }

    struct TestHost {
        granted: Vec<Capability>,
        rationale: bool,
        accept_rationale: bool,
        fail_launch: bool,
        log: Rc<RefCell<HostLog>>,
    }

    impl TestHost {
        fn granted_all(log: Rc<RefCell<HostLog>>) -> Self {
            Self {
                granted: vec![
                    Capability::CaptureDevice,
                    Capability::StorageRead,
                    Capability::StorageWrite,
                ],
                rationale: false,
                accept_rationale: true,
                fail_launch: false,
                log,
            }
        }

        fn granted_none(log: Rc<RefCell<HostLog>>) -> Self {
            Self {
                granted: Vec::new(),
                rationale: false,
                accept_rationale: true,
                fail_launch: false,
                log,
            }
        }
    }

    impl PickerHost for TestHost {
        fn granted_capabilities(&self) -> Vec<Capability> {
            self.granted.clone()
        }

        fn needs_rationale(&self) -> bool {
            self.rationale
        }

        fn show_rationale(&mut self, _message: &str) -> bool {
            self.log.borrow_mut().rationale_shown += 1;
            self.accept_rationale
        }

        fn request_capabilities(
            &mut self,
            capabilities: &[Capability],
            _request_code: u32,
        ) -> HostResult<()> {
            self.log
                .borrow_mut()
                .permission_requests
                .push(capabilities.to_vec());
            Ok(())
        }

        fn capture_handlers(&self) -> Vec<HandlerRef> {
            vec![HandlerRef::new("cam.app", "Camera")]
        }

        fn gallery_handlers(&self) -> Vec<HandlerRef> {
            vec![HandlerRef::new("gal.app", "Gallery")]
        }

        fn has_native_chooser(&self) -> bool {
            true
        }

        fn launch_chooser(&mut self, spec: &ChooserSpec, _request_code: u32) -> HostResult<()> {
            if self.fail_launch {
                return Err(anyhow!("display surface gone"));
            }
            self.log.borrow_mut().launched.push(spec.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingContent {
        deleted: Mutex<Vec<Location>>,
    }

    impl ContentAccess for RecordingContent {
        fn open(&self, _location: &Location) -> HostResult<Box<dyn Read + Send>> {
            Err(anyhow!("not readable in these tests"))
        }

        fn delete(&self, location: &Location) -> HostResult<()> {
            self.deleted.lock().unwrap().push(location.clone());
            Ok(())
        }
    }

    struct FixedStorage;

    impl Storage for FixedStorage {
        fn create_temp_output(&self, name_hint: &str) -> HostResult<Location> {
            Ok(Location(format!("/cache/{}.jpg", name_hint)))
        }

        fn create_final_output(&self, name_hint: &str) -> HostResult<PathBuf> {
            Ok(PathBuf::from(format!("/files/{}.jpg", name_hint)))
        }
    }

    fn picker(host: TestHost) -> Picker<TestHost> {
        Picker::new(
            PickConfig::new().with_modes(&[OutputMode::Image]).show_gallery(),
            host,
            Arc::new(RecordingContent::default()),
            Arc::new(FixedStorage),
        )
        .unwrap()
    }

    #[test]
    fn show_with_granted_permissions_launches_the_chooser() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut picker = picker(TestHost::granted_all(Rc::clone(&log)));

        picker.show().unwrap();

        assert_eq!(picker.state(), PickerState::AwaitingSelection);
        let log = log.borrow();
        assert_eq!(log.launched.len(), 1);
        assert!(log.permission_requests.is_empty());
        // Camera plus gallery, all bound to the pre-allocated target.
        assert_eq!(log.launched[0].extras.len(), 2);
    }

    #[test]
    fn show_without_permissions_requests_them() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut picker = picker(TestHost::granted_none(Rc::clone(&log)));

        picker.show().unwrap();

        assert_eq!(picker.state(), PickerState::AwaitingPermission);
        let log = log.borrow();
        assert!(log.launched.is_empty());
        assert_eq!(log.permission_requests.len(), 1);
        assert_eq!(
            log.permission_requests[0],
            vec![
                Capability::CaptureDevice,
                Capability::StorageRead,
                Capability::StorageWrite
            ]
        );
        assert_eq!(log.rationale_shown, 0);
    }

    #[test]
    fn rationale_is_shown_before_the_request_when_asked() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut host = TestHost::granted_none(Rc::clone(&log));
        host.rationale = true;
        let mut picker = picker(host);

        picker.show().unwrap();

        let log = log.borrow();
        assert_eq!(log.rationale_shown, 1);
        assert_eq!(log.permission_requests.len(), 1);
    }

    #[test]
    fn dismissed_rationale_returns_to_idle() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut host = TestHost::granted_none(Rc::clone(&log));
        host.rationale = true;
        host.accept_rationale = false;
        let mut picker = picker(host);

        picker.show().unwrap();

        assert_eq!(picker.state(), PickerState::Idle);
        assert!(log.borrow().permission_requests.is_empty());
    }

    #[test]
    fn show_while_awaiting_selection_is_rejected() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut picker = picker(TestHost::granted_all(Rc::clone(&log)));

        picker.show().unwrap();
        let second = picker.show();

        assert!(matches!(second, Err(PickError::RequestAlreadyInFlight)));
        // The original session is untouched.
        assert_eq!(picker.state(), PickerState::AwaitingSelection);
        assert_eq!(log.borrow().launched.len(), 1);
    }

    #[test]
    fn granted_permission_result_opens_the_selector() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut picker = picker(TestHost::granted_none(Rc::clone(&log)));
        picker.show().unwrap();

        picker.on_permission_result(
            crate::core::DEFAULT_PERMISSION_CODE,
            &[
                (Capability::CaptureDevice, true),
                (Capability::StorageRead, true),
                (Capability::StorageWrite, true),
            ],
        );

        assert_eq!(picker.state(), PickerState::AwaitingSelection);
        assert_eq!(log.borrow().launched.len(), 1);
    }

    #[test]
    fn denied_permission_result_fails_silently() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut picker = picker(TestHost::granted_none(Rc::clone(&log)));
        picker.on_failure(|err| panic!("no callback expected on denial: {}", err));
        picker.show().unwrap();

        picker.on_permission_result(
            crate::core::DEFAULT_PERMISSION_CODE,
            &[
                (Capability::CaptureDevice, true),
                (Capability::StorageRead, false),
                (Capability::StorageWrite, false),
            ],
        );

        assert_eq!(picker.state(), PickerState::Failed);
        assert!(log.borrow().launched.is_empty());
    }

    #[test]
    fn empty_permission_result_counts_as_denial() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut picker = picker(TestHost::granted_none(Rc::clone(&log)));
        picker.on_failure(|err| panic!("no callback expected on denial: {}", err));
        picker.show().unwrap();

        // An interrupted request comes back with no per-capability flags.
        picker.on_permission_result(crate::core::DEFAULT_PERMISSION_CODE, &[]);

        assert_eq!(picker.state(), PickerState::Failed);
        assert!(log.borrow().launched.is_empty());
    }

    #[test]
    fn stale_permission_result_is_a_noop() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut picker = picker(TestHost::granted_none(Rc::clone(&log)));
        picker.show().unwrap();

        picker.on_permission_result(9999, &[(Capability::CaptureDevice, true)]);

        assert_eq!(picker.state(), PickerState::AwaitingPermission);
        assert!(log.borrow().launched.is_empty());
    }

    #[test]
    fn stale_selection_result_is_a_noop() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut picker = picker(TestHost::granted_all(Rc::clone(&log)));
        picker.show().unwrap();

        picker.on_selection_result(9999, SelectionOutcome::Cancelled);

        assert_eq!(picker.state(), PickerState::AwaitingSelection);
    }

    #[test]
    fn cancelled_selection_deletes_the_capture_target_silently() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let content = Arc::new(RecordingContent::default());
        let mut picker = Picker::new(
            PickConfig::new(),
            TestHost::granted_all(Rc::clone(&log)),
            Arc::clone(&content) as Arc<dyn ContentAccess>,
            Arc::new(FixedStorage),
        )
        .unwrap();
        picker.on_success(|_| panic!("no callback expected on cancel"));
        picker.on_failure(|err| panic!("no callback expected on cancel: {}", err));

        picker.show().unwrap();
        picker.on_selection_result(crate::core::DEFAULT_REQUEST_CODE, SelectionOutcome::Cancelled);

        assert_eq!(picker.state(), PickerState::Cancelled);
        let deleted = content.deleted.lock().unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].as_str().starts_with("/cache/temp_"));
    }

    #[test]
    fn completed_request_accepts_a_new_show() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut picker = picker(TestHost::granted_all(Rc::clone(&log)));

        picker.show().unwrap();
        picker.on_selection_result(crate::core::DEFAULT_REQUEST_CODE, SelectionOutcome::Cancelled);
        assert_eq!(picker.state(), PickerState::Cancelled);

        picker.show().unwrap();
        assert_eq!(picker.state(), PickerState::AwaitingSelection);
        assert_eq!(log.borrow().launched.len(), 2);
    }

    #[test]
    fn failed_chooser_launch_deletes_the_capture_target() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut host = TestHost::granted_all(Rc::clone(&log));
        host.fail_launch = true;
        let content = Arc::new(RecordingContent::default());
        let mut picker = Picker::new(
            PickConfig::new(),
            host,
            Arc::clone(&content) as Arc<dyn ContentAccess>,
            Arc::new(FixedStorage),
        )
        .unwrap();

        let shown = picker.show();

        assert!(matches!(shown, Err(PickError::Host(_))));
        assert_eq!(picker.state(), PickerState::Idle);
        let deleted = content.deleted.lock().unwrap();
        assert_eq!(deleted.len(), 1);
        assert!(deleted[0].as_str().starts_with("/cache/temp_"));
    }

    #[test]
    fn show_after_teardown_is_rejected() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut picker = picker(TestHost::granted_all(Rc::clone(&log)));

        picker.teardown();
        let shown = picker.show();

        assert!(matches!(shown, Err(PickError::TornDown)));
        assert_eq!(picker.state(), PickerState::Idle);
        assert!(log.borrow().launched.is_empty());
    }

    #[test]
    fn teardown_resets_and_ignores_late_events() {
        let log = Rc::new(RefCell::new(HostLog::default()));
        let mut picker = picker(TestHost::granted_all(Rc::clone(&log)));
        picker.show().unwrap();

        picker.teardown();
        assert_eq!(picker.state(), PickerState::Idle);

        picker.on_selection_result(
            crate::core::DEFAULT_REQUEST_CODE,
            SelectionOutcome::Success {
                location: None,
                capture_action: true,
            },
        );
        assert_eq!(picker.state(), PickerState::Idle);
    }
}
