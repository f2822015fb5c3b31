// pickshot/src/process.rs
use crate::core::{ImageSource, OutputMode, PickError, PickerResult, PickerState, Result, ScalePolicy};
use crate::host::{ContentAccess, Storage};
use crate::transform::{Encoder, TransformEngine};
use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

pub type OnSuccess = Arc<dyn Fn(PickerResult) + Send + Sync>;
pub type OnFailure = Arc<dyn Fn(PickError) + Send + Sync>;

/// Everything the background task needs, captured at spawn time so the
/// worker never touches the picker again.
pub(crate) struct TaskContext {
    pub source: ImageSource,
    pub modes: Vec<OutputMode>,
    pub scale_policy: ScalePolicy,
    pub target_size: u32,
    pub file_name: String,
    pub content: Arc<dyn ContentAccess>,
    pub storage: Arc<dyn Storage>,
    /// Cleared synchronously by teardown; a dead owner means the outcome
    /// is discarded instead of delivered.
    pub alive: Arc<AtomicBool>,
    pub state: Arc<Mutex<PickerState>>,
    pub on_success: OnSuccess,
    pub on_failure: OnFailure,
}

/// Handle to the single in-flight processing task. Cancellation is
/// advisory and checked between output-production steps, not preemptive.
pub struct ProcessHandle {
    cancelled: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl ProcessHandle {
    pub fn cancel(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, |join| join.is_finished())
    }

    #[cfg(test)]
    fn join(mut self) {
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}

/// Spawns the worker that decodes, transforms and encodes the picked
/// picture, then fires exactly one of the callbacks — unless cancelled
/// or orphaned, in which case the outcome is silently discarded.
pub(crate) fn spawn(ctx: TaskContext) -> std::io::Result<ProcessHandle> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let worker_cancelled = Arc::clone(&cancelled);

    let join = std::thread::Builder::new()
        .name("pickshot-process".to_string())
        .spawn(move || run(ctx, worker_cancelled))?;

    Ok(ProcessHandle {
        cancelled,
        join: Some(join),
    })
}

fn run(ctx: TaskContext, cancelled: Arc<AtomicBool>) {
    let outcome = produce(&ctx, &cancelled);

    // Checked under the state lock: teardown clears the alive flag while
    // holding the same lock, so a torn-down owner is always observed here.
    let mut state = ctx.state.lock().unwrap_or_else(|err| err.into_inner());
    if cancelled.load(Ordering::SeqCst) {
        log::debug!("processing cancelled, discarding outcome");
        return;
    }
    if !ctx.alive.load(Ordering::SeqCst) {
        log::debug!("owner torn down, discarding outcome");
        return;
    }

    match outcome {
        Ok(Some(result)) => {
            *state = PickerState::Completed;
            drop(state);
            (ctx.on_success)(result);
        }
        Ok(None) => {}
        Err(err) => {
            log::error!("error while processing the picked image: {}", err);
            *state = PickerState::Failed;
            drop(state);
            (ctx.on_failure)(err);
        }
    }
}

/// Runs the pipeline and builds the requested representations.
/// `Ok(None)` means a cancellation was observed mid-way; partial results
/// are dropped, never surfaced.
fn produce(ctx: &TaskContext, cancelled: &AtomicBool) -> Result<Option<PickerResult>> {
    let location = ctx.source.location();
    log::debug!("processing picked image from {}", location);

    let mut reader = ctx
        .content
        .open(location)
        .map_err(|err| PickError::SourceUnreadable(err.to_string()))?;
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|err| PickError::SourceUnreadable(err.to_string()))?;

    let engine = TransformEngine::new(ctx.scale_policy, ctx.target_size);
    let image = engine.process(&bytes)?;

    let encoder = Encoder::new();
    let mut result = PickerResult::default();
    let mut produced: Vec<OutputMode> = Vec::new();

    for &mode in &ctx.modes {
        if cancelled.load(Ordering::SeqCst) || !ctx.alive.load(Ordering::SeqCst) {
            return Ok(None);
        }
        if produced.contains(&mode) {
            continue;
        }
        produced.push(mode);

        match mode {
            OutputMode::Image => result.image = Some(image.clone()),
            OutputMode::Bytes => result.bytes = Some(encoder.encode(&image)?),
            OutputMode::File => {
                let path = ctx.storage.create_final_output(&ctx.file_name)?;
                encoder.write(&image, &path)?;
                result.file = Some(path);
            }
        }
    }

    Ok(Some(result))
}
