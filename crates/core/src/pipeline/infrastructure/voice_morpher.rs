use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;

use crate::effects::domain::morph_preset::MorphPreset;
use crate::pipeline::morph_settings::MorphSettings;
use crate::pipeline::transcode_job::TranscodeJob;
use crate::shared::error::MorphError;

/// Asynchronous front end: one worker thread per job, one result per job.
///
/// Jobs share nothing but the immutable preset table, so any number may run
/// concurrently.
#[derive(Debug, Clone, Default)]
pub struct VoiceMorpher {
    settings: MorphSettings,
}

impl VoiceMorpher {
    pub fn new(settings: MorphSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MorphSettings {
        &self.settings
    }

    /// Morph `input` on a worker thread and hand the outcome to `completion`.
    ///
    /// `completion` runs exactly once, on the worker thread. A panic inside
    /// the job is reported as `MorphError::Aborted`.
    pub fn process_ogg_data<F>(&self, input: Vec<u8>, preset: MorphPreset, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Vec<u8>, MorphError>) + Send + 'static,
    {
        let settings = self.settings;
        std::thread::spawn(move || {
            let job = TranscodeJob::new(input, preset, settings);
            let result = panic::catch_unwind(AssertUnwindSafe(move || job.run()))
                .unwrap_or_else(|payload| Err(MorphError::Aborted(panic_message(payload.as_ref()))));
            completion(result);
        })
    }

    /// Like [`process_ogg_data`](Self::process_ogg_data), delivering the
    /// outcome through a one-shot channel.
    pub fn submit(&self, input: Vec<u8>, preset: MorphPreset) -> Receiver<Result<Vec<u8>, MorphError>> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.process_ogg_data(input, preset, move |result| {
            // The caller may have dropped the receiver; nobody is left to tell.
            let _ = tx.send(result);
        });
        rx
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked".to_string()
    }
}
