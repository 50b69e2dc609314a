use std::{
    sync::{mpsc::Receiver, LazyLock},
    thread::JoinHandle,
    time::Duration,
};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use plinth_events::RegistryEvent;
use tracing::trace;

static MULTI: LazyLock<MultiProgress> = LazyLock::new(MultiProgress::new);

/// Pause progress display, run the closure, then resume.
pub fn suspend<F: FnOnce()>(f: F) {
    MULTI.suspend(f);
}

/// Owns the thread rendering registry events.
///
/// Every sender of the channel must be dropped before [`finish`](Self::finish),
/// otherwise the thread never sees the end of the stream.
pub struct ProgressGuard {
    handle: Option<JoinHandle<()>>,
}

impl ProgressGuard {
    pub fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

fn batch_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {wide_bar:.cyan/dim} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("━━─")
}

pub fn spawn_event_handler(receiver: Receiver<RegistryEvent>, total: usize) -> ProgressGuard {
    let handle = std::thread::spawn(move || {
        let bar = MULTI.add(ProgressBar::new(total as u64));
        bar.set_style(batch_style());
        bar.enable_steady_tick(Duration::from_millis(100));

        for event in receiver {
            match event {
                RegistryEvent::ProviderStarted {
                    namespace,
                    name,
                    ..
                } => bar.set_message(format!("{namespace}/{name}")),
                RegistryEvent::BatchProgress {
                    completed,
                    failed,
                    ..
                } => {
                    bar.set_position(completed as u64);
                    if failed > 0 {
                        bar.set_message(format!("{failed} failed"));
                    }
                }
                RegistryEvent::ArtifactWritten {
                    path,
                    ..
                } => trace!("wrote {}", path.display()),
                _ => {}
            }
        }

        bar.finish_and_clear();
        MULTI.clear().ok();
    });

    ProgressGuard {
        handle: Some(handle),
    }
}
