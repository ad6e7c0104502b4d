//! Sequential background I/O.
//!
//! File work (model import, scene save, scene load) runs on a dedicated
//! `mr-ngin-io` thread that owns a single-threaded tokio runtime. Tasks are
//! driven one at a time, strictly in submission order, so a later task
//! observes the effects of an earlier one and never the other way round. A
//! failing task does not affect the tasks queued behind it.
//!
//! The runtime lives and dies on the worker thread, so an [`IoWorker`] can be
//! created and dropped from inside another tokio runtime.
//!
//! The worker never touches the scene graph. It only produces bytes and
//! parsed documents, handed back as [`Completion`]s over a channel that the
//! frame tick drains at its start.

use std::{
    collections::VecDeque,
    future::Future,
    panic::AssertUnwindSafe,
    path::{Path, PathBuf},
    pin::Pin,
    sync::mpsc,
    thread,
    time::Duration,
};

use futures::FutureExt;
use log::{debug, error, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::{
    error::{Result, SceneError},
    resources::{self, scene::SceneDocument},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    ImportModel,
    SaveScene,
    LoadScene,
}

/// Result of one finished I/O task.
#[derive(Debug)]
pub enum Completion {
    ModelImported {
        name: String,
        bytes: Vec<u8>,
    },
    SceneSaved {
        path: PathBuf,
    },
    /// `assets[i]` holds the bytes for `document.models[i]`, `None` if the
    /// file is missing or unreadable.
    SceneLoaded {
        document: SceneDocument,
        assets: Vec<Option<Vec<u8>>>,
    },
    NoPersistedScene,
    Failed {
        task: TaskKind,
        error: SceneError,
    },
}

impl Completion {
    /// The kind of task that produced this completion.
    pub fn task(&self) -> TaskKind {
        match self {
            Completion::ModelImported { .. } => TaskKind::ImportModel,
            Completion::SceneSaved { .. } => TaskKind::SaveScene,
            Completion::SceneLoaded { .. } | Completion::NoPersistedScene => TaskKind::LoadScene,
            Completion::Failed { task, .. } => *task,
        }
    }
}

type Job = Pin<Box<dyn Future<Output = Result<Completion>> + Send>>;

pub struct IoWorker {
    // `None` once shut down.
    jobs: Option<UnboundedSender<(TaskKind, Job)>>,
    thread: Option<thread::JoinHandle<()>>,
    completions: mpsc::Receiver<Completion>,
    ready: VecDeque<Completion>,
    // submitted tasks whose completion has not been drained yet, oldest first
    outstanding: VecDeque<TaskKind>,
}

impl IoWorker {
    pub fn new() -> Result<Self> {
        let (job_tx, job_rx) = unbounded_channel::<(TaskKind, Job)>();
        let (done_tx, done_rx) = mpsc::channel();
        let (started_tx, started_rx) = mpsc::sync_channel::<std::io::Result<()>>(1);

        let thread = thread::Builder::new()
            .name("mr-ngin-io".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = started_tx.send(Err(e));
                        return;
                    }
                };
                let _ = started_tx.send(Ok(()));
                runtime.block_on(drive(job_rx, done_tx));
            })?;

        match started_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(SceneError::Io(std::io::Error::other(
                    "i/o worker exited during startup",
                )));
            }
        }

        Ok(Self {
            jobs: Some(job_tx),
            thread: Some(thread),
            completions: done_rx,
            ready: VecDeque::new(),
            outstanding: VecDeque::new(),
        })
    }

    fn submit(&mut self, task: TaskKind, job: Job) -> bool {
        let Some(jobs) = &self.jobs else {
            warn!("i/o worker is shut down, rejecting {:?}", task);
            return false;
        };
        if jobs.send((task, job)).is_err() {
            error!("i/o worker stopped unexpectedly, dropping {:?}", task);
            return false;
        }
        self.outstanding.push_back(task);
        true
    }

    /// Copies `source` into `models_dir` and reads it back.
    pub fn import_model(&mut self, source: PathBuf, models_dir: PathBuf) -> bool {
        self.submit(
            TaskKind::ImportModel,
            Box::pin(async move {
                let (name, destination) = resources::copy_into(&source, &models_dir).await?;
                let bytes = resources::load_binary(&destination).await?;
                Ok(Completion::ModelImported { name, bytes })
            }),
        )
    }

    /// `document` must already be captured on the frame tick.
    pub fn save_scene(&mut self, document: SceneDocument, path: PathBuf) -> bool {
        self.submit(
            TaskKind::SaveScene,
            Box::pin(async move {
                document.save(&path).await?;
                Ok(Completion::SceneSaved { path })
            }),
        )
    }

    pub fn load_scene(&mut self, path: PathBuf, models_dir: PathBuf) -> bool {
        self.submit(
            TaskKind::LoadScene,
            Box::pin(async move {
                let Some(document) = SceneDocument::load(&path).await? else {
                    return Ok(Completion::NoPersistedScene);
                };
                let reads = document
                    .models
                    .iter()
                    .map(|name| read_model(&models_dir, name));
                let assets = futures::future::join_all(reads).await;
                Ok(Completion::SceneLoaded { document, assets })
            }),
        )
    }

    /// Tasks submitted but not yet drained.
    pub fn in_flight(&self) -> usize {
        self.outstanding.len()
    }

    /// Whether a task of `kind` was submitted and its completion not yet
    /// drained.
    pub fn is_pending(&self, kind: TaskKind) -> bool {
        self.outstanding.contains(&kind)
    }

    /// Everything that finished since the last call, in submission order.
    pub fn drain(&mut self) -> Vec<Completion> {
        self.collect_finished();
        for completion in &self.ready {
            if self.outstanding.pop_front() != Some(completion.task()) {
                warn!("{:?} completion arrived out of order", completion.task());
            }
        }
        self.ready.drain(..).collect()
    }

    /// Blocks until every submitted task has finished or `timeout` elapses.
    /// Finished completions stay buffered for the next [`IoWorker::drain`].
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = instant::Instant::now() + timeout;
        self.collect_finished();
        while self.ready.len() < self.outstanding.len() {
            let remaining = deadline.saturating_duration_since(instant::Instant::now());
            match self.completions.recv_timeout(remaining) {
                Ok(completion) => self.ready.push_back(completion),
                Err(mpsc::RecvTimeoutError::Timeout) => return false,
                Err(mpsc::RecvTimeoutError::Disconnected) => return false,
            }
        }
        true
    }

    /// Stops accepting work and lets queued tasks run to completion.
    /// Returns their completions.
    pub fn shutdown(&mut self) -> Vec<Completion> {
        self.stop();
        self.drain()
    }

    pub fn is_shut_down(&self) -> bool {
        self.jobs.is_none()
    }

    fn collect_finished(&mut self) {
        while let Ok(completion) = self.completions.try_recv() {
            self.ready.push_back(completion);
        }
    }

    fn stop(&mut self) {
        self.jobs.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("i/o worker thread terminated abnormally");
            }
        }
    }
}

impl Drop for IoWorker {
    fn drop(&mut self) {
        // queued saves still reach the disk
        self.stop();
        for completion in self.completions.try_iter() {
            if let Completion::Failed { task, error } = completion {
                error!("{:?} failed after the frame loop went away: {}", task, error);
            }
        }
    }
}

async fn drive(
    mut jobs: UnboundedReceiver<(TaskKind, Job)>,
    done: mpsc::Sender<Completion>,
) {
    while let Some((task, job)) = jobs.recv().await {
        let completion = match AssertUnwindSafe(job).catch_unwind().await {
            Ok(Ok(completion)) => completion,
            Ok(Err(error)) => Completion::Failed { task, error },
            Err(_) => Completion::Failed {
                task,
                error: SceneError::Io(std::io::Error::other(format!(
                    "{:?} task panicked",
                    task
                ))),
            },
        };
        if done.send(completion).is_err() {
            debug!("completion receiver dropped, stopping i/o worker");
            break;
        }
    }
}

async fn read_model(models_dir: &Path, name: &str) -> Option<Vec<u8>> {
    let Some(path) = resources::model_path(models_dir, name) else {
        warn!("ignoring model name `{}`: not a plain file name", name);
        return None;
    };
    match resources::load_binary(&path).await {
        Ok(bytes) => Some(bytes),
        Err(SceneError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("model file {} is missing", path.display());
            None
        }
        Err(e) => {
            warn!("could not read model file {}: {}", path.display(), e);
            None
        }
    }
}
