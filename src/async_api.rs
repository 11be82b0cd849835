use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use log::debug;
use tokio::sync::oneshot;

use crate::{CardConfig, CardGenerator, CardRequest, Error, RenderedCard, Result};

struct Job {
    request: CardRequest,
    resp: oneshot::Sender<Result<RenderedCard>>,
}

/// An async-friendly card generator backed by dedicated render threads.
///
/// Metadata fetches block and encoding is CPU-bound, so neither runs on
/// the async executor: jobs go through a channel to a fixed set of worker
/// threads sharing one [`CardGenerator`], and results come back over a
/// oneshot channel. Dropping every clone of the pool stops the workers
/// once the queue drains.
#[derive(Clone)]
pub struct RenderPool {
    job_tx: Sender<Job>,
    workers: usize,
}

impl RenderPool {
    /// Create a pool from a config. The generator (fonts, HTTP client) is
    /// built on a plain thread, off the async runtime.
    pub async fn new(config: CardConfig) -> Result<Self> {
        let workers = config.render_workers;
        let (init_tx, init_rx) = oneshot::channel();

        thread::spawn(move || {
            let _ = init_tx.send(CardGenerator::new(config));
        });

        let generator = init_rx
            .await
            .map_err(|e| Error::InitializationError(format!("Worker init canceled: {}", e)))??;

        Self::with_generator(generator, workers)
    }

    /// Start `workers` threads (at least one) around an existing generator.
    pub fn with_generator(generator: CardGenerator, workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let generator = Arc::new(generator);
        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let job_rx = Arc::new(Mutex::new(job_rx));

        for i in 0..workers {
            let generator = generator.clone();
            let job_rx = job_rx.clone();
            thread::Builder::new()
                .name(format!("linkcard-render-{}", i))
                .spawn(move || worker_loop(&generator, &job_rx))
                .map_err(|e| {
                    Error::InitializationError(format!("Failed to spawn render worker: {}", e))
                })?;
        }
        debug!("Render pool started with {} workers", workers);

        Ok(Self { job_tx, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Render one card. Invalid requests are rejected before queueing.
    pub async fn generate(&self, request: CardRequest) -> Result<RenderedCard> {
        request.validate()?;

        let (resp_tx, resp_rx) = oneshot::channel();
        self.job_tx
            .send(Job {
                request,
                resp: resp_tx,
            })
            .map_err(|_| Error::Other("Render pool is shut down".into()))?;

        resp_rx
            .await
            .map_err(|e| Error::Other(format!("Render worker dropped the job: {}", e)))?
    }

    /// Render several cards concurrently; results keep the input order.
    pub async fn generate_many(&self, requests: Vec<CardRequest>) -> Vec<Result<RenderedCard>> {
        futures::future::join_all(requests.into_iter().map(|r| self.generate(r))).await
    }
}

fn worker_loop(generator: &CardGenerator, jobs: &Mutex<Receiver<Job>>) {
    loop {
        let job = match jobs.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => return,
        };
        // Every sender is gone: the pool was dropped
        let Ok(job) = job else { return };
        let _ = job.resp.send(generator.generate(&job.request));
    }
}
