//! File de tâches asynchrones
//!
//! Les commandes qui répondent avant que le service ait confirmé (bascule
//! lecture/pause, envoi différé du volume, relecture après une commande)
//! déposent ici une tâche nommée. Chaque échec est journalisé et compté.

use crate::errors::Result;
use crate::openapi::WorkerStats;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, warn};

type JobFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

struct Job {
    name: String,
    future: JobFuture,
}

#[derive(Clone)]
pub struct Worker {
    tx: mpsc::UnboundedSender<Job>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl Worker {
    /// Démarre la boucle d'exécution sur le runtime courant
    pub fn start() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let stats = Arc::new(Mutex::new(WorkerStats::default()));
        tokio::spawn(run(rx, stats.clone()));
        Self { tx, stats }
    }

    pub fn submit<F>(&self, name: &str, future: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let job = Job {
            name: name.to_string(),
            future: Box::pin(future),
        };
        self.stats.lock().submitted += 1;
        if self.tx.send(job).is_err() {
            let mut stats = self.stats.lock();
            stats.failed += 1;
            stats.last_error = Some(format!("{}: worker stopped", name));
            warn!("Worker stopped, job '{}' dropped", name);
        }
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats.lock().clone()
    }

    /// Attend que toutes les tâches soumises soient terminées
    pub async fn wait_idle(&self) {
        loop {
            {
                let stats = self.stats.lock();
                if stats.completed + stats.failed >= stats.submitted {
                    return;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<Job>, stats: Arc<Mutex<WorkerStats>>) {
    let mut jobs: JoinSet<(String, Result<()>)> = JoinSet::new();

    loop {
        tokio::select! {
            job = rx.recv() => match job {
                Some(Job { name, future }) => {
                    debug!("▶️  Job '{}' started", name);
                    jobs.spawn(async move { (name, future.await) });
                }
                None => break,
            },
            Some(done) = jobs.join_next(), if !jobs.is_empty() => record(&stats, done),
        }
    }

    while let Some(done) = jobs.join_next().await {
        record(&stats, done);
    }
}

fn record(
    stats: &Mutex<WorkerStats>,
    done: std::result::Result<(String, Result<()>), JoinError>,
) {
    let mut stats = stats.lock();
    match done {
        Ok((name, Ok(()))) => {
            stats.completed += 1;
            debug!("✅ Job '{}' done", name);
        }
        Ok((name, Err(e))) => {
            stats.failed += 1;
            stats.last_error = Some(format!("{}: {}", name, e));
            warn!("Job '{}' failed: {}", name, e);
        }
        Err(e) => {
            stats.failed += 1;
            stats.last_error = Some(format!("job panicked: {}", e));
            error!("Job panicked: {}", e);
        }
    }
}
