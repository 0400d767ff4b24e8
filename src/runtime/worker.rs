use std::io;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use crate::app::{Job, Reply};
use crate::delivery::{DeliveryError, DeliveryService};

/// Runs remote jobs off the control thread, one short-lived thread each.
pub struct Workers {
    service: Arc<dyn DeliveryService>,
    replies: Sender<Reply>,
}

impl Workers {
    pub fn new(service: Arc<dyn DeliveryService>, replies: Sender<Reply>) -> Self {
        Self { service, replies }
    }

    pub fn spawn_all(&self, jobs: Vec<Job>) {
        for job in jobs {
            self.spawn(job);
        }
    }

    pub fn spawn(&self, job: Job) {
        tracing::debug!(?job, "starting remote job");
        let service = Arc::clone(&self.service);
        let replies = self.replies.clone();
        let unstarted = job.clone();

        let spawned = thread::Builder::new()
            .name("remote".to_string())
            .spawn(move || {
                let reply = job.run(service.as_ref());
                // The receiver is gone only while shutting down.
                let _ = replies.send(reply);
            });

        if let Err(e) = spawned {
            self.report_unstarted(unstarted, e);
        }
    }

    /// Answer a job that never ran, so a pending load cannot stay `Loading`.
    fn report_unstarted(&self, job: Job, err: io::Error) {
        tracing::warn!(error = %err, ?job, "could not start worker thread");
        let reply = job.fail(DeliveryError::RemoteUnavailable(format!(
            "could not start worker: {err}"
        )));
        let _ = self.replies.send(reply);
    }
}
