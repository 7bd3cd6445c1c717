//! Thread pool of cascade replicas.
//!
//! Each worker owns a private [`Cascade`] imported from its own copy of an
//! exported snapshot, so no cascade state is shared between threads. Jobs
//! go out round-robin over per-worker channels; replies come back on one
//! shared channel tagged with the job index.
//!
//! A worker that panics reports the failure before exiting. The pool is
//! then poisoned and every later call fails with
//! [`CascadeError::WorkerDisconnected`].
use crate::cascade::{Cascade, CascadeSnapshot};
use crate::classifier::StageDecoder;
use crate::error::CascadeError;
use log::{debug, info, warn};
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

struct Job {
    index: usize,
    input: Vec<f32>,
}

enum Reply {
    Ready(Result<(), CascadeError>),
    Verdict { index: usize, verdict: u8 },
    Failed,
}

struct Worker {
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

pub struct WorkerPool {
    workers: Vec<Worker>,
    replies: Receiver<(usize, Reply)>,
    poisoned: Cell<Option<usize>>,
}

fn worker_main(
    id: usize,
    snapshot: CascadeSnapshot,
    decoder: Arc<dyn StageDecoder>,
    jobs: Receiver<Job>,
    replies: Sender<(usize, Reply)>,
) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        worker_loop(id, &snapshot, decoder.as_ref(), jobs, &replies)
    }));
    if outcome.is_err() {
        warn!("Worker {id} panicked");
        let _ = replies.send((id, Reply::Failed));
    }
}

fn worker_loop(
    id: usize,
    snapshot: &CascadeSnapshot,
    decoder: &dyn StageDecoder,
    jobs: Receiver<Job>,
    replies: &Sender<(usize, Reply)>,
) {
    let mut cascade = match Cascade::from_snapshot(snapshot, decoder) {
        Ok(cascade) => cascade,
        Err(err) => {
            let _ = replies.send((id, Reply::Ready(Err(err))));
            return;
        }
    };
    if replies.send((id, Reply::Ready(Ok(())))).is_err() {
        return;
    }
    debug!("Worker {id} ready with {} stages", cascade.len());
    for job in jobs {
        let verdict = cascade.run(&job.input);
        if replies
            .send((
                id,
                Reply::Verdict {
                    index: job.index,
                    verdict,
                },
            ))
            .is_err()
        {
            break;
        }
    }
}

impl WorkerPool {
    /// Start `threads` workers, each importing `snapshot`. Returns once every
    /// worker has reported ready, or the first import error.
    pub fn spawn(
        snapshot: &CascadeSnapshot,
        threads: usize,
        decoder: Arc<dyn StageDecoder>,
    ) -> Result<Self, CascadeError> {
        if threads == 0 {
            return Err(CascadeError::InvalidWorkerCount);
        }
        let (reply_tx, replies) = mpsc::channel();
        let mut workers = Vec::with_capacity(threads);
        for id in 0..threads {
            let (job_tx, job_rx) = mpsc::channel();
            let snapshot = snapshot.clone();
            let decoder = Arc::clone(&decoder);
            let reply_tx = reply_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("cascade-worker-{id}"))
                .spawn(move || worker_main(id, snapshot, decoder, job_rx, reply_tx))
                .map_err(|_| CascadeError::WorkerDisconnected { worker: id })?;
            workers.push(Worker {
                jobs: Some(job_tx),
                handle: Some(handle),
            });
        }
        drop(reply_tx);

        let pool = Self {
            workers,
            replies,
            poisoned: Cell::new(None),
        };
        for ready in 0..threads {
            match pool.replies.recv() {
                Ok((_, Reply::Ready(Ok(())))) => {}
                Ok((_, Reply::Ready(Err(err)))) => return Err(err),
                Ok((worker, Reply::Verdict { .. } | Reply::Failed)) => {
                    return Err(CascadeError::WorkerDisconnected { worker })
                }
                Err(_) => return Err(CascadeError::WorkerDisconnected { worker: ready }),
            }
        }
        info!("Generated workers on {threads} threads");
        Ok(pool)
    }

    pub fn threads(&self) -> usize {
        self.workers.len()
    }

    /// Worker whose failure poisoned the pool, if any.
    pub fn failed_worker(&self) -> Option<usize> {
        self.poisoned.get()
    }

    /// Classify every input on the pool. Verdicts come back in input order.
    pub fn classify_batch(&self, inputs: &[Vec<f32>]) -> Result<Vec<u8>, CascadeError> {
        if let Some(worker) = self.poisoned.get() {
            return Err(CascadeError::WorkerDisconnected { worker });
        }
        let n = self.workers.len();
        for (index, input) in inputs.iter().enumerate() {
            let worker = index % n;
            let sent = self.workers[worker].jobs.as_ref().map(|tx| {
                tx.send(Job {
                    index,
                    input: input.clone(),
                })
            });
            if !matches!(sent, Some(Ok(()))) {
                return Err(self.poison(worker));
            }
        }

        let mut verdicts = vec![0u8; inputs.len()];
        let mut received = 0usize;
        while received < inputs.len() {
            match self.replies.recv() {
                Ok((id, Reply::Verdict { index, verdict })) => match verdicts.get_mut(index) {
                    Some(slot) => {
                        *slot = verdict;
                        received += 1;
                    }
                    None => return Err(self.poison(id)),
                },
                Ok((id, Reply::Failed)) => return Err(self.poison(id)),
                Ok((id, Reply::Ready(_))) => {
                    warn!("Unexpected ready message from worker {id}");
                }
                Err(_) => return Err(self.poison(self.finished_worker())),
            }
        }
        Ok(verdicts)
    }

    /// Replies of an aborted batch may still be queued, so a failure is final.
    fn poison(&self, worker: usize) -> CascadeError {
        warn!("Worker {worker} disconnected; pool is no longer usable");
        self.poisoned.set(Some(worker));
        CascadeError::WorkerDisconnected { worker }
    }

    fn finished_worker(&self) -> usize {
        self.workers
            .iter()
            .position(|w| w.handle.as_ref().is_some_and(|h| h.is_finished()))
            .unwrap_or(0)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for worker in &mut self.workers {
            worker.jobs.take();
        }
        for (id, worker) in self.workers.iter_mut().enumerate() {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    warn!("Worker {id} panicked");
                }
            }
        }
        debug!("Worker pool shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{
        BuiltinDecoder, Classifier, Example, StageBlob, StumpStage, TrainConfig, TrainOutcome,
        TrainProgress,
    };

    /// Panics on any input whose first feature exceeds 0.5.
    struct Fragile;

    impl Classifier for Fragile {
        fn kind(&self) -> &'static str {
            "fragile"
        }

        fn predict(&self, input: &[f32]) -> f32 {
            assert!(input[0] <= 0.5, "fragile stage hit {}", input[0]);
            0.0
        }

        fn train(
            &mut self,
            _examples: &[Example<'_>],
            _config: &TrainConfig,
            _on_progress: &mut dyn FnMut(&TrainProgress),
        ) -> Result<TrainOutcome, CascadeError> {
            Ok(TrainOutcome::default())
        }

        fn serialize(&self) -> Result<StageBlob, CascadeError> {
            Ok(StageBlob {
                kind: "fragile".into(),
                params: serde_json::Value::Null,
            })
        }
    }

    struct FragileDecoder;

    impl StageDecoder for FragileDecoder {
        fn decode(&self, blob: &StageBlob) -> Result<Box<dyn Classifier>, CascadeError> {
            match blob.kind.as_str() {
                "fragile" => Ok(Box::new(Fragile)),
                _ => BuiltinDecoder.decode(blob),
            }
        }
    }

    fn snapshot() -> CascadeSnapshot {
        Cascade::with_stages(vec![
            Box::new(StumpStage::new(0, 0.5, true)),
            Box::new(StumpStage::new(1, 0.25, false)),
        ])
        .export()
        .unwrap()
    }

    #[test]
    fn zero_threads_is_a_configuration_error() {
        let err = WorkerPool::spawn(&snapshot(), 0, Arc::new(BuiltinDecoder))
            .err()
            .unwrap();
        assert_eq!(err, CascadeError::InvalidWorkerCount);
    }

    #[test]
    fn verdicts_match_in_process_run_and_keep_order() {
        let snapshot = snapshot();
        let pool = WorkerPool::spawn(&snapshot, 3, Arc::new(BuiltinDecoder)).unwrap();
        assert_eq!(pool.threads(), 3);
        let inputs: Vec<Vec<f32>> = (0..20)
            .map(|i| vec![(i % 7) as f32 / 7.0, (i % 5) as f32 / 5.0])
            .collect();
        let verdicts = pool.classify_batch(&inputs).unwrap();

        let mut local = Cascade::from_snapshot(&snapshot, &BuiltinDecoder).unwrap();
        let expected: Vec<u8> = inputs.iter().map(|x| local.run(x)).collect();
        assert_eq!(verdicts, expected);
        assert!(pool.classify_batch(&[]).unwrap().is_empty());
    }

    #[test]
    fn import_failure_fails_spawn() {
        let mut snapshot = snapshot();
        snapshot.stages.push(StageBlob {
            kind: "nope".into(),
            params: serde_json::Value::Null,
        });
        let err = WorkerPool::spawn(&snapshot, 2, Arc::new(BuiltinDecoder))
            .err()
            .unwrap();
        assert_eq!(err, CascadeError::UnknownStageKind("nope".into()));
    }

    #[test]
    fn panicking_worker_fails_the_batch_and_poisons_the_pool() {
        let snapshot = Cascade::with_stages(vec![Box::new(Fragile)])
            .export()
            .unwrap();
        let pool = WorkerPool::spawn(&snapshot, 2, Arc::new(FragileDecoder)).unwrap();
        assert_eq!(pool.classify_batch(&[vec![0.1]]).unwrap(), vec![0]);

        // Index 2 goes to worker 0.
        let inputs = vec![vec![0.0], vec![0.0], vec![0.9], vec![0.0]];
        let err = pool.classify_batch(&inputs).unwrap_err();
        assert_eq!(err, CascadeError::WorkerDisconnected { worker: 0 });
        assert_eq!(pool.failed_worker(), Some(0));

        let err = pool.classify_batch(&[vec![0.0]]).unwrap_err();
        assert_eq!(err, CascadeError::WorkerDisconnected { worker: 0 });
    }
}
