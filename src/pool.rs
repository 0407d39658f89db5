//! Bounded worker pool draining a shared job queue.
//!
//! Workers own their job and its process; results flow back to the calling
//! thread over a channel, which is the only place outcomes are collected.
use crate::cases::CaseId;
use crate::exec::Outcome;
use crate::interrupt::CancelToken;
use crate::schedule::Job;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::thread;

/// A finished case as reported by a worker.
#[derive(Debug, Clone)]
pub struct Completion {
    pub id: CaseId,
    pub name: String,
    pub outcome: Outcome,
}

/// Outcomes gathered by one run of the pool.
#[derive(Debug, Default)]
pub struct PoolRun {
    pub outcomes: BTreeMap<CaseId, Outcome>,
    pub interrupted: bool,
}

/// Host parallelism, falling back to one worker.
pub fn default_workers() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// Run `jobs` on `workers` threads, calling `on_complete` as results arrive.
///
/// Once `cancel` fires, workers stop taking new jobs; jobs already running
/// finish and are still reported.
pub fn run_pool<F, C>(
    jobs: Vec<Job>,
    workers: NonZeroUsize,
    cancel: CancelToken,
    run: F,
    mut on_complete: C,
) -> PoolRun
where
    F: Fn(&Job) -> Outcome + Sync,
    C: FnMut(&Completion),
{
    let (job_tx, job_rx) = unbounded::<Job>();
    let (done_tx, done_rx) = unbounded::<Completion>();
    let worker_count = workers.get().min(jobs.len().max(1));
    for job in jobs {
        // Receiver outlives this loop, so sending cannot fail.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let mut result = PoolRun::default();
    thread::scope(|scope| {
        for _ in 0..worker_count {
            let job_rx = job_rx.clone();
            let done_tx = done_tx.clone();
            let run = &run;
            scope.spawn(move || worker(job_rx, done_tx, cancel, run));
        }
        drop(done_tx);
        for completion in done_rx.iter() {
            on_complete(&completion);
            result.outcomes.insert(completion.id, completion.outcome);
        }
    });
    result.interrupted = cancel.is_cancelled();
    if result.interrupted {
        tracing::warn!(abandoned = job_rx.len(), "interrupted; queued cases abandoned");
    }
    result
}

fn worker<F>(jobs: Receiver<Job>, done: Sender<Completion>, cancel: CancelToken, run: &F)
where
    F: Fn(&Job) -> Outcome,
{
    while !cancel.is_cancelled() {
        let Ok(job) = jobs.try_recv() else {
            break;
        };
        let outcome = run(&job);
        let completion = Completion {
            id: job.id,
            name: job.name,
            outcome,
        };
        if done.send(completion).is_err() {
            break;
        }
    }
}
