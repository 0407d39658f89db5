//! Run orchestration: scan, schedule, execute, reconcile, persist.
use crate::config::RunConfig;
use crate::corpus::{load_corpus, AnnotatedFile};
use crate::interrupt::{self, CancelToken};
use crate::pool::{run_pool, Completion};
use crate::reconcile::{persist, reconcile};
use crate::report::{
    list_lines, progress_line, write_report, CaseReport, RunReport, Tally, REPORT_SCHEMA_VERSION,
};
use crate::schedule::Schedule;
use crate::util::display_path;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Interrupted,
}

/// Run with SIGINT/SIGTERM turned into a graceful stop.
pub fn run(config: &RunConfig) -> Result<RunStatus> {
    if !config.list_only {
        interrupt::install();
    }
    run_with_cancel(config, CancelToken::process())
}

/// Full workflow with an explicit cancellation source.
pub fn run_with_cancel(config: &RunConfig, cancel: CancelToken) -> Result<RunStatus> {
    let base = display_base(&config.target);
    let mut corpus = load_corpus(&config.target)?;
    let schedule = Schedule::build(&corpus, config.recheck, config.filter.as_deref())?;
    tracing::info!(
        files = corpus.len(),
        cases = schedule.cases.iter().map(Vec::len).sum::<usize>(),
        executable = schedule.executable_count(),
        recheck = config.recheck,
        "scheduled"
    );

    if config.list_only {
        for line in list_summary(&corpus, &schedule, base.as_deref()) {
            println!("{line}");
        }
        return Ok(RunStatus::Completed);
    }

    let jobs = schedule.jobs(&corpus);
    let mut tally = Tally {
        scheduled: jobs.len(),
        ..Tally::default()
    };
    let start = Instant::now();
    let pool = run_pool(
        jobs,
        config.workers,
        cancel,
        |job| config.executor.run_job(job),
        |completion: &Completion| {
            tally.record(&completion.outcome);
            println!(
                "{}",
                progress_line(
                    tally.completed(),
                    tally.scheduled,
                    &completion.name,
                    &completion.outcome
                )
            );
        },
    );
    tracing::info!(
        elapsed_ms = start.elapsed().as_millis(),
        completed = pool.outcomes.len(),
        interrupted = pool.interrupted,
        "execution finished"
    );

    let summary = reconcile(&mut corpus, &schedule.cases, &pool.outcomes);
    let written = persist(&mut corpus)?;
    tracing::info!(
        removed = summary.removed,
        retagged = summary.retagged,
        files_written = written.len(),
        "reconciled"
    );

    println!("{}", tally.summary_line());
    if pool.interrupted {
        println!("interrupted: results so far were saved");
    }

    if let Some(path) = &config.report {
        let cases = schedule
            .cases
            .iter()
            .flatten()
            .filter_map(|case| {
                let outcome = pool.outcomes.get(&case.id)?;
                Some(CaseReport {
                    file: display_path(&corpus[case.id.file].path, base.as_deref()),
                    line: case.id.decl_line + 1,
                    name: case.name.clone(),
                    passed: outcome.is_pass(),
                    label: outcome.label().map(str::to_string),
                })
            })
            .collect();
        let report = RunReport {
            schema_version: REPORT_SCHEMA_VERSION,
            api: config.executor.api,
            recheck: config.recheck,
            interrupted: pool.interrupted,
            tally,
            markers_removed: summary.removed,
            files_written: written
                .iter()
                .map(|path| display_path(path, base.as_deref()))
                .collect(),
            cases,
        };
        write_report(path, &report)?;
    }

    Ok(if pool.interrupted {
        RunStatus::Interrupted
    } else {
        RunStatus::Completed
    })
}

fn list_summary(corpus: &[AnnotatedFile], schedule: &Schedule, base: Option<&Path>) -> Vec<String> {
    let counts: Vec<(PathBuf, usize)> = corpus
        .iter()
        .map(|file| file.path.clone())
        .zip(schedule.per_file_counts())
        .collect();
    list_lines(&counts, base)
}

fn display_base(target: &Path) -> Option<PathBuf> {
    if target.is_dir() {
        Some(target.to_path_buf())
    } else {
        target.parent().map(Path::to_path_buf)
    }
}

#[cfg(all(test, unix))]
#[path = "workflow_tests.rs"]
mod tests;
