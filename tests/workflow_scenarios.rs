// tests/workflow_scenarios.rs

mod common;
use crate::common::builders::{chain, scenario, scenario_with};
use crate::common::tasks::{CancellingTask, GatedTask};
use crate::common::{Journal, TestResult, WorkflowBuilder, init_tracing, with_timeout};

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use dagflow::engine::{RunOutcome, WorkflowState};
use dagflow::errors::WorkflowError;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scenario_runs_every_task_in_dependency_order() -> TestResult {
    init_tracing();

    for _ in 0..20 {
        let mut wf = scenario().build();
        wf.start(CancellationToken::new(), Journal::new())?;

        let outcome = with_timeout(wf.wait_for_completion()).await?;
        assert_eq!(outcome, RunOutcome::Succeeded);
        assert_eq!(wf.state(), WorkflowState::Completed);
        assert!(!wf.is_cancelled());

        let journal = wf.context().expect("started workflow has a context");
        for name in ["A", "B", "C", "D", "E", "F", "G"] {
            assert_eq!(journal.times_started(name), 1, "{name} should run once");
        }

        journal.assert_ran_before("A", "E");
        journal.assert_ran_before("E", "F");
        journal.assert_ran_before("B", "F");
        journal.assert_ran_before("C", "G");
        journal.assert_ran_before("D", "G");
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn first_child_runs_on_parent_branch() -> TestResult {
    init_tracing();

    // 11 edges, 8 nodes with children (start, A..G): 3 spawned branches,
    // all of them from the start marker.
    let mut wf = scenario().build();
    wf.start(CancellationToken::new(), Journal::new())?;
    with_timeout(wf.wait_for_completion()).await?;
    assert_eq!(wf.spawned_branches(), 3);

    // A chain never fans out.
    let mut wf = chain(6).build();
    wf.start(CancellationToken::new(), Journal::new())?;
    assert_eq!(
        with_timeout(wf.wait_for_completion()).await?,
        RunOutcome::Succeeded
    );
    assert_eq!(wf.spawned_branches(), 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn wait_returns_only_after_all_paths_finish() -> TestResult {
    init_tracing();

    let gate = Arc::new(Notify::new());
    let gated = Arc::clone(&gate);
    let mut wf = WorkflowBuilder::new()
        .task("fast")
        .task_with("slow", GatedTask::new("slow", gated))
        .start("fast")
        .start("slow")
        .end("fast")
        .end("slow")
        .build();

    wf.start(CancellationToken::new(), Journal::new())?;

    // Still waiting on "slow": the wait times out, and dropping it is harmless.
    let early = tokio::time::timeout(Duration::from_millis(100), wf.wait_for_completion()).await;
    assert!(early.is_err(), "wait resolved before every path finished");
    assert_eq!(wf.state(), WorkflowState::Started);
    assert!(!wf.is_signalled());

    gate.notify_one();

    assert_eq!(
        with_timeout(wf.wait_for_completion()).await?,
        RunOutcome::Succeeded
    );
    let journal = wf.context().expect("context");
    assert_eq!(journal.times_started("fast"), 1);
    assert_eq!(journal.times_started("slow"), 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelled_before_start_runs_nothing() -> TestResult {
    init_tracing();

    let mut wf = scenario().build();
    let cancel = CancellationToken::new();
    cancel.cancel();

    wf.start(cancel, Journal::new())?;
    let outcome = with_timeout(wf.wait_for_completion()).await?;

    assert_eq!(outcome, RunOutcome::Cancelled);
    assert!(wf.is_cancelled());
    assert!(wf.context().expect("context").events().is_empty());
    assert_eq!(wf.spawned_branches(), 0);

    // Exactly one delivery: a second wait does not see another signal.
    assert!(matches!(
        wf.wait_for_completion().await,
        Err(WorkflowError::AlreadyCompleted)
    ));

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cancelling_after_a_skips_e_and_still_completes() -> TestResult {
    init_tracing();

    for _ in 0..20 {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let mut wf = scenario_with(WorkflowBuilder::new(), move |b, name| {
            if name == "A" {
                b.task_with("A", CancellingTask::new("A", token.clone()))
            } else {
                b.task(name)
            }
        })
        .build();

        wf.start(cancel, Journal::new())?;
        let outcome = with_timeout(wf.wait_for_completion()).await?;

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(wf.is_cancelled());

        let journal = wf.context().expect("context");
        assert_eq!(journal.times_started("A"), 1);
        assert!(!journal.has_started("E"));
        assert!(!journal.has_started("F"));
    }

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_success_and_cancellation_deliver_once() -> TestResult {
    init_tracing();

    for _ in 0..50 {
        let cancel = CancellationToken::new();
        let mut wf = WorkflowBuilder::new()
            .task_with("canceller", CancellingTask::new("canceller", cancel.clone()))
            .task("worker")
            .start("canceller")
            .start("worker")
            .end("canceller")
            .end("worker")
            .build();

        wf.start(cancel, Journal::new())?;
        let outcome = with_timeout(wf.wait_for_completion()).await?;

        // The end marker checks the token before delivering success, so
        // this run can only end as cancelled, whichever branch gets there.
        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(matches!(
            wf.wait_for_completion().await,
            Err(WorkflowError::AlreadyCompleted)
        ));
    }

    Ok(())
}
