use crate::cancel::{CancelToken, ChildToken};
use crate::error::{NormError, Phase, Result};
use crossbeam_utils::sync::WaitGroup;
use crossbeam_utils::thread;
use log::{debug, error};
use splitnorm_io::affinity::pin_thread_to_core;
use splitnorm_io::SystemTopology;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cancels the phase token if the worker unwinds, so siblings stop early.
struct CancelOnPanic<'a>(&'a ChildToken);

impl Drop for CancelOnPanic<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.0.cancel();
        }
    }
}

/// TaskGroup: one fork-join phase.
///
/// # Logic
/// 1. Spawns one named, scoped OS thread per task. Each worker optionally pins
///    itself to a core, then blocks on a launch gate.
/// 2. The gate (a `WaitGroup`) opens once the coordinator has released its
///    handle, i.e. after every spawn attempt of the phase. If any spawn
///    failed, the abort flag is raised first and released workers return
///    without touching their task.
/// 3. Every spawned worker is joined. Results land in per-task slots indexed
///    by task id, so the output order never depends on completion order.
///
/// A failed worker cancels the phase token. The first non-cancellation error
/// (in task order) is reported; a phase succeeds only if every task did.
pub struct TaskGroup<'t> {
    phase: Phase,
    topology: Option<&'t SystemTopology>,
    #[cfg(test)]
    fail_launch_at: Option<usize>,
}

impl<'t> TaskGroup<'t> {
    pub fn new(phase: Phase) -> Self {
        Self {
            phase,
            topology: None,
            #[cfg(test)]
            fail_launch_at: None,
        }
    }

    /// Pin worker `i` to `topology.core_for_worker(i)`.
    pub fn pinned(mut self, topology: &'t SystemTopology) -> Self {
        self.topology = Some(topology);
        self
    }

    /// Simulates a thread creation failure for task `id`.
    #[cfg(test)]
    pub(crate) fn fail_launch_at(mut self, id: usize) -> Self {
        self.fail_launch_at = Some(id);
        self
    }

    /// Runs `work` once per task, concurrently, and returns the outputs in task order.
    ///
    /// # Errors
    /// `Spawn` if any thread could not be created (no task ran), otherwise the
    /// first worker error or `WorkerPanicked`, otherwise `Cancelled` if the
    /// caller's token fired.
    pub fn run<I, T, F>(&self, tasks: Vec<I>, cancel: &CancelToken, work: F) -> Result<Vec<T>>
    where
        I: Send,
        T: Send,
        F: Fn(I, &ChildToken) -> Result<T> + Sync,
    {
        let phase = self.phase;
        let count = tasks.len();
        let token = cancel.child();
        let abort = AtomicBool::new(false);

        let work = &work;
        let token_ref = &token;
        let abort_ref = &abort;

        debug!("{} phase: launching {} workers", phase, count);

        let scoped = thread::scope(|s| {
            let gate = WaitGroup::new();
            let mut handles = Vec::with_capacity(count);
            let mut launch_error = None;

            for (id, task) in tasks.into_iter().enumerate() {
                #[cfg(test)]
                if self.fail_launch_at == Some(id) {
                    let e = std::io::Error::new(std::io::ErrorKind::WouldBlock, "simulated launch failure");
                    launch_error = Some((id, e));
                    break;
                }

                let gate = gate.clone();
                let core = self.topology.map(|t| t.core_for_worker(id));

                let spawned = s
                    .builder()
                    .name(format!("splitnorm-{}-{}", phase, id))
                    .spawn(move |_| {
                        if let Some(core) = core {
                            pin_thread_to_core(core);
                        }
                        gate.wait();
                        if abort_ref.load(Ordering::Acquire) {
                            return Ok(None);
                        }

                        let _guard = CancelOnPanic(token_ref);
                        let out = work(task, token_ref);
                        if out.is_err() {
                            token_ref.cancel();
                        }
                        out.map(Some)
                    });

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        launch_error = Some((id, e));
                        break;
                    }
                }
            }

            if launch_error.is_some() {
                abort_ref.store(true, Ordering::Release);
            }
            // Open the gate: workers proceed once every clone is gone.
            drop(gate);

            let joined: Vec<_> = handles.into_iter().map(|h| h.join()).collect();
            (launch_error, joined)
        });

        // All handles were joined inside the scope, so the scope itself cannot
        // report an unjoined panic.
        let (launch_error, joined) = scoped.map_err(|_| NormError::WorkerPanicked { phase, task: 0 })?;

        if let Some((task, source)) = launch_error {
            error!("{} phase: worker {} failed to launch: {}", phase, task, source);
            return Err(NormError::Spawn { phase, task, source });
        }

        let mut slots: Vec<Option<T>> = (0..count).map(|_| None).collect();
        let mut first_error = None;
        for (id, outcome) in joined.into_iter().enumerate() {
            match outcome {
                Ok(Ok(value)) => slots[id] = value,
                Ok(Err(NormError::Cancelled { .. })) => {}
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(_) => {
                    error!("{} phase: worker {} panicked", phase, id);
                    first_error.get_or_insert(NormError::WorkerPanicked { phase, task: id });
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        if slots.iter().any(Option::is_none) {
            return Err(NormError::Cancelled { phase });
        }
        Ok(slots.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_results_are_in_task_order() {
        let group = TaskGroup::new(Phase::Reduce);
        let tasks: Vec<usize> = (0..8).collect();
        let out = group
            .run(tasks, &CancelToken::new(), |t, _| {
                // Later tasks finish first.
                std::thread::sleep(std::time::Duration::from_millis((8 - t) as u64));
                Ok(t * 10)
            })
            .unwrap();
        assert_eq!(out, vec![0, 10, 20, 30, 40, 50, 60, 70]);
    }

    #[test]
    fn test_workers_run_on_named_threads() {
        let group = TaskGroup::new(Phase::Scale);
        let names = group
            .run(vec![(); 3], &CancelToken::new(), |_, _| {
                Ok(std::thread::current().name().unwrap_or_default().to_string())
            })
            .unwrap();
        assert_eq!(names, vec!["splitnorm-scale-0", "splitnorm-scale-1", "splitnorm-scale-2"]);
    }

    #[test]
    fn test_launch_failure_runs_no_task() {
        let ran = AtomicUsize::new(0);
        let group = TaskGroup::new(Phase::Scale).fail_launch_at(2);
        let err = group
            .run(vec![(); 4], &CancelToken::new(), |_, _| {
                ran.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, NormError::Spawn { phase: Phase::Scale, task: 2, .. }));
        // Workers 0 and 1 were spawned and joined, but never ran their task.
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_first_worker_error_wins_over_cancellation() {
        let group = TaskGroup::new(Phase::Reduce);
        let err = group
            .run::<usize, (), _>((0..4).collect(), &CancelToken::new(), |t, token| {
                if t == 1 {
                    return Err(NormError::Config("boom".into()));
                }
                // Siblings observe the phase token raised by worker 1.
                while !token.is_cancelled() {
                    std::thread::yield_now();
                }
                Err(NormError::Cancelled { phase: Phase::Reduce })
            })
            .unwrap_err();
        assert!(matches!(err, NormError::Config(ref m) if m == "boom"));
    }

    #[test]
    fn test_panicking_worker_fails_the_phase() {
        let group = TaskGroup::new(Phase::Reduce);
        let err = group
            .run(vec![0usize, 1, 2], &CancelToken::new(), |t, _| {
                if t == 2 {
                    panic!("worker blew up");
                }
                Ok(t)
            })
            .unwrap_err();
        assert!(matches!(err, NormError::WorkerPanicked { phase: Phase::Reduce, task: 2 }));
    }

    #[test]
    fn test_caller_cancellation() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let group = TaskGroup::new(Phase::Reduce);
        let err = group
            .run(vec![(); 2], &cancel, |_, token| {
                if token.is_cancelled() {
                    return Err(NormError::Cancelled { phase: Phase::Reduce });
                }
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, NormError::Cancelled { phase: Phase::Reduce }));
    }

    #[test]
    fn test_pinned_group_still_completes() {
        let topo = SystemTopology::new();
        let group = TaskGroup::new(Phase::Reduce).pinned(&topo);
        let out = group.run(vec![1, 2, 3], &CancelToken::new(), |t, _| Ok(t * 2)).unwrap();
        assert_eq!(out, vec![2, 4, 6]);
    }
}
