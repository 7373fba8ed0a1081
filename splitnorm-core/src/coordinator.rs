use crate::cancel::CancelToken;
use crate::error::{Phase, Result};
use crate::fork_join::TaskGroup;
use crate::partition::Partition;
use crate::worker::{Exponent, ReductionTask, ReductionWorker, ScalingTask, ScalingWorker};
use splitnorm_io::SystemTopology;

/// ReductionCoordinator: phase 1.
/// One `ReductionWorker` per segment; f64 partial sums are added in segment order.
pub struct ReductionCoordinator<'t> {
    group: TaskGroup<'t>,
    worker: ReductionWorker,
}

impl<'t> ReductionCoordinator<'t> {
    pub fn new(worker: ReductionWorker, topology: Option<&'t SystemTopology>) -> Self {
        let group = TaskGroup::new(Phase::Reduce);
        let group = match topology {
            Some(t) => group.pinned(t),
            None => group,
        };
        Self { group, worker }
    }

    #[cfg(test)]
    pub(crate) fn fail_launch_at(mut self, id: usize) -> Self {
        self.group = self.group.fail_launch_at(id);
        self
    }

    /// Partitions `data` over `threads` workers and returns `sum(x^exponent)`.
    pub fn reduce(&self, data: &[f32], threads: usize, exponent: Exponent, cancel: &CancelToken) -> Result<f64> {
        let partition = Partition::new(data.len(), threads)?;
        self.reduce_partitioned(data, &partition, exponent, cancel)
    }

    /// As `reduce`, over an existing partition of `data`.
    pub fn reduce_partitioned(
        &self,
        data: &[f32],
        partition: &Partition,
        exponent: Exponent,
        cancel: &CancelToken,
    ) -> Result<f64> {
        let tasks: Vec<ReductionTask<'_>> = partition
            .segments()
            .iter()
            .zip(partition.split(data)?)
            .map(|(segment, view)| ReductionTask { segment: *segment, data: view, exponent })
            .collect();

        let partials = self.group.run(tasks, cancel, |task, token| self.worker.run(task, token))?;
        Ok(partials.iter().sum())
    }
}

/// ScalingCoordinator: phase 2.
/// One `ScalingWorker` per segment; returns once every segment is divided.
pub struct ScalingCoordinator<'t> {
    group: TaskGroup<'t>,
    worker: ScalingWorker,
}

impl<'t> ScalingCoordinator<'t> {
    pub fn new(worker: ScalingWorker, topology: Option<&'t SystemTopology>) -> Self {
        let group = TaskGroup::new(Phase::Scale);
        let group = match topology {
            Some(t) => group.pinned(t),
            None => group,
        };
        Self { group, worker }
    }

    #[cfg(test)]
    pub(crate) fn fail_launch_at(mut self, id: usize) -> Self {
        self.group = self.group.fail_launch_at(id);
        self
    }

    /// Partitions `data` over `threads` workers and divides every element by `divisor`.
    pub fn scale(&self, data: &mut [f32], threads: usize, divisor: f32, cancel: &CancelToken) -> Result<()> {
        let partition = Partition::new(data.len(), threads)?;
        self.scale_partitioned(data, &partition, divisor, cancel)
    }

    /// As `scale`, over an existing partition of `data`.
    ///
    /// # Errors
    /// On a launch failure no element has been modified. On cancellation or a
    /// worker failure the contents are unspecified.
    pub fn scale_partitioned(
        &self,
        data: &mut [f32],
        partition: &Partition,
        divisor: f32,
        cancel: &CancelToken,
    ) -> Result<()> {
        let tasks: Vec<ScalingTask<'_>> = partition
            .segments()
            .iter()
            .zip(partition.split_mut(data)?)
            .map(|(segment, view)| ScalingTask { segment: *segment, data: view, divisor })
            .collect();

        self.group.run(tasks, cancel, |task, token| self.worker.run(task, token))?;
        Ok(())
    }
}
