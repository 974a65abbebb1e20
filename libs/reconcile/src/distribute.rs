//! Carbon-minimizing job distribution.
//!
//! Jobs and workers are lined up from the cleanest zone to the dirtiest and
//! walked from the dirty end inward. The dirtiest remaining job is offered
//! the dirtiest remaining worker; a worker that is not strictly cleaner than
//! that job is dropped for the rest of the pass. This is a greedy single pass,
//! not a global optimum.

use std::collections::{HashMap, HashSet};

use carbon_model::{CarbonIntensity, Job, UpdateJob, Worker, Zone};

/// Match free jobs to free workers in strictly cleaner zones.
///
/// Carbon entries are ranked ascending by value with ties kept in input
/// order. Only the first usable entry per zone counts; entries with an empty
/// zone or a non-finite value are ignored. Jobs and workers whose zone has no
/// usable entry do not take part in this pass.
pub fn distribute(
    jobs: &[&Job],
    workers: &[&Worker],
    carbon: &[CarbonIntensity],
) -> Vec<UpdateJob> {
    let ranked = rank_zones(carbon);
    let sorted_jobs = bucket(jobs, |j| &j.creation_zone, &ranked);
    let sorted_workers = bucket(workers, |w| &w.zone, &ranked);

    let mut assignments = Vec::new();
    let mut j = sorted_jobs.len();
    let mut w = sorted_workers.len();

    while j > 0 && w > 0 {
        let (job, job_carbon) = sorted_jobs[j - 1];
        let (worker, worker_carbon) = sorted_workers[w - 1];

        if worker_carbon >= job_carbon {
            w -= 1;
            continue;
        }

        assignments.push(UpdateJob {
            job_id: job.id.clone(),
            worker_id: worker.id.clone(),
            compute_zone: worker.zone.clone(),
            carbon_intensity: worker_carbon,
            carbon_saving: job_carbon - worker_carbon,
        });
        j -= 1;
        w -= 1;
    }

    assignments
}

/// Returns true if a carbon entry can take part in ranking.
pub fn is_usable(entry: &CarbonIntensity) -> bool {
    !entry.zone.is_empty() && entry.value.is_finite()
}

/// Zones ordered from cleanest to dirtiest.
fn rank_zones(carbon: &[CarbonIntensity]) -> Vec<(&Zone, f64)> {
    let mut seen: HashSet<&Zone> = HashSet::new();
    let mut ranked = Vec::with_capacity(carbon.len());
    for entry in carbon.iter().filter(|e| is_usable(e)) {
        if seen.insert(&entry.zone) {
            ranked.push((&entry.zone, entry.value));
        }
    }

    // sort_by is stable: equal values keep input order.
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

/// Flatten items into zone buckets laid out in ranked order.
fn bucket<'a, T, F>(items: &[&'a T], zone_of: F, ranked: &[(&Zone, f64)]) -> Vec<(&'a T, f64)>
where
    F: Fn(&'a T) -> &'a Zone,
{
    let mut buckets: HashMap<&Zone, Vec<&'a T>> = HashMap::new();
    for &item in items {
        buckets.entry(zone_of(item)).or_default().push(item);
    }

    let mut sorted = Vec::with_capacity(items.len());
    for (zone, value) in ranked {
        if let Some(members) = buckets.remove(zone) {
            sorted.extend(members.into_iter().map(|item| (item, *value)));
        }
    }
    sorted
}

/// Aggregate figures for a set of assignments.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DistributionSummary {
    pub assignments: usize,
    pub total_carbon_saving: f64,
}

impl DistributionSummary {
    pub fn from_assignments(assignments: &[UpdateJob]) -> Self {
        Self {
            assignments: assignments.len(),
            total_carbon_saving: assignments.iter().map(|a| a.carbon_saving).sum(),
        }
    }
}
