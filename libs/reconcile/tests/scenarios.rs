use carbon_model::{Job, UpdateJob, Worker};
use carbon_reconcile::{distribute, reconcile, zones};
use carbon_testing::fixtures::{
    carbon, job, scenario_a, scenario_unknown_worker_zone, worker, Scenario,
};
use rstest::{fixture, rstest};

#[fixture]
fn mixed() -> Scenario {
    scenario_a()
}

fn run(scenario: &Scenario) -> Vec<UpdateJob> {
    let reconciliation = reconcile(&scenario.jobs, &scenario.workers);
    distribute(
        &reconciliation.unassigned_jobs,
        &reconciliation.unassigned_workers,
        &scenario.carbon,
    )
}

fn triples(assignments: &[UpdateJob]) -> Vec<(&str, &str, f64)> {
    assignments
        .iter()
        .map(|a| (a.job_id.as_str(), a.worker_id.as_str(), a.carbon_saving))
        .collect()
}

#[rstest]
fn test_scenario_a_excludes_bound_pair(mixed: Scenario) {
    let reconciliation = reconcile(&mixed.jobs, &mixed.workers);

    assert_eq!(reconciliation.already_assigned.len(), 1);
    assert_eq!(reconciliation.already_assigned[0].job.id.as_str(), "job-4");
    assert!(reconciliation
        .unassigned_jobs
        .iter()
        .all(|j| j.id.as_str() != "job-4"));
    assert!(reconciliation
        .unassigned_workers
        .iter()
        .all(|w| w.id.as_str() != "w-de"));
}

#[rstest]
fn test_scenario_a_pairings(mixed: Scenario) {
    let assignments = run(&mixed);

    assert_eq!(
        triples(&assignments),
        vec![
            ("job-1", "w-jp", 50.0),
            ("job-3", "w-fr", 30.0),
            ("job-5", "w-ch", 5.0),
        ]
    );
    assert_eq!(assignments[0].compute_zone.as_str(), "JP");
    assert_eq!(assignments[0].carbon_intensity, 50.0);
}

#[rstest]
fn test_scenario_a_zones(mixed: Scenario) {
    let reconciliation = reconcile(&mixed.jobs, &mixed.workers);

    let zone_set: Vec<String> = zones(
        reconciliation.unassigned_jobs.iter().copied(),
        reconciliation.unassigned_workers.iter().copied(),
    )
    .into_iter()
    .map(|z| z.as_str().to_string())
    .collect();

    assert_eq!(zone_set, vec!["CH", "DE", "FR", "JP", "US"]);
}

#[test]
fn test_scenario_b_empty_inputs() {
    let carbon_data = carbon(&[("DE", 100.0)]);
    let jobs: Vec<&Job> = Vec::new();
    let workers: Vec<&Worker> = Vec::new();

    assert!(distribute(&jobs, &workers, &carbon_data).is_empty());
    assert!(distribute(&jobs, &workers, &[]).is_empty());
}

#[test]
fn test_scenario_c_worker_without_carbon_entry() {
    let scenario = scenario_unknown_worker_zone();

    let assignments = run(&scenario);

    assert_eq!(triples(&assignments), vec![("job-2", "w-fr", 80.0)]);
}

#[rstest]
#[case::dirtier_worker(&[("DE", 100.0), ("FR", 120.0)], 0)]
#[case::equal_intensity(&[("DE", 100.0), ("FR", 100.0)], 0)]
#[case::cleaner_worker(&[("DE", 100.0), ("FR", 99.5)], 1)]
#[case::missing_job_zone(&[("FR", 20.0)], 0)]
fn test_strictly_cleaner_rule(#[case] entries: &[(&str, f64)], #[case] expected: usize) {
    let jobs = [job("job-1", "DE")];
    let workers = [worker("w-fr", "FR")];

    let assignments = distribute(&[&jobs[0]], &[&workers[0]], &carbon(entries));

    assert_eq!(assignments.len(), expected);
}
