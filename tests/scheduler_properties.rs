// tests/scheduler_properties.rs

use std::collections::{BTreeSet, HashSet};

use proptest::prelude::*;

use parbuild::dag::topo_sort;
use parbuild::engine::execute_targets;
use parbuild::project::Project;
use parbuild_test_utils::builders::ProjectBuilder;
use parbuild_test_utils::recorder::{Behaviour, ExecutionLog};

/// A random acyclic graph: task N may only depend on tasks 0..N-1.
#[derive(Debug, Clone)]
struct GraphSpec {
    deps: Vec<BTreeSet<usize>>,
}

fn graph_strategy(max_tasks: usize) -> impl Strategy<Value = GraphSpec> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(|raw| {
            let deps = raw
                .into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    if i == 0 {
                        BTreeSet::new()
                    } else {
                        potential.into_iter().map(|d| d % i).collect()
                    }
                })
                .collect();
            GraphSpec { deps }
        })
    })
}

fn task_name(i: usize) -> String {
    format!("task_{i}")
}

fn build_project(
    spec: &GraphSpec,
    failing: &HashSet<usize>,
    threads: usize,
    log: &ExecutionLog,
) -> Project {
    let mut builder = ProjectBuilder::new()
        .with_threads(threads)
        .with_timeout_secs(30);

    for (i, deps) in spec.deps.iter().enumerate() {
        let dep_names: Vec<String> = deps.iter().map(|d| task_name(*d)).collect();
        let dep_refs: Vec<&str> = dep_names.iter().map(|s| s.as_str()).collect();
        let behaviour = if failing.contains(&i) {
            Behaviour::Fail(format!("{} failed", task_name(i)))
        } else {
            Behaviour::Succeed
        };
        builder = builder.with_target(log.target(&task_name(i), &dep_refs, behaviour));
    }

    builder.build()
}

fn run(project: &Project, requested: &str) -> Result<(), parbuild::errors::ParbuildError> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("building test runtime");
    rt.block_on(execute_targets(project, &[requested.to_string()]))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn dependencies_always_finish_before_dependents_start(
        spec in graph_strategy(8),
        root in any::<prop::sample::Index>(),
        threads in 1..=4usize,
        failing in proptest::collection::hash_set(0..8usize, 0..3),
    ) {
        let log = ExecutionLog::new();
        let project = build_project(&spec, &failing, threads, &log);
        let root = task_name(root.index(spec.deps.len()));

        let resolved: HashSet<String> = topo_sort(&root, project.targets())
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        let expect_failure = resolved
            .iter()
            .any(|name| failing.iter().any(|f| task_name(*f) == *name));

        let res = run(&project, &root);
        prop_assert_eq!(res.is_err(), expect_failure, "unexpected outcome {:?}", res);

        // Nothing outside the resolved set runs, nothing runs twice.
        for name in log.started() {
            prop_assert!(resolved.contains(&name), "{} is not a dependency of {}", name, root);
            prop_assert_eq!(log.start_count(&name), 1);
        }

        // Every start is preceded by the successful finish of each dependency,
        // so nothing downstream of a failed target is ever started.
        for (i, deps) in spec.deps.iter().enumerate() {
            let name = task_name(i);
            if let Some(start) = log.start_index(&name) {
                for d in deps {
                    let finish = log.finish_index(&task_name(*d));
                    prop_assert!(
                        matches!(finish, Some(f) if f < start),
                        "{} started before dependency {} finished", name, task_name(*d)
                    );
                }
            }
        }

        // On success the whole resolved set completed exactly once.
        if res.is_ok() {
            let finished: HashSet<String> = log.finished().into_iter().collect();
            prop_assert_eq!(&finished, &resolved);
            prop_assert_eq!(log.finished().len(), resolved.len());
        }
    }

    #[test]
    fn outcome_does_not_depend_on_width(
        spec in graph_strategy(6),
        failing in proptest::collection::hash_set(0..6usize, 0..2),
    ) {
        let root = task_name(spec.deps.len() - 1);

        let narrow_log = ExecutionLog::new();
        let narrow = run(&build_project(&spec, &failing, 1, &narrow_log), &root);

        let wide_log = ExecutionLog::new();
        let wide = run(&build_project(&spec, &failing, 4, &wide_log), &root);

        prop_assert_eq!(narrow.is_ok(), wide.is_ok());
        if narrow.is_ok() {
            let mut a = narrow_log.finished();
            let mut b = wide_log.finished();
            a.sort();
            b.sort();
            prop_assert_eq!(a, b);
        }
    }
}
