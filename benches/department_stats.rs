//! This bench test computes statistics over a large generated organisation:
//! 20 divisions of 10 teams of 10 parts, with 20 employees per part.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use vdt_admin::{
    DepartmentId, OrgTree,
    domain::{
        DepartmentNode, Employee, EmployeeDirectory, Level, NewEmployee, Policy, PolicyBook, PolicyOverride,
        stats::{department_stats, division_report, employee_counts},
    },
};

fn id(s: String) -> DepartmentId {
    DepartmentId::new(s).unwrap()
}

/// Generates the tree and a directory with varied activity data.
fn preseed() -> (OrgTree, Vec<Employee>) {
    let mut divisions = Vec::new();
    let mut directory = EmployeeDirectory::default();

    for d in 0..20 {
        let mut division = DepartmentNode::new(id(format!("div-{d}")), format!("Division {d}"), Level::Division);
        for t in 0..10 {
            let mut team = DepartmentNode::new(id(format!("team-{d}-{t}")), format!("Team {t}"), Level::Team);
            for p in 0..10 {
                let part_id = id(format!("part-{d}-{t}-{p}"));
                for e in 0..20 {
                    directory.create(NewEmployee {
                        name: format!("Employee {d}-{t}-{p}-{e}"),
                        email: format!("e{d}{t}{p}{e}@company.com"),
                        department_id: Some(part_id.clone()),
                        ..NewEmployee::default()
                    });
                }
                team = team.with_child(DepartmentNode::new(part_id, format!("Part {p}"), Level::Part));
            }
            division = division.with_child(team);
        }
        divisions.push(division);
    }

    let mut employees = directory.into_employees();
    for (i, employee) in employees.iter_mut().enumerate() {
        employee.compliance = u8::try_from(i % 101).unwrap();
        employee.avg_vdt = f64::from(u8::try_from(i % 9).unwrap());
    }

    (OrgTree::from_divisions(divisions).unwrap(), employees)
}

fn stats(c: &mut Criterion) {
    let (tree, employees) = preseed();

    c.bench_function("division stats", |b| {
        b.iter(|| {
            for division in tree.divisions() {
                black_box(department_stats(black_box(division), &employees));
            }
        });
    });

    c.bench_function("division report", |b| {
        b.iter(|| division_report(black_box(&tree), &employees, 60));
    });

    c.bench_function("employee counts", |b| {
        b.iter(|| employee_counts(black_box(&tree), &employees));
    });
}

fn effective_policy(c: &mut Criterion) {
    let (tree, _) = preseed();
    let parts: Vec<DepartmentId> = tree.leaves().into_iter().map(|node| node.id.clone()).collect();

    c.bench_function("effective policy for every part", |b| {
        b.iter_batched(
            || {
                let overrides = tree
                    .divisions()
                    .iter()
                    .step_by(2)
                    .map(|division| {
                        (
                            division.id.clone(),
                            PolicyOverride {
                                enabled: true,
                                policy: Policy::default(),
                            },
                        )
                    })
                    .collect();
                PolicyBook::new(Policy::default()).with_overrides(overrides)
            },
            |book| {
                for part in &parts {
                    black_box(book.effective_policy(&tree, black_box(part)));
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, stats, effective_policy);
criterion_main!(benches);
