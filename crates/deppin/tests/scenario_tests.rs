//! End-to-end analysis scenarios.
//!
//! Each test lays out a project on disk, answers build tool listings from a
//! [`FakeRunner`] and runs the full analyzer over it.

mod helpers;

use deppin::{Error, FakeRunner, Revision, UnresolvedReason};
use helpers::{TARGET, analyzer, dir, p, project};
use serde_json::json;

#[tokio::test]
async fn test_simple_single_module() {
    let (_temp, root) = project(&[(
        "Gopkg.lock",
        "[[projects]]\n  name = \"example.org/lib\"\n  revision = \"0a1b2c\"\n  version = \"v1.2.3\"\n",
    )]);
    let runner = FakeRunner::new()
        .package(TARGET, &dir(&root, ""), &["example.org/lib", "fmt"])
        .package("example.org/lib", &dir(&root, "vendor/example.org/lib"), &[]);

    let graph = analyzer(&root, runner, &[]).await.analyze().await.unwrap();

    let names: Vec<&str> = graph.nodes().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["example.org/app", "example.org/lib"]);
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.has_edge(&p(TARGET), &p("example.org/lib")));

    let lib = graph.revision(&p("example.org/lib")).unwrap();
    assert_eq!(lib.revision, "v1.2.3");
    assert!(!lib.is_unresolved);

    let root_revision = graph.root_revision();
    assert_eq!(root_revision.revision, "");
    assert!(!root_revision.is_unresolved);
}

fn nested_vendor_runner(root: &std::path::Path) -> FakeRunner {
    FakeRunner::new()
        .package(TARGET, &dir(root, ""), &["example.org/app/vendor/example.org/x"])
        .package(
            "example.org/app/vendor/example.org/x",
            &dir(root, "vendor/example.org/x"),
            &["example.org/app/vendor/example.org/x/vendor/example.org/y"],
        )
        .package(
            "example.org/app/vendor/example.org/x/vendor/example.org/y",
            &dir(root, "vendor/example.org/x/vendor/example.org/y"),
            &[],
        )
}

const NESTED_FILES: [(&str, &str); 2] = [
    ("vendor.conf", "example.org/x x-rev\nexample.org/y outer-rev\n"),
    ("vendor/example.org/x/vendor.conf", "example.org/y inner-rev\n"),
];

#[tokio::test]
async fn test_nested_vendor_policy_off_uses_outer_lockfile() {
    let (_temp, root) = project(&NESTED_FILES);

    let graph = analyzer(&root, nested_vendor_runner(&root), &[])
        .await
        .analyze()
        .await
        .unwrap();

    assert_eq!(graph.revision(&p("example.org/y")).unwrap().revision, "outer-rev");
    assert!(graph.has_edge(&p("example.org/x"), &p("example.org/y")));
}

#[tokio::test]
async fn test_nested_vendor_policy_on_prefers_inner_lockfile() {
    let (_temp, root) = project(&NESTED_FILES);

    let graph = analyzer(
        &root,
        nested_vendor_runner(&root),
        &[("allow-nested-vendor", json!(true))],
    )
    .await
    .analyze()
    .await
    .unwrap();

    assert_eq!(graph.revision(&p("example.org/y")).unwrap().revision, "inner-rev");
    assert_eq!(graph.revision(&p("example.org/x")).unwrap().revision, "x-rev");
}

fn unresolved_runner(root: &std::path::Path) -> FakeRunner {
    FakeRunner::new()
        .package(
            TARGET,
            &dir(root, ""),
            &["example.org/lib", "internal.corp/secret"],
        )
        .package("example.org/lib", &dir(root, "vendor/example.org/lib"), &[])
        .package("internal.corp/secret", "/opt/corp/src/internal.corp/secret", &[])
}

#[tokio::test]
async fn test_unresolved_prefix_allows_missing_pins() {
    let (_temp, root) = project(&[("vendor.conf", "example.org/lib v1\n")]);

    let graph = analyzer(
        &root,
        unresolved_runner(&root),
        &[("allow-unresolved-prefix", json!("internal.corp/"))],
    )
    .await
    .analyze()
    .await
    .unwrap();

    let secret = graph.revision(&p("internal.corp/secret")).unwrap();
    assert_eq!(secret.revision, "");
    assert!(secret.is_unresolved);
    assert_eq!(graph.unresolved().count(), 1);
}

#[tokio::test]
async fn test_missing_pins_fail_without_allowance() {
    let (_temp, root) = project(&[("vendor.conf", "example.org/lib v1\n")]);

    let err = analyzer(&root, unresolved_runner(&root), &[])
        .await
        .analyze()
        .await
        .unwrap_err();

    match err {
        Error::UnresolvedDependency(report) => {
            assert_eq!(report.entries().len(), 1);
            let entry = &report.entries()[0];
            assert_eq!(entry.import_path.as_str(), "internal.corp/secret");
            assert_eq!(entry.reason, UnresolvedReason::NoResolver);
            assert!(entry.resolver.is_none());
        }
        other => panic!("expected UnresolvedDependency, got: {other}"),
    }
}

fn world_runner(root: &std::path::Path) -> FakeRunner {
    FakeRunner::new()
        .package(TARGET, &dir(root, ""), &["example.org/x"])
        .package_in("os=windows", TARGET, &dir(root, ""), &["example.org/y"])
        .package("example.org/x", &dir(root, "vendor/example.org/x"), &[])
        .package("example.org/y", &dir(root, "vendor/example.org/y"), &[])
}

#[tokio::test]
async fn test_all_tags_unions_every_world() {
    let (_temp, root) = project(&[("vendor.conf", "example.org/x x1\nexample.org/y y1\n")]);

    let analyzer = analyzer(&root, world_runner(&root), &[("all-tags", json!(true))]).await;
    let graph = analyzer.analyze().await.unwrap();

    assert!(graph.contains(&p("example.org/x")));
    assert!(graph.contains(&p("example.org/y")));

    let y_worlds = graph.edge_worlds(&p(TARGET), &p("example.org/y")).unwrap();
    let y_worlds: Vec<&str> = y_worlds.iter().map(|w| w.as_str()).collect();
    assert_eq!(y_worlds, vec!["os=windows"]);

    let x_worlds = graph.edge_worlds(&p(TARGET), &p("example.org/x")).unwrap();
    assert_eq!(x_worlds.len(), analyzer.worlds().len() - 1);
}

#[tokio::test]
async fn test_host_only_sees_host_imports() {
    let (_temp, root) = project(&[("vendor.conf", "example.org/x x1\nexample.org/y y1\n")]);

    let graph = analyzer(&root, world_runner(&root), &[])
        .await
        .analyze()
        .await
        .unwrap();

    assert!(graph.contains(&p("example.org/x")));
    assert!(!graph.contains(&p("example.org/y")));
}

#[tokio::test]
async fn test_world_conflict_is_fatal() {
    let (_temp, root) = project(&[
        ("vendor.conf", "example.org/lib v1\n"),
        ("third_party/vendor.conf", "example.org/lib v2\n"),
    ]);
    let runner = FakeRunner::new()
        .package(TARGET, &dir(&root, ""), &["example.org/lib"])
        .package("example.org/lib", &dir(&root, "vendor/example.org/lib"), &[])
        .package_in(
            "os=windows",
            "example.org/lib",
            &dir(&root, "third_party/vendor/example.org/lib"),
            &[],
        );

    let err = analyzer(&root, runner, &[("all-tags", json!(true))])
        .await
        .analyze()
        .await
        .unwrap_err();

    match err {
        Error::WorldConflict(conflict) => {
            assert_eq!(conflict.name.as_str(), "example.org/lib");
            assert_eq!(conflict.first, "v2");
            assert_eq!(conflict.first_world.as_str(), "os=windows");
            assert_eq!(conflict.second, "v1");
            let message = conflict.to_string();
            assert!(message.contains("v1") && message.contains("v2"));
        }
        other => panic!("expected WorldConflict, got: {other}"),
    }
}

#[tokio::test]
async fn test_broken_package_does_not_stop_analysis() {
    let (_temp, root) = project(&[(
        "vendor.conf",
        "example.org/lib v1\nbroken/pkg b1\n",
    )]);
    let runner = FakeRunner::new()
        .package(TARGET, &dir(&root, ""), &["example.org/lib", "broken/pkg"])
        .package("example.org/lib", &dir(&root, "vendor/example.org/lib"), &[])
        .broken("broken/pkg", "cannot find package \"broken/pkg\"");

    let graph = analyzer(&root, runner, &[]).await.analyze().await.unwrap();

    assert!(graph.has_edge(&p(TARGET), &p("example.org/lib")));
    assert!(graph.has_edge(&p(TARGET), &p("broken/pkg")));
    assert!(graph.dependencies(&p("broken/pkg")).is_empty());
}

#[tokio::test]
async fn test_broken_root_is_unbuildable() {
    let (_temp, root) = project(&[("vendor.conf", "")]);
    let runner = FakeRunner::new().broken(TARGET, "no buildable Go source files");

    let err = analyzer(&root, runner, &[]).await.analyze().await.unwrap_err();

    match err {
        Error::TargetUnbuildable { target, failures } => {
            assert_eq!(target.as_str(), TARGET);
            assert_eq!(failures.len(), 1);
            assert!(failures[0].error.contains("no buildable"));
        }
        other => panic!("expected TargetUnbuildable, got: {other}"),
    }
}

#[tokio::test]
async fn test_two_vendored_copies_in_one_world_are_separate_nodes() {
    let (_temp, root) = project(&NESTED_FILES);
    let runner = nested_vendor_runner(&root)
        .package(
            TARGET,
            &dir(&root, ""),
            &[
                "example.org/app/vendor/example.org/x",
                "example.org/app/vendor/example.org/y",
            ],
        )
        .package(
            "example.org/app/vendor/example.org/y",
            &dir(&root, "vendor/example.org/y"),
            &[],
        );

    let graph = analyzer(
        &root,
        runner,
        &[("allow-nested-vendor", json!(true)), ("all-tags", json!(true))],
    )
    .await
    .analyze()
    .await
    .unwrap();

    let y_revisions: Vec<&str> = graph
        .revisions(&p("example.org/y"))
        .map(|r| r.revision.as_str())
        .collect();
    assert_eq!(y_revisions, vec!["inner-rev", "outer-rev"]);

    let root_revision = graph.root_revision();
    let x = Revision::pinned(p("example.org/x"), "x-rev");
    let outer = Revision::pinned(p("example.org/y"), "outer-rev");
    let inner = Revision::pinned(p("example.org/y"), "inner-rev");
    assert!(graph.worlds_between(root_revision, &outer).is_some());
    assert!(graph.worlds_between(&x, &inner).is_some());
    assert!(graph.worlds_between(root_revision, &inner).is_none());
    assert!(graph.worlds_between(&x, &outer).is_none());
    graph.validate().unwrap();
}

#[tokio::test]
async fn test_unresolved_in_one_world_yields_to_a_pin_in_another() {
    let (_temp, root) = project(&[("vendor.conf", "example.org/lib v1\n")]);
    let elsewhere = root
        .parent()
        .unwrap()
        .join("elsewhere/vendor/example.org/lib");
    let runner = FakeRunner::new()
        .package(TARGET, &dir(&root, ""), &["example.org/lib"])
        .package("example.org/lib", &dir(&root, "vendor/example.org/lib"), &[])
        .package_in(
            "os=windows",
            "example.org/lib",
            &elsewhere.to_string_lossy(),
            &[],
        );

    let graph = analyzer(&root, runner, &[("all-tags", json!(true))])
        .await
        .analyze()
        .await
        .unwrap();

    assert_eq!(graph.revision(&p("example.org/lib")).unwrap().revision, "v1");
    assert_eq!(graph.revisions(&p("example.org/lib")).count(), 1);
    assert_eq!(graph.unresolved().count(), 0);
    let worlds = graph.edge_worlds(&p(TARGET), &p("example.org/lib")).unwrap();
    assert!(worlds.iter().any(|w| w.as_str() == "os=windows"));
}
