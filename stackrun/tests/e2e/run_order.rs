//! Run order resolved from stacks discovered on disk

use super::helpers::{build_tree, run_order, Sandbox};
use stackrun::commands::list::{self, ListArgs};
use stackrun::commands::{plan, SelectArgs};
use stackrun::StackError;

fn order_of(layout: &[&str]) -> Vec<String> {
    let sandbox = Sandbox::new();
    build_tree(&sandbox, layout);
    run_order(&sandbox.project_at(""))
}

#[test]
fn test_independent_stacks_run_lexicographically() {
    assert_eq!(
        order_of(&["s:batatinha", "s:frita", "s:1", "s:2", "s:3", "s:boom"]),
        vec!["1", "2", "3", "batatinha", "boom", "frita"]
    );
}

#[test]
fn test_chain_with_relative_references() {
    assert_eq!(
        order_of(&["s:a", "s:b:after=[../a]", "s:c:after=[../b]"]),
        vec!["a", "b", "c"]
    );
}

#[test]
fn test_fan_in_follows_declared_order() {
    assert_eq!(
        order_of(&["s:a:after=[/b,/c,/d]", "s:b", "s:c", "s:d"]),
        vec!["b", "c", "d", "a"]
    );
}

#[test]
fn test_two_chains() {
    assert_eq!(
        order_of(&[
            "s:a",
            "s:b:after=[/a]",
            "s:c:after=[/b]",
            "s:d:after=[/z]",
            "s:z",
        ]),
        vec!["a", "b", "c", "z", "d"]
    );
}

#[test]
fn test_diamond_of_branches() {
    assert_eq!(
        order_of(&[
            "s:a:after=[/b,/c]",
            "s:b:after=[/d,/f]",
            "s:c:after=[/g,/h]",
            "s:d",
            "s:f",
            "s:g",
            "s:h",
        ]),
        vec!["d", "f", "b", "g", "h", "c", "a"]
    );
}

#[test]
fn test_nested_stacks() {
    assert_eq!(
        order_of(&["s:envs", "s:envs/prod:after=[..]", "s:envs/dev:after=[../prod]"]),
        vec!["envs", "envs/prod", "envs/dev"]
    );
}

#[test]
fn test_cycle_is_rejected_with_its_path() {
    let sandbox = Sandbox::new();
    build_tree(
        &sandbox,
        &["s:a:after=[/b]", "s:b:after=[/c]", "s:c:after=[/a]"],
    );
    let project = sandbox.project_at("");

    match project.run_order() {
        Err(StackError::Cycle { cycle }) => {
            let names: Vec<_> = cycle.iter().map(|p| p.as_str()).collect();
            assert_eq!(names, vec!["/a", "/b", "/c", "/a"]);
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn test_unknown_reference_fails_to_load() {
    let sandbox = Sandbox::new();
    build_tree(&sandbox, &["s:a:after=[/missing]"]);

    let err = stackrun::commands::Project::load(sandbox.root()).unwrap_err();
    let err = err.downcast::<StackError>().unwrap();
    assert!(matches!(err, StackError::UnresolvedReference { .. }));
}

#[test]
fn test_broken_stack_files_reported_together() {
    let sandbox = Sandbox::new();
    build_tree(
        &sandbox,
        &["f:a/stack.toml:[stack", "f:b/stack.toml:[stack]\nunknown = 1\n", "s:c"],
    );

    let err = stackrun::commands::Project::load(sandbox.root()).unwrap_err();
    match err.downcast::<StackError>().unwrap() {
        StackError::Discovery(errors) => assert_eq!(errors.len(), 2),
        other => panic!("expected discovery error, got {other:?}"),
    }
}

#[test]
fn test_list_is_lexicographic_and_run_order_is_not() {
    let sandbox = Sandbox::new();
    build_tree(&sandbox, &["s:a:after=[/b]", "s:b"]);
    let project = sandbox.project_at("");

    let mut out = Vec::new();
    list::execute(&project, &ListArgs::default(), None, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "a\nb\n");

    let mut out = Vec::new();
    plan::run_order(&project, &SelectArgs::default(), None, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "b\na\n");
}

#[test]
fn test_list_from_subdirectory_is_scoped_and_relative() {
    let sandbox = Sandbox::new();
    build_tree(&sandbox, &["s:envs/prod", "s:envs/dev", "s:global"]);
    let project = sandbox.project_at("envs");

    let mut out = Vec::new();
    list::execute(&project, &ListArgs::default(), None, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "dev\nprod\n");
}
