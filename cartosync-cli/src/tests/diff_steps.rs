//! Behaviour-driven step definitions driving the diff CLI scenarios.

use super::helpers::{Workspace, marker_json, parse_report};
use super::*;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

struct DiffWorld {
    workspace: Workspace,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

#[fixture]
fn diff_world() -> DiffWorld {
    DiffWorld {
        workspace: Workspace::new(),
        stdout: RefCell::new(Vec::new()),
        result: RefCell::new(None),
    }
}

#[given("an old marker list with markers a and b")]
fn old_list(#[from(diff_world)] world: &DiffWorld) {
    world.workspace.write(
        "old.json",
        &format!(
            "[{}, {}]",
            marker_json("a", "Taiyuan", 1.0, 1.0),
            marker_json("b", "Taiyuan", 2.0, 2.0)
        ),
    );
}

#[given("a new marker list with a retitled and c added")]
fn new_list(#[from(diff_world)] world: &DiffWorld) {
    let retitled = marker_json("a", "Taiyuan", 1.0, 1.0).replace(r#""title": "a""#, r#""title": "A""#);
    world.workspace.write(
        "new.json",
        &format!("[{retitled}, {}]", marker_json("c", "Datong", 3.0, 3.0)),
    );
}

#[when("I run the diff command")]
fn run_diff_command(#[from(diff_world)] world: &DiffWorld) {
    let argv = [
        "cartosync".to_owned(),
        "diff".to_owned(),
        world.workspace.path("old.json").into_string(),
        world.workspace.path("new.json").into_string(),
    ];
    let parsed = Cli::try_parse_from(argv).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Diff(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_diff(args, &mut *buffer)
        }
        Command::Replay(_) => panic!("expected diff command"),
    });
    world.result.replace(Some(outcome));
}

#[then("the report adds c, patches the title of a and removes b")]
fn report_lists_changes(#[from(diff_world)] world: &DiffWorld) {
    if let Some(Err(err)) = world.result.borrow().as_ref() {
        panic!("expected success, found {err:?}");
    }
    let report = parse_report(&world.stdout.borrow());
    assert_eq!(report["toAdd"][0]["id"], "c");
    assert_eq!(report["toRemove"][0]["id"], "b");
    assert_eq!(report["toUpdate"][0]["id"], "a");
    let change = &report["toUpdate"][0]["changes"][0];
    assert_eq!(change["key"], "title");
    assert_eq!(change["oldValue"], "a");
    assert_eq!(change["newValue"], "A");
}

#[then("the command fails because the new marker list does not exist")]
fn missing_new_list(#[from(diff_world)] world: &DiffWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::MissingSourceFile { field, .. } => assert_eq!(*field, ARG_DIFF_NEW),
        other => panic!("expected MissingSourceFile, found {other:?}"),
    }
}

#[scenario(path = "tests/features/diff_command.feature", name = "diffing two marker lists")]
fn diffing_two_lists(#[from(diff_world)] world: DiffWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/diff_command.feature",
    name = "rejecting a missing marker list"
)]
fn rejecting_missing_list(#[from(diff_world)] world: DiffWorld) {
    let _ = world;
}
