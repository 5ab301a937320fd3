//! End-to-end CLI tests: build a tiny MV-shaped project on disk, run
//! the compiled `rplocalize` binary against it, and check what landed
//! on disk, using an `assert_cmd::Command::cargo_bin` +
//! `assert_fs::TempDir` harness.

use assert_fs::prelude::*;
use predicates::prelude::*;

const MAP_JSON: &str = r#"{
    "events": [
        {
            "name": "ev1",
            "pages": [
                {
                    "list": [
                        { "code": 401, "parameters": [ "Hello there" ] },
                        { "code": 0, "parameters": [] }
                    ]
                }
            ]
        }
    ]
}"#;

fn rplocalize() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin( env!( "CARGO_PKG_NAME" ) ).unwrap()
}

#[ test ]
fn cli_translates_json_project_and_creates_backup() {
    let project = assert_fs::TempDir::new().unwrap();
    project.child( "data/Map001.json" ).write_str( MAP_JSON ).unwrap();

    let mut cmd = rplocalize();
    cmd.arg( project.path() );
    cmd.assert().success();

    let backup = project.child( ".rplocalize-backup/data/Map001.json" );
    backup.assert( predicate::path::is_file() );

    let backed_up = std::fs::read_to_string( backup.path() ).unwrap();
    assert!( backed_up.contains( "Hello there" ), "backup should hold the pre-translation bytes" );

    let rewritten = std::fs::read_to_string( project.child( "data/Map001.json" ).path() ).unwrap();
    let _: serde_json::Value = serde_json::from_str( &rewritten )
        .expect( "rewritten file must still be valid JSON" );
}

#[ test ]
fn cli_dry_run_leaves_project_untouched() {
    let project = assert_fs::TempDir::new().unwrap();
    project.child( "data/Map001.json" ).write_str( MAP_JSON ).unwrap();

    let mut cmd = rplocalize();
    cmd.arg( project.path() ).arg( "--dry-run" );
    cmd.assert().success();

    let after = std::fs::read_to_string( project.child( "data/Map001.json" ).path() ).unwrap();
    assert_eq!( after, MAP_JSON, "--dry-run must not modify the project file" );

    project.child( ".rplocalize-backup" ).assert( predicate::path::missing() );
}

#[ test ]
fn cli_rejects_missing_project_directory() {
    let mut cmd = rplocalize();
    cmd.arg( "/nonexistent/rplocalize-test-project" );
    cmd.assert().failure();
}
