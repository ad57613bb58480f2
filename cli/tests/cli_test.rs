use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

// (begin (define n 4) (if (< n 10) (return n) '()))
const EARLY_RETURN: &str = r#"
{ "Block": {
    "locals": [ { "id": 1, "name": "n", "ty": "Float", "kind": "Local" } ],
    "body": [
      { "Assign": { "variable": { "id": 1, "name": "n", "ty": "Float", "kind": "Local" },
                    "value": { "Literal": { "Int": 4 } }, "defined": true } },
      { "If": { "clauses": [ {
          "test": { "Call": {
              "callee": { "Read": { "variable": { "id": 2, "name": "<", "kind": "Global" } } },
              "args": [ { "Read": { "variable": { "id": 1, "name": "n", "ty": "Float", "kind": "Local" } } },
                        { "Literal": { "Int": 10 } } ] } },
          "body": { "Return": { "Read": { "variable": { "id": 1, "name": "n", "ty": "Float", "kind": "Local" } } } }
        } ],
        "else_body": { "Literal": "Nil" } } }
    ]
} }
"#;

fn write_tree(dir: &Path, name: &str, body: &str) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join(name);
    fs::write(&path, body)?;
    Ok(path)
}

#[test]
fn run_prints_value_on_every_mode() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tree = write_tree(dir.path(), "early.json", EARLY_RETURN)?;

    for mode in ["interpret", "compile", "both"] {
        let mut cmd = Command::cargo_bin("skem")?;
        cmd.args(["run", tree.to_str().unwrap(), "--mode", mode]);
        cmd.assert().success().stdout(predicate::str::contains("4.0"));
    }

    Ok(())
}

#[test]
fn disasm_elides_jump_after_return() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tree = write_tree(dir.path(), "early.json", EARLY_RETURN)?;

    let mut cmd = Command::cargo_bin("skem")?;
    cmd.args(["disasm", tree.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("JMPF"))
        .stdout(predicate::str::contains("RET"))
        .stdout(predicate::str::contains("JMP +").not());

    let mut cmd = Command::cargo_bin("skem")?;
    cmd.args(["disasm", "--no-elide", tree.to_str().unwrap()]);
    cmd.assert().success().stdout(predicate::str::contains("JMP +"));

    Ok(())
}

#[test]
fn check_reports_use_counts() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tree = write_tree(dir.path(), "early.json", EARLY_RETURN)?;

    let mut cmd = Command::cargo_bin("skem")?;
    cmd.args(["check", tree.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("reads=2 writes=1"))
        .stdout(predicate::str::contains("ok: 1 slot(s)"));

    Ok(())
}

#[test]
fn reports_unbound_variable() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tree = write_tree(
        dir.path(),
        "unbound.json",
        r#"{ "Read": { "variable": { "id": 7, "name": "ghost", "kind": "Global" } } }"#,
    )?;

    let mut cmd = Command::cargo_bin("skem")?;
    cmd.args(["run", tree.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unbound variable in ghost"));

    Ok(())
}

#[test]
fn rejects_ill_typed_assignment_on_load() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tree = write_tree(
        dir.path(),
        "bad.json",
        r#"{ "Assign": { "variable": { "id": 3, "name": "i", "ty": "Int", "kind": "Global" },
                         "value": { "Literal": { "Str": "text" } } } }"#,
    )?;

    let mut cmd = Command::cargo_bin("skem")?;
    cmd.args(["run", tree.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON tree"));

    Ok(())
}

#[test]
fn config_file_disables_builtins() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tree = write_tree(dir.path(), "early.json", EARLY_RETURN)?;
    let config = write_tree(dir.path(), "skem.toml", "install_builtins = false\n")?;

    let mut cmd = Command::cargo_bin("skem")?;
    cmd.args(["run", tree.to_str().unwrap(), "--config", config.to_str().unwrap()]);
    cmd.assert().failure().stderr(predicate::str::contains("unbound variable in <"));

    Ok(())
}
