use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

fn write_input(temp_dir: &tempfile::TempDir,data: &[u8]) -> Result<PathBuf,Box<dyn std::error::Error>> {
    let path = temp_dir.path().join("original.dat");
    std::fs::write(&path,data)?;
    Ok(path)
}

fn round_trip_test(data: &[u8],header: &str) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = write_input(&temp_dir,data)?;
    let packed_path = temp_dir.path().join("packed.huff");
    let out_path = temp_dir.path().join("restored.dat");
    let mut cmd = Command::cargo_bin("huffpack")?;
    cmd.arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&packed_path)
        .arg("--header").arg(header)
        .arg("--force")
        .assert()
        .success()
        .stderr(predicate::str::contains("compressed"));
    let mut cmd = Command::cargo_bin("huffpack")?;
    cmd.arg("expand")
        .arg("-i").arg(&packed_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("expanded"));
    match (std::fs::read(in_path),std::fs::read(out_path)) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare output with input")
    }
    Ok(())
}

#[test]
fn counts_round_trip() -> STDRESULT {
    let text = "I am Sam. Sam I am. I do not like this Sam I am.\n".repeat(50);
    round_trip_test(text.as_bytes(),"counts")
}

#[test]
fn tree_round_trip() -> STDRESULT {
    let text = "I am Sam. Sam I am. I do not like this Sam I am.\n".repeat(50);
    round_trip_test(text.as_bytes(),"tree")
}

#[test]
fn binary_round_trip() -> STDRESULT {
    let data: Vec<u8> = (0u32..4096).map(|i| (i*i % 251) as u8).collect();
    round_trip_test(&data,"tree")
}

#[test]
fn no_gain_without_force() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = write_input(&temp_dir,"too small to shrink".as_bytes())?;
    let packed_path = temp_dir.path().join("packed.huff");
    let mut cmd = Command::cargo_bin("huffpack")?;
    cmd.arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&packed_path)
        .arg("--header").arg("counts")
        .assert()
        .success()
        .stderr(predicate::str::contains("no size reduction"));
    assert_eq!(std::fs::metadata(packed_path)?.len(),0);
    Ok(())
}
