// Drives the real binary through a pseudo terminal: type a two letter custom
// passage, wait for the results screen, then leave with Esc.
//
// Unix only and ignored by default since it needs a PTY.
// Run with: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof, Regex};

#[test]
#[ignore]
fn custom_passage_reaches_results_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("keypace");
    // in-memory best score, so the first finish is always a baseline
    let cmd = format!("{} --no-save --mode passage -p hi", bin.display());

    let mut p = spawn(cmd)?;
    p.set_expect_timeout(Some(Duration::from_secs(5)));

    p.expect("keypace")?;
    p.send("hi")?;

    p.expect(Regex("Baseline|Established"))?;

    p.send("\x1b")?;
    p.expect(Eof)?;
    Ok(())
}
