//! Sleep timers handed to a detached worker process.

use std::net::UdpSocket;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde_json::{Value, json};

fn lumina() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lumina"))
}

#[test]
fn test_detached_timer_fires_after_parent_exits() {
    let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
    listener
        .set_read_timeout(Some(Duration::from_secs(120)))
        .unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    let start = Instant::now();
    let status = lumina()
        .args(["--ip", "127.0.0.1", "--port", &port, "sleep", "1"])
        .status()
        .unwrap();
    assert!(status.success());
    assert!(
        start.elapsed() < Duration::from_secs(30),
        "the parent must return without waiting for the timer"
    );

    let mut buf = [0u8; 512];
    let (n, _) = listener
        .recv_from(&mut buf)
        .expect("timer worker never sent its command");
    assert!(start.elapsed() >= Duration::from_secs(60));

    let payload: Value = serde_json::from_slice(&buf[..n]).unwrap();
    assert_eq!(payload, json!({"method": "setState", "params": {"state": false}}));
}

#[test]
fn test_worker_rejects_invalid_address_before_sleeping() {
    for args in [
        vec!["--timer", "1", "--port", "38899", "--off"],
        vec!["--timer", "1", "--ip", "not-an-ip", "--off"],
        vec!["--timer", "1", "--ip", "127.0.0.1", "--port", "65536"],
    ] {
        let start = Instant::now();
        let output = lumina().args(&args).output().unwrap();

        assert_eq!(output.status.code(), Some(1), "{args:?}");
        assert!(start.elapsed() < Duration::from_secs(30), "{args:?} slept");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("invalid timer configuration"), "{stderr}");
    }
}

#[test]
fn test_worker_survives_closed_stdout() {
    let listener = UdpSocket::bind("127.0.0.1:0").unwrap();
    listener
        .set_read_timeout(Some(Duration::from_secs(120)))
        .unwrap();
    let port = listener.local_addr().unwrap().port().to_string();

    let start = Instant::now();
    let mut worker = lumina()
        .args(["--timer", "1", "--ip", "127.0.0.1", "--port", &port, "--off"])
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    drop(worker.stdout.take());

    let mut buf = [0u8; 512];
    let (n, _) = listener
        .recv_from(&mut buf)
        .expect("worker lost its timer after stdout closed");
    assert!(start.elapsed() >= Duration::from_secs(60));
    let payload: Value = serde_json::from_slice(&buf[..n]).unwrap();
    assert_eq!(payload, json!({"method": "setState", "params": {"state": false}}));

    assert_eq!(worker.wait().unwrap().code(), Some(0));
}
