//! Tracking Session Lifecycle Tests
//!
//! Start/stop ordering, fault reporting and socket release.
//!
//! Run with: `cargo test --test session_lifecycle`

use drishti_io::TrackingSession;
use drishti_io::error::TransportFault;
use drishti_io::session::SessionState;
use std::net::UdpSocket;

#[test]
fn test_stop_is_idempotent() {
    let mut session = TrackingSession::new();
    session.stop();
    session.stop();
    assert_eq!(session.state(), SessionState::Idle);

    session.start(0);
    assert_eq!(session.state(), SessionState::Running);
    session.stop();
    session.stop();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(!session.is_running());
}

#[test]
fn test_restart_on_same_port() {
    let mut session = TrackingSession::new();
    session.start(0);
    let port = session.local_addr().unwrap().port();
    session.stop();

    session.start(port);
    assert!(session.is_running());
    assert_eq!(session.port(), port);
    assert_eq!(session.local_addr().unwrap().port(), port);
    assert_eq!(session.last_error(), None);
}

#[test]
fn test_socket_released_after_stop_and_drop() {
    let mut session = TrackingSession::new();
    session.start(0);
    let port = session.local_addr().unwrap().port();
    session.stop();

    // An exclusive bind only succeeds once the session's socket is closed
    let probe = UdpSocket::bind(("0.0.0.0", port));
    assert!(probe.is_ok());
    drop(probe);

    let mut session = TrackingSession::new();
    session.start(port);
    assert!(session.is_running());
    drop(session);
    assert!(UdpSocket::bind(("0.0.0.0", port)).is_ok());
}

#[test]
fn test_bind_failure_leaves_session_idle() {
    let blocker = UdpSocket::bind("0.0.0.0:0").unwrap();
    let port = blocker.local_addr().unwrap().port();

    let mut session = TrackingSession::new();
    session.start(port);
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(
        session.last_error(),
        Some(TransportFault::CannotCreateHandle(port))
    );
    assert_eq!(
        session.last_error().unwrap().to_string(),
        format!("Cannot create handle for UDP port {}", port)
    );

    // Stop after a failed start is harmless
    session.stop();
    assert_eq!(session.state(), SessionState::Idle);

    // Fault stays until cleared, even after a later successful start
    drop(blocker);
    session.start(port);
    assert!(session.is_running());
    assert_eq!(
        session.last_error(),
        Some(TransportFault::CannotCreateHandle(port))
    );
    session.clear_error();
    assert_eq!(session.last_error(), None);
}

#[test]
fn test_sessions_are_independent() {
    let mut a = TrackingSession::new();
    let mut b = TrackingSession::new();
    a.start(0);
    b.start(0);
    assert_ne!(a.local_addr(), b.local_addr());

    let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
    let port_a = a.local_addr().unwrap().port();
    let datagram =
        drishti_io::protocol::encode_constants_binary(&drishti_io::core::TrackingConstants::default());
    sender.send_to(&datagram, ("127.0.0.1", port_a)).unwrap();

    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while !a.poll().constants && std::time::Instant::now() < deadline {
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    assert!(a.poll().constants);
    assert!(!b.poll().constants);

    b.stop();
    assert!(a.is_running());
}
