//! Lifecycle of the supervisor against the mock engine

use mqtt5_embedded::{
    BrokerStatus, BrokerSupervisor, EmbeddedError, MockCall, MockEngineFactory, SupervisorConfig,
};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();
}

fn supervised(
    base: &Path,
    config: SupervisorConfig,
) -> (BrokerSupervisor<MockEngineFactory>, MockEngineFactory) {
    init_tracing();
    let factory = MockEngineFactory::new();
    let supervisor =
        BrokerSupervisor::with_factory(config.with_config_folder(base), factory.clone())
            .expect("Failed to create supervisor");
    (supervisor, factory)
}

#[tokio::test]
async fn test_given_folder_is_provisioned() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("x");
    let (supervisor, _) = supervised(&base, SupervisorConfig::new());

    assert!(base.join("data").is_dir());
    assert!(base.join("conf").is_dir());
    assert!(base.join("extensions").is_dir());
    assert_eq!(supervisor.layout().base(), base.as_path());
    assert!(supervisor.descriptor().data_folder().is_absolute());
}

#[tokio::test]
async fn test_reconstruction_is_idempotent() {
    let dir = tempdir().unwrap();
    let (first, _) = supervised(dir.path(), SupervisorConfig::new());
    std::fs::write(first.layout().data_dir().join("retained.json"), b"{}").unwrap();

    let (second, _) = supervised(dir.path(), SupervisorConfig::new());

    assert_eq!(first.descriptor(), second.descriptor());
    assert!(second.layout().data_dir().join("retained.json").is_file());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 3);
}

#[tokio::test]
async fn test_provisioning_failure_surfaces() {
    init_tracing();
    let dir = tempdir().unwrap();
    let blocked = dir.path().join("blocked");
    std::fs::write(&blocked, b"file").unwrap();

    let result = BrokerSupervisor::with_factory(
        SupervisorConfig::new().with_config_folder(&blocked),
        MockEngineFactory::new(),
    );

    assert!(matches!(result, Err(EmbeddedError::Provisioning { .. })));
}

#[tokio::test]
async fn test_successful_start_reports_running() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());

    supervisor.start().await;

    assert!(supervisor.is_server_running());
    assert_eq!(supervisor.status(), BrokerStatus::Running);
    assert_eq!(factory.running_count(), 1);
}

#[tokio::test]
async fn test_failed_start_does_not_escape() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());
    factory.set_start_response(Err(EmbeddedError::Engine("address in use".into())));

    supervisor.start().await;

    assert!(!supervisor.is_server_running());
    assert_eq!(
        supervisor.status().failure(),
        Some("Broker engine error: address in use")
    );
    assert_eq!(factory.running_count(), 0);
}

#[tokio::test]
async fn test_failed_build_does_not_escape() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());
    factory.set_build_response(Err(EmbeddedError::Configuration("bad broker.json".into())));

    supervisor.start().await;

    assert!(!supervisor.is_server_running());
    assert_eq!(factory.get_calls(), vec![MockCall::Build { engine: 1 }]);
}

#[tokio::test]
async fn test_try_start_returns_cause() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());
    factory.set_start_response(Err(EmbeddedError::Engine("refused".into())));

    let err = supervisor.try_start().await.unwrap_err();
    assert!(matches!(err, EmbeddedError::Engine(msg) if msg == "refused"));
    assert!(!supervisor.is_server_running());
}

#[tokio::test]
async fn test_start_after_failure_recovers() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());
    factory.set_start_response(Err(EmbeddedError::Engine("not yet".into())));
    supervisor.start().await;
    assert!(!supervisor.is_server_running());

    factory.reset_responses();
    supervisor.start().await;

    assert!(supervisor.is_server_running());
    assert_eq!(factory.built_count(), 2);
}

#[tokio::test]
async fn test_stop_after_start() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());

    supervisor.start().await;
    supervisor.stop().await;

    assert!(!supervisor.is_server_running());
    assert_eq!(supervisor.status(), BrokerStatus::Stopped);
    assert_eq!(factory.running_count(), 0);
}

#[tokio::test]
async fn test_stop_twice_second_is_noop() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());

    supervisor.start().await;
    supervisor.stop().await;
    assert!(!supervisor.is_server_running());
    let calls_after_first_stop = factory.get_calls().len();

    supervisor.stop().await;
    assert!(!supervisor.is_server_running());
    assert_eq!(factory.get_calls().len(), calls_after_first_stop);
}

#[tokio::test]
async fn test_stop_without_instance_is_noop() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());

    supervisor.stop().await;

    assert!(!supervisor.is_server_running());
    assert!(factory.get_calls().is_empty());
}

#[tokio::test]
async fn test_stop_failure_still_reaches_stopped() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());
    supervisor.start().await;

    factory.set_stop_response(Err(EmbeddedError::Engine("stuck".into())));
    factory.set_close_response(Err(EmbeddedError::Io("busy".into())));
    supervisor.stop().await;

    assert!(!supervisor.is_server_running());
    assert_eq!(supervisor.status(), BrokerStatus::Stopped);
    assert_eq!(
        factory.get_calls()[2..],
        [MockCall::Stop { engine: 1 }, MockCall::Close { engine: 1 }]
    );
}

// Deliberate deviation: a second start while running is refused instead of
// building a second broker.
#[tokio::test]
async fn test_start_while_running_is_refused() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());
    supervisor.start().await;

    let err = supervisor.try_start().await.unwrap_err();
    assert!(matches!(err, EmbeddedError::AlreadyRunning));

    supervisor.start().await;
    assert!(supervisor.is_server_running());
    assert_eq!(factory.built_count(), 1);
    assert_eq!(factory.running_count(), 1);
}

#[tokio::test]
async fn test_start_timeout_is_a_start_failure() {
    let dir = tempdir().unwrap();
    let config = SupervisorConfig::new().with_start_timeout(Duration::from_millis(20));
    let (supervisor, factory) = supervised(dir.path(), config);
    factory.set_start_delay(Duration::from_secs(30));

    let err = supervisor.try_start().await.unwrap_err();

    assert!(matches!(err, EmbeddedError::Timeout { operation: "start", .. }));
    assert!(!supervisor.is_server_running());
    assert_eq!(
        factory.get_calls().last(),
        Some(&MockCall::Close { engine: 1 })
    );
}

#[tokio::test]
async fn test_restart_from_stopped_starts() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());

    supervisor.restart().await;

    assert!(supervisor.is_server_running());
    assert_eq!(
        factory.get_calls(),
        vec![MockCall::Build { engine: 1 }, MockCall::Start { engine: 1 }]
    );
}

#[tokio::test]
async fn test_try_restart_returns_cause() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());
    supervisor.start().await;

    factory.set_start_response(Err(EmbeddedError::Engine("port taken".into())));
    let err = supervisor.try_restart().await.unwrap_err();

    assert!(matches!(err, EmbeddedError::Engine(msg) if msg == "port taken"));
    assert!(!supervisor.is_server_running());
    assert_eq!(
        supervisor.status().failure(),
        Some("Broker engine error: port taken")
    );
    assert_eq!(factory.running_count(), 0);

    factory.reset_responses();
    supervisor.try_restart().await.unwrap();
    assert!(supervisor.is_server_running());
    assert_eq!(factory.built_count(), 3);
}

#[tokio::test]
async fn test_restart_indefinitely() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());

    for _ in 0..5 {
        supervisor.start().await;
        assert!(supervisor.is_server_running());
        supervisor.stop().await;
        assert!(!supervisor.is_server_running());
    }

    assert_eq!(factory.built_count(), 5);
    assert_eq!(factory.running_count(), 0);
}

#[tokio::test]
async fn test_subscribers_see_transitions() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());
    let mut status = supervisor.subscribe();
    assert_eq!(*status.borrow_and_update(), BrokerStatus::Stopped);

    supervisor.start().await;
    assert!(status.has_changed().unwrap());
    assert_eq!(*status.borrow_and_update(), BrokerStatus::Running);

    supervisor.stop().await;
    status.changed().await.unwrap();
    assert_eq!(*status.borrow_and_update(), BrokerStatus::Stopped);

    factory.set_start_response(Err(EmbeddedError::Engine("nope".into())));
    supervisor.start().await;
    status.changed().await.unwrap();
    assert!(matches!(&*status.borrow(), BrokerStatus::Failed(_)));
}

#[tokio::test]
async fn test_concurrent_starts_build_one_broker() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());
    factory.set_start_delay(Duration::from_millis(20));
    let supervisor = Arc::new(supervisor);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let supervisor = Arc::clone(&supervisor);
            tokio::spawn(async move { supervisor.try_start().await })
        })
        .collect();

    let mut started = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => started += 1,
            Err(e) => assert!(matches!(e, EmbeddedError::AlreadyRunning)),
        }
    }

    assert_eq!(started, 1);
    assert_eq!(factory.built_count(), 1);
    assert!(supervisor.is_server_running());
}

#[tokio::test]
async fn test_concurrent_start_and_stop_stay_consistent() {
    let dir = tempdir().unwrap();
    let (supervisor, factory) = supervised(dir.path(), SupervisorConfig::new());
    factory.set_start_delay(Duration::from_millis(5));
    factory.set_stop_delay(Duration::from_millis(5));
    let supervisor = Arc::new(supervisor);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let supervisor = Arc::clone(&supervisor);
            tokio::spawn(async move {
                if i % 2 == 0 {
                    supervisor.start().await;
                } else {
                    supervisor.stop().await;
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(factory.running_count(), usize::from(supervisor.is_server_running()));
}
