//! End-to-end: connect, enroll, restart, identify

mod helpers;

use std::sync::Arc;

use fingerprint_core::{CaptureSource, Identification, Scanner};
use helpers::{sample, test_config, MockCaptureSource};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn enrollments_survive_a_device_restart() {
    let _ = tracing_subscriber::fmt::try_init();

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.database_path = dir.path().join("fingerprints.db");
    config.image_dir = dir.path().join("captures");

    // First session: enroll one finger
    let source = Arc::new(MockCaptureSource::new());
    for i in 1..=3 {
        source.push_sample(sample(i));
    }

    let scanner = Scanner::connect(source.clone() as Arc<dyn CaptureSource>, config.clone())
        .await
        .unwrap();
    let enrollment = scanner.register().await.unwrap();
    assert_eq!(enrollment.user_id, 1);

    // Capture images were written under the configured folder
    for i in 1..=3 {
        assert!(config
            .image_dir
            .join(format!("user_1_sample_{i}.raw"))
            .exists());
    }

    scanner.disconnect().await.unwrap();

    // Second session against the same database, fresh device: connect
    // clears the index, then the bulk load restores the enrollment.
    let source = Arc::new(MockCaptureSource::new());
    source.push_sample(helpers::sample_with_template(&enrollment.template));

    let scanner = Scanner::connect(source.clone() as Arc<dyn CaptureSource>, config)
        .await
        .unwrap();
    assert_eq!(source.indexed_ids(), vec![1]);

    let outcome = scanner.identify().await.unwrap();
    assert_eq!(
        outcome,
        Identification::Match {
            user_id: 1,
            score: 96
        }
    );
}
