#[cfg(test)]
mod tests {
    use crate::{error::SessionError, session::Session};
    use engine_config::settings::{SettingsOverrides, error::SettingsError};
    use engine_core::error::ContextError;
    use engine_processing::store::registry::LoadMode;
    use model::records::field::StoreKind;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio_util::sync::CancellationToken;

    fn file_with(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test(start_paused = true)]
    async fn test_dry_session_end_to_end() {
        let config = file_with("access = \"a\"\nsecret = \"s\"\nthrottleInterval = 0\n");
        let results = file_with("WorkerId,AssignmentId,Approve,Reject\nW1,A1,1,\nW2,A2,,1\n");

        let mut session = Session::open(
            config.path(),
            SettingsOverrides {
                dry: true,
                sandbox: false,
            },
        )
        .unwrap();
        session.connect_remote().unwrap();
        assert!(!session.context().is_connected());

        let report = session
            .load(
                StoreKind::Results,
                results.path().to_str().unwrap(),
                LoadMode::default(),
            )
            .unwrap();
        assert_eq!(report.inserted, 2);

        let summary = session
            .batch(CancellationToken::new())
            .approve_reject(None)
            .await
            .unwrap();
        assert_eq!(summary.dry_skipped, 2);
        assert_eq!(session.metrics().dry_skipped, 2);
    }

    #[test]
    fn test_invalid_settings_are_reported() {
        let config = file_with("access = \"a\"\nnRetries = 99\n");
        let err = Session::open(config.path(), SettingsOverrides::default())
            .err()
            .unwrap();
        match err {
            SessionError::Settings(SettingsError::ValidationFailed(errors)) => {
                assert_eq!(errors.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_live_session_connects_once() {
        let config = file_with("access = \"a\"\nsecret = \"s\"\nsandbox = true\n");
        let session = Session::open(config.path(), SettingsOverrides::default()).unwrap();

        session.connect_remote().unwrap();
        assert!(session.context().is_connected());
        assert!(matches!(
            session.connect_remote(),
            Err(SessionError::Context(ContextError::AlreadyConnected))
        ));
    }
}
