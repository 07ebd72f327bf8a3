//! Tests for error types.

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("missing data dir");
        assert_eq!(err.to_string(), "configuration error: missing data dir");
    }

    #[test]
    fn test_storage_error_not_found() {
        let err = StorageError::not_found("source", "notes");
        assert_eq!(err.to_string(), "not found: source with id 'notes'");
    }

    #[test]
    fn test_storage_error_conversion() {
        let storage_err = StorageError::Database("connection failed".to_string());
        let err: Error = storage_err.into();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_ingest_error_conversion() {
        let ingest_err = IngestError::Pipeline("empty document".to_string());
        let err: Error = ingest_err.into();
        assert!(matches!(err, Error::Ingest(_)));
    }

    #[test]
    fn test_ingest_read_error_display() {
        let err = IngestError::read("/notes/a.md", "permission denied");
        assert_eq!(
            err.to_string(),
            "failed to read '/notes/a.md': permission denied"
        );
    }

    #[test]
    fn test_git_error_display() {
        let err = GitError::CommandFailed {
            op: "pull",
            detail: "could not resolve host".to_string(),
        };
        assert_eq!(err.to_string(), "git pull failed: could not resolve host");
    }

    #[test]
    fn test_git_error_conversion() {
        let git_err = GitError::Unavailable("not a repository".to_string());
        let err: Error = git_err.into();
        assert!(matches!(err, Error::Git(_)));
    }

    #[test]
    fn test_watcher_error_conversion() {
        let watch_err = WatcherError::WatchFailed {
            path: "/tmp/test".to_string(),
            reason: "permission denied".to_string(),
        };
        let err: Error = watch_err.into();
        assert!(matches!(err, Error::Watcher(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(Error::config("test error"))
        }

        assert!(returns_ok().is_ok());
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_error_debug_format() {
        let err = Error::Internal("something went wrong".to_string());
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("Internal"));
        assert!(debug_str.contains("something went wrong"));
    }

    #[test]
    fn test_error_internal() {
        let err = Error::internal("test internal error");
        assert_eq!(err.to_string(), "internal error: test internal error");
    }

    #[test]
    fn test_storage_error_database() {
        let err = StorageError::Database("connection timeout".to_string());
        assert_eq!(err.to_string(), "database error: connection timeout");
    }

    #[test]
    fn test_storage_error_migration() {
        let err = StorageError::Migration("migration 001 failed".to_string());
        assert_eq!(err.to_string(), "migration error: migration 001 failed");
    }

    #[test]
    fn test_ingest_error_embedding() {
        let err = IngestError::Embedding("service unreachable".to_string());
        assert_eq!(err.to_string(), "embedding error: service unreachable");
    }

    #[test]
    fn test_ingest_error_store() {
        let err = IngestError::Store("disk full".to_string());
        assert_eq!(err.to_string(), "store error: disk full");
    }

    #[test]
    fn test_watcher_error_channel() {
        let err = WatcherError::Channel("receiver dropped".to_string());
        assert_eq!(err.to_string(), "event channel error: receiver dropped");
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn inner() -> Result<i32> {
            Err(Error::config("inner error"))
        }

        fn outer() -> Result<i32> {
            let _ = inner()?;
            Ok(0)
        }

        let result = outer();
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().to_string(),
            "configuration error: inner error"
        );
    }

    #[test]
    fn test_multiple_error_types_in_result() {
        fn might_fail_storage() -> Result<String> {
            Err(Error::Storage(StorageError::Database("test".to_string())))
        }

        fn might_fail_ingest() -> Result<String> {
            Err(Error::Ingest(IngestError::Pipeline("test".to_string())))
        }

        assert!(might_fail_storage().is_err());
        assert!(might_fail_ingest().is_err());
    }
}
