//! Unit tests for loader error types.

use std::path::PathBuf;
use std::sync::Arc;

use rstest::rstest;

use super::*;

#[test]
fn fragment_read_message_includes_path_and_source() {
    let error = LoaderError::FragmentRead {
        path: PathBuf::from("/mods/demo/Public/Get-Thing.ps1"),
        source: Arc::new(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "permission denied",
        )),
    };
    let message = error.to_string();
    assert!(
        message.contains("Get-Thing.ps1"),
        "expected path in message: {message}"
    );
    assert!(
        message.contains("permission denied"),
        "expected source in message: {message}"
    );
}

#[rstest]
#[case::execution(
    LoaderError::FragmentExecution {
        path: PathBuf::from("broken.ps1"),
        message: "divide by zero".into(),
    },
    "divide by zero"
)]
#[case::activation(
    LoaderError::Activation {
        id: "Ghost".into(),
        message: "not present in ambient catalogue".into(),
    },
    "Ghost"
)]
#[case::publish(
    LoaderError::PublishFailed {
        module: "Storage".into(),
        message: "sink rejected names".into(),
    },
    "sink rejected names"
)]
#[case::guard_leak(
    LoaderError::GuardLeak {
        module: "Storage".into(),
    },
    "latch corrupted"
)]
fn error_messages_carry_context(#[case] error: LoaderError, #[case] needle: &str) {
    let message = error.to_string();
    assert!(
        message.contains(needle),
        "expected '{needle}' in message: {message}"
    );
}

#[test]
fn directory_read_preserves_source_chain() {
    let error = LoaderError::DirectoryRead {
        path: PathBuf::from("/mods/demo/Private"),
        source: Arc::new(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such directory",
        )),
    };
    let source = std::error::Error::source(&error);
    assert!(source.is_some(), "expected a source error");
}
