//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials and the document directory are available
//! before indexing starts, so a missing token does not surface only after
//! the whole corpus has been embedded.

use crate::config::{require_env, EmbeddingProvider, Settings};
use crate::error::{ArbitroError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// The bot needs both tokens and the documents.
    Run,
    /// A one-off question needs the inference token and the documents.
    Ask,
    /// Indexing needs the documents, plus a token for hosted embeddings.
    Index,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    check_data_dir(settings)?;
    match operation {
        Operation::Run => {
            require_env(&settings.telegram.token_env)?;
            require_env(&settings.inference.token_env)?;
        }
        Operation::Ask => {
            require_env(&settings.inference.token_env)?;
        }
        Operation::Index => {
            if settings.embedding.provider == EmbeddingProvider::HuggingFace {
                require_env(&settings.inference.token_env)?;
            }
        }
    }
    Ok(())
}

fn check_data_dir(settings: &Settings) -> Result<()> {
    let dir = settings.data_dir();
    if dir.is_dir() {
        Ok(())
    } else {
        Err(ArbitroError::Config(format!(
            "document directory {} does not exist",
            dir.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_for(dir: &std::path::Path) -> Settings {
        let mut settings = Settings::default();
        settings.general.data_dir = dir.to_string_lossy().to_string();
        settings.embedding.provider = EmbeddingProvider::Hashing;
        settings
    }

    #[test]
    fn test_index_needs_only_documents() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check(Operation::Index, &settings_for(dir.path())).is_ok());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_for(&dir.path().join("nope"));
        assert!(matches!(
            check(Operation::Index, &settings),
            Err(ArbitroError::Config(_))
        ));
    }

    #[test]
    fn test_hosted_embeddings_need_inference_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_for(dir.path());
        settings.embedding.provider = EmbeddingProvider::HuggingFace;
        settings.inference.token_env = "ARBITRO_TEST_UNSET_HF_TOKEN".to_string();
        let err = check(Operation::Index, &settings).unwrap_err();
        assert!(matches!(err, ArbitroError::MissingEnv(name) if name == "ARBITRO_TEST_UNSET_HF_TOKEN"));
    }

    #[test]
    fn test_run_needs_telegram_token() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_for(dir.path());
        settings.telegram.token_env = "ARBITRO_TEST_UNSET_TELEGRAM_TOKEN".to_string();
        let err = check(Operation::Run, &settings).unwrap_err();
        assert!(
            matches!(err, ArbitroError::MissingEnv(name) if name == "ARBITRO_TEST_UNSET_TELEGRAM_TOKEN")
        );
    }
}
