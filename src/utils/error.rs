// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("WebDriver command failed: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError), // Automatically convert thirtyfour errors

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Could not open listing {url}: {source}")]
    Start {
        url: String,
        #[source]
        source: DriverError,
    },

    #[error("Pagination failed after page {page}: {source}")]
    Navigation {
        page: usize,
        #[source]
        source: DriverError,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("File already exists: {0}")]
    FileExists(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Browser session failed: {0}")]
    Driver(#[from] DriverError),

    #[error("Extraction run failed: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_error_message_names_page_and_cause() {
        let err = PipelineError::Navigation {
            page: 4,
            source: DriverError::Navigation("click intercepted".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Pagination failed after page 4: Navigation failed: click intercepted"
        );
    }

    #[test]
    fn app_error_wraps_storage_error() {
        let err: AppError = StorageError::FileExists("out.csv".to_string()).into();
        assert!(matches!(err, AppError::Storage(StorageError::FileExists(_))));
        assert_eq!(err.to_string(), "Storage error: File already exists: out.csv");
    }
}
