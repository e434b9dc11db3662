//! Rich diagnostic error types for seshat.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text. Note that most retrieval failures are
//! deliberately NOT errors: a label with no match, a node with no data, or a
//! statement that cannot be decoded all degrade to `None`/skip and never reach
//! these types. The enums below cover the genuinely fatal concerns: cache I/O,
//! embedding model failures, and configuration problems.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for seshat.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source chains) through to the user.
#[derive(Debug, Error, Diagnostic)]
pub enum SeshatError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Rank(#[from] RankError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Prompt(#[from] PromptError),
}

// ---------------------------------------------------------------------------
// Cache errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum CacheError {
    #[error("failed to read cache file {path}: {source}")]
    #[diagnostic(
        code(seshat::cache::read),
        help("Check that the cache file is readable. Delete it to start fresh.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write cache file {path}: {source}")]
    #[diagnostic(
        code(seshat::cache::write),
        help(
            "Check that the cache directory exists, has correct permissions, \
             and that the disk is not full."
        )
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cache serialization error: {message}")]
    #[diagnostic(
        code(seshat::cache::serde),
        help(
            "The cache could not be serialized or deserialized. If the file was \
             written by an older seshat version, delete it and re-run."
        )
    )]
    Serialization { message: String },
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

// ---------------------------------------------------------------------------
// Ranking errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum RankError {
    #[error("failed to initialize embedding model: {message}")]
    #[diagnostic(
        code(seshat::rank::model_init),
        help(
            "The ONNX embedding model could not be loaded. On first use the model \
             is downloaded from the Hugging Face hub — check your network \
             connection and available disk space."
        )
    )]
    ModelInit { message: String },

    #[error("unknown embedding model: \"{name}\"")]
    #[diagnostic(
        code(seshat::rank::unknown_model),
        help(
            "Supported models: all-MiniLM-L6-v2, all-MiniLM-L12-v2, \
             bge-small-en-v1.5, bge-base-en-v1.5, \
             paraphrase-multilingual-mpnet-base-v2, nomic-embed-text-v1.5."
        )
    )]
    UnknownModel { name: String },

    #[error("embedding failed: {message}")]
    #[diagnostic(
        code(seshat::rank::encode),
        help(
            "The embedding model rejected the input batch. This usually \
             indicates a model runtime problem rather than bad input."
        )
    )]
    Encode { message: String },
}

pub type RankResult<T> = std::result::Result<T, RankError>;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    #[diagnostic(
        code(seshat::config::read),
        help("Check that the path is correct and the file is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    #[diagnostic(
        code(seshat::config::parse),
        help("The file must be valid TOML. See the documented RetrieverConfig fields.")
    )]
    Parse { path: String, message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Prompt errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum PromptError {
    #[error("failed to read prompt template {path}: {source}")]
    #[diagnostic(
        code(seshat::prompt::read),
        help("Check that the template path is correct and the file is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse prompt template {path}: {message}")]
    #[diagnostic(
        code(seshat::prompt::parse),
        help(
            "A prompt template is a TOML file with a `system` string, an \
             `input_template` string, and an optional `few_shot` example list."
        )
    )]
    Parse { path: String, message: String },
}

pub type PromptResult<T> = std::result::Result<T, PromptError>;

/// Convenience alias for functions returning seshat results.
pub type SeshatResult<T> = std::result::Result<T, SeshatError>;
