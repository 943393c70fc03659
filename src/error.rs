//! Error and diagnostic types.
//!
//! # Overview
//!
//! The engine distinguishes three tiers of failure:
//! - [`Diagnostic`] / [`DiagnosticReport`]: collected, non-fatal validator
//!   findings. The caller decides whether a report with errors blocks
//!   compilation.
//! - [`CompileError`]: a single fatal error that aborts compilation. No
//!   scene runtime is produced when this is returned.
//! - [`RuntimeError`]: raised by the GPU executor. Aborts the current draw
//!   and propagates; it is not a user-facing validation failure.
//!
//! [`MotifError`] composes all three for callers that want one `Result`
//! type end to end.

use thiserror::Error;

/// Severity of a single [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// One validator finding: a stable code, severity, JSON-path identifier,
/// and human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn error(code: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code, severity: Severity::Error, path: path.into(), message: message.into() }
    }

    #[must_use]
    pub fn warning(code: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code, severity: Severity::Warning, path: path.into(), message: message.into() }
    }
}

/// A bundle of validator diagnostics. Warnings never block; the caller
/// decides whether to reject a report where [`DiagnosticReport::has_errors`]
/// is true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: DiagnosticReport) {
        self.diagnostics.extend(other.diagnostics);
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning)
    }
}

/// A single fatal compile-time error. Structured fields are preserved
/// end to end; callers must not collapse this into a string before
/// surfacing it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code} at {path}: {message}")]
pub struct CompileError {
    pub code: &'static str,
    pub path: String,
    pub message: String,
    pub anim_ref: Option<String>,
    pub block_id: Option<String>,
}

impl CompileError {
    #[must_use]
    pub fn new(code: &'static str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { code, path: path.into(), message: message.into(), anim_ref: None, block_id: None }
    }

    #[must_use]
    pub fn with_anim_ref(mut self, anim_ref: impl Into<String>) -> Self {
        self.anim_ref = Some(anim_ref.into());
        self
    }

    #[must_use]
    pub fn with_block_id(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = Some(block_id.into());
        self
    }
}

/// Errors raised by the GPU executor while interpreting a render command
/// stream. These abort the current draw; they are programming errors, not
/// user-facing validation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    // ========================================================================
    // Stack discipline
    // ========================================================================
    /// A `PopTransform`/`PopClipRect`/`EndMask`/`EndMatte` was issued below
    /// the base of its stack.
    #[error("command stack underflow: {0}")]
    StackUnderflow(&'static str),

    /// Offscreen mask/matte nesting exceeded the configured limit.
    #[error("INVALID_COMMAND_STACK: offscreen depth {depth} exceeds limit {limit}")]
    InvalidCommandStack { depth: u32, limit: u32 },

    // ========================================================================
    // Resource resolution
    // ========================================================================
    /// A `PathId` referenced by a command has no entry in the registry.
    #[error("MISSING_PATH_RESOURCE: path {0:?} not registered")]
    MissingPathResource(crate::path::PathId),

    /// No GPU texture available for a namespaced asset id.
    #[error("NO_TEXTURE_FOR_ASSET: {0}")]
    NoTextureForAsset(String),

    // ========================================================================
    // Scope structure
    // ========================================================================
    /// A `BeginMatte` scope did not contain exactly two child group scopes.
    #[error("malformed matte scope: {0}")]
    MalformedMatteScope(&'static str),

    /// A defensive guard against cyclic matte chains at runtime.
    #[error("MATTE_CHAIN_CYCLE: layer {0} already visited")]
    MatteChainCycle(String),
}

/// Top-level error type composing all three tiers, for callers that want a
/// single `Result` across the whole pipeline.
#[derive(Error, Debug, Clone)]
pub enum MotifError {
    #[error("validation failed with {} error(s)", .0.errors().count())]
    Validation(DiagnosticReport),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

pub type Result<T> = std::result::Result<T, MotifError>;
