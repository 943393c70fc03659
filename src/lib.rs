//! Core of a scene template rendering engine for editable, variant-aware,
//! Lottie-derived animated scenes.
//!
//! This crate covers four tightly coupled subsystems:
//!
//! - [`compiler`] + [`air`]: lowers a validated vector animation document
//!   into an Animation Intermediate Representation (AIR).
//! - [`scene`]: assembles per-block runtimes from one or more AIRs into a
//!   [`scene::SceneRuntime`], sharing a scene-wide [`path::PathRegistry`].
//! - [`render_plan`] + [`air_emit`]: emit a deterministic, ordered list of
//!   render commands for a given scene frame.
//! - [`gpu`]: interprets the render command stream against a GPU target,
//!   including boolean mask compositing and track-matte compositing.
//!
//! [`hit_test`] shares the block transform formula used by the render plan
//! emitter so that tap targets stay pixel-identical to rendered content.
//!
//! The package loader, JSON schema I/O, UI shell, font/audio, and the
//! platform texture loader live outside this crate; they are reached only
//! through the trait boundaries in [`assets`] and [`gpu::provider`].

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::too_many_lines)]

pub mod air;
pub mod air_emit;
pub mod assets;
pub mod compiler;
pub mod error;
pub mod gpu;
pub mod hit_test;
pub mod math;
pub mod path;
pub mod render_plan;
pub mod scene;

pub use error::{CompileError, Diagnostic, DiagnosticReport, MotifError, RuntimeError, Severity};
pub use path::{PathId, PathRegistry};
pub use scene::SceneRuntime;
