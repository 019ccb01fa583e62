//! Prompt Template System
//!
//! Loads and renders YAML prompt templates with single-parent inheritance.
//!
//! Each definition file maps template keys to records. A record may name a
//! parent via the reserved `_extends` field; resolution flattens the chain
//! with child fields winning. The `template` field is the renderable body.
//!
//! Bodies use Handlebars syntax for variable substitution; the simple
//! `{var}` spelling is accepted too and rewritten to `{{ var }}` before
//! rendering.

mod manager;

pub use manager::{PromptManager, PromptVars, rewrite_single_braces};
