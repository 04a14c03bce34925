#![forbid(unsafe_code)]
//! Rendering of inventory subsets: graphviz dot text, plain-text and JSON
//! issue reports, and an adapter seam for invoking `dot` to produce SVG.

mod dot;
mod graphviz;
mod report;
mod theme;

pub use dot::render_dot;
pub use graphviz::{DeniedGraphvizRunner, DotGraphvizRunner, GraphvizRunner};
pub use report::{render_json, render_jsonl, render_text_summary};
pub use theme::Theme;

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    Serialize {
        detail: String,
    },
    EffectDenied {
        effect: &'static str,
        detail: String,
    },
    Process {
        program: String,
        detail: String,
    },
    ProcessStatus {
        program: String,
        status: i32,
        stderr: String,
    },
}

impl Display for RenderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialize { detail } => write!(f, "failed to serialize report: {detail}"),
            Self::EffectDenied { effect, detail } => {
                write!(f, "effect `{effect}` denied: {detail}")
            }
            Self::Process { program, detail } => {
                write!(f, "failed to run `{program}`: {detail}")
            }
            Self::ProcessStatus {
                program,
                status,
                stderr,
            } => write!(f, "`{program}` exited with status {status}: {stderr}"),
        }
    }
}

impl std::error::Error for RenderError {}
