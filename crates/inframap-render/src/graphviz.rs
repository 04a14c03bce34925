use crate::RenderError;
use std::path::Path;
use std::process::Command;

/// Seam for the external `dot` program, so report generation stays
/// testable without graphviz installed.
pub trait GraphvizRunner {
    fn render_svg(&self, dot_file: &Path, svg_file: &Path) -> Result<(), RenderError>;
}

/// Invokes `dot -Tsvg` from PATH.
#[derive(Debug, Default)]
pub struct DotGraphvizRunner;

impl GraphvizRunner for DotGraphvizRunner {
    fn render_svg(&self, dot_file: &Path, svg_file: &Path) -> Result<(), RenderError> {
        let output = Command::new("dot")
            .arg("-Tsvg")
            .arg("-o")
            .arg(svg_file)
            .arg(dot_file)
            .output()
            .map_err(|err| RenderError::Process {
                program: "dot".to_string(),
                detail: err.to_string(),
            })?;
        if output.status.success() {
            Ok(())
        } else {
            Err(RenderError::ProcessStatus {
                program: "dot".to_string(),
                status: output.status.code().unwrap_or(1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Refuses every invocation; the test double for subprocess-free runs.
#[derive(Debug, Default)]
pub struct DeniedGraphvizRunner;

impl GraphvizRunner for DeniedGraphvizRunner {
    fn render_svg(&self, dot_file: &Path, _svg_file: &Path) -> Result<(), RenderError> {
        Err(RenderError::EffectDenied {
            effect: "subprocess",
            detail: format!("refusing to render {}", dot_file.display()),
        })
    }
}
