//! Output formatting abstraction for text vs JSON rendering
//!
//! All command output flows through [`OutputWriter`], which handles format
//! switching. Command handlers never format for a specific target.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use ci_shim_runner::{BuildPlan, RunReport};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Writes command output in the selected format.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Render a payload to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    /// Render a payload to any writer.
    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => {
                payload.render_text(w)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Human-readable text rendering.
///
/// Implemented by every CLI output payload alongside `serde::Serialize`.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let verdict = if self.success() {
            "PASSED".green().bold()
        } else {
            "FAILED".red().bold()
        };
        writeln!(w, "Build {} (exit code {})", verdict, self.exit_code)?;
        writeln!(w, "  build type:  {}", self.build_type)?;
        writeln!(w, "  session:     {}", self.session.name().unwrap_or("<all>"))?;
        writeln!(w, "  output dir:  {}", self.output_dir.display())?;
        match &self.result_log {
            Some(path) => writeln!(w, "  result log:  {}", path.display())?,
            None => writeln!(w, "  result log:  (none)")?,
        }
        writeln!(
            w,
            "  logs shipped: {}",
            if self.logs_shipped { "yes" } else { "no" }
        )?;
        if self.hung_up {
            writeln!(w, "  {}", "interrupted by hang-up".yellow())?;
        }
        Ok(())
    }
}

impl Render for BuildPlan {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "Build plan ({})", self.build_type)?;
        writeln!(w, "  project root: {}", self.project_root.display())?;
        writeln!(w, "  output dir:   {}", self.output_dir.display())?;
        writeln!(w, "Commands:")?;
        for (i, cmd) in self.commands.iter().enumerate() {
            writeln!(w, "  {}. {}", i + 1, cmd)?;
        }
        if let Some(name) = &self.result_log {
            writeln!(w, "Collect: {name}")?;
        }
        if let Some(shipper) = &self.log_shipper {
            writeln!(w, "On exit: {}", shipper.display())?;
        }
        Ok(())
    }
}
