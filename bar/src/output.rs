//! Where rendered status lines go.

use crate::app::App;
use anyhow::{bail, Context, Result};
use rootstat_core::OutputTarget;
use std::io::Write;
use tokio::process::Command;

/// Writes one status update per tick to the configured target.
#[derive(Debug, Clone, Copy)]
pub struct Sink {
    target: OutputTarget,
}

impl Sink {
    pub fn new(target: OutputTarget) -> Self {
        Self { target }
    }

    #[must_use]
    pub fn target(&self) -> OutputTarget {
        self.target
    }

    /// The text this sink would publish for the current state of `app`.
    pub fn line(&self, app: &App) -> Result<String> {
        match self.target {
            OutputTarget::Stdout | OutputTarget::XRoot => Ok(app.render()),
            OutputTarget::Waybar => {
                serde_json::to_string(&app.waybar()).context("Failed to serialize Waybar output")
            }
        }
    }

    pub async fn emit(&self, app: &App) -> Result<()> {
        let line = self.line(app)?;
        match self.target {
            OutputTarget::Stdout | OutputTarget::Waybar => {
                let mut stdout = std::io::stdout().lock();
                write_line(&mut stdout, &line)
            }
            OutputTarget::XRoot => set_root_name(&line).await,
        }
    }
}

fn write_line(out: &mut impl Write, line: &str) -> Result<()> {
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}

/// Set the X root window name, which dwm-style bars display.
async fn set_root_name(text: &str) -> Result<()> {
    let status = Command::new("xsetroot")
        .arg("-name")
        .arg(text)
        .status()
        .await
        .context("Failed to run xsetroot")?;

    if !status.success() {
        bail!("xsetroot exited with {status}");
    }
    Ok(())
}
