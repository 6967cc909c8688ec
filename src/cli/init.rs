//! Init command for writing a starter project.

use std::path::PathBuf;

use clap::Args;
use hsigen::config::GeneratorConfig;
use hsigen::error::{HsiError, Result};
use hsigen::project::{Project, ProjectSerializer};

/// Write a starter project with a background and two sample classes
#[derive(Debug, Clone, Args)]
pub struct InitArgs {
    /// Path of the project file to create
    #[arg(value_name = "FILE")]
    pub project: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub fn execute(&self, config: &GeneratorConfig) -> Result<()> {
        if self.project.exists() && !self.force {
            return Err(HsiError::invalid_format(format!(
                "{} already exists; pass --force to overwrite it",
                self.project.display()
            )));
        }

        let mut project = Project::with_sample_classes();
        project.num_bands = config.preferences.num_bands;
        ProjectSerializer::save_to_file(&project, &self.project)?;

        println!(
            "Created {} with {} spectra",
            self.project.display(),
            project.spectra.len()
        );
        Ok(())
    }
}
