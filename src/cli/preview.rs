//! Preview command for rendering a layout as a color image.

use std::path::PathBuf;

use clap::Args;
use hsigen::color::ClassColorMap;
use hsigen::config::GeneratorConfig;
use hsigen::error::Result;
use hsigen::project::ProjectSerializer;

use super::LayoutArgs;

/// Render a generated layout with each class in its spectrum color
#[derive(Debug, Clone, Args)]
pub struct PreviewArgs {
    /// Project file providing the classes and their colors
    #[arg(value_name = "FILE")]
    pub project: PathBuf,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Output image path (format from the extension)
    #[arg(short, long, value_name = "FILE", default_value = "preview.png")]
    pub output: PathBuf,
}

impl PreviewArgs {
    /// Execute the preview command
    pub fn execute(&self, config: &GeneratorConfig) -> Result<()> {
        let project = ProjectSerializer::load_from_file(&self.project)?;
        let layout = self.layout.build(project.spectra.len(), config)?;

        let image = ClassColorMap::from_spectra(&project.spectra).render_rgb(&layout);
        let output = config.export.resolve(&self.output);
        image.save(&output)?;

        println!(
            "Wrote {}x{} preview to {}",
            image.width(),
            image.height(),
            output.display()
        );
        Ok(())
    }
}
