//! Export command for writing a hyperspectral cube.

use std::path::PathBuf;

use clap::Args;
use hsigen::config::GeneratorConfig;
use hsigen::error::Result;
use hsigen::export::CubeExporter;
use hsigen::project::ProjectSerializer;

use super::LayoutArgs;

/// Generate a layout and write the cube with its header
#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    /// Project file providing the class spectra
    #[arg(value_name = "FILE")]
    pub project: PathBuf,

    #[command(flatten)]
    pub layout: LayoutArgs,

    /// Output cube path; the header is written next to it with a .hdr extension
    #[arg(short, long, value_name = "FILE", default_value = "cube.bsq")]
    pub output: PathBuf,

    /// Number of spectral bands (defaults to the project value)
    #[arg(long)]
    pub bands: Option<usize>,

    /// Also write a NumPy .npy copy of the cube
    #[arg(long)]
    pub npy: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub fn execute(&self, config: &GeneratorConfig) -> Result<()> {
        let project = ProjectSerializer::load_from_file(&self.project)?;
        let num_bands = self.bands.unwrap_or(project.num_bands);
        let layout = self.layout.build(project.spectra.len(), config)?;

        let exporter = CubeExporter::new(&project.spectra, &layout, num_bands);
        let output = config.export.resolve(&self.output);
        let summary = exporter.save(&output)?;
        println!(
            "Wrote {} ({} bytes) and {}",
            summary.data_path.display(),
            summary.bytes_written,
            summary.header_path.display()
        );

        if self.npy || config.export.write_npy {
            let npy_path = output.with_extension("npy");
            exporter.save_npy(&npy_path)?;
            println!("Wrote {}", npy_path.display());
        }
        Ok(())
    }
}
