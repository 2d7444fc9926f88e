use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dicom_series_volume::{
    Orientation, SliceRecord, VolumeLoader, catalog, volume::plane_to_image,
};
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the DICOM files of a directory
    List {
        dir: PathBuf,

        /// Maximum number of files to print
        #[arg(short, long, default_value_t = 100)]
        limit: usize,
    },
    /// Write a CSV summary with one row per DICOM file
    Catalog {
        dir: PathBuf,

        /// CSV path, defaults to summary.csv inside the directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Reconstruct the primary series and save its axial, coronal and sagittal planes
    Reconstruct {
        dir: PathBuf,

        /// Directory the plane images are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Show the metadata of this file (1-based, as printed by `list`)
        /// instead of the series reference slice
        #[arg(short, long)]
        select: Option<usize>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::List { dir, limit } => list(&dir, limit),
        Command::Catalog { dir, output } => {
            let output = output.unwrap_or_else(|| dir.join("summary.csv"));
            write_catalog(&dir, &output)
        }
        Command::Reconstruct {
            dir,
            output_dir,
            select,
        } => reconstruct(&dir, &output_dir, select),
    }
}

fn list(dir: &Path, limit: usize) -> Result<()> {
    let paths = VolumeLoader::list_dicom_files(dir)?;
    for (i, path) in paths.iter().take(limit).enumerate() {
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        println!("{}: {name}", i + 1);
    }
    if paths.len() > limit {
        println!("... {} more", paths.len() - limit);
    }
    Ok(())
}

fn write_catalog(dir: &Path, output: &Path) -> Result<()> {
    let entries = catalog::scan_directory(dir)?;
    catalog::save_csv(&entries, output)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Wrote {} rows to {}", entries.len(), output.display());
    Ok(())
}

fn reconstruct(dir: &Path, output_dir: &Path, select: Option<usize>) -> Result<()> {
    let paths = VolumeLoader::list_dicom_files(dir)?;
    let selected = match select {
        Some(index) if index == 0 || index > paths.len() => {
            bail!("selection {index} is out of range 1-{}", paths.len())
        }
        Some(index) => Some(
            SliceRecord::open(&paths[index - 1])
                .with_context(|| format!("reading {}", paths[index - 1].display()))?,
        ),
        None => None,
    };

    let reconstruction = VolumeLoader::load_from_file_paths(&paths)?;
    info!(
        "Series {} ordered by {:?}, volume {:?}, spacing {:?}",
        reconstruction.series_uid,
        reconstruction.sort_by,
        reconstruction.volume.dim(),
        reconstruction.volume.spacing
    );

    let reference = selected.as_ref().unwrap_or(&reconstruction.reference);
    println!("{}", reference.metadata);
    if let Some(mean) = reference.mean_intensity() {
        println!("Mean intensity:      {mean:.2}");
    }

    let planes = reconstruction.planes()?;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;
    for orientation in Orientation::ALL {
        let path = output_dir.join(format!("{orientation}.png"));
        let image = plane_to_image(&planes.get(orientation))
            .with_context(|| format!("converting {orientation} plane"))?;
        image
            .save(&path)
            .with_context(|| format!("saving {}", path.display()))?;
        println!("Saved {}", path.display());
    }
    Ok(())
}
