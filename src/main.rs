use std::path::Path;

use clap::{error::ErrorKind, Parser};

mod config;
mod datatypes;
mod error;
mod plotter;
mod reader;

use crate::{config::RenderStyle, error::MeshPlotError};

const USAGE: &str = "usage: meshplot <mesh>.dat <export_path>";

/// Renders a triangulated mesh dump to png images
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Mesh file with node, triangle and edge sections
    mesh: String,

    /// Existing directory that receives mesh_step_<N>.png
    export_path: String,

    /// Number of frames, each dropping one more trailing triangle
    #[arg(short, long, default_value_t = 1)]
    frames: usize,

    /// Json file overriding the default render style
    #[arg(short, long)]
    style: Option<String>,

    /// Extra positional arguments, ignored
    #[arg(hide = true)]
    ignored: Vec<String>,
}

fn run(cli: &Cli) -> Result<(), MeshPlotError> {
    let mesh = reader::read_mesh(&cli.mesh)?;

    let style = match &cli.style {
        Some(path) => config::load_style(path)?,
        None => RenderStyle::default(),
    };

    plotter::render_frames(&mesh, Path::new(&cli.export_path), cli.frames, &style)?;

    Ok(())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(err) if err.kind() == ErrorKind::MissingRequiredArgument => {
            println!("{USAGE}");
            std::process::exit(1)
        }
        Err(err) => err.exit(),
    };

    if let Err(err) = run(&cli) {
        eprintln!("error: {err}");
        std::process::exit(1)
    }
}
