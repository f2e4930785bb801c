//! skelmesh-export - skeletal mesh export tool
//!
//! Reads a glTF/GLB scene and writes a `.mesh` model asset. The binary stream
//! goes to stdout unless `--output` is given; diagnostics go to stderr.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use skelmesh_export::formats::{write_mesh_file, write_mesh_stream};
use skelmesh_export::{ExportOptions, NodeId, Scene, convert_scene, import_gltf};

#[derive(Parser)]
#[command(name = "skelmesh-export")]
#[command(about = "Skeletal mesh export tool")]
#[command(version)]
struct Cli {
    /// Input scene file (glTF/GLB)
    input: PathBuf,

    /// Output .mesh file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Scene node whose subtree is exported
    #[arg(long)]
    root: Option<String>,

    /// Shader name written for every mesh
    #[arg(long)]
    shader: Option<String>,

    /// Print the node, mesh and bone summary instead of exporting
    #[arg(long)]
    list: bool,
}

fn main() -> ExitCode {
    // stdout carries the mesh stream, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage text that could not be written counts as a failure
            if err.print().is_err() {
                return ExitCode::FAILURE;
            }
            // --help and --version are not failures
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    tracing::info!("Loading {:?}", cli.input);
    let scene = import_gltf(&cli.input)?;

    if cli.list {
        list_scene(&scene);
        return Ok(());
    }

    let options = ExportOptions {
        root: cli.root,
        shader: cli.shader,
    };
    let asset = convert_scene(&scene, &options)?;

    let written = match &cli.output {
        Some(path) => {
            tracing::info!("Writing {:?}", path);
            write_mesh_file(path, &asset)?
        }
        None => write_mesh_stream(&mut std::io::stdout().lock(), &asset)?,
    };

    tracing::info!(
        "Exported {} meshes ({} bytes)",
        asset.meshes.len(),
        written
    );
    Ok(())
}

fn list_scene(scene: &Scene) {
    tracing::info!(
        "{} nodes, {} meshes",
        scene.nodes().len(),
        scene.meshes.len()
    );
    for id in scene.preorder(scene.root()) {
        let node = scene.node(id);
        let indent = "  ".repeat(depth(scene, id));
        tracing::info!("{}{}", indent, node.name);
        for &index in &node.meshes {
            let mesh = &scene.meshes[index];
            tracing::info!(
                "{}  mesh: {} vertices, {} faces, {} bones",
                indent,
                mesh.positions.len(),
                mesh.faces.len(),
                mesh.bones.len()
            );
            for bone in &mesh.bones {
                tracing::info!(
                    "{}    bone '{}' ({} weights)",
                    indent,
                    bone.name,
                    bone.weights.len()
                );
            }
        }
    }
}

fn depth(scene: &Scene, mut id: NodeId) -> usize {
    let mut depth = 0;
    while let Some(parent) = scene.node(id).parent {
        depth += 1;
        id = parent;
    }
    depth
}
