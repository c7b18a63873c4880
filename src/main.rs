//! mwgeo CLI - Command-line tool for building Most Wanted geometry files.
//!
//! This is the main entry point for the mwgeo command-line application.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use mwgeo::prelude::*;

/// mwgeo - compile meshes into Most Wanted geometry.bin files
#[derive(Parser)]
#[command(name = "mwgeo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log per-object progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a source mesh (.mwr or .ase) into a geometry file
    Compile {
        /// Source mesh
        source: PathBuf,

        /// Output geometry file
        #[arg(default_value = "geometry.bin")]
        target: PathBuf,

        /// Prefix for part names and x_ texture placeholders
        #[arg(short, long, env = "MWGEO_XNAME")]
        xname: String,

        /// Material override table (name=shader/texture)
        #[arg(short, long)]
        matlist: Option<PathBuf>,

        /// Cross-link table (origin=target)
        #[arg(long)]
        xlink: Option<PathBuf>,

        /// Object drawn with the transparent tint (repeatable)
        #[arg(short, long)]
        transparent: Vec<String>,
    },

    /// Print the parts of a geometry file
    Inspect {
        /// Geometry file
        file: PathBuf,

        /// Print a JSON summary
        #[arg(long)]
        json: bool,

        /// Texture coordinate pairs per vertex
        #[arg(long, default_value_t = 1)]
        uv_channels: usize,
    },

    /// Add cross-linked parts to an existing geometry file
    Crosslink {
        /// Geometry file
        file: PathBuf,

        /// Prefix for part names
        #[arg(short, long, env = "MWGEO_XNAME")]
        xname: String,

        /// Cross-link table (origin=target)
        #[arg(long)]
        xlink: PathBuf,

        /// Output file, defaults to rewriting the input
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Texture coordinate pairs per vertex
        #[arg(long, default_value_t = 1)]
        uv_channels: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Compile {
            source,
            target,
            xname,
            matlist,
            xlink,
            transparent,
        } => {
            cmd_compile(&source, &target, xname, matlist.as_deref(), xlink.as_deref(), transparent)?;
        }
        Commands::Inspect {
            file,
            json,
            uv_channels,
        } => {
            cmd_inspect(&file, json, uv_channels)?;
        }
        Commands::Crosslink {
            file,
            xname,
            xlink,
            output,
            uv_channels,
        } => {
            let output = output.unwrap_or_else(|| file.clone());
            cmd_crosslink(&file, &output, xname, &xlink, uv_channels)?;
        }
    }

    Ok(())
}

fn cmd_compile(
    source: &Path,
    target: &Path,
    xname: String,
    matlist: Option<&Path>,
    xlink: Option<&Path>,
    transparent: Vec<String>,
) -> Result<()> {
    println!("Compiling: {} -> {}", source.display(), target.display());

    let mut options = CompileOptions::new(xname).with_transparent(transparent);
    if let Some(path) = matlist {
        options.materials = MaterialTable::from_path(path)
            .with_context(|| format!("Failed to load material list {}", path.display()))?;
    }
    if let Some(path) = xlink {
        options.cross_links = CrossLinkTable::from_path(path)
            .with_context(|| format!("Failed to load cross links {}", path.display()))?;
    }

    let start = Instant::now();
    let compilation = Compiler::new(&options)
        .compile_path(source)
        .context("Failed to compile source mesh")?;

    compilation
        .file
        .save(target)
        .context("Failed to write geometry file")?;

    println!(
        "Compiled {} parts in {:?} ({} warnings)",
        compilation.file.part_count(),
        start.elapsed(),
        compilation.diagnostics.len()
    );

    Ok(())
}

/// Per-part line of the inspect report.
#[derive(Serialize)]
struct PartSummary<'a> {
    name: &'a str,
    hash: NameHash,
    triangles: u32,
    vertices: usize,
    groups: usize,
    textures: &'a [NameHash],
    shaders: &'a [NameHash],
    mount_points: usize,
    bounds: Bounds,
    offset: Option<u32>,
    length: Option<u32>,
}

#[derive(Serialize)]
struct FileSummary<'a> {
    relative_path: &'a str,
    class_type: &'a str,
    part_count: u32,
    parts: Vec<PartSummary<'a>>,
}

fn cmd_inspect(path: &Path, json: bool, uv_channels: usize) -> Result<()> {
    let file = GeometryFile::open_with(path, &ReadOptions { uv_channels })
        .context("Failed to read geometry file")?;

    let parts = file
        .parts()
        .iter()
        .map(|part| {
            let entry = file.lookup(part.hash());
            PartSummary {
                name: part.name(),
                hash: part.hash(),
                triangles: part.info.triangle_count,
                vertices: part.data.vertices.len(),
                groups: part.data.groups.len(),
                textures: &part.info.textures,
                shaders: &part.info.shaders,
                mount_points: part.info.mount_points.len(),
                bounds: part.info.bounds,
                offset: entry.map(|e| e.offset),
                length: entry.map(|e| e.length),
            }
        })
        .collect();

    let summary = FileSummary {
        relative_path: &file.info().relative_path,
        class_type: &file.info().class_type,
        part_count: file.info().part_count,
        parts,
    };

    if json {
        let text = serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?;
        println!("{}", text);
        return Ok(());
    }

    println!(
        "{} ({}), {} parts",
        summary.relative_path, summary.class_type, summary.part_count
    );
    for part in &summary.parts {
        println!(
            "{:>10} {:>8} tris {:>6} verts {:>3} groups {:>3} mounts  {}",
            part.hash.to_string(),
            part.triangles,
            part.vertices,
            part.groups,
            part.mount_points,
            part.name
        );
    }

    Ok(())
}

fn cmd_crosslink(
    input: &Path,
    output: &Path,
    xname: String,
    xlink: &Path,
    uv_channels: usize,
) -> Result<()> {
    println!("Cross-linking: {} -> {}", input.display(), output.display());

    let mut file = GeometryFile::open_with(input, &ReadOptions { uv_channels })
        .context("Failed to read geometry file")?;
    let table = CrossLinkTable::from_path(xlink)
        .with_context(|| format!("Failed to load cross links {}", xlink.display()))?;

    let resolver = NameResolver::new(xname);
    let mut diagnostics = Diagnostics::new();
    let added = apply_cross_links(&mut file, &resolver, &table, &mut diagnostics);

    file.save(output).context("Failed to write geometry file")?;

    println!(
        "Added {} parts, {} total ({} warnings)",
        added,
        file.part_count(),
        diagnostics.len()
    );

    Ok(())
}
