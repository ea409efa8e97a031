//! Command line tool for building navigation meshes from tile maps and querying paths on them.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, bail};
use clap::{Args as ClapArgs, Parser, Subcommand};
use glam::Vec2;
use tilenav::{
    FixturePalette, Navmesh, NavmeshConfig, NavmeshConfigBuilder, RectilinearClipper, TileMap,
    build_navmesh, find_path_between_points,
};

mod level;

use level::{LevelDescription, PaletteEntry, palette_from_entries};

/// Builds navigation meshes for tile-based levels and finds paths on them
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert a JSON level description into a binary tile map
    Import {
        /// Level description (JSON)
        #[clap(long, value_parser)]
        level: PathBuf,

        /// Output tile map file
        #[clap(long, value_parser)]
        output: PathBuf,
    },

    /// Print statistics about a tile map
    Inspect {
        /// Input tile map file
        #[clap(long, value_parser)]
        map: PathBuf,
    },

    /// Build the navigation mesh of a tile map
    Build {
        #[clap(flatten)]
        mesh: MeshArgs,

        /// Write the navmesh as JSON to this file
        #[clap(long, value_parser)]
        output: Option<PathBuf>,
    },

    /// Find a smoothed path between two points
    FindPath {
        #[clap(flatten)]
        mesh: MeshArgs,

        /// Start position (x,y)
        #[clap(long, value_parser = parse_vector, allow_hyphen_values = true)]
        start: Vec2,

        /// End position (x,y)
        #[clap(long, value_parser = parse_vector, allow_hyphen_values = true)]
        end: Vec2,

        /// Treat all doors as closed
        #[clap(long)]
        closed_doors: bool,

        /// Write the waypoints as JSON to this file
        #[clap(long, value_parser)]
        output: Option<PathBuf>,
    },
}

/// Everything needed to build a navmesh.
#[derive(ClapArgs, Debug)]
struct MeshArgs {
    /// Input tile map file
    #[clap(long, value_parser)]
    map: PathBuf,

    /// Fixture palette (JSON list of `{ "id", "width", "height" }`)
    #[clap(long, value_parser)]
    palette: Option<PathBuf>,

    /// The radius of the agent in world units
    #[clap(long, default_value = "0.25")]
    agent_radius: f32,

    /// Multiplier applied to the agent radius
    #[clap(long, default_value = "1.0")]
    clearance_scale: f32,

    /// Use this clearance instead of deriving it from the agent
    #[clap(long)]
    obstacle_extents: Option<f32>,
}

impl MeshArgs {
    fn config(&self) -> NavmeshConfig {
        match self.obstacle_extents {
            Some(obstacle_extents) => NavmeshConfig { obstacle_extents },
            None => NavmeshConfigBuilder {
                agent_radius: self.agent_radius,
                clearance_scale: self.clearance_scale,
            }
            .build(),
        }
    }

    fn build(&self) -> Result<Navmesh> {
        let map = load_map(&self.map)?;
        let palette = match &self.palette {
            Some(path) => load_palette(path)?,
            None => FixturePalette::new(),
        };
        let config = self.config();
        build_navmesh(&map, &palette, &config, &RectilinearClipper)
            .with_context(|| format!("Failed to build navmesh for {}", self.map.display()))
    }
}

/// Parse a comma-separated vector
fn parse_vector(s: &str) -> Result<Vec2, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err(format!("Vector must have 2 components, got {}", parts.len()));
    }
    let x = parts[0].trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = parts[1].trim().parse::<f32>().map_err(|e| e.to_string())?;
    Ok(Vec2::new(x, y))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Import { level, output } => import_level(&level, &output),
        Commands::Inspect { map } => inspect(&map),
        Commands::Build { mesh, output } => build(&mesh, output.as_deref()),
        Commands::FindPath {
            mesh,
            start,
            end,
            closed_doors,
            output,
        } => find_path(&mesh, start, end, closed_doors, output.as_deref()),
    }
}

fn load_map(path: &Path) -> Result<TileMap> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    TileMap::read_from(BufReader::new(file))
        .with_context(|| format!("Failed to read tile map {}", path.display()))
}

fn load_palette(path: &Path) -> Result<FixturePalette> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let entries: Vec<PaletteEntry> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse palette {}", path.display()))?;
    palette_from_entries(entries)
}

fn import_level(input: &Path, output: &Path) -> Result<()> {
    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let level: LevelDescription = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse level {}", input.display()))?;
    let map = level.to_tile_map()?;

    let file = File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    map.write_to(&mut writer)?;
    writer.flush()?;
    println!(
        "Wrote {}x{} tile map to {}",
        map.width(),
        map.height(),
        output.display()
    );
    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let map = load_map(path)?;
    let regions = map.traverse_regions();
    let obstacles = map.extract_walls_and_doors();
    let cells: Vec<(i32, i32)> = (0..map.height() as i32)
        .flat_map(|row| (0..map.width() as i32).map(move |col| (row, col)))
        .collect();
    let floor = cells.iter().filter(|&&(row, col)| map.is_floor(row, col)).count();
    let fixtures = cells
        .iter()
        .filter(|&&(row, col)| map.fixture(row, col).is_some())
        .count();

    println!("Tile map {}", path.display());
    println!("  size:      {}x{} tiles", map.width(), map.height());
    println!("  grid size: {} wu", map.grid_size());
    println!("  floor:     {floor} tiles");
    println!("  regions:   {}", regions.region_count());
    println!("  walls:     {}", obstacles.walls.len());
    println!("  doors:     {}", obstacles.doors.len());
    println!("  fixtures:  {fixtures}");
    Ok(())
}

fn build(mesh: &MeshArgs, output: Option<&Path>) -> Result<()> {
    let navmesh = mesh.build()?;
    let triangles: usize = navmesh.rooms.iter().map(|room| room.triangles.len()).sum();
    println!(
        "Navmesh built: {} rooms, {} triangles, {} nodes, {} edges",
        navmesh.rooms.len(),
        triangles,
        navmesh.graph.nodes.len(),
        navmesh.graph.edges.len()
    );

    if let Some(output) = output {
        let writer = BufWriter::new(File::create(output)?);
        serde_json::to_writer(writer, &navmesh)
            .with_context(|| format!("Failed to write navmesh to {}", output.display()))?;
        println!("Navmesh saved to {}", output.display());
    }
    Ok(())
}

fn find_path(
    mesh: &MeshArgs,
    start: Vec2,
    end: Vec2,
    closed_doors: bool,
    output: Option<&Path>,
) -> Result<()> {
    let navmesh = mesh.build()?;
    let graph = &navmesh.graph;

    let path = if closed_doors {
        let (Some(from), Some(to)) = (graph.node_at(start), graph.node_at(end)) else {
            bail!("Start {start} or end {end} is not on the navmesh");
        };
        graph
            .find_node_path_filtered(from, to, |_, next| {
                graph.node(next).is_some_and(|node| !node.is_door())
            })
            .map(|nodes| graph.smooth_path(&nodes, start, end))
            .unwrap_or_default()
    } else {
        find_path_between_points(graph, start, end)
    };

    if path.is_empty() {
        bail!("No path found from {start} to {end}");
    }
    let length: f32 = path.windows(2).map(|pair| pair[0].distance(pair[1])).sum();
    println!("Path found with {} waypoints, length {length:.2}:", path.len());
    for point in &path {
        println!("  ({:.2}, {:.2})", point.x, point.y);
    }

    if let Some(output) = output {
        let points: Vec<[f32; 2]> = path.iter().map(|point| point.to_array()).collect();
        let writer = BufWriter::new(File::create(output)?);
        serde_json::to_writer_pretty(writer, &points)
            .with_context(|| format!("Failed to write path to {}", output.display()))?;
        println!("Path saved to {}", output.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_parse() {
        assert_eq!(parse_vector("1.5, -2").unwrap(), Vec2::new(1.5, -2.0));
        assert!(parse_vector("1,2,3").is_err());
        assert!(parse_vector("x,2").is_err());
    }

    #[test]
    fn explicit_extents_win() {
        let args = Args::parse_from([
            "tilenav",
            "build",
            "--map",
            "level.tmap",
            "--agent-radius",
            "2",
            "--obstacle-extents",
            "0.5",
        ]);
        let Commands::Build { mesh, .. } = args.command else {
            panic!("expected the build command");
        };
        assert_eq!(mesh.config().obstacle_extents, 0.5);
    }

    #[test]
    fn agent_radius_is_scaled() {
        let args = Args::parse_from([
            "tilenav",
            "find-path",
            "--map",
            "level.tmap",
            "--agent-radius",
            "2",
            "--clearance-scale",
            "1.5",
            "--start",
            "1,1",
            "--end",
            "5,5",
        ]);
        let Commands::FindPath { mesh, start, .. } = args.command else {
            panic!("expected the find-path command");
        };
        assert_eq!(mesh.config().obstacle_extents, 3.0);
        assert_eq!(start, Vec2::ONE);
    }
}
