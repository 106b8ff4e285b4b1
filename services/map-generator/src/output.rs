//! Artifact publication.
//!
//! Every artifact is first written next to its final location under a
//! hidden `.{name}.staging` name. Once all of them are on disk they are
//! renamed into place together: previous artifacts are set aside, the
//! staged ones moved in, and on any failure the previous ones are put
//! back. A failed run never publishes some tiles without the others.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use map_common::{MapError, TileCoord};
use rayon::prelude::*;
use renderer::png::write_png;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::OutputConfig;
use crate::pipeline::MapOutput;

/// Suffix of vegetation tile file stems.
pub const VEGETATION_SUFFIX: &str = "_veg";

/// Where a published run's artifacts ended up.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedPaths {
    pub root: PathBuf,
    pub full_map: PathBuf,
    pub full_vegetation: PathBuf,
    pub map_dir: PathBuf,
    pub vegetation_dir: PathBuf,
    pub manifest: PathBuf,
}

impl PublishedPaths {
    fn new(config: &OutputConfig) -> Self {
        let root = config.root.clone();
        Self {
            full_map: root.join(&config.full_map),
            full_vegetation: root.join(&config.full_vegetation),
            map_dir: root.join(&config.map_dir),
            vegetation_dir: root.join(&config.vegetation_dir),
            manifest: root.join(&config.manifest),
            root,
        }
    }
}

/// File name of a styled tile: `"{column},{row}.png"`.
pub fn map_tile_name(coord: &TileCoord) -> String {
    format!("{}.png", coord.file_stem())
}

/// File name of a vegetation tile: `"{column},{row}_veg.png"`.
pub fn vegetation_tile_name(coord: &TileCoord) -> String {
    format!("{}{}.png", coord.file_stem(), VEGETATION_SUFFIX)
}

/// Hidden sibling names of every artifact while it is being written.
struct Staging {
    map_dir: PathBuf,
    vegetation_dir: PathBuf,
    full_map: PathBuf,
    full_vegetation: PathBuf,
    manifest: PathBuf,
}

impl Staging {
    fn new(paths: &PublishedPaths) -> Self {
        Self {
            map_dir: hidden_sibling(&paths.map_dir, "staging"),
            vegetation_dir: hidden_sibling(&paths.vegetation_dir, "staging"),
            full_map: hidden_sibling(&paths.full_map, "staging"),
            full_vegetation: hidden_sibling(&paths.full_vegetation, "staging"),
            manifest: hidden_sibling(&paths.manifest, "staging"),
        }
    }

    /// Staged path and final path of each artifact.
    fn moves(&self, paths: &PublishedPaths) -> Vec<(PathBuf, PathBuf)> {
        vec![
            (self.map_dir.clone(), paths.map_dir.clone()),
            (self.vegetation_dir.clone(), paths.vegetation_dir.clone()),
            (self.full_map.clone(), paths.full_map.clone()),
            (self.full_vegetation.clone(), paths.full_vegetation.clone()),
            (self.manifest.clone(), paths.manifest.clone()),
        ]
    }

    fn discard(&self) {
        for path in [
            &self.map_dir,
            &self.vegetation_dir,
            &self.full_map,
            &self.full_vegetation,
            &self.manifest,
        ] {
            remove_if_exists(path);
        }
    }
}

/// Write every artifact of `output` under `config.root`.
pub fn publish(output: &MapOutput, config: &OutputConfig) -> Result<PublishedPaths, MapError> {
    let paths = PublishedPaths::new(config);
    fs::create_dir_all(&paths.root).map_err(|e| io_error(&paths.root, e))?;

    let staging = Staging::new(&paths);
    let rename = |from: &Path, to: &Path| fs::rename(from, to);
    let published = write_staged(output, &staging)
        .and_then(|_| commit(&staging.moves(&paths), &rename));
    if let Err(e) = published {
        staging.discard();
        return Err(e);
    }

    info!(
        root = %paths.root.display(),
        tiles = output.tiles.len(),
        "Published map artifacts"
    );
    Ok(paths)
}

fn write_staged(output: &MapOutput, staging: &Staging) -> Result<(), MapError> {
    staging.discard();
    for dir in [&staging.map_dir, &staging.vegetation_dir] {
        fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;
    }

    output
        .tiles
        .par_iter()
        .try_for_each(|(coord, (map_tile, vegetation_tile))| {
            write_png(&staging.map_dir.join(map_tile_name(coord)), map_tile)?;
            write_png(
                &staging.vegetation_dir.join(vegetation_tile_name(coord)),
                vegetation_tile,
            )
        })?;
    debug!(tiles = output.tiles.len(), "Staged tiles");

    write_png(&staging.full_map, &output.map)?;
    write_png(&staging.full_vegetation, &output.vegetation)?;

    let manifest = serde_json::to_string_pretty(&output.report)?;
    fs::write(&staging.manifest, manifest).map_err(|e| io_error(&staging.manifest, e))?;
    Ok(())
}

type RenameFn<'a> = &'a dyn Fn(&Path, &Path) -> io::Result<()>;

/// Move every staged artifact over its final path, all or nothing.
fn commit(moves: &[(PathBuf, PathBuf)], rename: RenameFn<'_>) -> Result<(), MapError> {
    let mut set_aside: Vec<(PathBuf, PathBuf)> = Vec::new();
    for (_, target) in moves {
        if !target.exists() {
            continue;
        }
        let previous = hidden_sibling(target, "previous");
        remove_if_exists(&previous);
        if let Err(e) = rename(target, &previous) {
            roll_back(&[], &set_aside, rename);
            return Err(io_error(target, e));
        }
        debug!(path = %target.display(), "Set previous artifact aside");
        set_aside.push((target.clone(), previous));
    }

    let mut placed: Vec<&Path> = Vec::new();
    for (staged, target) in moves {
        if let Err(e) = rename(staged, target) {
            roll_back(&placed, &set_aside, rename);
            return Err(io_error(target, e));
        }
        placed.push(target);
    }

    for (_, previous) in &set_aside {
        remove_if_exists(previous);
    }
    Ok(())
}

/// Remove what was already moved in and restore the previous artifacts.
fn roll_back(placed: &[&Path], set_aside: &[(PathBuf, PathBuf)], rename: RenameFn<'_>) {
    for target in placed {
        remove_if_exists(target);
    }
    for (target, previous) in set_aside {
        if let Err(e) = rename(previous, target) {
            warn!(path = %target.display(), error = %e, "Failed to restore previous artifact");
        }
    }
}

/// Hidden sibling `.{name}.{suffix}` of `path`.
fn hidden_sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    path.with_file_name(format!(".{}.{}", name, suffix))
}

fn remove_if_exists(path: &Path) {
    let removed = if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.exists() {
        fs::remove_file(path)
    } else {
        return;
    };
    if let Err(e) = removed {
        warn!(path = %path.display(), error = %e, "Failed to remove artifact");
    }
}

fn io_error(path: &Path, err: std::io::Error) -> MapError {
    MapError::Io(format!("{}: {}", path.display(), err))
}
