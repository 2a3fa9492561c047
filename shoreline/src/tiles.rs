//! Source elevation grid set.

use crate::{ConfigError, Error};
use dashmap::DashMap;
use demgrid::Grid;
use log::debug;
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    sync::Arc,
};

pub struct Tiles {
    /// Directory containing EHdr grids.
    tile_dir: PathBuf,

    /// How to load tiles (in-memory or mapped).
    tile_mode: TileMode,

    /// `.flt` files found in `tile_dir`, sorted by name.
    paths: Vec<PathBuf>,

    /// Tiles which have been loaded on demand.
    tiles: DashMap<PathBuf, Arc<Grid>>,
}

impl Tiles {
    /// Scans `tile_dir` for grids.
    ///
    /// Fails early if the directory holds no complete `.flt`/`.hdr`
    /// pair.
    pub fn new(tile_dir: PathBuf, tile_mode: TileMode) -> Result<Self, Error> {
        if !tile_dir.is_dir() {
            return Err(ConfigError::Path(tile_dir).into());
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&tile_dir)? {
            let path = entry?.path();
            if Some("flt") == path.extension().and_then(OsStr::to_str) && demgrid::exists(&path) {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Err(ConfigError::NoTiles(tile_dir).into());
        }
        paths.sort();
        debug!("found {} grids in {tile_dir:?}", paths.len());
        Ok(Self {
            tile_dir,
            tile_mode,
            paths,
            tiles: DashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.tile_dir
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Returns the grid at `path`, loading it on first use.
    ///
    /// Concurrent callers share a single loaded copy.
    pub fn get(&self, path: &Path) -> Result<Arc<Grid>, Error> {
        self.tiles
            .entry(path.to_owned())
            .or_try_insert_with(|| self.tile_mode.open(path).map(Arc::new))
            .map(|r| r.clone())
    }
}

/// How to handle tile.
///
/// The trade off between loading tile data into memory versus memory
/// mapping is not obvious, and you should measure both before
/// deciding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TileMode {
    /// Parse tile and load into memory.
    #[default]
    InMem,

    /// Memory map file contents.
    MemMap,
}

impl TileMode {
    pub fn memmap(memmap: bool) -> Self {
        if memmap {
            Self::MemMap
        } else {
            Self::InMem
        }
    }

    /// Opens the grid at `path` in this mode.
    pub fn open(self, path: &Path) -> Result<Grid, Error> {
        debug!("loading {path:?}");
        match self {
            TileMode::InMem => Ok(Grid::load(path)?),
            TileMode::MemMap => Ok(Grid::memmap(path)?),
        }
    }
}

/// Returns the file name of a tile, used to name its derived files.
pub fn tile_name(path: &Path) -> String {
    path.file_name()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_string()
}

/// Returns the file name of a tile without its extension.
pub fn tile_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{tile_name, tile_stem, TileMode, Tiles};
    use demgrid::{Endian, Grid, Header};
    use std::{path::Path, sync::Arc};

    #[test]
    fn test_names() {
        let path = Path::new("/data/dem/dem_2020.flt");
        assert_eq!(tile_name(path), "dem_2020.flt");
        assert_eq!(tile_stem(path), "dem_2020");
    }

    #[test]
    fn test_scan_and_share() {
        let dir = std::env::temp_dir().join(format!("shoreline-{}-tiles", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let header = Header {
            ncols: 2,
            nrows: 2,
            xllcorner: 0.0,
            yllcorner: 0.0,
            cellsize: 1.0,
            nodata: -9999.0,
            endian: Endian::Little,
        };
        Grid::filled(header, 3.0).write(dir.join("b.flt")).unwrap();
        Grid::filled(header, 1.0).write(dir.join("a.flt")).unwrap();
        std::fs::write(dir.join("notes.txt"), "not a grid").unwrap();

        let tiles = Tiles::new(dir.clone(), TileMode::MemMap).unwrap();
        assert_eq!(tiles.paths().len(), 2);
        assert_eq!(tile_name(&tiles.paths()[0]), "a.flt");

        let first = tiles.get(&tiles.paths()[1]).unwrap();
        let second = tiles.get(&tiles.paths()[1]).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.get(0, 0), Some(3.0));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_empty_dir_fails() {
        let dir = std::env::temp_dir().join(format!("shoreline-{}-no-tiles", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        assert!(Tiles::new(dir.clone(), TileMode::InMem).is_err());
        std::fs::remove_dir_all(dir).unwrap();
    }
}
