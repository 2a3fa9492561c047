//! ESRI EHdr float grid (`.hdr` + `.flt`) elevation rasters.
//!
//! A grid is a pair of files sharing a stem: a plain text `.hdr`
//! header and a headerless `.flt` file of `ncols * nrows` 32-bit
//! floats, stored row-major from the north-west corner.
//!
//! # References
//!
//! 1. [GDAL EHdr driver](https://gdal.org/drivers/raster/ehdr.html)
//! 1. [ESRI GridFloat](https://desktop.arcgis.com/en/arcmap/latest/manage-data/raster-and-images/bil-bip-and-bsq-raster-files.htm)

mod error;
mod header;

pub use crate::{
    error::GridError,
    header::{Endian, GeoTransform, Header},
};
use byteorder::{BigEndian as BE, ByteOrder, LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use geo::{
    geometry::{Coord, Polygon},
    polygon,
};
use memmap2::Mmap;
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    mem::size_of,
    path::{Path, PathBuf},
};

/// Base floating point type used for all coordinates and calculations.
pub type C = f64;

/// No-data value written by this crate unless told otherwise.
pub const DEFAULT_NODATA: f32 = -9999.0;

pub struct Grid {
    header: Header,

    /// Elevation samples.
    samples: SampleStore,
}

enum SampleStore {
    InMem(Box<[f32]>),
    MemMap(Mmap, Endian),
}

impl SampleStore {
    fn get_unchecked(&self, index: usize) -> f32 {
        match self {
            Self::InMem(samples) => samples[index],
            Self::MemMap(raw, endian) => {
                let start = index * size_of::<f32>();
                let bytes = &raw[start..start + size_of::<f32>()];
                match endian {
                    Endian::Little => LE::read_f32(bytes),
                    Endian::Big => BE::read_f32(bytes),
                }
            }
        }
    }
}

impl Grid {
    /// Returns a grid built from row-major `samples`.
    pub fn new(header: Header, samples: Vec<f32>) -> Result<Self, GridError> {
        if samples.len() != header.len() {
            return Err(GridError::SampleCount(
                samples.len(),
                header.ncols,
                header.nrows,
            ));
        }
        Ok(Self {
            header,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a grid with every sample set to `value`.
    pub fn filled(header: Header, value: f32) -> Self {
        Self {
            header,
            samples: SampleStore::InMem(vec![value; header.len()].into_boxed_slice()),
        }
    }

    /// Returns a Grid read into memory from the file at `path`.
    ///
    /// `path` may name either the `.flt` or the `.hdr` file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        let (header, flt_path) = open_header(path.as_ref())?;
        check_len(&header, &flt_path)?;
        let mut file = BufReader::new(File::open(&flt_path)?);
        let mut samples = Vec::with_capacity(header.len());
        for _ in 0..header.len() {
            let sample = match header.endian {
                Endian::Little => file.read_f32::<LE>()?,
                Endian::Big => file.read_f32::<BE>()?,
            };
            samples.push(sample);
        }
        Ok(Self {
            header,
            samples: SampleStore::InMem(samples.into_boxed_slice()),
        })
    }

    /// Returns a Grid using the memory-mapped sample file as storage.
    pub fn memmap<P: AsRef<Path>>(path: P) -> Result<Self, GridError> {
        let (header, flt_path) = open_header(path.as_ref())?;
        check_len(&header, &flt_path)?;
        let samples = {
            let file = File::open(flt_path)?;
            let mmap = unsafe { Mmap::map(&file)? };
            SampleStore::MemMap(mmap, header.endian)
        };
        Ok(Self { header, samples })
    }

    /// Writes this grid as `path` (`.flt`) plus its `.hdr` sidecar.
    ///
    /// Samples are always written little-endian.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), GridError> {
        let flt_path = path.as_ref().with_extension("flt");
        let header = Header {
            endian: Endian::Little,
            ..self.header
        };
        header.write(BufWriter::new(File::create(hdr_path(&flt_path))?))?;
        let mut out = BufWriter::new(File::create(&flt_path)?);
        for idx in 0..self.header.len() {
            out.write_f32::<LE>(self.samples.get_unchecked(idx))?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Returns `(nrows, ncols)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.header.nrows, self.header.ncols)
    }

    /// Returns the number of samples in this grid.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.header.len()
    }

    pub fn nodata(&self) -> f32 {
        self.header.nodata
    }

    pub fn geo_transform(&self) -> GeoTransform {
        self.header.geo_transform()
    }

    /// Returns the raw sample at `(row, col)`, no-data included.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.header.nrows && col < self.header.ncols {
            Some(self.samples.get_unchecked(row * self.header.ncols + col))
        } else {
            None
        }
    }

    /// Returns the sample at `(row, col)` unless it is out of bounds,
    /// no-data, or NaN.
    pub fn value(&self, row: usize, col: usize) -> Option<f32> {
        self.get(row, col)
            .filter(|sample| !sample.is_nan() && *sample != self.header.nodata)
    }

    /// Returns the raw sample of the cell containing `coord`.
    pub fn sample(&self, coord: Coord<C>) -> Option<f32> {
        let (row, col) = self.geo_transform().pixel(coord.x, coord.y);
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        self.get(row, col)
    }

    /// Returns min, max, mean and standard deviation of all valid
    /// samples.
    pub fn statistics(&self) -> Statistics {
        let (nrows, ncols) = self.dimensions();
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut count = 0_usize;
        for row in 0..nrows {
            for col in 0..ncols {
                if let Some(sample) = self.value(row, col) {
                    let sample = f64::from(sample);
                    min = min.min(sample);
                    max = max.max(sample);
                    sum += sample;
                    sum_sq += sample * sample;
                    count += 1;
                }
            }
        }
        if count == 0 {
            return Statistics::default();
        }
        #[allow(clippy::cast_precision_loss)]
        let n = count as f64;
        let mean = sum / n;
        let stddev = (sum_sq / n - mean * mean).max(0.0).sqrt();
        Statistics {
            min,
            max,
            mean,
            stddev,
            count,
        }
    }

    /// Returns this grid's extent.
    pub fn polygon(&self) -> Polygon<C> {
        let gt = self.geo_transform();
        #[allow(clippy::cast_precision_loss)]
        let e = gt.x_origin + self.header.ncols as C * gt.pixel_width;
        #[allow(clippy::cast_precision_loss)]
        let s = gt.y_origin - self.header.nrows as C * gt.pixel_height;
        let (w, n) = (gt.x_origin, gt.y_origin);
        polygon![
            (x: w, y: s),
            (x: e, y: s),
            (x: e, y: n),
            (x: w, y: n),
            (x: w, y: s),
        ]
    }
}

/// Summary of the valid samples in a grid.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation.
    pub stddev: f64,
    /// Number of valid samples.
    pub count: usize,
}

impl Statistics {
    /// A clip whose mean and standard deviation are both exactly zero
    /// carries no terrain (typically it fell outside the source).
    pub fn is_degenerate(&self) -> bool {
        self.mean == 0.0 && self.stddev == 0.0
    }
}

/// Returns the `.hdr` sidecar path for a grid path.
pub fn hdr_path(path: &Path) -> PathBuf {
    path.with_extension("hdr")
}

/// Returns the `.flt` sample path for a grid path.
pub fn flt_path(path: &Path) -> PathBuf {
    path.with_extension("flt")
}

/// Returns `true` if both files of the grid at `path` exist.
pub fn exists(path: &Path) -> bool {
    hdr_path(path).exists() && flt_path(path).exists()
}

fn open_header(path: &Path) -> Result<(Header, PathBuf), GridError> {
    let hdr = hdr_path(path);
    let rdr = BufReader::new(File::open(&hdr)?);
    let header = Header::parse(rdr, &hdr)?;
    Ok((header, flt_path(path)))
}

fn check_len(header: &Header, flt_path: &Path) -> Result<(), GridError> {
    let expected = header
        .sample_bytes()
        .ok_or_else(|| GridError::Dimensions {
            ncols: header.ncols,
            nrows: header.nrows,
            path: flt_path.to_owned(),
        })? as u64;
    let actual = flt_path.metadata()?.len();
    if actual == expected {
        Ok(())
    } else {
        Err(GridError::FltLen(actual, flt_path.to_owned(), expected))
    }
}

#[cfg(test)]
mod tests {
    use super::{Endian, Grid, GridError, Header, Statistics};
    use approx::assert_relative_eq;
    use geo::geometry::Coord;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("demgrid-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn header(ncols: usize, nrows: usize) -> Header {
        Header {
            ncols,
            nrows,
            xllcorner: 500.0,
            yllcorner: 1000.0,
            cellsize: 1.0,
            nodata: -9999.0,
            endian: Endian::Little,
        }
    }

    fn ramp() -> Grid {
        // 3 rows x 4 cols, north row first.
        let samples = vec![
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, -9999.0, 8.0, //
            9.0, 10.0, 11.0, 12.0,
        ];
        Grid::new(header(4, 3), samples).unwrap()
    }

    #[test]
    fn test_sample_count_mismatch() {
        assert!(matches!(
            Grid::new(header(2, 2), vec![0.0; 3]),
            Err(GridError::SampleCount(3, 2, 2))
        ));
    }

    #[test]
    fn test_geo_index() {
        let grid = ramp();
        // North-west cell.
        assert_eq!(grid.sample(Coord { x: 500.5, y: 1002.9 }), Some(1.0));
        // South-east cell.
        assert_eq!(grid.sample(Coord { x: 503.9, y: 1000.1 }), Some(12.0));
        assert_eq!(grid.value(1, 2), None);
        assert_eq!(grid.get(1, 2), Some(-9999.0));
    }

    #[test]
    fn test_out_of_bounds_get_returns_none() {
        let grid = ramp();
        // A smidge north.
        assert_eq!(grid.sample(Coord { x: 501.0, y: 1003.1 }), None);
        // A smidge east.
        assert_eq!(grid.sample(Coord { x: 504.1, y: 1001.0 }), None);
        // A smidge south.
        assert_eq!(grid.sample(Coord { x: 501.0, y: 999.9 }), None);
        // A smidge west.
        assert_eq!(grid.sample(Coord { x: 499.9, y: 1001.0 }), None);
    }

    #[test]
    fn test_statistics_skip_nodata() {
        let stats = ramp().statistics();
        assert_eq!(stats.count, 11);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 12.0);
        assert_relative_eq!(stats.mean, 71.0 / 11.0, epsilon = 1e-12);
        assert!(!stats.is_degenerate());
    }

    #[test]
    fn test_all_nodata_is_degenerate() {
        let grid = Grid::filled(header(3, 3), -9999.0);
        assert_eq!(grid.statistics(), Statistics::default());
        assert!(grid.statistics().is_degenerate());
    }

    #[test]
    fn test_write_then_open() {
        let dir = scratch_dir("write");
        let path = dir.join("ramp.flt");
        let grid = ramp();
        grid.write(&path).unwrap();
        assert!(super::exists(&path));

        let loaded = Grid::load(&path).unwrap();
        let mapped = Grid::memmap(dir.join("ramp.hdr")).unwrap();
        assert_eq!(loaded.header(), grid.header());
        for row in 0..3 {
            for col in 0..4 {
                assert_eq!(loaded.get(row, col), grid.get(row, col));
                assert_eq!(mapped.get(row, col), grid.get(row, col));
            }
        }
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_truncated_sample_file() {
        let dir = scratch_dir("truncated");
        let path = dir.join("short.flt");
        ramp().write(&path).unwrap();
        std::fs::write(&path, [0_u8; 8]).unwrap();
        assert!(matches!(Grid::load(&path), Err(GridError::FltLen(8, _, 48))));
        std::fs::remove_dir_all(dir).unwrap();
    }
}
