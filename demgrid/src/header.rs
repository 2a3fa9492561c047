use crate::{GridError, C};
use std::{
    fmt,
    io::{BufRead, Write},
    path::Path,
};

/// Byte order of the raw `.flt` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// `LSBFIRST`
    Little,
    /// `MSBFIRST`
    Big,
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endian::Little => f.write_str("LSBFIRST"),
            Endian::Big => f.write_str("MSBFIRST"),
        }
    }
}

/// Contents of an EHdr `.hdr` sidecar file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Header {
    /// Number of columns.
    pub ncols: usize,

    /// Number of rows.
    pub nrows: usize,

    /// West edge of the grid (not the center of the first cell).
    pub xllcorner: C,

    /// South edge of the grid (not the center of the last row).
    pub yllcorner: C,

    /// Square cell size in map units.
    pub cellsize: C,

    /// Sample value marking missing data.
    pub nodata: f32,

    /// Byte order of the sample file.
    pub endian: Endian,
}

impl Header {
    /// Parses a header from `rdr`.
    ///
    /// Keys are matched case-insensitively. `xllcenter`/`yllcenter`
    /// are accepted in place of the corner keys and shifted by half a
    /// cell. `path` is only used for error reporting.
    pub fn parse<R: BufRead>(rdr: R, path: &Path) -> Result<Self, GridError> {
        let mut ncols = None;
        let mut nrows = None;
        let mut xll = None;
        let mut yll = None;
        let mut centered = (false, false);
        let mut cellsize = None;
        let mut nodata = None;
        let mut endian = Endian::Little;

        for line in rdr.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let bad_line = || GridError::HeaderLine {
                line: trimmed.to_string(),
                path: path.to_owned(),
            };
            let mut parts = trimmed.split_whitespace();
            let (key, value) = match (parts.next(), parts.next()) {
                (Some(key), Some(value)) => (key.to_ascii_lowercase(), value),
                _ => return Err(bad_line()),
            };
            match key.as_str() {
                "ncols" => ncols = Some(value.parse::<usize>().map_err(|_| bad_line())?),
                "nrows" => nrows = Some(value.parse::<usize>().map_err(|_| bad_line())?),
                "xllcorner" | "xllcenter" => {
                    centered.0 = key == "xllcenter";
                    xll = Some(value.parse::<C>().map_err(|_| bad_line())?);
                }
                "yllcorner" | "yllcenter" => {
                    centered.1 = key == "yllcenter";
                    yll = Some(value.parse::<C>().map_err(|_| bad_line())?);
                }
                "cellsize" => cellsize = Some(value.parse::<C>().map_err(|_| bad_line())?),
                "nodata_value" | "nodata" => {
                    nodata = Some(value.parse::<f32>().map_err(|_| bad_line())?);
                }
                "byteorder" => {
                    endian = match value.to_ascii_uppercase().as_str() {
                        "LSBFIRST" | "I" => Endian::Little,
                        "MSBFIRST" | "M" => Endian::Big,
                        _ => return Err(bad_line()),
                    }
                }
                // Other EHdr keys (nbits, layout, ...) carry nothing we
                // need for single band float grids.
                _ => (),
            }
        }

        let missing = |key| GridError::MissingKey {
            key,
            path: path.to_owned(),
        };
        let cellsize = cellsize.ok_or_else(|| missing("cellsize"))?;
        let half = cellsize / 2.0;
        let mut xllcorner = xll.ok_or_else(|| missing("xllcorner"))?;
        let mut yllcorner = yll.ok_or_else(|| missing("yllcorner"))?;
        if centered.0 {
            xllcorner -= half;
        }
        if centered.1 {
            yllcorner -= half;
        }

        let ncols = ncols.ok_or_else(|| missing("ncols"))?;
        let nrows = nrows.ok_or_else(|| missing("nrows"))?;
        if sample_bytes(ncols, nrows).is_none() {
            return Err(GridError::Dimensions {
                ncols,
                nrows,
                path: path.to_owned(),
            });
        }

        Ok(Self {
            ncols,
            nrows,
            xllcorner,
            yllcorner,
            cellsize,
            nodata: nodata.unwrap_or(crate::DEFAULT_NODATA),
            endian,
        })
    }

    /// Writes `self` in EHdr layout.
    pub fn write<W: Write>(&self, mut out: W) -> Result<(), GridError> {
        writeln!(out, "ncols         {}", self.ncols)?;
        writeln!(out, "nrows         {}", self.nrows)?;
        writeln!(out, "xllcorner     {}", self.xllcorner)?;
        writeln!(out, "yllcorner     {}", self.yllcorner)?;
        writeln!(out, "cellsize      {}", self.cellsize)?;
        writeln!(out, "NODATA_value  {}", self.nodata)?;
        writeln!(out, "byteorder     {}", self.endian)?;
        Ok(())
    }

    /// Returns the number of samples described by this header.
    pub fn len(&self) -> usize {
        self.ncols * self.nrows
    }

    /// Returns the size of the sample file, or `None` if it does not
    /// fit in `usize`.
    pub fn sample_bytes(&self) -> Option<usize> {
        sample_bytes(self.ncols, self.nrows)
    }

    /// Returns `true` if the header describes zero samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the pixel/geo affine mapping for this grid.
    pub fn geo_transform(&self) -> GeoTransform {
        #[allow(clippy::cast_precision_loss)]
        GeoTransform {
            x_origin: self.xllcorner,
            y_origin: self.yllcorner + self.nrows as C * self.cellsize,
            pixel_width: self.cellsize,
            pixel_height: self.cellsize,
        }
    }
}

/// North-up affine mapping between pixel and geo coordinates.
///
/// The origin is the _corner_ (not center) of the north-west most
/// cell. Rows grow southward, columns grow eastward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub x_origin: C,
    pub y_origin: C,
    pub pixel_width: C,
    pub pixel_height: C,
}

impl GeoTransform {
    /// Returns the `(row, col)` of the cell containing `(x, y)`.
    ///
    /// Results may be negative or beyond the grid dimensions; bounds
    /// checking is left to the caller.
    pub fn pixel(&self, x: C, y: C) -> (isize, isize) {
        #[allow(clippy::cast_possible_truncation)]
        let col = ((x - self.x_origin) / self.pixel_width).floor() as isize;
        #[allow(clippy::cast_possible_truncation)]
        let row = ((self.y_origin - y) / self.pixel_height).floor() as isize;
        (row, col)
    }

    /// Returns the geo coordinates of the center of `(row, col)`.
    pub fn pixel_center(&self, row: usize, col: usize) -> (C, C) {
        #[allow(clippy::cast_precision_loss)]
        let x = self.x_origin + (col as C + 0.5) * self.pixel_width;
        #[allow(clippy::cast_precision_loss)]
        let y = self.y_origin - (row as C + 0.5) * self.pixel_height;
        (x, y)
    }
}

fn sample_bytes(ncols: usize, nrows: usize) -> Option<usize> {
    ncols
        .checked_mul(nrows)?
        .checked_mul(std::mem::size_of::<f32>())
}

#[cfg(test)]
mod tests {
    use super::{Endian, GeoTransform, Header};
    use crate::GridError;
    use std::path::Path;

    #[test]
    fn test_parse_corner_header() {
        let raw = "ncols 4\nnrows 3\nxllcorner 100.0\nyllcorner 200.0\ncellsize 2\nNODATA_value -9999\nbyteorder LSBFIRST\n";
        let header = Header::parse(raw.as_bytes(), Path::new("test.hdr")).unwrap();
        assert_eq!(header.ncols, 4);
        assert_eq!(header.nrows, 3);
        assert_eq!(header.xllcorner, 100.0);
        assert_eq!(header.yllcorner, 200.0);
        assert_eq!(header.nodata, -9999.0);
        assert_eq!(header.endian, Endian::Little);
        assert_eq!(
            header.geo_transform(),
            GeoTransform {
                x_origin: 100.0,
                y_origin: 206.0,
                pixel_width: 2.0,
                pixel_height: 2.0,
            }
        );
    }

    #[test]
    fn test_parse_center_header() {
        let raw = "NCOLS 2\nNROWS 2\nXLLCENTER 1.0\nYLLCENTER 1.0\nCELLSIZE 2.0\nBYTEORDER M\n";
        let header = Header::parse(raw.as_bytes(), Path::new("test.hdr")).unwrap();
        assert_eq!(header.xllcorner, 0.0);
        assert_eq!(header.yllcorner, 0.0);
        assert_eq!(header.endian, Endian::Big);
        assert_eq!(header.nodata, crate::DEFAULT_NODATA);
    }

    #[test]
    fn test_missing_key() {
        let raw = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\n";
        assert!(Header::parse(raw.as_bytes(), Path::new("test.hdr")).is_err());
    }

    #[test]
    fn test_pixel_lookup() {
        let gt = GeoTransform {
            x_origin: 10.0,
            y_origin: 20.0,
            pixel_width: 0.5,
            pixel_height: 0.5,
        };
        assert_eq!(gt.pixel(10.1, 19.9), (0, 0));
        assert_eq!(gt.pixel(11.2, 18.4), (3, 2));
        assert_eq!(gt.pixel(9.9, 20.1), (-1, -1));
        assert_eq!(gt.pixel_center(3, 2), (11.25, 18.25));
    }

    #[test]
    fn test_oversized_header() {
        let raw = format!(
            "ncols {}\nnrows 3\nxllcorner 0\nyllcorner 0\ncellsize 1\n",
            usize::MAX / 2
        );
        assert!(matches!(
            Header::parse(raw.as_bytes(), Path::new("huge.hdr")),
            Err(GridError::Dimensions { nrows: 3, .. })
        ));

        let raw = "ncols 1000\nnrows 1000\nxllcorner 0\nyllcorner 0\ncellsize 1\n";
        let header = Header::parse(raw.as_bytes(), Path::new("ok.hdr")).unwrap();
        assert_eq!(header.sample_bytes(), Some(4_000_000));
    }
}
