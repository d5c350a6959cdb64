//! Ancillary wire/text formats the surrounding pipeline emits. The core
//! never performs file or socket I/O; these are pure formatting and
//! byte-order functions a caller wires up to its own output stream.

use crate::error::{RegridError, Result};
pub use crate::point::BADVAL;

/// Projection/grid geometry common to every header variant.
#[derive(Debug, Clone, Copy)]
pub struct GridHeader<'a> {
    pub ncols: usize,
    pub nrows: usize,
    pub xorig: f64,
    pub yorig: f64,
    pub xcell: f64,
    pub ycell: f64,
    /// Numeric vertical-grid type code.
    pub vgtyp: i32,
    pub vgtop: f64,
    pub vglvls: &'a [f64],
}

impl GridHeader<'_> {
    fn grid_line(&self) -> String {
        let levels = self
            .vglvls
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "# Grid: ncols nrows xorig yorig xcell ycell vgtyp vgtop vglvls[{}]:\n{} {} {} {} {} {} {} {} {}\n",
            self.vglvls.len(),
            self.ncols,
            self.nrows,
            self.xorig,
            self.yorig,
            self.xcell,
            self.ycell,
            self.vgtyp,
            self.vgtop,
            levels
        )
    }
}

/// `# lcc projection: lat_1 lat_2 lat_0 lon_0 major_semiaxis minor_semiaxis`.
pub fn format_lcc_header(
    lat1: f64,
    lat2: f64,
    lat0: f64,
    lon0: f64,
    major: f64,
    minor: f64,
    grid: &GridHeader<'_>,
) -> String {
    format!(
        "# lcc projection: lat_1 lat_2 lat_0 lon_0 major_semiaxis minor_semiaxis\n{lat1} {lat2} {lat0} {lon0} {major} {minor}\n{}",
        grid.grid_line()
    )
}

/// `# lonlat projection: major_semiaxis minor_semiaxis`.
pub fn format_lonlat_header(major: f64, minor: f64, grid: &GridHeader<'_>) -> String {
    format!(
        "# lonlat projection: major_semiaxis minor_semiaxis\n{major} {minor}\n{}",
        grid.grid_line()
    )
}

/// `# mercator projection: lat_ts lon_0 major_semiaxis minor_semiaxis`.
pub fn format_mercator_header(
    lat_ts: f64,
    lon0: f64,
    major: f64,
    minor: f64,
    grid: &GridHeader<'_>,
) -> String {
    format!(
        "# mercator projection: lat_ts lon_0 major_semiaxis minor_semiaxis\n{lat_ts} {lon0} {major} {minor}\n{}",
        grid.grid_line()
    )
}

/// `# stereographic projection: lat_ts lon_0 pole major_semiaxis minor_semiaxis`.
pub fn format_stereographic_header(
    lat_ts: f64,
    lon0: f64,
    pole: projection::Pole,
    major: f64,
    minor: f64,
    grid: &GridHeader<'_>,
) -> String {
    let pole = match pole {
        projection::Pole::North => "N",
        projection::Pole::South => "S",
    };
    format!(
        "# stereographic projection: lat_ts lon_0 pole major_semiaxis minor_semiaxis\n{lat_ts} {lon0} {pole} {major} {minor}\n{}",
        grid.grid_line()
    )
}

/// Encode a slice of doubles as big-endian (MSB) 64-bit IEEE-754 bytes.
/// The wire format is always big-endian regardless of host byte order.
pub fn encode_f64_be(values: &[f64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for &v in values {
        bytes.extend_from_slice(&v.to_be_bytes());
    }
    bytes
}

/// Inverse of [`encode_f64_be`].
pub fn decode_f64_be(bytes: &[u8]) -> Result<Vec<f64>> {
    if !bytes.len().is_multiple_of(8) {
        return Err(RegridError::DimensionMismatch(
            "byte buffer length must be a multiple of 8".into(),
        ));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| f64::from_be_bytes(chunk.try_into().expect("chunk is exactly 8 bytes")))
        .collect())
}

/// Encode a slice of 64-bit integers as big-endian bytes: used for swath
/// stream timestamp/point-count arrays.
pub fn encode_i64_be(values: &[i64]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for &v in values {
        bytes.extend_from_slice(&v.to_be_bytes());
    }
    bytes
}

/// Inverse of [`encode_i64_be`].
pub fn decode_i64_be(bytes: &[u8]) -> Result<Vec<i64>> {
    if !bytes.len().is_multiple_of(8) {
        return Err(RegridError::DimensionMismatch(
            "byte buffer length must be a multiple of 8".into(),
        ));
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| i64::from_be_bytes(chunk.try_into().expect("chunk is exactly 8 bytes")))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn f64_be_roundtrips() {
        let values = [1.0, -2.5, BADVAL, 0.0];
        let bytes = encode_f64_be(&values);
        assert_eq!(bytes.len(), 32);
        let decoded = decode_f64_be(&bytes).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn f64_encoding_is_actually_big_endian() {
        let bytes = encode_f64_be(&[1.0]);
        // 1.0_f64 = 0x3FF0000000000000; big-endian puts the sign/exponent
        // byte first.
        assert_eq!(bytes[0], 0x3F);
        assert_eq!(bytes[1], 0xF0);
    }

    #[test]
    fn i64_be_roundtrips() {
        let values = [1_700_000_000_i64, -1, 0, i64::MAX];
        let bytes = encode_i64_be(&values);
        let decoded = decode_i64_be(&bytes).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn decode_rejects_partial_word() {
        assert!(decode_f64_be(&[0u8; 7]).is_err());
    }

    #[test]
    fn lcc_header_matches_documented_shape() {
        let grid = GridHeader {
            ncols: 10,
            nrows: 10,
            xorig: -100.0,
            yorig: 30.0,
            xcell: 1.0,
            ycell: 1.0,
            vgtyp: 7,
            vgtop: 10000.0,
            vglvls: &[1.0, 0.5, 0.0],
        };
        let header = format_lcc_header(25.0, 25.0, 25.0, -95.0, 6_378_137.0, 6_356_752.3, &grid);
        assert!(header.starts_with(
            "# lcc projection: lat_1 lat_2 lat_0 lon_0 major_semiaxis minor_semiaxis\n"
        ));
        assert!(
            header.contains("# Grid: ncols nrows xorig yorig xcell ycell vgtyp vgtop vglvls[3]:\n")
        );
        assert!(header.contains("10 10 -100 30 1 1 7 10000"));
    }
}
