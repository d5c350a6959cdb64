//! Post-processing helpers: compaction and interleaved coordinate splitting
//! used by the site-data pipeline downstream of a regrid call.

use crate::error::{RegridError, Result};

/// Compact `packed[timestep * stations + station]` into a dense array of
/// length `sum(points)`, keeping only the first `points[timestep]` stations
/// of each timestep.
pub fn compact_real(packed: &[f64], stations: usize, points: &[usize]) -> Result<Vec<f64>> {
    compact(packed, stations, points)
}

/// Integer counterpart of [`compact_real`].
pub fn compact_int(packed: &[i64], stations: usize, points: &[usize]) -> Result<Vec<i64>> {
    compact(packed, stations, points)
}

fn compact<T: Copy>(packed: &[T], stations: usize, points: &[usize]) -> Result<Vec<T>> {
    if stations == 0 {
        return Err(RegridError::InvalidArgument("stations must be > 0".into()));
    }
    let timesteps = points.len();
    if packed.len() != timesteps * stations {
        return Err(RegridError::DimensionMismatch(format!(
            "packed array length {} does not match timesteps * stations = {}",
            packed.len(),
            timesteps * stations
        )));
    }
    if points.iter().any(|&p| p > stations) {
        return Err(RegridError::InvalidArgument(
            "points[timestep] must not exceed stations".into(),
        ));
    }

    let total: usize = points.iter().sum();
    let mut out = Vec::with_capacity(total);
    for (timestep, &count) in points.iter().enumerate() {
        let base = timestep * stations;
        out.extend_from_slice(&packed[base..base + count]);
    }
    Ok(out)
}

/// Split `[lon, lat, lon, lat, ...]` into two parallel arrays.
pub fn copy_lonlat_from_interleaved(interleaved: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
    if !interleaved.len().is_multiple_of(2) {
        return Err(RegridError::DimensionMismatch(
            "interleaved lon/lat array must have even length".into(),
        ));
    }
    let n = interleaved.len() / 2;
    let mut lon = Vec::with_capacity(n);
    let mut lat = Vec::with_capacity(n);
    for pair in interleaved.chunks_exact(2) {
        lon.push(pair[0]);
        lat.push(pair[1]);
    }
    Ok((lon, lat))
}
