//! Vertical coordinate model: converts level coordinates to meters above
//! mean sea level.
//!
//! Covers seven vertical coordinate types. `VGSGPH3` (hydrostatic sigma-P),
//! `VGSGPN3` (non-hydrostatic sigma-P), and `VGWRFEM` (WRF sigma-P) share one
//! formula and are kept as distinct enum variants purely so callers can
//! round-trip the original vertical-grid type code; they are never treated
//! differently here.

use crate::error::{RegridError, Result};

/// Which vertical coordinate a [`VerticalModel`]'s `levels` represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalKind {
    /// Hydrostatic sigma-pressure (MM5 `VGSGPH3`).
    HydrostaticSigmaP,
    /// Non-hydrostatic sigma-pressure (MM5 `VGSGPN3`).
    NonHydrostaticSigmaP,
    /// WRF sigma-pressure (`VGWRFEM`).
    WrfSigmaP,
    /// Linear sigma-Z blend between the surface and model top.
    SigmaZ,
    /// Pressure in Pascals.
    PressurePa,
    /// Meters above mean sea level.
    Z,
    /// Meters above ground level.
    H,
}

impl VerticalKind {
    /// The three MM5-style sigma-pressure variants share the same formula.
    fn is_sigma_p_family(self) -> bool {
        matches!(
            self,
            VerticalKind::HydrostaticSigmaP
                | VerticalKind::NonHydrostaticSigmaP
                | VerticalKind::WrfSigmaP
        )
    }

    /// Sigma-type coordinates (the sigma-P family and sigma-Z) are bounded
    /// in `[0, 1]`; everything else is bounded in `[-1000, 1e6]`
    /// meters/Pascals.
    fn is_sigma_bounded(self) -> bool {
        self.is_sigma_p_family() || matches!(self, VerticalKind::SigmaZ)
    }

    /// Levels decrease with increasing altitude for the sigma types and for
    /// pressure (higher pressure = lower up); Z and H increase with
    /// altitude by definition.
    fn levels_decrease_with_altitude(self) -> bool {
        self.is_sigma_bounded() || matches!(self, VerticalKind::PressurePa)
    }
}

/// Vertical coordinate model: {type, top_pressure, levels, physical constants}.
#[derive(Debug, Clone)]
pub struct VerticalModel {
    kind: VerticalKind,
    /// Model-top pressure `Pt`, used by the sigma-pressure family.
    top_pressure: f64,
    /// Layer-edge level values, length `layers + 1`.
    levels: Vec<f64>,
    /// Gravitational acceleration.
    g: f64,
    /// Dry-air gas constant.
    r: f64,
    /// MM5 lapse-rate constant `A`.
    a: f64,
    /// Reference surface temperature `T0s`.
    t0s: f64,
    /// Reference surface pressure `P00`.
    p00: f64,
    /// Model-top height, used by the sigma-Z blend.
    z_top: f64,
}

impl VerticalModel {
    /// Build a vertical model, validating the level schedule's monotonicity
    /// and bounds.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: VerticalKind,
        top_pressure: f64,
        levels: Vec<f64>,
        g: f64,
        r: f64,
        a: f64,
        t0s: f64,
        p00: f64,
        z_top: f64,
    ) -> Result<Self> {
        if levels.len() < 2 {
            return Err(RegridError::InvalidArgument(
                "vertical model needs at least 2 level edges (1 layer)".into(),
            ));
        }
        if levels.iter().any(|v| !v.is_finite()) {
            return Err(RegridError::InvalidArgument(
                "vertical model levels must be finite".into(),
            ));
        }

        if kind.levels_decrease_with_altitude() {
            let strictly_decreasing = levels.windows(2).all(|w| w[0] > w[1]);
            if !strictly_decreasing {
                return Err(RegridError::InvalidArgument(
                    "levels must be strictly decreasing with altitude".into(),
                ));
            }
        } else {
            let strictly_increasing = levels.windows(2).all(|w| w[0] < w[1]);
            if !strictly_increasing {
                return Err(RegridError::InvalidArgument(
                    "levels must be strictly increasing with altitude".into(),
                ));
            }
        }

        if kind.is_sigma_bounded() {
            if levels.iter().any(|&v| !(0.0..=1.0).contains(&v)) {
                return Err(RegridError::InvalidArgument(
                    "sigma-type levels must lie in [0, 1]".into(),
                ));
            }
        } else {
            let min = levels.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = levels.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            if min < -1000.0 || max > 1.0e6 {
                return Err(RegridError::InvalidArgument(format!(
                    "non-sigma levels must lie in [-1000, 1e6], got [{min}, {max}]"
                )));
            }
        }

        if !g.is_finite() || g <= 0.0 {
            return Err(RegridError::InvalidArgument(
                "g must be finite and > 0".into(),
            ));
        }

        Ok(Self {
            kind,
            top_pressure,
            levels,
            g,
            r,
            a,
            t0s,
            p00,
            z_top,
        })
    }

    pub fn kind(&self) -> VerticalKind {
        self.kind
    }

    /// Number of layers (`levels.len() - 1`).
    pub fn layers(&self) -> usize {
        self.levels.len() - 1
    }

    /// Compute the layer-edge elevations `z[0..=layers]` in meters above MSL
    /// for the given terrain elevation, in strictly increasing order.
    ///
    /// This is pure and stateless; callers that regrid many points with the
    /// same or similar surface elevations should memoize the result
    /// themselves against a recomputation threshold — see
    /// [`crate::grid::Grid`]'s per-worker scratch buffer.
    pub fn compute_edges(&self, surface_elevation: f64) -> Result<Vec<f64>> {
        let mut z = Vec::with_capacity(self.levels.len());
        for &level in &self.levels {
            let edge = self.edge_z(level, surface_elevation)?;
            z.push(edge);
        }
        if z.iter().any(|v| !v.is_finite()) {
            return Err(RegridError::DomainError(
                "vertical model produced a non-finite elevation".into(),
            ));
        }
        if !z.windows(2).all(|w| w[0] < w[1]) {
            return Err(RegridError::DomainError(
                "vertical model produced a non-monotonic elevation schedule".into(),
            ));
        }
        Ok(z)
    }

    fn edge_z(&self, level: f64, zs: f64) -> Result<f64> {
        match self.kind {
            VerticalKind::HydrostaticSigmaP
            | VerticalKind::NonHydrostaticSigmaP
            | VerticalKind::WrfSigmaP => self.mm5_sigma_p(level, zs),
            VerticalKind::SigmaZ => Ok(zs + level * (self.z_top - zs)),
            VerticalKind::PressurePa => {
                let p_hpa = level / 100.0;
                if p_hpa <= 0.0 {
                    return Err(RegridError::DomainError(
                        "pressure level must be positive".into(),
                    ));
                }
                Ok(-7200.0 * (p_hpa / 1012.5).ln())
            }
            VerticalKind::Z => Ok(level),
            VerticalKind::H => Ok(zs + level),
        }
    }

    /// MM5 hydrostatic sigma-pressure formula:
    /// `H0s = R*T0s/g`, `q* = sigma_p + (1-sigma_p)*(Pt/P00)*exp(2*Zs/H0s/sqrt)`,
    /// `z = Zs - H0s*ln(q*)*(A/(2*T0s)*ln(q*) + sqrt)`.
    fn mm5_sigma_p(&self, sigma_p: f64, zs: f64) -> Result<f64> {
        let h0s = self.r * self.t0s / self.g;
        let inner = 1.0 - 2.0 * self.a / self.t0s / h0s * zs;
        if inner < 0.0 {
            return Err(RegridError::DomainError(
                "mm5 sigma-p: sqrt of a negative number".into(),
            ));
        }
        let sq = inner.sqrt();
        let q_star = sigma_p
            + (1.0 - sigma_p) * (self.top_pressure / self.p00) * (2.0 * zs / h0s / sq).exp();
        if q_star <= 0.0 {
            return Err(RegridError::DomainError(
                "mm5 sigma-p: log of a non-positive q*".into(),
            ));
        }
        let ln_q = q_star.ln();
        Ok(zs - h0s * ln_q * (self.a / (2.0 * self.t0s) * ln_q + sq))
    }
}
