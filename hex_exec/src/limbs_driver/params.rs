//! Parameters structure for LimbsDriver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use super::LimbsDriverError;
use crate::kinematics::{AngleLimitPolicy, LimbGeometry, LinkGeometry};
use crate::NUM_LIMBS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the limbs driver.
///
/// Every field is optional in the file, a missing field is a configuration
/// error reported at initialisation.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Limbs in the order LF, LM, LR, RF, RM, RR.
    pub limbs: Vec<LimbParams>,

    /// Number of trajectory steps of a move until a sequence sets its own.
    pub default_smoothness: Option<u32>,

    /// Treatment of solved angles outside of the joint limits.
    pub angle_limit_policy: Option<AngleLimitPolicy>,
}

/// Parameters of one limb.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimbParams {
    pub coxa: LinkParams,
    pub femur: LinkParams,
    pub tibia: LinkParams,

    /// Foot position at power on.
    ///
    /// Units: millimetres, `[x, y, z]`
    pub start_position_mm: Option<[f64; 3]>,
}

/// Parameters of one link.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkParams {
    /// Units: millimetres, greater than zero
    pub length_mm: Option<f64>,

    /// Units: degrees, in [-360, 360]
    pub zero_rotate_deg: Option<f64>,

    /// Units: degrees
    pub min_angle_deg: Option<f64>,

    /// Units: degrees
    pub max_angle_deg: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Validate the parameters and extract the geometry and start position
    /// of every limb.
    pub fn limbs_config(
        &self,
    ) -> Result<[(LimbGeometry, Point3<f64>); NUM_LIMBS], LimbsDriverError> {
        if self.limbs.len() != NUM_LIMBS {
            return Err(LimbsDriverError::InvalidParams(format!(
                "expected {} limbs, found {}",
                NUM_LIMBS,
                self.limbs.len()
            )));
        }

        let mut out = [(LimbGeometry::default(), Point3::origin()); NUM_LIMBS];

        for (i, limb) in self.limbs.iter().enumerate() {
            let geom = LimbGeometry {
                coxa: limb.coxa.geometry(i, "coxa")?,
                femur: limb.femur.geometry(i, "femur")?,
                tibia: limb.tibia.geometry(i, "tibia")?,
            };
            let start = match limb.start_position_mm {
                Some(p) => Point3::new(p[0], p[1], p[2]),
                None => return Err(missing(i, "start_position_mm")),
            };
            out[i] = (geom, start);
        }

        Ok(out)
    }

    pub fn smoothness(&self) -> Result<u32, LimbsDriverError> {
        match self.default_smoothness {
            Some(0) => Err(LimbsDriverError::InvalidParams(
                "default_smoothness must be at least 1".into(),
            )),
            Some(s) => Ok(s),
            None => Err(LimbsDriverError::InvalidParams(
                "default_smoothness is not set".into(),
            )),
        }
    }

    pub fn policy(&self) -> Result<AngleLimitPolicy, LimbsDriverError> {
        self.angle_limit_policy.ok_or_else(|| {
            LimbsDriverError::InvalidParams("angle_limit_policy is not set".into())
        })
    }
}

impl LinkParams {
    fn geometry(&self, limb: usize, name: &str) -> Result<LinkGeometry, LimbsDriverError> {
        let field = |v: Option<f64>, f: &str| v.ok_or_else(|| missing(limb, &format!("{}.{}", name, f)));

        let geom = LinkGeometry {
            length_mm: field(self.length_mm, "length_mm")?,
            zero_rotate_deg: field(self.zero_rotate_deg, "zero_rotate_deg")?,
            min_angle_deg: field(self.min_angle_deg, "min_angle_deg")?,
            max_angle_deg: field(self.max_angle_deg, "max_angle_deg")?,
        };

        if !(geom.length_mm > 0.0) {
            return Err(LimbsDriverError::InvalidParams(format!(
                "limb {} {}.length_mm must be positive, found {}",
                limb, name, geom.length_mm
            )));
        }
        if !(-360.0..=360.0).contains(&geom.zero_rotate_deg) {
            return Err(LimbsDriverError::InvalidParams(format!(
                "limb {} {}.zero_rotate_deg must be in [-360, 360], found {}",
                limb, name, geom.zero_rotate_deg
            )));
        }
        if geom.min_angle_deg > geom.max_angle_deg {
            return Err(LimbsDriverError::InvalidParams(format!(
                "limb {} {} has min_angle_deg above max_angle_deg",
                limb, name
            )));
        }

        Ok(geom)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn missing(limb: usize, field: &str) -> LimbsDriverError {
    LimbsDriverError::InvalidParams(format!("limb {} {} is not set", limb, field))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::limbs_params as default_params;

    #[test]
    fn test_valid_params() {
        let cfg = default_params().limbs_config().unwrap();
        assert_eq!(cfg[0].0.coxa.zero_rotate_deg, 180.0);
        assert_eq!(cfg[5].1, Point3::new(150.0, -30.0, -60.0));
    }

    #[test]
    fn test_missing_fields() {
        let mut p = default_params();
        p.limbs[2].femur.length_mm = None;
        assert!(matches!(
            p.limbs_config(),
            Err(LimbsDriverError::InvalidParams(_))
        ));

        let mut p = default_params();
        p.limbs.pop();
        assert!(p.limbs_config().is_err());

        let mut p = default_params();
        p.default_smoothness = None;
        assert!(p.smoothness().is_err());

        let mut p = default_params();
        p.angle_limit_policy = None;
        assert!(p.policy().is_err());
    }

    #[test]
    fn test_zero_rotate_range() {
        let mut p = default_params();
        p.limbs[4].coxa.zero_rotate_deg = Some(361.0);
        assert!(p.limbs_config().is_err());

        p.limbs[4].coxa.zero_rotate_deg = Some(-360.0);
        assert!(p.limbs_config().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let p: Params = util::params::from_str(
            r#"
            default_smoothness = 20
            angle_limit_policy = "Clamp"

            [[limbs]]
            start_position_mm = [-150.0, -30.0, 60.0]

            [limbs.coxa]
            length_mm = 40.0
            zero_rotate_deg = 180.0
            min_angle_deg = -90.0
            max_angle_deg = 90.0
            "#,
        )
        .unwrap();

        assert_eq!(p.default_smoothness, Some(20));
        assert_eq!(p.angle_limit_policy, Some(AngleLimitPolicy::Clamp));
        assert_eq!(p.limbs.len(), 1);
        assert_eq!(p.limbs[0].coxa.length_mm, Some(40.0));
        assert_eq!(p.limbs[0].femur.length_mm, None);
    }
}
