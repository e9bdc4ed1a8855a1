//! Scalar invariants derived from stress-like tensor fields.
//!
//! Result databases store the tensor under one key (`S`) and expose Mises
//! stress, pressure and the third invariant as derived values. A requested
//! name is split into the stored key and the invariant to apply with
//! [`FieldSelector::parse`]; [`derive_invariant`] then evaluates it at every
//! sample point before any reduction happens.
//!
//! Component order is `S11 S22 S33 S12 S13 S23` (3D) or `S11 S22 S33 S12`
//! (plane stress/strain, axisymmetric).

use crate::data::field::{FieldDescriptor, FieldType};
use crate::data::field_table::FieldTable;
use crate::result_error::ResultSieveError;
use std::fmt;

/// Key under which the stress tensor is stored.
pub const STRESS_KEY: &str = "S";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Invariant {
    /// Mises equivalent stress.
    Mises,
    /// Equivalent pressure stress, `-tr(s)/3`.
    Pressure,
    /// Third deviatoric invariant, sign preserving.
    ThirdInvariant,
}

impl Invariant {
    /// Output name of the invariant.
    pub const fn name(self) -> &'static str {
        match self {
            Invariant::Mises => "MISES",
            Invariant::Pressure => "PRESS",
            Invariant::ThirdInvariant => "INV3",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "MISES" => Some(Invariant::Mises),
            "PRESS" => Some(Invariant::Pressure),
            "INV3" => Some(Invariant::ThirdInvariant),
            _ => None,
        }
    }

    /// Value of the invariant for one tensor sample, or `None` if the sample
    /// has neither 4 nor 6 components.
    pub fn evaluate(self, s: &[f64]) -> Option<f64> {
        let [s11, s22, s33, s12, s13, s23] = match *s {
            [s11, s22, s33, s12, s13, s23] => [s11, s22, s33, s12, s13, s23],
            [s11, s22, s33, s12] => [s11, s22, s33, s12, 0.0, 0.0],
            _ => return None,
        };
        let value = match self {
            Invariant::Mises => {
                let normal = (s11 - s22).powi(2) + (s22 - s33).powi(2) + (s33 - s11).powi(2);
                let shear = s12 * s12 + s13 * s13 + s23 * s23;
                (0.5 * normal + 3.0 * shear).sqrt()
            }
            Invariant::Pressure => -(s11 + s22 + s33) / 3.0,
            Invariant::ThirdInvariant => {
                let mean = (s11 + s22 + s33) / 3.0;
                let (d11, d22, d33) = (s11 - mean, s22 - mean, s33 - mean);
                let det = d11 * (d22 * d33 - s23 * s23) - s12 * (s12 * d33 - s23 * s13)
                    + s13 * (s12 * s23 - d22 * s13);
                (13.5 * det).cbrt()
            }
        };
        Some(value)
    }
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A requested field name split into the stored key and an optional
/// invariant to derive from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldSelector {
    pub key: String,
    pub invariant: Option<Invariant>,
}

impl FieldSelector {
    /// `MISES`, `PRESS` and `INV3` map to the stress key; any other name is
    /// looked up as stored.
    pub fn parse(name: &str) -> Self {
        match Invariant::from_name(name) {
            Some(invariant) => Self {
                key: STRESS_KEY.to_string(),
                invariant: Some(invariant),
            },
            None => Self {
                key: name.to_string(),
                invariant: None,
            },
        }
    }

    /// Name reported in results.
    pub fn display_name(&self) -> &str {
        match self.invariant {
            Some(invariant) => invariant.name(),
            None => &self.key,
        }
    }
}

/// Scalar table holding `invariant` of every sample of `table`.
///
/// # Errors
/// `UnsupportedInvariant` unless the field has 4 or 6 components.
pub fn derive_invariant(
    table: &FieldTable,
    invariant: Invariant,
) -> Result<FieldTable, ResultSieveError> {
    let components = table.component_count();
    if components != 4 && components != 6 {
        return Err(ResultSieveError::UnsupportedInvariant {
            invariant: invariant.name().to_string(),
            field: table.name().to_string(),
            components,
        });
    }
    let descriptor = FieldDescriptor::new(
        invariant.name(),
        FieldType::Scalar,
        table.native_location(),
    );
    table.try_map_samples(descriptor, |s| {
        invariant.evaluate(s).map(|v| vec![v]).ok_or_else(|| {
            ResultSieveError::UnsupportedInvariant {
                invariant: invariant.name().to_string(),
                field: table.name().to_string(),
                components: s.len(),
            }
        })
    })
}
