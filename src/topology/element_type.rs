//! Element type metadata: solver element codes and their integration-point counts.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// Integration points of the common continuum, shell, and membrane codes.
///
/// Plane-stress (`CPS`), plane-strain (`CPE`, `CPEG`) and axisymmetric (`CAX`)
/// families share their layouts and are expanded below.
static IP_COUNTS: Lazy<HashMap<String, u16>> = Lazy::new(|| {
    let mut table: HashMap<String, u16> = [
        ("C3D4", 1),
        ("C3D10", 4),
        ("C3D10M", 4),
        ("C3D6", 2),
        ("C3D15", 9),
        ("C3D8", 8),
        ("C3D8R", 1),
        ("C3D8I", 8),
        ("C3D20", 27),
        ("C3D20R", 8),
        ("S3", 1),
        ("S3R", 1),
        ("S4", 4),
        ("S4R", 1),
        ("S8R", 4),
        ("M3D3", 1),
        ("M3D4", 4),
        ("M3D4R", 1),
        ("T2D2", 1),
        ("T3D2", 1),
    ]
    .into_iter()
    .map(|(code, n)| (code.to_string(), n))
    .collect();

    let planar = [
        ("3", 1),
        ("4", 4),
        ("4R", 1),
        ("4I", 4),
        ("6", 3),
        ("6M", 3),
        ("8", 9),
        ("8R", 4),
    ];
    for family in ["CPS", "CPE", "CPEG", "CAX"] {
        for (suffix, n) in planar {
            table.insert(format!("{family}{suffix}"), n);
        }
    }
    table
});

/// Element type of one element, identified by the solver's element code.
///
/// The code determines the number of integration points. Codes missing from
/// the built-in table can still be used; supply the count with
/// [`ElementType::with_ip_count`] if per-IP validation is wanted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ElementType {
    code: String,
    ip_count: Option<u16>,
}

impl ElementType {
    /// Element type for `code`, looked up case-insensitively.
    ///
    /// A trailing hybrid marker (`H`, as in `C3D8RH`) does not change the
    /// integration layout and is ignored for the lookup.
    pub fn new(code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        let ip_count = lookup_ip_count(&code);
        Self { code, ip_count }
    }

    /// Element type with an explicit integration-point count.
    pub fn with_ip_count(code: &str, ip_count: u16) -> Self {
        Self {
            code: code.trim().to_ascii_uppercase(),
            ip_count: Some(ip_count),
        }
    }

    /// The normalized element code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Number of integration points, when known.
    pub fn integration_points(&self) -> Option<u16> {
        self.ip_count
    }
}

fn lookup_ip_count(code: &str) -> Option<u16> {
    if let Some(&n) = IP_COUNTS.get(code) {
        return Some(n);
    }
    code.strip_suffix('H')
        .and_then(|base| IP_COUNTS.get(base).copied())
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
