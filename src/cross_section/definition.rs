//! Cross-section definitions as a closed set of variants.
//!
//! Every variant exposes the same aggregate view: a flow width and an
//! ordered list of named sections (main channel, then flood plains). The
//! [`CrossSectionDefinition::Proxy`] variant wraps another definition, shifts
//! its levels and otherwise forwards every query unchanged.

use serde::{Deserialize, Serialize};

/// Names of the roughness sections, in the order they are laid out from the
/// channel axis outwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionType {
    Main,
    FloodPlain1,
    FloodPlain2,
}

/// One named section and its width.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionType,
    pub width: f64,
}

/// Row of a tabulated Z-W profile.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZwRow {
    /// Level.
    pub z: f64,
    /// Total width at this level.
    pub total_width: f64,
    /// Part of the total width that only stores water.
    pub storage_width: f64,
}

impl ZwRow {
    pub const fn new(z: f64, total_width: f64, storage_width: f64) -> Self {
        Self {
            z,
            total_width,
            storage_width,
        }
    }

    /// Width that conveys flow.
    pub fn flow_width(&self) -> f64 {
        self.total_width - self.storage_width
    }
}

/// Parametric shape kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StandardShape {
    Rectangle,
    Trapezium,
    Elliptical,
    Cunette,
    SteelCunette,
    Arch,
}

/// The tabulated and parametric profile variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileKind {
    Zw,
    Yz,
    Xyz,
    Standard(StandardShape),
}

/// Tabulated level/width profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ZwProfile {
    pub rows: Vec<ZwRow>,
    pub sections: Vec<Section>,
}

impl ZwProfile {
    pub fn new(rows: Vec<ZwRow>) -> Self {
        Self {
            rows,
            sections: Vec::new(),
        }
    }
}

/// Transverse (y, z) profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct YzProfile {
    pub points: Vec<(f64, f64)>,
    pub sections: Vec<Section>,
}

/// Georeferenced (x, y, z) profile.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct XyzProfile {
    pub points: Vec<(f64, f64, f64)>,
    pub sections: Vec<Section>,
}

/// Parametric profile described by its shape and overall width.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StandardProfile {
    pub shape: StandardShape,
    pub width: f64,
    pub height: f64,
    pub sections: Vec<Section>,
}

/// Shared definition shifted by a level offset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProxyDefinition {
    pub inner: Box<CrossSectionDefinition>,
    pub level_shift: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CrossSectionDefinition {
    Zw(ZwProfile),
    Yz(YzProfile),
    Xyz(XyzProfile),
    Standard(StandardProfile),
    Proxy(ProxyDefinition),
}

impl CrossSectionDefinition {
    /// Wrap `inner` in a proxy shifted by `level_shift`.
    pub fn proxy(inner: CrossSectionDefinition, level_shift: f64) -> Self {
        Self::Proxy(ProxyDefinition {
            inner: Box::new(inner),
            level_shift,
        })
    }

    /// The definition a proxy chain finally resolves to.
    pub fn resolved(&self) -> &CrossSectionDefinition {
        let mut def = self;
        while let Self::Proxy(p) = def {
            def = &p.inner;
        }
        def
    }

    /// Profile kind, looking through proxies.
    pub fn kind(&self) -> ProfileKind {
        match self {
            Self::Zw(_) => ProfileKind::Zw,
            Self::Yz(_) => ProfileKind::Yz,
            Self::Xyz(_) => ProfileKind::Xyz,
            Self::Standard(s) => ProfileKind::Standard(s.shape),
            Self::Proxy(p) => p.inner.kind(),
        }
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }

    /// Maximum width that conveys flow.
    pub fn flow_width(&self) -> f64 {
        match self {
            Self::Zw(p) => p
                .rows
                .iter()
                .map(ZwRow::flow_width)
                .fold(0.0, f64::max),
            Self::Yz(p) => extent(p.points.iter().map(|&(y, _)| y)),
            Self::Xyz(p) => match (p.points.first(), p.points.last()) {
                (Some(a), Some(b)) => (b.0 - a.0).hypot(b.1 - a.1),
                _ => 0.0,
            },
            Self::Standard(p) => p.width,
            Self::Proxy(p) => p.inner.flow_width(),
        }
    }

    /// Named sections, main channel first.
    pub fn sections(&self) -> &[Section] {
        match self {
            Self::Zw(p) => &p.sections,
            Self::Yz(p) => &p.sections,
            Self::Xyz(p) => &p.sections,
            Self::Standard(p) => &p.sections,
            Self::Proxy(p) => p.inner.sections(),
        }
    }

    /// Append a section. On a proxy the wrapped definition is changed.
    pub fn add_section(&mut self, kind: SectionType, width: f64) {
        let section = Section { kind, width };
        match self {
            Self::Zw(p) => p.sections.push(section),
            Self::Yz(p) => p.sections.push(section),
            Self::Xyz(p) => p.sections.push(section),
            Self::Standard(p) => p.sections.push(section),
            Self::Proxy(p) => p.inner.add_section(kind, width),
        }
    }

    /// Width of the first section of the given type.
    pub fn section_width(&self, kind: SectionType) -> Option<f64> {
        self.sections()
            .iter()
            .find(|s| s.kind == kind)
            .map(|s| s.width)
    }

    /// Z-W rows with any proxy level shift applied; `None` for other profiles.
    pub fn zw_rows(&self) -> Option<Vec<ZwRow>> {
        match self {
            Self::Zw(p) => Some(p.rows.clone()),
            Self::Proxy(p) => p.inner.zw_rows().map(|rows| {
                rows.into_iter()
                    .map(|r| ZwRow {
                        z: r.z + p.level_shift,
                        ..r
                    })
                    .collect()
            }),
            _ => None,
        }
    }
}

fn extent(values: impl Iterator<Item = f64>) -> f64 {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if hi >= lo { hi - lo } else { 0.0 }
}
