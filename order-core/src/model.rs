use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartId(Uuid);

impl PartId {
    pub fn new() -> Self {
        PartId(Uuid::new_v4())
    }
}

impl Default for PartId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "part-{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(Uuid);

impl GroupId {
    pub fn new() -> Self {
        GroupId(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

// global drawing frame, mm
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.maxx - self.minx
    }

    pub fn height(&self) -> f64 {
        self.maxy - self.miny
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            minx: self.minx.min(other.minx),
            miny: self.miny.min(other.miny),
            maxx: self.maxx.max(other.maxx),
            maxy: self.maxy.max(other.maxy),
        }
    }
}

/// Opaque rendered image, carried as a `data:` URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    pub fn new(url: impl Into<String>) -> Self {
        PreviewHandle(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        let s = self.0.trim();
        s.is_empty() || s == "data:,"
    }
}

/// One outline reported by the drawing analyzer.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawPart {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub minx: f64,
    #[serde(default)]
    pub miny: f64,
    #[serde(default)]
    pub maxx: f64,
    #[serde(default)]
    pub maxy: f64,
    #[serde(default)]
    pub preview: PreviewHandle,
    #[serde(default)]
    pub preview_global: Option<PreviewHandle>,
}

impl RawPart {
    pub fn bounds(&self) -> Bounds {
        Bounds {
            minx: self.minx,
            miny: self.miny,
            maxx: self.maxx,
            maxy: self.maxy,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    pub group_id: Option<GroupId>,
    pub width: u32,
    pub height: u32,
    pub bounds: Bounds,
    pub price: u64,
    pub color: String,
    pub name: String,
    pub description: String,
    pub preview: PreviewHandle,
    pub preview_global: Option<PreviewHandle>,
    /// Constituents replaced by this part, in display order. Empty unless merged.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<Part>,
}

impl Part {
    /// Number of cut pieces billed under this part.
    pub fn part_count(&self) -> u32 {
        if self.parts.is_empty() {
            1
        } else {
            u32::try_from(self.parts.len()).unwrap_or(u32::MAX)
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.color.trim().is_empty() && !self.name.trim().is_empty()
    }

    pub fn size(&self) -> PartSize {
        PartSize {
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditableField {
    Color,
    Name,
    Description,
}

impl EditableField {
    pub const ALL: [EditableField; 3] = [Self::Color, Self::Name, Self::Description];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Name => "name",
            Self::Description => "description",
        }
    }
}

impl std::str::FromStr for EditableField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("not an editable field: {s}"))
    }
}

pub(crate) fn round_mm(v: f64) -> u32 {
    // callers reject negative and non-finite input
    v.round().min(f64::from(u32::MAX)) as u32
}
