//! Core document data model.
//!
//! A `Document` owns every `Node` by value in a flat id → node map. The tree
//! is expressed only through each node's ordered `children` list (paint /
//! z order, back to front). Pages point at their own root node; libraries
//! (styles, variables, components) and the prototype graph hang off the
//! document root aggregate.
//!
//! The in-memory model only carries the current (layered) representation of
//! fills and strokes. Legacy single-value mirrors live in `migrate::legacy`.

use crate::id::NodeId;
use crate::vector::VectorData;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Schema version stamped on every serialized document.
pub const CURRENT_VERSION: u32 = 12;

/// Default numeric tolerance for boolean resolution.
pub const DEFAULT_BOOLEAN_TOLERANCE: f64 = 0.001;

// ─── Geometry primitives ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn translate(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp both components to ≥ 1, the floor every size mutator enforces.
    pub fn clamped(self) -> Self {
        Self::new(clamp_dimension(self.width), clamp_dimension(self.height))
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::new(1.0, 1.0)
    }
}

fn clamp_dimension(v: f64) -> f64 {
    if v.is_finite() { v.max(1.0) } else { 1.0 }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_min_max(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Tight box around a set of points. `None` when the iterator is empty.
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::from_min_max(min_x, min_y, max_x, max_y))
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Inclusive containment: points on the edge count as inside.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.max_x() && py >= self.y && py <= self.max_y()
    }

    /// Inclusive overlap test (touching edges intersect).
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x <= other.max_x()
            && other.x <= self.max_x()
            && self.y <= other.max_y()
            && other.y <= self.max_y()
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::from_min_max(
            self.x.min(other.x),
            self.y.min(other.y),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    /// Grow by `d` on every side.
    pub fn inflate(&self, d: f64) -> Bounds {
        Bounds::new(
            self.x - d,
            self.y - d,
            self.width + 2.0 * d,
            self.height + 2.0 * d,
        )
    }

    /// Normalise negative extents so that `width`/`height` are ≥ 0.
    pub fn normalized(&self) -> Bounds {
        Bounds::from_min_max(
            self.x.min(self.max_x()),
            self.y.min(self.max_y()),
            self.x.max(self.max_x()),
            self.y.max(self.max_y()),
        )
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }

    pub fn approx_eq(&self, other: &Bounds, eps: f64) -> bool {
        (self.x - other.x).abs() <= eps
            && (self.y - other.y).abs() <= eps
            && (self.width - other.width).abs() <= eps
            && (self.height - other.height).abs() <= eps
    }

    pub fn to_kurbo(&self) -> kurbo::Rect {
        kurbo::Rect::new(self.x, self.y, self.max_x(), self.max_y())
    }

    pub fn from_kurbo(rect: kurbo::Rect) -> Self {
        Self::from_min_max(rect.x0, rect.y0, rect.x1, rect.y1)
    }
}

// ─── Colors & Paint ──────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0]; serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Helper to parse a single hex digit.
pub fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a hex color string: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`.
    /// The string may optionally start with `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let short = |i: usize| hex_val(bytes[i]).map(|v| (v * 17) as f32 / 255.0);
        let long = |i: usize| {
            let hi = hex_val(bytes[i])?;
            let lo = hex_val(bytes[i + 1])?;
            Some((hi << 4 | lo) as f32 / 255.0)
        };

        match bytes.len() {
            3 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0)),
            4 => Some(Self::rgba(short(0)?, short(1)?, short(2)?, short(3)?)),
            6 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, 1.0)),
            8 => Some(Self::rgba(long(0)?, long(2)?, long(4)?, long(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let (r, g, b, a) = (q(self.r), q(self.g), q(self.b), q(self.a));
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleMode {
    Fill,
    Fit,
    Crop,
    Tile,
}

/// One fill layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Paint {
    Solid {
        color: Color,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opacity: Option<f64>,
    },
    Image {
        asset_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale_mode: Option<ScaleMode>,
    },
}

impl Paint {
    pub fn solid(color: Color) -> Self {
        Paint::Solid {
            color,
            opacity: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StrokeAlign {
    Inside,
    Center,
    Outside,
}

/// One stroke layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<StrokeAlign>,
}

impl Default for Stroke {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1.0,
            opacity: None,
            align: None,
        }
    }
}

// ─── Layout constraints ──────────────────────────────────────────────────

/// How a child follows its parent on one axis when the parent is resized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AxisConstraint {
    /// Keep the distance to the left / top edge.
    #[default]
    Min,
    /// Keep the distance to the right / bottom edge.
    Max,
    /// Keep both distances, stretching the child.
    Stretch,
    /// Keep the offset from the parent's center.
    Center,
    /// Scale position and size proportionally.
    Scale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub horizontal: AxisConstraint,
    pub vertical: AxisConstraint,
}

// ─── Text ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justified,
}

// ─── Boolean ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BooleanStatus {
    #[default]
    Ok,
    Invalid,
}

/// Why a boolean node could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanErrorCode {
    InvalidGeometry,
    InsufficientOperands,
    SelfIntersection,
    NumericalFailure,
    InvalidTolerance,
}

impl BooleanErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanErrorCode::InvalidGeometry => "invalid_geometry",
            BooleanErrorCode::InsufficientOperands => "insufficient_operands",
            BooleanErrorCode::SelfIntersection => "self_intersection",
            BooleanErrorCode::NumericalFailure => "numerical_failure",
            BooleanErrorCode::InvalidTolerance => "invalid_tolerance",
        }
    }
}

impl fmt::Display for BooleanErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanData {
    pub op: BooleanOp,
    pub operand_ids: Vec<NodeId>,
    #[serde(default)]
    pub status: BooleanStatus,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error_code: Option<BooleanErrorCode>,
}

fn default_tolerance() -> f64 {
    DEFAULT_BOOLEAN_TOLERANCE
}

impl BooleanData {
    pub fn new(op: BooleanOp, operand_ids: Vec<NodeId>) -> Self {
        Self {
            op,
            operand_ids,
            status: BooleanStatus::Ok,
            tolerance: DEFAULT_BOOLEAN_TOLERANCE,
            last_error_code: None,
        }
    }
}

/// Fill rule for path outlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    #[default]
    Nonzero,
    Evenodd,
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Variant-specific node payload, tagged on the wire by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum NodeKind {
    /// Visible container; clips its children when `clip_content` is set.
    Frame {
        #[serde(default = "default_true")]
        clip_content: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        corner_radius: Option<f64>,
    },
    Group,
    Rectangle {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        corner_radius: Option<f64>,
    },
    Ellipse,
    Text {
        #[serde(default)]
        text: String,
        #[serde(default = "default_font_family")]
        font_family: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
        #[serde(default = "default_font_weight")]
        font_weight: u16,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        line_height: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text_align: Option<TextAlign>,
    },
    Image {
        asset_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale_mode: Option<ScaleMode>,
    },
    /// Freeform path: editable `vector` data and/or literal SVG path data.
    Path {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        vector: Option<VectorData>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path_data: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill_rule: Option<FillRule>,
    },
    /// Composite whose outline combines its operand children.
    Boolean { boolean_data: BooleanData },
    ComponentInstance {
        component_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overrides: Option<BTreeMap<String, serde_json::Value>>,
    },
}

fn default_true() -> bool {
    true
}

fn default_font_family() -> String {
    "Inter".into()
}

fn default_font_size() -> f64 {
    14.0
}

fn default_font_weight() -> u16 {
    400
}

impl NodeKind {
    /// The wire discriminant (`"frame"`, `"componentInstance"`, …).
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Frame { .. } => "frame",
            NodeKind::Group => "group",
            NodeKind::Rectangle { .. } => "rectangle",
            NodeKind::Ellipse => "ellipse",
            NodeKind::Text { .. } => "text",
            NodeKind::Image { .. } => "image",
            NodeKind::Path { .. } => "path",
            NodeKind::Boolean { .. } => "boolean",
            NodeKind::ComponentInstance { .. } => "componentInstance",
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        NodeKind::Text {
            text: content.into(),
            font_family: default_font_family(),
            font_size: default_font_size(),
            font_weight: default_font_weight(),
            line_height: None,
            text_align: None,
        }
    }
}

/// All wire discriminants accepted for `Node.type`.
pub const NODE_TYPES: &[&str] = &[
    "frame",
    "group",
    "rectangle",
    "ellipse",
    "text",
    "image",
    "path",
    "boolean",
    "componentInstance",
];

/// A single node in the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub position: Point,
    #[serde(default)]
    pub size: Size,
    /// Degrees, clockwise, about the node's center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Ordered back-to-front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fills: Option<Vec<Paint>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<Stroke>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraints>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_bindings: Option<BTreeMap<String, String>>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            name: None,
            position: Point::default(),
            size: Size::default(),
            rotation: None,
            children: None,
            fills: None,
            strokes: None,
            opacity: None,
            visible: None,
            locked: None,
            constraints: None,
            variable_bindings: None,
            kind,
        }
    }

    /// Builder-style placement helper.
    pub fn at(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.position = Point::new(x, y);
        self.size = Size::new(width, height);
        self
    }

    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn children_mut(&mut self) -> &mut Vec<NodeId> {
        self.children.get_or_insert_with(Vec::new)
    }

    /// Box in the parent's coordinate space (rotation ignored).
    pub fn local_bounds(&self) -> Bounds {
        Bounds::new(
            self.position.x,
            self.position.y,
            self.size.width,
            self.size.height,
        )
    }

    pub fn boolean_data(&self) -> Option<&BooleanData> {
        match &self.kind {
            NodeKind::Boolean { boolean_data } => Some(boolean_data),
            _ => None,
        }
    }

    pub fn boolean_data_mut(&mut self) -> Option<&mut BooleanData> {
        match &mut self.kind {
            NodeKind::Boolean { boolean_data } => Some(boolean_data),
            _ => None,
        }
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.kind, NodeKind::Boolean { .. })
    }

    /// Containers whose children may be grouped, reordered or ungrouped.
    pub fn is_container(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Frame { .. } | NodeKind::Group | NodeKind::Boolean { .. }
        )
    }
}

// ─── Pages & assets ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub name: String,
    pub root_id: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetKind {
    Image,
    Svg,
    Font,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: AssetKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

// ─── Style library ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaintStyle {
    pub id: String,
    pub name: String,
    pub paints: Vec<Paint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub id: String,
    pub name: String,
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EffectKind {
    DropShadow,
    InnerShadow,
    LayerBlur,
    BackgroundBlur,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Effect {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Point>,
    pub radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectStyle {
    pub id: String,
    pub name: String,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridPattern {
    Columns,
    Rows,
    Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGrid {
    pub pattern: GridPattern,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gutter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridStyle {
    pub id: String,
    pub name: String,
    pub grids: Vec<LayoutGrid>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleLibrary {
    #[serde(default)]
    pub paint: BTreeMap<String, PaintStyle>,
    #[serde(default)]
    pub text: BTreeMap<String, TextStyle>,
    #[serde(default)]
    pub effect: BTreeMap<String, EffectStyle>,
    #[serde(default)]
    pub grid: BTreeMap<String, GridStyle>,
}

// ─── Variable library ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableType {
    Color,
    Number,
    String,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableMode {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableCollection {
    pub id: String,
    pub name: String,
    pub modes: Vec<VariableMode>,
    pub default_mode_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableToken {
    pub id: String,
    pub name: String,
    pub collection_id: String,
    #[serde(rename = "type")]
    pub kind: VariableType,
    pub values_by_mode: BTreeMap<String, VariableValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableLibrary {
    #[serde(default)]
    pub collections: BTreeMap<String, VariableCollection>,
    #[serde(default)]
    pub tokens: BTreeMap<String, VariableToken>,
    /// Active mode id per collection id.
    #[serde(default)]
    pub active_modes: BTreeMap<String, String>,
}

// ─── Component library ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    pub id: String,
    pub name: String,
    pub root_node_id: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSet {
    pub id: String,
    pub name: String,
    pub definition_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentLibrary {
    #[serde(default)]
    pub definitions: BTreeMap<String, ComponentDefinition>,
    #[serde(default)]
    pub sets: BTreeMap<String, ComponentSet>,
}

// ─── Prototype graph ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionTrigger {
    OnClick,
    OnHover,
    OnPress,
    AfterDelay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionAction {
    Navigate,
    Overlay,
    Back,
    OpenUrl,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: String,
    pub source_id: NodeId,
    pub trigger: InteractionTrigger,
    pub action: InteractionAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePrototype {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_node_id: Option<NodeId>,
    #[serde(default)]
    pub interactions: Vec<Interaction>,
}

/// Per-page prototype interaction graph, keyed by page id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PrototypeGraph {
    #[serde(default)]
    pub pages: BTreeMap<String, PagePrototype>,
}

// ─── Document ────────────────────────────────────────────────────────────

/// The root aggregate. Treated as an immutable value per revision: editing
/// produces a new `Document` rather than mutating a shared one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: u32,
    pub root_id: NodeId,
    pub pages: Vec<Page>,
    pub active_page_id: String,
    pub nodes: BTreeMap<NodeId, Node>,
    #[serde(default)]
    pub assets: BTreeMap<String, Asset>,
    #[serde(default)]
    pub styles: StyleLibrary,
    #[serde(default)]
    pub variables: VariableLibrary,
    #[serde(default)]
    pub components: ComponentLibrary,
    #[serde(default)]
    pub prototype: PrototypeGraph,
}

impl Document {
    /// A fresh document: one page whose root is an empty frame `root`.
    #[must_use]
    pub fn new() -> Self {
        let root_id = NodeId::intern("root");
        let root = Node::new(
            root_id,
            NodeKind::Frame {
                clip_content: false,
                corner_radius: None,
            },
        );
        let page = Page {
            id: "page_1".into(),
            name: "Page 1".into(),
            root_id,
        };
        let mut prototype = PrototypeGraph::default();
        prototype
            .pages
            .insert(page.id.clone(), PagePrototype::default());

        Self {
            version: CURRENT_VERSION,
            root_id,
            active_page_id: page.id.clone(),
            pages: vec![page],
            nodes: BTreeMap::from([(root_id, root)]),
            assets: BTreeMap::new(),
            styles: StyleLibrary::default(),
            variables: VariableLibrary::default(),
            components: ComponentLibrary::default(),
            prototype,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn page(&self, id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    pub fn active_page(&self) -> Option<&Page> {
        self.page(&self.active_page_id)
    }

    /// Root node ids of every page plus the document root.
    pub fn is_structural_root(&self, id: NodeId) -> bool {
        id == self.root_id || self.pages.iter().any(|p| p.root_id == id)
    }

    /// Find the parent of `id` and the child's index within it.
    pub fn parent_of(&self, id: NodeId) -> Option<(NodeId, usize)> {
        self.nodes.values().find_map(|n| {
            n.children()
                .iter()
                .position(|c| *c == id)
                .map(|idx| (n.id, idx))
        })
    }

    /// Child → parent lookup table for the whole document.
    pub fn parent_map(&self) -> BTreeMap<NodeId, NodeId> {
        let mut map = BTreeMap::new();
        for node in self.nodes.values() {
            for child in node.children() {
                map.insert(*child, node.id);
            }
        }
        map
    }

    /// All strict descendants of `id`, depth-first, pre-order.
    ///
    /// Tolerates cycles and dangling child references.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = std::collections::HashSet::from([id]);
        let mut stack: Vec<NodeId> = self
            .get(id)
            .map(|n| n.children().iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            if let Some(node) = self.get(next) {
                stack.extend(node.children().iter().rev().copied());
            }
        }
        out
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let parents = self.parent_map();
        let mut current = descendant;
        let mut steps = 0usize;
        while let Some(parent) = parents.get(&current) {
            if *parent == ancestor {
                return true;
            }
            current = *parent;
            steps += 1;
            if steps > self.nodes.len() {
                break;
            }
        }
        false
    }

    /// Insert `child` into `parent`'s children at `index` (clamped to the end).
    pub fn insert_child(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> bool {
        let Some(node) = self.get_mut(parent) else {
            return false;
        };
        let children = node.children_mut();
        let at = index.unwrap_or(children.len()).min(children.len());
        children.insert(at, child);
        true
    }

    /// Remove `child` from its parent's children list.
    /// Returns the former parent and index.
    pub fn detach(&mut self, child: NodeId) -> Option<(NodeId, usize)> {
        let (parent, index) = self.parent_of(child)?;
        if let Some(node) = self.get_mut(parent) {
            node.children_mut().remove(index);
        }
        Some((parent, index))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
