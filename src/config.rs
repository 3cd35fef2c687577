use image::Rgba;
use json::JsonValue;

use crate::error::MeshPlotError;

/// Resolution of the exported figure
pub const DEFAULT_DPI: f64 = 280.0;
/// Figure size in inches
pub const DEFAULT_FIGURE_SIZE: (f64, f64) = (8.0, 4.0);
/// Triangle outline width in points
pub const DEFAULT_LINE_WIDTH_PT: f64 = 0.9;

const STYLE_KEYS: [&str; 7] = [
    "width",
    "height",
    "margin",
    "line_width",
    "background",
    "face_color",
    "edge_color",
];

/// Visual settings of a rendered frame. Sizes are in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub width: u32,
    pub height: u32,
    pub margin: u32,
    pub line_width: f64,
    pub background: Rgba<u8>,
    pub face_color: Rgba<u8>,
    pub edge_color: Rgba<u8>,
}

impl Default for RenderStyle {
    fn default() -> Self {
        RenderStyle {
            width: (DEFAULT_FIGURE_SIZE.0 * DEFAULT_DPI) as u32,
            height: (DEFAULT_FIGURE_SIZE.1 * DEFAULT_DPI) as u32,
            margin: 40,
            line_width: DEFAULT_LINE_WIDTH_PT * DEFAULT_DPI / 72.0,
            background: Rgba([0, 0, 0, 0]),
            face_color: Rgba([255, 255, 255, 255]),
            edge_color: Rgba([0, 0, 0, 255]),
        }
    }
}

fn parse_size(style_json: &JsonValue, key: &str) -> Result<Option<u32>, MeshPlotError> {
    if !style_json.has_key(key) {
        return Ok(None);
    }

    match style_json[key].as_u32() {
        Some(v) if v > 0 => Ok(Some(v)),
        _ => Err(MeshPlotError::Input(format!(
            "Style field {key} must be a positive integer"
        ))),
    }
}

/// Parses `[r, g, b]` or `[r, g, b, a]`, opaque when alpha is omitted
fn parse_color(style_json: &JsonValue, key: &str) -> Result<Option<Rgba<u8>>, MeshPlotError> {
    if !style_json.has_key(key) {
        return Ok(None);
    }

    let value = &style_json[key];
    if !value.is_array() || !(value.len() == 3 || value.len() == 4) {
        return Err(MeshPlotError::Input(format!(
            "Style field {key} must be an array of 3 or 4 channel values"
        )));
    }

    let mut channels = [255u8; 4];
    for (i, member) in value.members().enumerate() {
        channels[i] = match member.as_u8() {
            Some(c) => c,
            None => {
                return Err(MeshPlotError::Input(format!(
                    "Style field {key} has a channel outside 0-255"
                )))
            }
        };
    }

    Ok(Some(Rgba(channels)))
}

/// Builds a RenderStyle from a json object, starting from the defaults
///
/// # Arguments
/// * `style_json` - The style file as a JsonValue object
pub fn parse_style(style_json: &JsonValue) -> Result<RenderStyle, MeshPlotError> {
    if !style_json.is_object() {
        return Err(MeshPlotError::Input(
            "Style file must contain a json object".to_owned(),
        ));
    }

    for (key, _) in style_json.entries() {
        if !STYLE_KEYS.contains(&key) {
            println!("warning [config]: ignoring unknown style field {key}");
        }
    }

    let mut style = RenderStyle::default();

    if let Some(v) = parse_size(style_json, "width")? {
        style.width = v;
    }
    if let Some(v) = parse_size(style_json, "height")? {
        style.height = v;
    }
    if style_json.has_key("margin") {
        style.margin = match style_json["margin"].as_u32() {
            Some(m) => m,
            None => {
                return Err(MeshPlotError::Input(
                    "Style field margin must be a non-negative integer".to_owned(),
                ))
            }
        };
    }
    if style_json.has_key("line_width") {
        style.line_width = match style_json["line_width"].as_f64() {
            Some(w) if w > 0.0 => w,
            _ => {
                return Err(MeshPlotError::Input(
                    "Style field line_width must be a positive number".to_owned(),
                ))
            }
        };
    }
    if let Some(c) = parse_color(style_json, "background")? {
        style.background = c;
    }
    if let Some(c) = parse_color(style_json, "face_color")? {
        style.face_color = c;
    }
    if let Some(c) = parse_color(style_json, "edge_color")? {
        style.edge_color = c;
    }

    if style.margin.saturating_mul(2) >= style.width.min(style.height) {
        return Err(MeshPlotError::Input(format!(
            "Style margin {} leaves no drawing area in a {}x{} image",
            style.margin, style.width, style.height
        )));
    }

    Ok(style)
}

/// Loads a RenderStyle from a json style file
///
/// # Arguments
/// * `style_file` - The path to the style file
pub fn load_style(style_file: &str) -> Result<RenderStyle, MeshPlotError> {
    let file_string = match std::fs::read_to_string(style_file) {
        Ok(f) => f,
        Err(err) => {
            return Err(MeshPlotError::Input(format!(
                "Unable to open style file {style_file}: {err}"
            )))
        }
    };

    let style_json = match json::parse(&file_string) {
        Ok(f) => f,
        Err(err) => {
            return Err(MeshPlotError::Input(format!(
                "Error in style file json: {err}"
            )))
        }
    };

    let style = parse_style(&style_json)?;
    println!("info: loaded render style from {style_file}");

    Ok(style)
}
