//! Builder configuration.
//!
//! Every field has a default, so a partial JSON object is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Visual and behavioral knobs for the page builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderConfig {
    /// Outline and handle color of the selected element.
    pub selection_color: String,
    /// Glow drawn around the selected element.
    pub selection_shadow: String,
    /// Dashed outline color shown on hover.
    pub hover_color: String,
    /// Text color substituted for low-contrast grays.
    pub legible_text_color: String,
    /// Opacity of an element while it is being dragged for reorder.
    pub drag_opacity: f32,
    /// Smallest width/height an image can be resized to, in CSS pixels.
    pub min_image_size: f64,
    /// Size assumed for images with no explicit or intrinsic dimensions.
    pub default_image_width: f64,
    pub default_image_height: f64,
    /// Edge length of the square resize handles.
    pub handle_size: u32,
    /// Make tagged elements draggable for reordering.
    pub enable_reorder: bool,
    /// Text shown on an empty canvas.
    pub placeholder_text: String,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            selection_color: "#3b82f6".to_string(),
            selection_shadow: "0 0 0 4px rgba(59, 130, 246, 0.15)".to_string(),
            hover_color: "#93c5fd".to_string(),
            legible_text_color: "#1f2937".to_string(),
            drag_opacity: 0.5,
            min_image_size: 50.0,
            default_image_width: 300.0,
            default_image_height: 200.0,
            handle_size: 10,
            enable_reorder: true,
            placeholder_text: "Drag elements from the library to start building this page"
                .to_string(),
        }
    }
}

impl BuilderConfig {
    /// Load a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = BuilderConfig::from_json(r##"{"selectionColor": "#ff0000", "minImageSize": 80}"##)
            .unwrap();
        assert_eq!(config.selection_color, "#ff0000");
        assert_eq!(config.min_image_size, 80.0);
        assert_eq!(config.hover_color, BuilderConfig::default().hover_color);
        assert!(config.enable_reorder);
    }

    #[test]
    fn test_invalid_json() {
        assert!(BuilderConfig::from_json("{not json").is_err());
    }
}
