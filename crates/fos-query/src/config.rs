//! Session Configuration

/// Session configuration options
#[derive(Debug, Clone)]
pub struct Config {
    /// Charset assumed when a content type names none
    pub default_charset: String,

    /// Content type used by `Session::new_document` without one
    pub default_content_type: String,

    /// Specificity of inline, legacy and imperatively set styles
    pub inline_specificity: u32,

    /// `display` value restored by `show()` when nothing was saved
    pub default_display: String,

    /// Presentational attributes folded into the cascade as inline styles
    /// (attribute name, CSS property)
    pub legacy_style_attributes: Vec<(String, String)>,
}

impl Default for Config {
    fn default() -> Self {
        let legacy = [
            ("bgcolor", "background-color"),
            ("text", "color"),
            ("width", "width"),
            ("height", "height"),
        ];
        Self {
            default_charset: "UTF-8".to_string(),
            default_content_type: "text/html".to_string(),
            inline_specificity: 1000,
            default_display: "block".to_string(),
            legacy_style_attributes: legacy
                .iter()
                .map(|(attr, prop)| (attr.to_string(), prop.to_string()))
                .collect(),
        }
    }
}
