//! Content type handling (`text/html; charset=utf-8`)

use fos_dom::DocumentKind;

use crate::ParseError;

/// Parsed content type header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Lowercased MIME type
    pub mime: String,
    /// Charset parameter, if any
    pub charset: Option<String>,
}

impl ContentType {
    /// Parse `mime[; charset=x]`
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let mut parts = value.split(';');
        let mime = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        if mime.is_empty() || !mime.contains('/') {
            return Err(ParseError::InvalidContentType(value.to_string()));
        }

        let charset = parts.find_map(|param| {
            let (key, val) = param.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| val.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        });

        Ok(Self { mime, charset })
    }

    pub fn html() -> Self {
        Self {
            mime: "text/html".into(),
            charset: None,
        }
    }

    pub fn xml() -> Self {
        Self {
            mime: "text/xml".into(),
            charset: None,
        }
    }

    pub fn xhtml() -> Self {
        Self {
            mime: "application/xhtml+xml".into(),
            charset: None,
        }
    }

    /// Replace the charset parameter
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Document flavor implied by the MIME type
    pub fn kind(&self) -> DocumentKind {
        if self.mime.contains("xhtml") {
            DocumentKind::Xhtml
        } else if self.mime.contains("xml") {
            DocumentKind::Xml
        } else {
            DocumentKind::Html
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.charset {
            Some(charset) => write!(f, "{};charset={}", self.mime, charset),
            None => f.write_str(&self.mime),
        }
    }
}
