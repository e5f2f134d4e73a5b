//! Safe spots and alert text

use actuator_link::Position;
use serde::{Deserialize, Serialize};

/// Category used when the provider does not say what the place is
pub const DEFAULT_CATEGORY: &str = "SAFE SPOT";

/// A place where a drowsy driver can stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafeSpot {
    /// Display category, e.g. "FUEL" or "REST AREA"
    pub category: String,
    pub name: String,
    /// Street / neighbourhood, when the provider returns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vicinity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl SafeSpot {
    /// Build a spot from raw provider tags, filling in defaults
    pub fn from_tags(category: Option<&str>, name: Option<&str>) -> Self {
        let category = category
            .map(category_label)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Nearby {}", category));
        Self {
            category,
            name,
            vicinity: None,
            position: None,
        }
    }

    pub fn with_vicinity(mut self, vicinity: Option<String>) -> Self {
        self.vicinity = vicinity.filter(|v| !v.trim().is_empty());
        self
    }

    pub fn with_position(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    /// One alert line, markup-escaped: `CATEGORY: NAME (vicinity, 1.2 km)`
    pub fn render(&self, origin: &Position) -> String {
        let mut line = format!("{}: {}", escape_markup(&self.category), escape_markup(&self.name));

        let mut details = Vec::new();
        if let Some(vicinity) = &self.vicinity {
            details.push(escape_markup(vicinity));
        }
        if let Some(position) = &self.position {
            details.push(format!("{:.1} km", origin.distance_km(position)));
        }
        if !details.is_empty() {
            line.push_str(&format!(" ({})", details.join(", ")));
        }
        line
    }
}

/// `rest_area` -> `REST AREA`
pub fn category_label(raw: &str) -> String {
    raw.trim().replace('_', " ").to_uppercase()
}

/// Escape characters that break Pango markup in desktop popups
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Full alert body: header with the total count, then one line per spot
pub fn render_alert(total: usize, spots: &[SafeSpot], origin: &Position) -> String {
    let mut body = format!("EMERGENCY: {} spots found nearby:", total);
    for spot in spots {
        body.push_str("\n- ");
        body.push_str(&spot.render(origin));
    }
    body
}
