use geojson::JsonValue;

use crate::data::Region;

/// Shown when a region has no usable name ("governorate").
pub const NAME_PLACEHOLDER: &str = "محافظة";
/// Label in front of the measurement ("population").
pub const ATTRIBUTE_LABEL: &str = "عدد السكان";
pub const ATTRIBUTE_KEY: &str = "pollution";

/// Static popup text, fixed when the feature is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PopupContent {
    pub title: String,
    pub detail: Option<String>,
}

impl PopupContent {
    pub fn for_region(region: &Region) -> Self {
        let title = region.display_name().unwrap_or(NAME_PLACEHOLDER).to_string();
        let detail = region
            .attribute(ATTRIBUTE_KEY)
            .and_then(display_value)
            .map(|v| format!("{ATTRIBUTE_LABEL}: {v}"));
        Self { title, detail }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str()).chain(self.detail.as_deref())
    }
}

/// Renders truthy values only; zero, `""`, false and null yield nothing.
fn display_value(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Number(n) => n.as_f64().filter(|v| *v != 0.0).map(format_grouped),
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Bool(true) => Some("true".into()),
        JsonValue::Array(_) | JsonValue::Object(_) => Some(value.to_string()),
        _ => None,
    }
}

/// `1234567.25` -> `1,234,567.25`; at most three fraction digits.
pub fn format_grouped(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (int, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac.trim_end_matches('0');

    let mut out = String::with_capacity(fixed.len() + int.len() / 3 + 1);
    if value < 0.0 && (int != "0" || !frac.is_empty()) {
        out.push('-');
    }
    let digits = int.len();
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::region;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_grouped(1000.0), "1,000");
        assert_eq!(format_grouped(999.0), "999");
        assert_eq!(format_grouped(1234567.0), "1,234,567");
        assert_eq!(format_grouped(1234.5), "1,234.5");
        assert_eq!(format_grouped(0.12345), "0.123");
        assert_eq!(format_grouped(-25000.0), "-25,000");
    }

    #[test]
    fn name_and_value_present() {
        let popup = PopupContent::for_region(&region("Cairo", Some(1000.0)));
        assert_eq!(popup.title, "Cairo");
        assert_eq!(popup.detail.as_deref(), Some("عدد السكان: 1,000"));
    }

    #[test]
    fn zero_or_missing_value_omits_line() {
        for pollution in [None, Some(0.0)] {
            let popup = PopupContent::for_region(&region("Luxor", pollution));
            assert_eq!(popup.detail, None);
            assert_eq!(popup.lines().count(), 1);
            assert!(popup.lines().all(|l| !l.contains('0')));
        }
    }

    #[test]
    fn missing_name_uses_placeholder() {
        let mut r = region("x", Some(5.0));
        r.name = None;
        let popup = PopupContent::for_region(&r);
        assert_eq!(popup.title, NAME_PLACEHOLDER);
        assert!(!popup.title.is_empty());
        assert_eq!(popup.lines().collect::<Vec<_>>(), [NAME_PLACEHOLDER, "عدد السكان: 5"]);
    }

    #[test]
    fn only_truthy_values_render() {
        use serde_json::json;
        assert_eq!(display_value(&json!("high")), Some("high".into()));
        assert_eq!(display_value(&json!("")), None);
        assert_eq!(display_value(&json!(false)), None);
        assert_eq!(display_value(&json!(0)), None);
        assert_eq!(display_value(&JsonValue::Null), None);
    }

    #[test]
    fn blank_strings_and_collections_still_count_as_present() {
        use serde_json::json;
        assert_eq!(display_value(&json!("  ")), Some("  ".into()));
        assert_eq!(display_value(&json!([1, 2])), Some("[1,2]".into()));
        assert_eq!(display_value(&json!([])), Some("[]".into()));
        assert_eq!(display_value(&json!({"a": 1})), Some(r#"{"a":1}"#.into()));
    }
}
