//! Rich-text markup for tags.
//!
//! Produces the `<font color>`/`<b>`/`<i>` subset understood by the in-game text renderer.
//! Text is segmented into extended grapheme clusters so that emoji sequences and combining
//! marks always receive a single color.

use unicode_segmentation::UnicodeSegmentation;

use super::color::{Rgb8, RgbTriple};

/// Inputs for one render. Colors are already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDescriptor {
    pub text: String,
    pub primary: RgbTriple,
    /// Falls back to `primary` when absent.
    pub secondary: Option<RgbTriple>,
    pub bold: bool,
    pub italic: bool,
    pub rainbow: bool,
}

/// Coloring strategy, chosen once per descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Solid(Rgb8),
    Gradient(Rgb8, Rgb8),
    Rainbow,
}

impl RenderMode {
    pub fn select(descriptor: &StyleDescriptor) -> Self {
        if descriptor.rainbow {
            return RenderMode::Rainbow;
        }

        let start = descriptor.primary.to_rgb8();
        let end = descriptor
            .secondary
            .as_ref()
            .unwrap_or(&descriptor.primary)
            .to_rgb8();

        if start == end {
            RenderMode::Solid(start)
        } else {
            RenderMode::Gradient(start, end)
        }
    }
}

/// Render `descriptor` into markup. Empty text renders to an empty string.
pub fn render(descriptor: &StyleDescriptor) -> String {
    if descriptor.text.is_empty() {
        return String::new();
    }

    let text = descriptor.text.as_str();
    let mut markup = match RenderMode::select(descriptor) {
        RenderMode::Solid(color) => font(color, &escape(text)),
        RenderMode::Gradient(start, end) => gradient(text, start, end),
        RenderMode::Rainbow => rainbow(text),
    };

    if descriptor.bold {
        markup = format!("<b>{markup}</b>");
    }
    if descriptor.italic {
        markup = format!("<i>{markup}</i>");
    }
    markup
}

/// Escape backslashes and single quotes so the markup survives inside a single-quoted literal.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            other => out.push(other),
        }
    }
    out
}

fn font(color: Rgb8, escaped: &str) -> String {
    format!("<font color=\"{}\">{escaped}</font>", color.to_hex())
}

fn gradient(text: &str, start: Rgb8, end: Rgb8) -> String {
    let clusters: Vec<&str> = text.graphemes(true).collect();
    if clusters.len() <= 1 {
        return font(start, &escape(text));
    }

    let last = (clusters.len() - 1) as f64;
    clusters
        .iter()
        .enumerate()
        .map(|(index, cluster)| font(start.lerp(end, index as f64 / last), &escape(cluster)))
        .collect()
}

fn rainbow(text: &str) -> String {
    let clusters: Vec<&str> = text.graphemes(true).collect();
    if clusters.len() <= 1 {
        return escape(text);
    }

    let span = (clusters.len() - 1) as f64;
    clusters
        .iter()
        .enumerate()
        .map(|(index, cluster)| font(Rgb8::from_hue(index as f64 / span), &escape(cluster)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(text: &str, primary: &str, secondary: Option<&str>) -> StyleDescriptor {
        StyleDescriptor {
            text: text.to_string(),
            primary: RgbTriple::parse(primary).expect("primary color"),
            secondary: secondary.map(|raw| RgbTriple::parse(raw).expect("secondary color")),
            bold: false,
            italic: false,
            rainbow: false,
        }
    }

    #[test]
    fn empty_text_renders_nothing() {
        let mut style = descriptor("", "255,0,0", None);
        style.bold = true;
        style.italic = true;
        assert_eq!(render(&style), "");
    }

    #[test]
    fn bold_gradient_matches_expected_markup() {
        let mut style = descriptor("Hi", "0,0,0", Some("255,255,255"));
        style.bold = true;

        assert_eq!(
            render(&style),
            "<b><font color=\"#000000\">H</font><font color=\"#FFFFFF\">i</font></b>"
        );
    }

    #[test]
    fn same_colors_emit_single_solid_tag() {
        let style = descriptor("Moderators", "0, 0, 139", Some("0,0,139"));
        let markup = render(&style);

        assert_eq!(markup, "<font color=\"#00008B\">Moderators</font>");
        assert_eq!(markup.matches("<font").count(), 1);
    }

    #[test]
    fn missing_secondary_is_solid() {
        let style = descriptor("abc", "1,2,3", None);
        assert_eq!(RenderMode::select(&style), RenderMode::Solid(Rgb8::new(1, 2, 3)));
    }

    #[test]
    fn colors_equal_after_rounding_are_solid() {
        let style = descriptor("abc", "10.2,0,0", Some("10,0,0"));
        assert_eq!(render(&style).matches("<font").count(), 1);
    }

    #[test]
    fn gradient_interpolates_between_endpoints() {
        let style = descriptor("abc", "0,0,0", Some("255,255,255"));
        assert_eq!(
            render(&style),
            "<font color=\"#000000\">a</font>\
             <font color=\"#808080\">b</font>\
             <font color=\"#FFFFFF\">c</font>"
        );
    }

    #[test]
    fn single_character_gradient_uses_primary() {
        let style = descriptor("Z", "255,0,0", Some("0,0,255"));
        assert_eq!(render(&style), "<font color=\"#FF0000\">Z</font>");
    }

    #[test]
    fn rainbow_overrides_colors() {
        let mut style = descriptor("abc", "1,1,1", Some("1,1,1"));
        style.rainbow = true;

        assert_eq!(
            render(&style),
            "<font color=\"#FF0000\">a</font>\
             <font color=\"#00FFFF\">b</font>\
             <font color=\"#FF0000\">c</font>"
        );
    }

    #[test]
    fn single_character_rainbow_has_no_color_tag() {
        let mut style = descriptor("'", "0,0,0", None);
        style.rainbow = true;
        assert_eq!(render(&style), "\\'");
    }

    #[test]
    fn rainbow_emits_one_tag_per_cluster() {
        let mut style = descriptor("crew", "0,0,0", None);
        style.rainbow = true;
        assert_eq!(render(&style).matches("<font").count(), 4);
    }

    #[test]
    fn clusters_are_never_split() {
        // Family emoji joined with ZWJ, then "e" with a combining acute accent.
        let text = "\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}e\u{301}";
        let style = descriptor(text, "0,0,0", Some("255,0,0"));
        let markup = render(&style);

        assert_eq!(markup.matches("<font").count(), 2);
        assert!(markup.contains(">\u{1F468}\u{200D}\u{1F469}\u{200D}\u{1F467}</font>"));
        assert!(markup.contains(">e\u{301}</font>"));
    }

    #[test]
    fn quotes_and_backslashes_are_escaped_in_every_mode() {
        let text = "O'Brien\\Test";
        let solid = render(&descriptor(text, "0,0,0", None));
        assert_eq!(solid, "<font color=\"#000000\">O\\'Brien\\\\Test</font>");

        let gradient = render(&descriptor(text, "0,0,0", Some("9,9,9")));
        assert!(gradient.contains(">\\'</font>"));
        assert!(gradient.contains(">\\\\</font>"));

        let mut rainbow_style = descriptor(text, "0,0,0", None);
        rainbow_style.rainbow = true;
        let rainbow = render(&rainbow_style);
        assert!(rainbow.contains(">\\'</font>"));
        assert!(rainbow.contains(">\\\\</font>"));

        for markup in [solid, gradient, rainbow] {
            let stripped = markup.replace("\\\\", "").replace("\\'", "");
            assert!(!stripped.contains('\''), "unescaped quote in {markup}");
            assert!(!stripped.contains('\\'), "unescaped backslash in {markup}");
        }
    }

    #[test]
    fn italic_wraps_bold() {
        let mut style = descriptor("x", "255,255,255", None);
        style.bold = true;
        style.italic = true;
        assert_eq!(
            render(&style),
            "<i><b><font color=\"#FFFFFF\">x</font></b></i>"
        );
    }

    #[test]
    fn render_is_deterministic() {
        let mut style = descriptor("Repeat me", "12,34,56", Some("200,100,50"));
        style.italic = true;
        assert_eq!(render(&style), render(&style));

        style.rainbow = true;
        assert_eq!(render(&style), render(&style));
    }
}
