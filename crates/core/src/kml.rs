//! KML document generation.

use crate::models::Placemark;
use std::borrow::Cow;

pub fn document_title(folder_name: &str) -> String {
    format!("{} (Geotagged Images)", folder_name)
}

/// Renders placemarks, in the given order, as a KML 2.2 document.
pub fn build(placemarks: &[Placemark], title: &str) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<kml xmlns=\"http://www.opengis.net/kml/2.2\">\n  <Document>\n",
    );
    out.push_str(&format!("    <name>{}</name>\n", escape(title)));
    for pm in placemarks {
        out.push_str("    <Placemark>\n");
        out.push_str(&format!("      <name>{}</name>\n", escape(&pm.name)));
        if !pm.desc.is_empty() {
            out.push_str(&format!(
                "      <description>{}</description>\n",
                escape(&pm.desc)
            ));
        }
        out.push_str(&format!(
            "      <Point><coordinates>{}</coordinates></Point>\n",
            coordinates(pm)
        ));
        out.push_str("    </Placemark>\n");
    }
    out.push_str("  </Document>\n</kml>\n");
    out
}

// KML order is lon,lat[,alt].
fn coordinates(pm: &Placemark) -> String {
    match pm.alt {
        Some(alt) => format!("{},{},{}", pm.lon, pm.lat, alt),
        None => format!("{},{}", pm.lon, pm.lat),
    }
}

/// Escapes the five XML special characters. Each character is replaced
/// once, so existing entities are never double-escaped.
pub fn escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;
    use quick_xml::Reader;

    fn placemark(name: &str, desc: &str, alt: Option<f64>) -> Placemark {
        Placemark {
            name: name.to_string(),
            lat: 12.3,
            lon: 45.6,
            alt,
            desc: desc.to_string(),
        }
    }

    /// Parses the whole document and returns the text of every `<name>` element.
    fn names(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut names = Vec::new();
        let mut in_name = false;
        loop {
            match reader.read_event().expect("well-formed XML") {
                Event::Start(e) if e.name().as_ref() == b"name" => in_name = true,
                Event::End(e) if e.name().as_ref() == b"name" => in_name = false,
                Event::Text(t) if in_name => names.push(t.unescape().unwrap().into_owned()),
                Event::Eof => break,
                _ => {}
            }
        }
        names
    }

    #[test]
    fn coordinates_are_lon_lat_alt() {
        let kml = build(&[placemark("a.jpg", "a.jpg", Some(7.8))], "t");
        assert!(kml.contains("<coordinates>45.6,12.3,7.8</coordinates>"));

        let kml = build(&[placemark("a.jpg", "a.jpg", None)], "t");
        assert!(kml.contains("<coordinates>45.6,12.3</coordinates>"));
    }

    #[test]
    fn escapes_all_five_entities() {
        assert_eq!(escape(r#"a&b<c>d"e'f"#), "a&amp;b&lt;c&gt;d&quot;e&apos;f");
        assert_eq!(escape("&amp;"), "&amp;amp;");
        assert!(matches!(escape("plain.jpg"), Cow::Borrowed(_)));
    }

    #[test]
    fn escaped_names_parse_back() {
        let tricky = r#"Tom & Jerry's <"best">.jpg"#;
        let kml = build(&[placemark(tricky, "dir/x.jpg", None)], "Fish & Chips");
        assert!(kml.contains(
            "<name>Tom &amp; Jerry&apos;s &lt;&quot;best&quot;&gt;.jpg</name>"
        ));
        assert_eq!(names(&kml), vec!["Fish & Chips".to_string(), tricky.to_string()]);
    }

    #[test]
    fn empty_description_is_omitted() {
        let kml = build(&[placemark("a.jpg", "", None)], "t");
        assert!(!kml.contains("<description>"));
        let kml = build(&[placemark("a.jpg", "sub/a.jpg", None)], "t");
        assert!(kml.contains("      <description>sub/a.jpg</description>\n"));
    }

    #[test]
    fn full_document_layout() {
        let kml = build(&[placemark("a.jpg", "a.jpg", Some(7.8))], "Trip (Geotagged Images)");
        let expected = "\
<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<kml xmlns=\"http://www.opengis.net/kml/2.2\">
  <Document>
    <name>Trip (Geotagged Images)</name>
    <Placemark>
      <name>a.jpg</name>
      <description>a.jpg</description>
      <Point><coordinates>45.6,12.3,7.8</coordinates></Point>
    </Placemark>
  </Document>
</kml>
";
        assert_eq!(kml, expected);
    }

    #[test]
    fn empty_document_is_still_valid() {
        let kml = build(&[], &document_title("Empty"));
        assert_eq!(names(&kml), vec!["Empty (Geotagged Images)".to_string()]);
    }
}
