//! Styled KML overlays.
//!
//! Rings are stored with `x = longitude`, `y = latitude`, which is also the
//! order KML expects inside `<coordinates>`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use geo::{Coord, Polygon};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;

const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KmlColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl KmlColor {
    pub const RED: KmlColor = KmlColor { r: 255, g: 0, b: 0 };

    /// KMLの色表記 (aabbggrr)
    pub fn to_kml(self, alpha: u8) -> String {
        format!("{:02x}{:02x}{:02x}{:02x}", alpha, self.b, self.g, self.r)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub fill: KmlColor,
    pub fill_alpha: u8,
    pub outline: KmlColor,
    pub outline_width: f64,
}

impl OverlayStyle {
    /// Style for a single raster outline.
    pub fn outline() -> Self {
        Self {
            fill: KmlColor::RED,
            fill_alpha: 100,
            outline: KmlColor::RED,
            outline_width: 1.0,
        }
    }

    /// More opaque than [`OverlayStyle::outline`] so overlap regions stand out.
    pub fn overlap() -> Self {
        Self {
            fill_alpha: 120,
            ..Self::outline()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placemark {
    pub name: String,
    pub ring: Vec<Coord<f64>>,
    pub style: OverlayStyle,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayDocument {
    pub placemarks: Vec<Placemark>,
}

/// Result of emitting a document: either saved to disk or handed back.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    Saved(PathBuf),
    InMemory(OverlayDocument),
}

impl OverlayDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.placemarks.is_empty()
    }

    /// 外周リングだけをKMLに書き出す
    pub fn add_polygon(&mut self, name: impl Into<String>, polygon: &Polygon<f64>, style: &OverlayStyle) {
        self.placemarks.push(Placemark {
            name: name.into(),
            ring: polygon.exterior().0.clone(),
            style: style.clone(),
        });
    }

    pub fn write_kml<W: Write>(&self, out: W) -> Result<()> {
        let mut writer = Writer::new_with_indent(out, b' ', 2);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let mut kml = BytesStart::new("kml");
        kml.push_attribute(("xmlns", KML_NAMESPACE));
        writer.write_event(Event::Start(kml))?;
        writer.write_event(Event::Start(BytesStart::new("Document")))?;

        for placemark in &self.placemarks {
            write_placemark(&mut writer, placemark)?;
        }

        writer.write_event(Event::End(BytesEnd::new("Document")))?;
        writer.write_event(Event::End(BytesEnd::new("kml")))?;
        Ok(())
    }

    pub fn to_kml_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_kml(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Writes the document to `path`, replacing any existing file.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_kml_string()?)?;
        tracing::info!("KML saved as: {}", path.display());
        Ok(())
    }

    /// Saves to `destination` when given, otherwise returns the document.
    pub fn emit(self, destination: Option<&Path>) -> Result<Emission> {
        match destination {
            Some(path) => {
                self.save(path)?;
                Ok(Emission::Saved(path.to_path_buf()))
            }
            None => Ok(Emission::InMemory(self)),
        }
    }
}

fn write_placemark<W: Write>(writer: &mut Writer<W>, placemark: &Placemark) -> Result<()> {
    let style = &placemark.style;

    writer.write_event(Event::Start(BytesStart::new("Placemark")))?;
    write_text_element(writer, "name", &placemark.name)?;

    writer.write_event(Event::Start(BytesStart::new("Style")))?;
    writer.write_event(Event::Start(BytesStart::new("LineStyle")))?;
    write_text_element(writer, "color", &style.outline.to_kml(255))?;
    write_text_element(writer, "width", &style.outline_width.to_string())?;
    writer.write_event(Event::End(BytesEnd::new("LineStyle")))?;
    writer.write_event(Event::Start(BytesStart::new("PolyStyle")))?;
    write_text_element(writer, "color", &style.fill.to_kml(style.fill_alpha))?;
    writer.write_event(Event::End(BytesEnd::new("PolyStyle")))?;
    writer.write_event(Event::End(BytesEnd::new("Style")))?;

    let coordinates = placemark
        .ring
        .iter()
        .map(|c| format!("{},{},0", c.x, c.y))
        .collect::<Vec<_>>()
        .join(" ");

    writer.write_event(Event::Start(BytesStart::new("Polygon")))?;
    writer.write_event(Event::Start(BytesStart::new("outerBoundaryIs")))?;
    writer.write_event(Event::Start(BytesStart::new("LinearRing")))?;
    write_text_element(writer, "coordinates", &coordinates)?;
    writer.write_event(Event::End(BytesEnd::new("LinearRing")))?;
    writer.write_event(Event::End(BytesEnd::new("outerBoundaryIs")))?;
    writer.write_event(Event::End(BytesEnd::new("Polygon")))?;

    writer.write_event(Event::End(BytesEnd::new("Placemark")))?;
    Ok(())
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;
    use tempfile::TempDir;

    fn square() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(-21.0, 64.0), (-20.9, 64.0), (-20.9, 64.1), (-21.0, 64.1)]),
            vec![],
        )
    }

    #[test]
    fn test_kml_color() {
        assert_eq!(KmlColor::RED.to_kml(255), "ff0000ff");
        assert_eq!(KmlColor::RED.to_kml(100), "640000ff");
        assert_eq!(KmlColor { r: 0x12, g: 0x34, b: 0x56 }.to_kml(0x78), "78563412");
    }

    #[test]
    fn test_overlap_style_is_more_opaque() {
        let outline = OverlayStyle::outline();
        let overlap = OverlayStyle::overlap();
        assert!(overlap.fill_alpha > outline.fill_alpha);
        assert_eq!(overlap.outline, outline.outline);
        assert_eq!(overlap.outline_width, outline.outline_width);
    }

    #[test]
    fn test_kml_contains_styled_polygon() {
        let mut doc = OverlayDocument::new();
        doc.add_polygon("DEM Outline", &square(), &OverlayStyle::outline());
        let kml = doc.to_kml_string().unwrap();

        assert!(kml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(kml.contains("<kml xmlns=\"http://www.opengis.net/kml/2.2\">"));
        assert!(kml.contains("<name>DEM Outline</name>"));
        assert!(kml.contains("<color>640000ff</color>"));
        assert!(kml.contains("<color>ff0000ff</color>"));
        assert!(kml.contains("<width>1</width>"));
        // 経度,緯度の順で、リングは閉じている
        assert!(kml.contains("<coordinates>-21,64,0 -20.9,64,0 -20.9,64.1,0 -21,64.1,0 -21,64,0</coordinates>"));
    }

    #[test]
    fn test_names_are_escaped() {
        let mut doc = OverlayDocument::new();
        doc.add_polygon("A & B", &square(), &OverlayStyle::overlap());
        let kml = doc.to_kml_string().unwrap();
        assert!(kml.contains("<name>A &amp; B</name>"));
    }

    #[test]
    fn test_empty_document_is_valid_kml() {
        let kml = OverlayDocument::new().to_kml_string().unwrap();
        assert!(kml.contains("<Document>"));
        assert!(kml.contains("</kml>"));
        assert!(!kml.contains("<Placemark>"));
    }

    #[test]
    fn test_emit_in_memory_and_saved() {
        let mut doc = OverlayDocument::new();
        doc.add_polygon("Overlap", &square(), &OverlayStyle::overlap());

        let emitted = doc.clone().emit(None).unwrap();
        assert_eq!(emitted, Emission::InMemory(doc.clone()));

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("overlap.kml");
        fs::write(&path, "stale").unwrap();

        let emitted = doc.emit(Some(&path)).unwrap();
        assert_eq!(emitted, Emission::Saved(path.clone()));
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("<name>Overlap</name>"));
        assert!(!written.contains("stale"));
    }
}
