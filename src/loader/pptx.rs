//! PowerPoint (`.pptx`) text extraction.
//!
//! A pptx file is a zip archive; every slide lives in `ppt/slides/slideN.xml`.
//! Slides are read in presentation order, as listed by `ppt/presentation.xml`
//! and resolved through its relationships part. Archives without that list
//! fall back to the number in the slide file name.
//! The text of each shape is its paragraphs joined by newlines, and shapes are
//! joined by newlines in slide order.

use super::{decode_xml_entities, DocumentKind, Extractor};
use crate::error::{ArbitroError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

/// Extractor for `.pptx` files.
pub struct PptxExtractor;

impl PptxExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PptxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn slide_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^ppt/slides/slide(\d+)\.xml$").expect("valid regex"))
}

impl Extractor for PptxExtractor {
    fn extensions(&self) -> &[&'static str] {
        &["pptx"]
    }

    fn kind(&self) -> DocumentKind {
        DocumentKind::Slides
    }

    fn extract(&self, path: &Path) -> Result<String> {
        let file = std::fs::File::open(path)?;
        let mut archive = zip::ZipArchive::new(file).map_err(|e| ArbitroError::Extraction {
            path: path.display().to_string(),
            reason: format!("invalid pptx archive: {}", e),
        })?;

        let mut slides: Vec<(u32, String)> = archive
            .file_names()
            .filter_map(|name| {
                let number = slide_name_pattern()
                    .captures(name)?
                    .get(1)?
                    .as_str()
                    .parse()
                    .ok()?;
                Some((number, name.to_string()))
            })
            .collect();
        slides.sort_by_key(|(number, _)| *number);
        let mut names: Vec<String> = slides.into_iter().map(|(_, name)| name).collect();

        let listed = match (
            read_entry(&mut archive, "ppt/presentation.xml"),
            read_entry(&mut archive, "ppt/_rels/presentation.xml.rels"),
        ) {
            (Some(presentation), Some(rels)) => presentation_order(&presentation, &rels)
                .into_iter()
                .filter(|name| names.contains(name))
                .collect(),
            _ => Vec::new(),
        };
        if !listed.is_empty() {
            names = listed;
        }

        let mut texts = Vec::new();
        for name in names {
            let mut xml = String::new();
            archive.by_name(&name)?.read_to_string(&mut xml)?;
            texts.extend(shape_texts(&xml));
        }

        Ok(texts.join("\n"))
    }
}

fn read_entry(archive: &mut zip::ZipArchive<std::fs::File>, name: &str) -> Option<String> {
    let mut xml = String::new();
    archive.by_name(name).ok()?.read_to_string(&mut xml).ok()?;
    Some(xml)
}

fn slide_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<p:sldId\b([^>]*)>").expect("valid regex"))
}

fn relationship_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<Relationship\b([^>]*)>").expect("valid regex"))
}

/// Value of `name="..."` inside the attribute text of a tag.
fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!(" {}=\"", name);
    let start = attrs.find(&needle)? + needle.len();
    let len = attrs[start..].find('"')?;
    Some(&attrs[start..start + len])
}

/// Archive paths of the slides listed in `<p:sldIdLst>`, in presentation order.
fn presentation_order(presentation_xml: &str, rels_xml: &str) -> Vec<String> {
    let targets: HashMap<&str, &str> = relationship_pattern()
        .captures_iter(rels_xml)
        .filter_map(|caps| {
            let attrs = caps.get(1)?.as_str();
            Some((attribute(attrs, "Id")?, attribute(attrs, "Target")?))
        })
        .collect();

    slide_id_pattern()
        .captures_iter(presentation_xml)
        .filter_map(|caps| {
            let rel_id = attribute(caps.get(1)?.as_str(), "r:id")?;
            let target = targets.get(rel_id)?;
            Some(match target.strip_prefix('/') {
                Some(absolute) => absolute.to_string(),
                None => format!("ppt/{}", target),
            })
        })
        .collect()
}

/// Text of every text-bearing shape in a slide, in document order.
fn shape_texts(xml: &str) -> Vec<String> {
    let mut shapes = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_run = false;
    let mut rest = xml;

    while let Some(start) = rest.find('<') {
        if in_run {
            current.push_str(&decode_xml_entities(&rest[..start]));
        }
        let Some(len) = rest[start..].find('>') else {
            break;
        };
        let tag = &rest[start + 1..start + len];
        rest = &rest[start + len + 1..];

        let (closing, body) = match tag.strip_prefix('/') {
            Some(body) => (true, body),
            None => (false, tag),
        };
        let self_closing = body.ends_with('/');
        let name = body
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("");

        match name {
            "a:t" if closing => in_run = false,
            "a:t" if !self_closing => in_run = true,
            "a:br" => current.push('\n'),
            "a:p" if closing || self_closing => paragraphs.push(std::mem::take(&mut current)),
            "p:txBody" if closing => {
                let text = paragraphs.join("\n");
                paragraphs.clear();
                if !text.trim().is_empty() {
                    shapes.push(text);
                }
            }
            _ => {}
        }
    }

    shapes
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) fn slide_xml(shapes: &[&[&str]]) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree>"#,
        );
        for paragraphs in shapes {
            xml.push_str("<p:sp><p:txBody><a:bodyPr/><a:lstStyle/>");
            for paragraph in *paragraphs {
                xml.push_str(&format!(
                    r#"<a:p><a:r><a:rPr lang="es-ES" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                    paragraph
                ));
            }
            xml.push_str("</p:txBody></p:sp>");
        }
        xml.push_str("</p:spTree></p:cSld></p:sld>");
        xml
    }

    /// Write a pptx archive whose slides contain the given shapes.
    pub(crate) fn write_sample_pptx(path: &Path, slides: &[(u32, String)]) {
        write_pptx(path, slides, None);
    }

    fn presentation_parts(order: &[u32]) -> (String, String) {
        let mut presentation = String::from(
            r#"<p:presentation xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>"#,
        );
        let mut rels = String::from(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/>"#,
        );
        for (i, number) in order.iter().enumerate() {
            presentation.push_str(&format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, 10 + number));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide{}.xml"/>"#,
                10 + number,
                number
            ));
        }
        presentation.push_str("</p:sldIdLst></p:presentation>");
        rels.push_str("</Relationships>");
        (presentation, rels)
    }

    fn write_pptx(path: &Path, slides: &[(u32, String)], order: Option<&[u32]>) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::FileOptions::default();

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(b"<Types/>").unwrap();
        if let Some(order) = order {
            let (presentation, rels) = presentation_parts(order);
            zip.start_file("ppt/presentation.xml", options).unwrap();
            zip.write_all(presentation.as_bytes()).unwrap();
            zip.start_file("ppt/_rels/presentation.xml.rels", options)
                .unwrap();
            zip.write_all(rels.as_bytes()).unwrap();
        }
        for (number, xml) in slides {
            zip.start_file(format!("ppt/slides/slide{}.xml", number), options)
                .unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
        }
        zip.start_file("ppt/slides/_rels/slide1.xml.rels", options)
            .unwrap();
        zip.write_all(b"<Relationships/>").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_shape_texts() {
        let xml = slide_xml(&[&["Reglas de juego", "Artículo 1"], &["Tiempo &amp; marcador"]]);
        let shapes = shape_texts(&xml);
        assert_eq!(shapes, vec!["Reglas de juego\nArtículo 1", "Tiempo & marcador"]);
    }

    #[test]
    fn test_empty_shapes_are_dropped() {
        let xml = r#"<p:sp><p:txBody><a:p/></p:txBody></p:sp><p:sp><p:txBody><a:p><a:r><a:t>Hola</a:t></a:r><a:br/><a:r><a:t>mundo</a:t></a:r></a:p></p:txBody></p:sp>"#;
        assert_eq!(shape_texts(xml), vec!["Hola\nmundo"]);
    }

    #[test]
    fn test_extract_orders_slides_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curso.pptx");
        write_sample_pptx(
            &path,
            &[
                (10, slide_xml(&[&["Diapositiva diez"]])),
                (2, slide_xml(&[&["Diapositiva dos"]])),
                (1, slide_xml(&[&["Diapositiva uno"], &["Notas"]])),
            ],
        );

        let text = PptxExtractor::new().extract(&path).unwrap();
        assert_eq!(text, "Diapositiva uno\nNotas\nDiapositiva dos\nDiapositiva diez");
    }

    #[test]
    fn test_extract_follows_presentation_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curso.pptx");
        write_pptx(
            &path,
            &[
                (1, slide_xml(&[&["Portada"]])),
                (2, slide_xml(&[&["Añadida al final"]])),
                (3, slide_xml(&[&["Movida al principio"]])),
            ],
            Some(&[3, 1, 2]),
        );

        let text = PptxExtractor::new().extract(&path).unwrap();
        assert_eq!(text, "Movida al principio\nPortada\nAñadida al final");
    }

    #[test]
    fn test_presentation_order_resolves_relationships() {
        let presentation = r#"<p:sldIdLst><p:sldId id="257" r:id="rId7"/><p:sldId id="256" r:id="rId2"/><p:sldId id="258" r:id="rId99"/></p:sldIdLst>"#;
        let rels = r#"<Relationships><Relationship Target="slides/slide1.xml" Id="rId2" Type="t"/><Relationship Id="rId7" Type="t" Target="/ppt/slides/slide4.xml"/></Relationships>"#;

        assert_eq!(
            presentation_order(presentation, rels),
            vec!["ppt/slides/slide4.xml", "ppt/slides/slide1.xml"]
        );
    }

    #[test]
    fn test_not_a_zip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roto.pptx");
        std::fs::write(&path, b"definitely not a zip").unwrap();

        let err = PptxExtractor::new().extract(&path).unwrap_err();
        assert!(matches!(err, ArbitroError::Extraction { .. }));
    }
}
