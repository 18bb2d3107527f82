//! lopdf side of a document: content streams and annotation dictionaries

use super::access::LinkAnnotation;
use crate::analysis::{normalize_bytes, Rect};
use crate::error::{Error, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Parsed object graph of a PDF plus its page tree
pub(crate) struct ContentSource {
    document: Document,
    pages: Vec<ObjectId>,
}

impl ContentSource {
    pub(crate) fn load(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data)?;
        let pages = document.get_pages().into_values().collect();
        Ok(Self { document, pages })
    }

    pub(crate) fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// True when the page tree could not be walked although the file has objects
    pub(crate) fn page_tree_broken(&self) -> bool {
        self.pages.is_empty() && !self.document.objects.is_empty()
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        if page < 1 || page > self.page_count() {
            return Err(Error::PageOutOfBounds {
                page,
                total: self.page_count(),
            });
        }
        Ok(self.pages[(page - 1) as usize])
    }

    /// Decoded content stream of a page, `None` when it has no content
    pub(crate) fn raw_content(&self, page: u32) -> Result<Option<Vec<u8>>> {
        let id = self.page_id(page)?;
        let content = self.document.get_page_content(id)?;
        Ok((!content.is_empty()).then_some(content))
    }

    /// lopdf's own text extraction, used when PDFium is unavailable
    pub(crate) fn plain_text(&self, page: u32) -> Result<String> {
        self.page_id(page)?;
        Ok(self.document.extract_text(&[page])?)
    }

    /// Link annotations listed in each page's `/Annots`
    pub(crate) fn links_by_page(&self) -> Vec<(u32, Vec<Result<LinkAnnotation>>)> {
        (1..=self.page_count())
            .zip(self.pages.iter())
            .map(|(page, id)| (page, self.page_links(*id)))
            .collect()
    }

    fn page_links(&self, page_id: ObjectId) -> Vec<Result<LinkAnnotation>> {
        let annots = match self
            .document
            .get_dictionary(page_id)
            .and_then(|page| page.get(b"Annots"))
        {
            Ok(obj) => obj,
            Err(_) => return Vec::new(),
        };

        let entries = match self.resolve(annots).and_then(|obj| obj.as_array()) {
            Ok(entries) => entries,
            Err(e) => return vec![Err(decode_error(format!("/Annots is not an array: {}", e)))],
        };

        entries
            .iter()
            .filter_map(|entry| {
                let dict = match self.resolve(entry).and_then(|obj| obj.as_dict()) {
                    Ok(dict) => dict,
                    Err(e) => return Some(Err(decode_error(format!("bad annotation entry: {}", e)))),
                };
                is_link(dict).then(|| self.link_annotation(dict))
            })
            .collect()
    }

    /// Every link annotation object in the file, page unknown
    pub(crate) fn document_links(&self) -> Vec<Result<LinkAnnotation>> {
        self.document
            .objects
            .values()
            .filter_map(|obj| obj.as_dict().ok())
            .filter(|dict| is_link(dict))
            .map(|dict| self.link_annotation(dict))
            .collect()
    }

    fn link_annotation(&self, dict: &Dictionary) -> Result<LinkAnnotation> {
        let rect = dict
            .get(b"Rect")
            .ok()
            .and_then(|obj| self.resolve(obj).ok())
            .and_then(|obj| obj.as_array().ok())
            .and_then(|values| rect_from_array(values));

        let action = match dict.get(b"A") {
            Ok(obj) => self
                .resolve(obj)
                .and_then(|obj| obj.as_dict())
                .map_err(|e| decode_error(format!("unreadable /A action: {}", e)))?,
            Err(_) => return Ok(LinkAnnotation { uri: None, rect }),
        };

        let is_uri_action = matches!(action.get(b"S"), Ok(Object::Name(name)) if name == b"URI");
        if !is_uri_action {
            return Ok(LinkAnnotation { uri: None, rect });
        }

        let uri = match action.get(b"URI").and_then(|obj| self.resolve(obj)) {
            Ok(Object::String(bytes, _)) => pdf_string(bytes),
            Ok(other) => {
                return Err(decode_error(format!("/URI is not a string: {:?}", other)))
            }
            Err(e) => return Err(decode_error(format!("missing /URI: {}", e))),
        };

        Ok(LinkAnnotation {
            uri: Some(uri),
            rect,
        })
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> lopdf::Result<&'a Object> {
        match obj {
            Object::Reference(id) => self.document.get_object(*id),
            other => Ok(other),
        }
    }
}

fn is_link(dict: &Dictionary) -> bool {
    matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Link")
}

fn decode_error(reason: String) -> Error {
    Error::AnnotationDecode { reason }
}

fn rect_from_array(values: &[Object]) -> Option<Rect> {
    let numbers: Vec<f32> = values
        .iter()
        .filter_map(|value| match value {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(f) => Some(*f),
            _ => None,
        })
        .collect();
    let array: [f32; 4] = numbers.try_into().ok()?;
    Some(Rect::from_pdf_array(array))
}

/// Text strings are UTF-16BE with a BOM or single-byte encoded
fn pdf_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => normalize_bytes(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};
    use pretty_assertions::assert_eq;

    fn uri_annotation(doc: &mut Document, uri: &str) -> ObjectId {
        doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![72.into(), 700.into(), 200.into(), Object::Real(712.5)],
            "A" => dictionary! {
                "S" => "URI",
                "URI" => Object::string_literal(uri),
            },
        })
    }

    fn build(pages: Vec<(&str, Vec<ObjectId>)>, doc: &mut Document) -> Vec<u8> {
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let mut kids: Vec<Object> = Vec::new();
        for (text, annots) in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().unwrap(),
            ));
            let mut page = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
            };
            if !annots.is_empty() {
                let refs: Vec<Object> = annots.into_iter().map(Object::from).collect();
                page.set("Annots", refs);
            }
            kids.push(doc.add_object(page).into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_raw_content_of_each_page() {
        let mut doc = Document::with_version("1.5");
        let data = build(vec![("first page", vec![]), ("second page", vec![])], &mut doc);
        let source = ContentSource::load(&data).unwrap();

        assert_eq!(source.page_count(), 2);
        let raw = source.raw_content(2).unwrap().unwrap();
        assert!(String::from_utf8_lossy(&raw).contains("(second page) Tj"));
        assert!(matches!(
            source.raw_content(3),
            Err(Error::PageOutOfBounds { page: 3, total: 2 })
        ));
    }

    #[test]
    fn test_links_attributed_to_their_page() {
        let mut doc = Document::with_version("1.5");
        let link = uri_annotation(&mut doc, "https://jane.example.dev");
        let data = build(vec![("no links", vec![]), ("one link", vec![link])], &mut doc);
        let source = ContentSource::load(&data).unwrap();

        let pages = source.links_by_page();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].1.is_empty());
        assert_eq!(pages[1].0, 2);
        let annotation = pages[1].1[0].as_ref().unwrap();
        assert_eq!(annotation.uri.as_deref(), Some("https://jane.example.dev"));
        assert_eq!(
            annotation.rect,
            Some(Rect::from_pdf_array([72.0, 700.0, 200.0, 712.5]))
        );
    }

    #[test]
    fn test_non_uri_and_non_link_annotations() {
        let mut doc = Document::with_version("1.5");
        let goto = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "A" => dictionary! { "S" => "GoTo", "D" => vec![Object::Integer(0)] },
        });
        let note = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Text",
            "Contents" => Object::string_literal("just a note"),
        });
        let data = build(vec![("page", vec![goto, note])], &mut doc);
        let source = ContentSource::load(&data).unwrap();

        let links = &source.links_by_page()[0].1;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_ref().unwrap().uri, None);
    }

    #[test]
    fn test_dangling_annotation_is_a_decode_error() {
        let mut doc = Document::with_version("1.5");
        let good = uri_annotation(&mut doc, "https://ok.example");
        let dangling: ObjectId = (9999, 0);
        let data = build(vec![("page", vec![dangling, good])], &mut doc);
        let source = ContentSource::load(&data).unwrap();

        let links = &source.links_by_page()[0].1;
        assert_eq!(links.len(), 2);
        assert!(matches!(links[0], Err(Error::AnnotationDecode { .. })));
        assert!(links[1].is_ok());
    }

    #[test]
    fn test_document_wide_scan_finds_unattached_links() {
        let mut doc = Document::with_version("1.5");
        uri_annotation(&mut doc, "https://orphan.example");
        let data = build(vec![("page", vec![])], &mut doc);
        let source = ContentSource::load(&data).unwrap();

        let links = source.document_links();
        assert_eq!(links.len(), 1);
        assert_eq!(
            links[0].as_ref().unwrap().uri.as_deref(),
            Some("https://orphan.example")
        );
    }

    #[test]
    fn test_pdf_string_utf16() {
        assert_eq!(pdf_string(&[0xFE, 0xFF, 0x00, 0x68, 0x00, 0x69]), "hi");
        assert_eq!(pdf_string(b"plain"), "plain");
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(ContentSource::load(b"%PDF-1.4 but nothing else").is_err());
    }
}
