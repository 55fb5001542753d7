//! # PDF Container Access
//!
//! Thin layer over lopdf for the handful of things document generation
//! needs: open a template PDF, read a page's size, add fonts and images,
//! stack an overlay content stream on a page, and serialize the result.
//!
//! The overlay never rewrites the existing page content. The page's streams
//! are wrapped as `q … Q` and the new drawing operations are appended after
//! them, so whatever graphics state the template leaves behind cannot leak
//! into the fields.

pub mod content;
pub mod font;
mod standard;

pub use content::PageCanvas;
pub use font::{FontId, FontRegistry, FontSet, PdfFont, TextMeasure};

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbImage;
use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use std::io::Write;

use crate::error::{Result, ValidocError};
use crate::geometry::PageBox;

/// Zlib-compress a stream body for `/FlateDecode`.
pub fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Resources the overlay refers to by name.
#[derive(Debug, Default)]
pub struct OverlayResources {
    pub fonts: Vec<(String, ObjectId)>,
    pub images: Vec<(String, ObjectId)>,
}

/// A template PDF opened for stamping.
pub struct SourcePdf {
    doc: Document,
    compress: bool,
}

impl SourcePdf {
    /// Parse PDF bytes. Encrypted documents are rejected.
    pub fn load(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ValidocError::Pdf("empty PDF data".to_string()));
        }
        let doc = Document::load_mem(bytes)
            .map_err(|e| ValidocError::Pdf(format!("cannot parse PDF: {}", e)))?;
        if doc.trailer.get(b"Encrypt").is_ok() {
            return Err(ValidocError::Pdf(
                "encrypted PDFs are not supported".to_string(),
            ));
        }
        if doc.get_pages().is_empty() {
            return Err(ValidocError::Pdf("document has no pages".to_string()));
        }
        Ok(Self {
            doc,
            compress: true,
        })
    }

    /// Whether added streams are Flate-compressed.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Object id of a 1-based page.
    pub fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.doc
            .get_pages()
            .get(&page)
            .copied()
            .ok_or_else(|| ValidocError::InvalidPage(page, self.page_count()))
    }

    /// The page's MediaBox, inherited from ancestors when not set directly.
    pub fn page_box(&self, page_id: ObjectId) -> Result<PageBox> {
        let mut current = Some(page_id);
        while let Some(id) = current {
            let dict = self.dict(id)?;
            if let Ok(raw) = dict.get(b"MediaBox") {
                return self.media_box(raw);
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        Err(ValidocError::Pdf(format!(
            "page {} {} has no MediaBox",
            page_id.0, page_id.1
        )))
    }

    fn media_box(&self, raw: &Object) -> Result<PageBox> {
        let values = self
            .resolve(raw)
            .as_array()
            .map_err(|_| ValidocError::Pdf("MediaBox is not an array".to_string()))?;
        let numbers: Vec<f64> = values
            .iter()
            .filter_map(|o| number(self.resolve(o)))
            .collect();
        let &[llx, lly, urx, ury] = numbers.as_slice() else {
            return Err(ValidocError::Pdf(format!(
                "MediaBox needs 4 numbers, got {}",
                values.len()
            )));
        };
        let page = PageBox {
            origin_x: llx.min(urx),
            origin_y: lly.min(ury),
            width: (urx - llx).abs(),
            height: (ury - lly).abs(),
        };
        if page.width <= 0.0 || page.height <= 0.0 {
            return Err(ValidocError::InvalidPageSize(page.width, page.height));
        }
        Ok(page)
    }

    /// Add an RGB raster as an image XObject.
    pub fn add_image(&mut self, image: &RgbImage) -> Result<ObjectId> {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(image.width()),
            "Height" => i64::from(image.height()),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
        };
        let data = self.stream_body(&mut dict, image.as_raw())?;
        Ok(self.doc.add_object(Stream::new(dict, data)))
    }

    /// Mutable access for font embedding.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn compresses(&self) -> bool {
        self.compress
    }

    /// Stack `overlay` (content stream bytes) on top of the page.
    pub fn overlay(
        &mut self,
        page_id: ObjectId,
        overlay: Vec<u8>,
        resources: OverlayResources,
    ) -> Result<()> {
        let mut contents = self.existing_contents(page_id)?;

        let open_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));

        let mut body = b"Q\n".to_vec();
        body.extend_from_slice(&overlay);
        let mut dict = Dictionary::new();
        let data = self.stream_body(&mut dict, &body)?;
        let overlay_id = self.doc.add_object(Stream::new(dict, data));

        contents.insert(0, Object::Reference(open_id));
        contents.push(Object::Reference(overlay_id));

        let mut res = self.effective_resources(page_id)?;
        self.merge_named(&mut res, b"Font", &resources.fonts)?;
        self.merge_named(&mut res, b"XObject", &resources.images)?;

        let page = self.dict_mut(page_id)?;
        page.set("Contents", Object::Array(contents));
        page.set("Resources", Object::Dictionary(res));

        debug!(
            "Overlay on page object {} {}: {} fonts, {} images, {} content bytes",
            page_id.0,
            page_id.1,
            resources.fonts.len(),
            resources.images.len(),
            overlay.len()
        );
        Ok(())
    }

    /// Serialize the document.
    pub fn save(mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }

    fn existing_contents(&self, page_id: ObjectId) -> Result<Vec<Object>> {
        let page = self.dict(page_id)?;
        Ok(match page.get(b"Contents") {
            Err(_) => Vec::new(),
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            Ok(other) => {
                return Err(ValidocError::Pdf(format!(
                    "unexpected page Contents: {:?}",
                    other
                )));
            }
        })
    }

    /// The page's resource dictionary, resolved and detached from any
    /// shared or inherited object.
    fn effective_resources(&self, page_id: ObjectId) -> Result<Dictionary> {
        let mut current = Some(page_id);
        while let Some(id) = current {
            let dict = self.dict(id)?;
            if let Ok(raw) = dict.get(b"Resources") {
                return match self.resolve(raw) {
                    Object::Dictionary(d) => Ok(d.clone()),
                    _ => Err(ValidocError::Pdf(
                        "page Resources is not a dictionary".to_string(),
                    )),
                };
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        Ok(Dictionary::new())
    }

    fn merge_named(
        &self,
        resources: &mut Dictionary,
        category: &[u8],
        entries: &[(String, ObjectId)],
    ) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let mut sub = match resources.get(category) {
            Ok(raw) => match self.resolve(raw) {
                Object::Dictionary(d) => d.clone(),
                _ => {
                    return Err(ValidocError::Pdf(format!(
                        "Resources /{} is not a dictionary",
                        String::from_utf8_lossy(category)
                    )));
                }
            },
            Err(_) => Dictionary::new(),
        };
        for (name, id) in entries {
            sub.set(name.as_bytes().to_vec(), Object::Reference(*id));
        }
        resources.set(category.to_vec(), Object::Dictionary(sub));
        Ok(())
    }

    fn stream_body(&self, dict: &mut Dictionary, data: &[u8]) -> Result<Vec<u8>> {
        if self.compress {
            dict.set("Filter", "FlateDecode");
            deflate(data)
        } else {
            Ok(data.to_vec())
        }
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    fn dict(&self, id: ObjectId) -> Result<&Dictionary> {
        self.doc
            .get_object(id)
            .and_then(Object::as_dict)
            .map_err(|_| ValidocError::Pdf(format!("object {} {} is not a dictionary", id.0, id.1)))
    }

    fn dict_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary> {
        self.doc
            .get_object_mut(id)
            .and_then(Object::as_dict_mut)
            .map_err(|_| ValidocError::Pdf(format!("object {} {} is not a dictionary", id.0, id.1)))
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory PDFs for tests.

    use lopdf::{Document, Object, Stream, dictionary};

    /// A document with `pages` empty pages of the given size.
    pub fn blank_pdf(pages: usize, width: i64, height: i64) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..pages {
            let content_id = doc.add_object(Stream::new(dictionary! {}, b"0 0 m\n".to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
                "Resources" => dictionary! {},
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }
}
