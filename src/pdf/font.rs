//! Fonts for text fields: measuring, encoding and embedding.
//!
//! Two kinds of font can back a text field:
//!
//! - **TrueType** (the production path): parsed with ab_glyph for advance
//!   widths, embedded as a Type0 / Identity-H composite font so any glyph in
//!   the file (accents, ñ, ¿) can be shown. A ToUnicode map keeps the output
//!   searchable and copyable.
//! - **Helvetica**: a standard font that needs no file. Handy for tests and
//!   previews; limited to WinAnsi characters.
//!
//! Width measurement and glyph encoding both go through the same
//! [`PdfFont`], so alignment offsets always match what is drawn.

use ab_glyph::{Font, FontArc, GlyphId};
use log::debug;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use super::standard;
use crate::error::{Result, ValidocError};

/// Anything that can tell how wide a string is at a given size.
pub trait TextMeasure {
    /// Advance width of `text` in points at `size` points.
    fn text_width(&self, text: &str, size: f64) -> f64;
}

struct TrueType {
    font: FontArc,
    bytes: Arc<[u8]>,
    units_per_em: f32,
}

enum FontKind {
    TrueType(TrueType),
    Helvetica,
}

/// A font usable for drawing text into a PDF.
pub struct PdfFont {
    name: String,
    kind: FontKind,
}

impl std::fmt::Debug for PdfFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            FontKind::TrueType(_) => "TrueType",
            FontKind::Helvetica => "Helvetica",
        };
        f.debug_struct("PdfFont")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

impl PdfFont {
    /// The standard Helvetica font (not embedded).
    pub fn helvetica() -> Self {
        Self {
            name: "Helvetica".to_string(),
            kind: FontKind::Helvetica,
        }
    }

    /// Parse a TrueType/OpenType font from memory.
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> Result<Self> {
        let bytes: Arc<[u8]> = Arc::from(bytes);
        let font = FontArc::try_from_vec(bytes.to_vec())
            .map_err(|e| ValidocError::Font(format!("{}: {}", name, e)))?;
        let units_per_em = font.units_per_em().unwrap_or(1000.0);
        Ok(Self {
            name: pdf_name(name),
            kind: FontKind::TrueType(TrueType {
                font,
                bytes,
                units_per_em,
            }),
        })
    }

    /// Load a TrueType font file. A missing file is fatal to rendering.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ValidocError::Font(format!("cannot read {}: {}", path.display(), e)))?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Embedded");
        Self::from_bytes(stem, bytes)
    }

    /// PostScript-style name used as `BaseFont`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.kind, FontKind::TrueType(_))
    }

    /// Bytes for a `Tj` string operand.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match &self.kind {
            FontKind::Helvetica => standard::encode_win_ansi(text),
            FontKind::TrueType(tt) => text
                .chars()
                .flat_map(|c| tt.font.glyph_id(c).0.to_be_bytes())
                .collect(),
        }
    }

    /// Advance of one character in 1/1000 em.
    fn char_width(&self, ch: char) -> f64 {
        match &self.kind {
            FontKind::Helvetica => {
                let code = standard::win_ansi_code(ch).unwrap_or(standard::REPLACEMENT);
                f64::from(standard::helvetica_width(code))
            }
            FontKind::TrueType(tt) => glyph_width(tt, tt.font.glyph_id(ch)),
        }
    }
}

impl TextMeasure for PdfFont {
    fn text_width(&self, text: &str, size: f64) -> f64 {
        let units: f64 = text.chars().map(|c| self.char_width(c)).sum();
        units * size / 1000.0
    }
}

fn glyph_width(tt: &TrueType, id: GlyphId) -> f64 {
    f64::from(tt.font.h_advance_unscaled(id) * 1000.0 / tt.units_per_em)
}

/// Keep only characters legal in a PDF name.
fn pdf_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();
    if cleaned.is_empty() {
        "Embedded".to_string()
    } else {
        cleaned
    }
}

/// Handle to a font inside a [`FontSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontId(usize);

/// The fonts available to a render: one default plus named families.
#[derive(Debug, Clone)]
pub struct FontSet {
    fonts: Vec<Arc<PdfFont>>,
    families: HashMap<String, FontId>,
}

impl FontSet {
    pub fn new(default: PdfFont) -> Self {
        Self {
            fonts: vec![Arc::new(default)],
            families: HashMap::new(),
        }
    }

    /// Helvetica only. No font file needed.
    pub fn standard() -> Self {
        Self::new(PdfFont::helvetica())
    }

    /// Register a font for a `fontFamily` value (case-insensitive).
    pub fn with_family(mut self, family: &str, font: PdfFont) -> Self {
        let id = FontId(self.fonts.len());
        self.fonts.push(Arc::new(font));
        self.families.insert(family.trim().to_lowercase(), id);
        self
    }

    pub fn default_font(&self) -> FontId {
        FontId(0)
    }

    /// Font for a field's `fontFamily`, falling back to the default.
    pub fn resolve(&self, family: Option<&str>) -> FontId {
        let Some(family) = family else {
            return self.default_font();
        };
        match self.families.get(&family.trim().to_lowercase()) {
            Some(id) => *id,
            None => {
                debug!("Font family '{}' not registered, using default", family);
                self.default_font()
            }
        }
    }

    pub fn font(&self, id: FontId) -> &PdfFont {
        &self.fonts[id.0]
    }
}

/// Fonts used by one render, and the characters drawn with each.
///
/// Embedded fonts only carry widths and Unicode mappings for glyphs that
/// were actually drawn.
#[derive(Debug, Default)]
pub struct FontRegistry {
    used: BTreeMap<FontId, BTreeSet<char>>,
}

impl FontRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource name for a font, e.g. `VdF1`.
    pub fn resource_name(id: FontId) -> String {
        format!("VdF{}", id.0 + 1)
    }

    /// Record that `text` is drawn with `id`; returns the resource name.
    pub fn record(&mut self, id: FontId, text: &str) -> String {
        self.used.entry(id).or_default().extend(text.chars());
        Self::resource_name(id)
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Add the used fonts to `doc`. Returns `(resource name, font object)`.
    pub fn embed(
        &self,
        doc: &mut Document,
        fonts: &FontSet,
        compress: bool,
    ) -> Result<Vec<(String, ObjectId)>> {
        let mut out = Vec::with_capacity(self.used.len());
        for (id, chars) in &self.used {
            let font = fonts.font(*id);
            let object = match &font.kind {
                FontKind::Helvetica => doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => "Helvetica",
                    "Encoding" => "WinAnsiEncoding",
                }),
                FontKind::TrueType(tt) => embed_true_type(doc, &font.name, tt, chars, compress)?,
            };
            out.push((Self::resource_name(*id), object));
        }
        Ok(out)
    }
}

fn embed_true_type(
    doc: &mut Document,
    name: &str,
    tt: &TrueType,
    chars: &BTreeSet<char>,
    compress: bool,
) -> Result<ObjectId> {
    let mut file_dict = dictionary! { "Length1" => tt.bytes.len() as i64 };
    let file_data = if compress {
        file_dict.set("Filter", "FlateDecode");
        super::deflate(&tt.bytes)?
    } else {
        tt.bytes.to_vec()
    };
    let file_id = doc.add_object(Stream::new(file_dict, file_data));

    let scale = 1000.0 / tt.units_per_em;
    let ascent = (tt.font.ascent_unscaled() * scale).round() as i64;
    let descent = (tt.font.descent_unscaled() * scale).round() as i64;

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => name,
        "Flags" => 32,
        "FontBBox" => vec![0.into(), descent.into(), 1000.into(), ascent.into()],
        "ItalicAngle" => 0,
        "Ascent" => ascent,
        "Descent" => descent,
        "CapHeight" => ascent,
        "StemV" => 80,
        "FontFile2" => file_id,
    });

    // Glyph id -> (width, unicode). Several chars may share a glyph (.notdef).
    let mut glyphs: BTreeMap<u16, (i64, char)> = BTreeMap::new();
    for ch in chars {
        let gid = tt.font.glyph_id(*ch);
        glyphs
            .entry(gid.0)
            .or_insert_with(|| (glyph_width(tt, gid).round() as i64, *ch));
    }

    let mut widths = Vec::with_capacity(glyphs.len() * 2);
    for (gid, (width, _)) in &glyphs {
        widths.push(Object::Integer(i64::from(*gid)));
        widths.push(Object::Array(vec![Object::Integer(*width)]));
    }

    let cid_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType2",
        "BaseFont" => name,
        "CIDSystemInfo" => dictionary! {
            "Registry" => Object::string_literal("Adobe"),
            "Ordering" => Object::string_literal("Identity"),
            "Supplement" => 0,
        },
        "FontDescriptor" => descriptor_id,
        "CIDToGIDMap" => "Identity",
        "DW" => 1000,
        "W" => widths,
    });

    let cmap = to_unicode_cmap(glyphs.iter().map(|(gid, (_, ch))| (*gid, *ch)));
    let mut cmap_dict = Dictionary::new();
    let cmap_data = if compress {
        cmap_dict.set("Filter", "FlateDecode");
        super::deflate(cmap.as_bytes())?
    } else {
        cmap.into_bytes()
    };
    let cmap_id = doc.add_object(Stream::new(cmap_dict, cmap_data));

    Ok(doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => name,
        "Encoding" => "Identity-H",
        "DescendantFonts" => vec![cid_font_id.into()],
        "ToUnicode" => cmap_id,
    }))
}

/// Build a ToUnicode CMap for 2-byte glyph ids.
fn to_unicode_cmap(entries: impl Iterator<Item = (u16, char)>) -> String {
    let entries: Vec<(u16, char)> = entries.collect();
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n\
         12 dict begin\n\
         begincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n\
         /CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );
    // At most 100 entries per bfchar block.
    for chunk in entries.chunks(100) {
        cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, ch) in chunk {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            cmap.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
        }
        cmap.push_str("endbfchar\n");
    }
    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}

/// Hex string operand for `Tj`.
pub fn text_operand(bytes: Vec<u8>) -> Object {
    Object::String(bytes, StringFormat::Hexadecimal)
}
