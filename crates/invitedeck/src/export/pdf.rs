use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use serde::{Deserialize, Serialize};

use crate::export::ExportResult;
use crate::export::document::PageSink;

const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Unit a page format is expressed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PageUnit {
    #[default]
    Pt,
    Mm,
}

impl PageUnit {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pt" => Some(Self::Pt),
            "mm" => Some(Self::Mm),
            _ => None,
        }
    }

    fn to_points(self, value: f32) -> f32 {
        match self {
            Self::Pt => value,
            Self::Mm => value * POINTS_PER_MM,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFormat {
    pub width: f32,
    pub height: f32,
    pub unit: PageUnit,
}

impl PageFormat {
    /// Portrait A4.
    pub fn a4(unit: PageUnit) -> Self {
        match unit {
            PageUnit::Pt => Self {
                width: 595.28,
                height: 841.89,
                unit,
            },
            PageUnit::Mm => Self {
                width: 210.0,
                height: 297.0,
                unit,
            },
        }
    }

    /// Page size in PDF user space units.
    pub fn points(&self) -> (f32, f32) {
        (self.unit.to_points(self.width), self.unit.to_points(self.height))
    }
}

/// A PDF built page by page, each page holding full-bleed JPEG images.
pub struct PdfDocument {
    doc: Document,
    pages_id: ObjectId,
    format: PageFormat,
    /// Image XObjects placed on each page, in order.
    pages: Vec<Vec<ObjectId>>,
}

impl PdfDocument {
    pub fn new(format: PageFormat) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            format,
            pages: vec![Vec::new()],
        }
    }

    fn page_content(&self, images: &[ObjectId]) -> ExportResult<(Vec<u8>, Dictionary)> {
        let (w, h) = self.format.points();
        let mut operations = Vec::new();
        let mut xobjects = Dictionary::new();
        for (i, id) in images.iter().enumerate() {
            let name = format!("Im{}", i + 1);
            operations.push(Operation::new("q", vec![]));
            operations.push(Operation::new(
                "cm",
                vec![
                    Object::Real(w),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(h),
                    Object::Integer(0),
                    Object::Integer(0),
                ],
            ));
            operations.push(Operation::new(
                "Do",
                vec![Object::Name(name.clone().into_bytes())],
            ));
            operations.push(Operation::new("Q", vec![]));
            xobjects.set(name, Object::Reference(*id));
        }
        let content = Content { operations }.encode()?;
        Ok((content, xobjects))
    }
}

impl PageSink for PdfDocument {
    fn add_page(&mut self) -> ExportResult<()> {
        self.pages.push(Vec::new());
        Ok(())
    }

    fn place_image(&mut self, jpeg: &[u8], width: u32, height: u32) -> ExportResult<()> {
        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg.to_vec(),
        );
        let id = self.doc.add_object(image);
        if let Some(page) = self.pages.last_mut() {
            page.push(id);
        }
        Ok(())
    }

    fn finish(&mut self) -> ExportResult<Vec<u8>> {
        let (w, h) = self.format.points();
        let mut kids = Vec::with_capacity(self.pages.len());
        for images in std::mem::take(&mut self.pages) {
            let (content, xobjects) = self.page_content(&images)?;
            let content_id = self.doc.add_object(Stream::new(Dictionary::new(), content));
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => self.pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(w),
                    Object::Real(h),
                ],
                "Contents" => content_id,
                "Resources" => dictionary! { "XObject" => xobjects },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::document::encode_jpeg;
    use eframe::egui::Color32;
    use image::RgbaImage;

    fn jpeg() -> Vec<u8> {
        let image = RgbaImage::from_pixel(4, 6, image::Rgba([30, 58, 138, 255]));
        encode_jpeg(&image, 90, Color32::WHITE).unwrap()
    }

    #[test]
    fn a4_in_either_unit_is_the_same_page() {
        let (pw, ph) = PageFormat::a4(PageUnit::Pt).points();
        let (mw, mh) = PageFormat::a4(PageUnit::Mm).points();
        assert!((pw - mw).abs() < 0.1);
        assert!((ph - mh).abs() < 0.1);
    }

    #[test]
    fn saved_document_has_one_page_per_section() {
        let mut pdf = PdfDocument::new(PageFormat::a4(PageUnit::Mm));
        let jpeg = jpeg();
        pdf.place_image(&jpeg, 4, 6).unwrap();
        for _ in 0..3 {
            pdf.add_page().unwrap();
            pdf.place_image(&jpeg, 4, 6).unwrap();
        }
        let bytes = pdf.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 4);
    }

    fn image_width_on_page(doc: &Document, page_id: ObjectId) -> i64 {
        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let image_id = xobjects.get(b"Im1").unwrap().as_reference().unwrap();
        let image = doc.get_object(image_id).unwrap().as_stream().unwrap();
        image.dict.get(b"Width").unwrap().as_i64().unwrap()
    }

    #[test]
    fn pages_keep_placement_order() {
        let mut pdf = PdfDocument::new(PageFormat::a4(PageUnit::Pt));
        for width in 1..=4u32 {
            if width > 1 {
                pdf.add_page().unwrap();
            }
            let image = RgbaImage::from_pixel(width, 6, image::Rgba([30, 58, 138, 255]));
            let jpeg = encode_jpeg(&image, 90, Color32::WHITE).unwrap();
            pdf.place_image(&jpeg, width, 6).unwrap();
        }
        let bytes = pdf.finish().unwrap();

        let loaded = Document::load_mem(&bytes).unwrap();
        let widths: Vec<i64> = loaded
            .get_pages()
            .values()
            .map(|&id| image_width_on_page(&loaded, id))
            .collect();
        assert_eq!(widths, [1, 2, 3, 4]);
    }

    #[test]
    fn single_section_uses_the_implicit_page() {
        let mut pdf = PdfDocument::new(PageFormat::a4(PageUnit::Pt));
        pdf.place_image(&jpeg(), 4, 6).unwrap();
        let bytes = pdf.finish().unwrap();
        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 1);
    }

    #[test]
    fn unit_names() {
        assert_eq!(PageUnit::from_name("mm"), Some(PageUnit::Mm));
        assert_eq!(PageUnit::from_name("pt"), Some(PageUnit::Pt));
        assert_eq!(PageUnit::from_name("in"), None);
    }
}
