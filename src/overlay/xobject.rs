use image::RgbaImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};

use crate::error::{AppError, AppResult};

use super::page::MediaBox;

pub(crate) const SIGNATURE_IMAGE_NAME: &str = "PsigImage";

/// Adds the raster as an RGB image XObject, with a soft mask when it has transparency.
pub(crate) fn embed_rgba_image(doc: &mut Document, image: &RgbaImage) -> AppResult<ObjectId> {
    let (width, height) = image.dimensions();
    let pixel_count = width as usize * height as usize;
    let mut rgb = Vec::with_capacity(pixel_count * 3);
    let mut alpha = Vec::with_capacity(pixel_count);
    for pixel in image.pixels() {
        rgb.extend_from_slice(&pixel.0[..3]);
        alpha.push(pixel[3]);
    }

    let mut image_dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
    };

    if alpha.iter().any(|&value| value != u8::MAX) {
        let smask = compressed(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            alpha,
        ))?;
        let smask_id = doc.add_object(smask);
        image_dict.set("SMask", smask_id);
    }

    Ok(doc.add_object(compressed(Stream::new(image_dict, rgb))?))
}

/// Page-sized form XObject that paints only the signature image through `matrix`.
pub(crate) fn overlay_form(
    doc: &mut Document,
    media_box: MediaBox,
    image_id: ObjectId,
    matrix: [f64; 6],
) -> AppResult<ObjectId> {
    let operands = matrix.map(pdf_number).join(" ");
    let content = format!("q {operands} cm /{SIGNATURE_IMAGE_NAME} Do Q");

    let mut xobjects = Dictionary::new();
    xobjects.set(SIGNATURE_IMAGE_NAME, image_id);
    let form = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => media_box.as_array(),
            "Resources" => dictionary! {
                "XObject" => Object::Dictionary(xobjects),
            },
        },
        content.into_bytes(),
    );
    Ok(doc.add_object(compressed(form)?))
}

/// Flate-compresses a stream the overlay adds; existing page streams are never touched.
fn compressed(mut stream: Stream) -> AppResult<Stream> {
    stream
        .compress()
        .map_err(|source| AppError::pdf_write("failed to compress overlay stream", source))?;
    Ok(stream)
}

pub(crate) fn pdf_number(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == rounded.trunc() {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}
