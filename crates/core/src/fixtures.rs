//! Synthetic EXIF, JPEG and HEIF payloads for tests.

use exif::experimental::Writer;
use exif::{Field, In, Rational, Tag, Value};
use std::io::Cursor;

/// GPS fields to embed. Magnitudes are stored as a single degree rational so
/// they decode back to exactly the same `f64`.
#[derive(Debug, Clone)]
pub struct GpsFixture {
    lat: f64,
    lat_ref: &'static str,
    lon: f64,
    lon_ref: &'static str,
    altitude: Option<(f64, u8)>,
}

impl GpsFixture {
    pub fn new(lat: f64, lat_ref: &'static str, lon: f64, lon_ref: &'static str) -> Self {
        Self {
            lat,
            lat_ref,
            lon,
            lon_ref,
            altitude: None,
        }
    }

    pub fn altitude(mut self, metres: f64, reference: u8) -> Self {
        self.altitude = Some((metres, reference));
        self
    }
}

const SCALE: u32 = 1_000_000;

fn degrees(v: f64) -> Value {
    let num = (v.abs() * f64::from(SCALE)).round() as u32;
    Value::Rational(vec![
        Rational::from((num, SCALE)),
        Rational::from((0, 1)),
        Rational::from((0, 1)),
    ])
}

fn field(tag: Tag, value: Value) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value,
    }
}

fn write_tiff(fields: &[Field]) -> Vec<u8> {
    let mut writer = Writer::new();
    for f in fields {
        writer.push_field(f);
    }
    let mut buf = Cursor::new(Vec::new());
    writer.write(&mut buf, false).expect("write exif");
    buf.into_inner()
}

/// A bare TIFF-format EXIF block carrying the given GPS fields.
pub fn exif_block(gps: &GpsFixture) -> Vec<u8> {
    let mut fields = vec![
        field(Tag::Make, Value::Ascii(vec![b"Fixture".to_vec()])),
        field(Tag::GPSLatitudeRef, Value::Ascii(vec![gps.lat_ref.as_bytes().to_vec()])),
        field(Tag::GPSLatitude, degrees(gps.lat)),
        field(Tag::GPSLongitudeRef, Value::Ascii(vec![gps.lon_ref.as_bytes().to_vec()])),
        field(Tag::GPSLongitude, degrees(gps.lon)),
    ];
    if let Some((metres, reference)) = gps.altitude {
        let num = (metres.abs() * 1000.0).round() as u32;
        fields.push(field(Tag::GPSAltitudeRef, Value::Byte(vec![reference])));
        fields.push(field(Tag::GPSAltitude, Value::Rational(vec![Rational::from((num, 1000))])));
    }
    write_tiff(&fields)
}

/// An EXIF block with camera fields only.
pub fn exif_block_without_gps() -> Vec<u8> {
    write_tiff(&[
        field(Tag::Make, Value::Ascii(vec![b"Fixture".to_vec()])),
        field(Tag::Orientation, Value::Short(vec![1])),
    ])
}

/// A minimal JPEG stream: SOI, an APP1 Exif segment, EOI.
pub fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(tiff);
    let len = u16::try_from(app1.len() + 2).expect("APP1 segment too large");

    let mut out = vec![0xff, 0xd8, 0xff, 0xe1];
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&app1);
    out.extend_from_slice(&[0xff, 0xd9]);
    out
}

/// A real baseline-encoded 8x8 JPEG with an APP1 Exif segment holding `tiff`
/// spliced in after SOI, so both kamadak and the `image` decoder accept it.
#[cfg(feature = "image-meta")]
pub fn encoded_jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
    use image::codecs::jpeg::JpegEncoder;

    let pixels = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 120, 40]));
    let mut encoded = Vec::new();
    JpegEncoder::new(&mut encoded)
        .encode_image(&pixels)
        .expect("encode jpeg");

    let with_app1 = jpeg_with_exif(tiff);
    // SOI and APP1 from the minimal stream, then the encoder's output after its SOI.
    let mut out = with_app1[..with_app1.len() - 2].to_vec();
    out.extend_from_slice(&encoded[2..]);
    out
}

pub fn iso_box(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let size = u32::try_from(body.len() + 8).expect("box too large");
    let mut out = size.to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(body);
    out
}

fn full_box(kind: &[u8; 4], version: u8, body: &[u8]) -> Vec<u8> {
    let mut content = vec![version, 0, 0, 0];
    content.extend_from_slice(body);
    iso_box(kind, &content)
}

fn infe(item_id: u16, item_type: &[u8; 4]) -> Vec<u8> {
    let mut body = item_id.to_be_bytes().to_vec();
    body.extend_from_slice(&[0, 0]);
    body.extend_from_slice(item_type);
    body.push(0);
    full_box(b"infe", 2, &body)
}

fn ftyp() -> Vec<u8> {
    iso_box(b"ftyp", b"heic\0\0\0\0mif1heic")
}

fn hdlr() -> Vec<u8> {
    let mut body = vec![0u8; 4];
    body.extend_from_slice(b"pict");
    body.extend_from_slice(&[0u8; 13]);
    full_box(b"hdlr", 0, &body)
}

fn iinf(items: &[(u16, &[u8; 4])]) -> Vec<u8> {
    let mut body = (items.len() as u16).to_be_bytes().to_vec();
    for (id, kind) in items {
        body.extend(infe(*id, kind));
    }
    full_box(b"iinf", 0, &body)
}

struct Location {
    item_id: u16,
    offset: u32,
    length: u32,
}

// Version 1 iloc, 4-byte offsets and lengths, one extent per item, file offsets.
fn iloc(locations: &[Location]) -> Vec<u8> {
    let mut body = vec![0x44, 0x00];
    body.extend_from_slice(&(locations.len() as u16).to_be_bytes());
    for l in locations {
        body.extend_from_slice(&l.item_id.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
        body.extend_from_slice(&0u16.to_be_bytes());
        body.extend_from_slice(&1u16.to_be_bytes());
        body.extend_from_slice(&l.offset.to_be_bytes());
        body.extend_from_slice(&l.length.to_be_bytes());
    }
    full_box(b"iloc", 1, &body)
}

/// Lays out `ftyp`, `meta` and one `mdat` holding `payloads` back to back.
/// `meta` has the same size whatever offsets it records, so it is built twice.
fn heif_file(payloads: &[(u16, &[u8])], meta: impl Fn(&[Location]) -> Vec<u8>) -> Vec<u8> {
    let locate = |start: u32| {
        let mut offset = start;
        payloads
            .iter()
            .map(|(item_id, data)| {
                let l = Location {
                    item_id: *item_id,
                    offset,
                    length: data.len() as u32,
                };
                offset += l.length;
                l
            })
            .collect::<Vec<_>>()
    };
    let mut out = ftyp();
    let probe = meta(&locate(0));
    let start = (out.len() + probe.len() + 8) as u32;
    out.extend(meta(&locate(start)));
    let mdat: Vec<u8> = payloads.iter().flat_map(|(_, d)| d.iter().copied()).collect();
    out.extend(iso_box(b"mdat", &mdat));
    out
}

/// A bare-bones HEIF file: an image item and an Exif item holding `item`,
/// listed in `iinf`/`iloc` only.
pub fn heif_with_exif(item: &[u8]) -> Vec<u8> {
    heif_file(&[(2, item)], |locations| {
        let mut body = hdlr();
        body.extend(iinf(&[(1, b"hvc1"), (2, b"Exif")]));
        body.extend(iloc(locations));
        full_box(b"meta", 0, &body)
    })
}

// HEVCDecoderConfigurationRecord, Main profile 8-bit 4:2:0, no parameter set arrays.
const HVCC: [u8; 23] = [
    1, 0x01, 0x60, 0, 0, 0, 0x90, 0, 0, 0, 0, 0, 90, 0xf0, 0, 0xfc, 0xfd, 0xf8, 0xf8, 0, 0,
    0x0f, 0,
];

/// A HEIF file with the boxes a full reader expects: a primary `hvc1` image
/// with `hvcC` and `ispe` properties, and an Exif item linked to it by a
/// `cdsc` reference.
pub fn heif_image_with_exif(item: &[u8]) -> Vec<u8> {
    let image_data: &[u8] = &[0, 0, 0, 2, 0x26, 0x01];
    heif_file(&[(1, image_data), (2, item)], |locations| {
        let mut ispe = 64u32.to_be_bytes().to_vec();
        ispe.extend_from_slice(&64u32.to_be_bytes());
        let mut ipco = iso_box(b"hvcC", &HVCC);
        ipco.extend(full_box(b"ispe", 0, &ispe));

        // Item 1: hvcC (essential, index 1) and ispe (index 2).
        let mut ipma = 1u32.to_be_bytes().to_vec();
        ipma.extend_from_slice(&1u16.to_be_bytes());
        ipma.extend_from_slice(&[2, 0x81, 0x02]);

        let mut iprp = iso_box(b"ipco", &ipco);
        iprp.extend(full_box(b"ipma", 0, &ipma));

        // Exif item 2 describes image item 1.
        let mut cdsc = 2u16.to_be_bytes().to_vec();
        cdsc.extend_from_slice(&1u16.to_be_bytes());
        cdsc.extend_from_slice(&1u16.to_be_bytes());

        let mut body = hdlr();
        body.extend(full_box(b"pitm", 0, &1u16.to_be_bytes()));
        body.extend(iloc(locations));
        body.extend(iinf(&[(1, b"hvc1"), (2, b"Exif")]));
        body.extend(full_box(b"iref", 0, &iso_box(b"cdsc", &cdsc)));
        body.extend(iso_box(b"iprp", &iprp));
        full_box(b"meta", 0, &body)
    })
}
