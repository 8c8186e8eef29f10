//! Hand-built JPEGs carrying EXIF date tags.
//!
//! Compiled into both the library's unit tests and the integration tests, so
//! it only depends on `std`.
#![allow(dead_code)]

const TAG_DATE_TIME: u16 = 0x0132;
const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TYPE_ASCII: u16 = 2;
const TYPE_LONG: u16 = 4;

// `YYYY:MM:DD HH:MM:SS` plus NUL
const DATE_LEN: u32 = 20;

/// Smallest JPEG the EXIF reader accepts: SOI, an APP1 segment holding a
/// big-endian TIFF with a single `DateTime` entry, then EOI.
pub fn jpeg_with_datetime(datetime: &str) -> Vec<u8> {
    jpeg_with_dates(Some(datetime), None)
}

/// JPEG with an optional `DateTime` in IFD0 and an optional
/// `DateTimeOriginal` in an Exif sub-IFD.
pub fn jpeg_with_dates(datetime: Option<&str>, original: Option<&str>) -> Vec<u8> {
    for value in datetime.iter().chain(original.iter()) {
        assert_eq!(value.len(), 19, "expected YYYY:MM:DD HH:MM:SS");
    }

    let entries = u16::from(datetime.is_some()) + u16::from(original.is_some());
    // Header, then IFD0, then everything IFD0 points at.
    let mut free = 8 + 2 + 12 * u32::from(entries) + 4;

    let mut tiff = b"MM\0\x2A".to_vec();
    tiff.extend_from_slice(&8u32.to_be_bytes());
    tiff.extend_from_slice(&entries.to_be_bytes());

    let mut data = Vec::new();
    if let Some(datetime) = datetime {
        push_entry(&mut tiff, TAG_DATE_TIME, TYPE_ASCII, DATE_LEN, free);
        push_ascii(&mut data, datetime);
        free += DATE_LEN;
    }
    if let Some(original) = original {
        push_entry(&mut tiff, TAG_EXIF_IFD_POINTER, TYPE_LONG, 1, free);
        data.extend_from_slice(&1u16.to_be_bytes());
        push_entry(&mut data, TAG_DATE_TIME_ORIGINAL, TYPE_ASCII, DATE_LEN, free + 2 + 12 + 4);
        data.extend_from_slice(&0u32.to_be_bytes());
        push_ascii(&mut data, original);
    }
    tiff.extend_from_slice(&0u32.to_be_bytes());
    tiff.extend_from_slice(&data);

    let mut app1 = b"Exif\0\0".to_vec();
    app1.extend_from_slice(&tiff);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    let len = u16::try_from(app1.len() + 2).unwrap();
    jpeg.extend_from_slice(&len.to_be_bytes());
    jpeg.extend_from_slice(&app1);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

fn push_entry(buf: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
    buf.extend_from_slice(&tag.to_be_bytes());
    buf.extend_from_slice(&kind.to_be_bytes());
    buf.extend_from_slice(&count.to_be_bytes());
    buf.extend_from_slice(&value.to_be_bytes());
}

fn push_ascii(buf: &mut Vec<u8>, text: &str) {
    buf.extend_from_slice(text.as_bytes());
    buf.push(0);
}
