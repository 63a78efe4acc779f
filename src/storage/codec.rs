//! Binary feature stream.
//!
//! A stream is a bare sequence of records, read until the input runs out:
//!
//! ```text
//! [u32 LE length][Location as JSON][u32 LE length][polygon]
//! ```
//!
//! The polygon block is little endian: a format version byte, the loop count
//! (`u32`), then per loop a reserved flags byte, the vertex count (`u32`) and
//! that many `f64` triples. Vertices are stored in their oriented order, so a
//! decoded loop bounds the same side as the encoded one.

use crate::compute::polygon::{Loop, Polygon};
use crate::compute::sphere::Point;
use crate::error::{Result, RgeoError};
use crate::feature::{Feature, FeatureCollection};
use bytes::{Buf, BufMut};
use rgeo_types::Location;
use s2::r3::vector::Vector;
use std::io::{Read, Write};

const POLYGON_FORMAT_VERSION: u8 = 1;
const VERTEX_SIZE: usize = 3 * std::mem::size_of::<f64>();

/// Decode every record of an in-memory stream.
pub fn decode_feature_stream(bytes: &[u8]) -> Result<FeatureCollection> {
    let mut buf = bytes;
    let mut features = Vec::new();
    while buf.has_remaining() {
        let record = features.len();
        let feature = decode_record(&mut buf).map_err(|reason| decode_error(record, reason))?;
        features.push(feature);
    }
    log::debug!("Decoded {} features from {} bytes", features.len(), bytes.len());
    Ok(features)
}

/// Read a whole stream from `reader` and decode it.
pub fn read_feature_stream<R: Read>(mut reader: R) -> Result<FeatureCollection> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode_feature_stream(&bytes)
}

pub fn encode_feature_stream(features: &[Feature]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    for feature in features {
        encode_record(feature, &mut buf)?;
    }
    Ok(buf)
}

pub fn write_feature_stream<W: Write>(mut writer: W, features: &[Feature]) -> Result<()> {
    let mut buf = Vec::new();
    for feature in features {
        buf.clear();
        encode_record(feature, &mut buf)?;
        writer.write_all(&buf)?;
    }
    writer.flush()?;
    Ok(())
}

pub(crate) fn encode_record(feature: &Feature, buf: &mut Vec<u8>) -> Result<()> {
    let json = serde_json::to_vec(&feature.location)?;
    put_block(buf, &json)?;

    let mut polygon = Vec::new();
    encode_polygon(&feature.polygon, &mut polygon)?;
    put_block(buf, &polygon)
}

pub(crate) fn decode_single_record(bytes: &[u8]) -> Result<Feature> {
    let mut buf = bytes;
    let feature = decode_record(&mut buf).map_err(|reason| decode_error(0, reason))?;
    if buf.has_remaining() {
        return Err(decode_error(
            0,
            format!("{} trailing bytes after record", buf.remaining()),
        ));
    }
    Ok(feature)
}

fn decode_error(record: usize, reason: String) -> RgeoError {
    RgeoError::Decode { record, reason }
}

fn put_block(buf: &mut Vec<u8>, block: &[u8]) -> Result<()> {
    let len = u32::try_from(block.len()).map_err(|_| {
        RgeoError::InvalidGeometry(format!("Record block of {} bytes is too large", block.len()))
    })?;
    buf.put_u32_le(len);
    buf.put_slice(block);
    Ok(())
}

fn encode_polygon(polygon: &Polygon, buf: &mut Vec<u8>) -> Result<()> {
    buf.put_u8(POLYGON_FORMAT_VERSION);
    buf.put_u32_le(polygon.num_loops() as u32);
    for lp in polygon.loops() {
        let count = u32::try_from(lp.num_vertices()).map_err(|_| {
            RgeoError::InvalidGeometry(format!("Loop of {} vertices is too large", lp.num_vertices()))
        })?;
        buf.put_u8(0);
        buf.put_u32_le(count);
        for v in lp.vertices() {
            buf.put_f64_le(v.0.x);
            buf.put_f64_le(v.0.y);
            buf.put_f64_le(v.0.z);
        }
    }
    Ok(())
}

fn decode_record(buf: &mut &[u8]) -> std::result::Result<Feature, String> {
    let json = take_block(buf, "location")?;
    let location: Location =
        serde_json::from_slice(json).map_err(|e| format!("invalid location JSON: {}", e))?;

    let mut block = take_block(buf, "polygon")?;
    let polygon = decode_polygon(&mut block)?;
    if block.has_remaining() {
        return Err(format!(
            "{} unused bytes at end of polygon block",
            block.remaining()
        ));
    }

    Ok(Feature { location, polygon })
}

fn decode_polygon(buf: &mut &[u8]) -> std::result::Result<Polygon, String> {
    let version = take_u8(buf, "polygon version")?;
    if version != POLYGON_FORMAT_VERSION {
        return Err(format!("unsupported polygon format version {}", version));
    }

    let num_loops = take_u32(buf, "loop count")? as usize;
    let mut loops = Vec::with_capacity(num_loops.min(buf.remaining()));
    for i in 0..num_loops {
        let flags = take_u8(buf, "loop flags")?;
        if flags != 0 {
            return Err(format!("loop {} has unknown flags {:#04x}", i, flags));
        }

        let count = take_u32(buf, "vertex count")? as usize;
        if buf.remaining() < count.saturating_mul(VERTEX_SIZE) {
            return Err(format!(
                "truncated loop {}: {} vertices need {} bytes, {} left",
                i,
                count,
                count.saturating_mul(VERTEX_SIZE),
                buf.remaining()
            ));
        }

        let mut vertices = Vec::with_capacity(count);
        for _ in 0..count {
            let v = Vector::new(buf.get_f64_le(), buf.get_f64_le(), buf.get_f64_le());
            if !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()) {
                return Err(format!("loop {} has a non-finite vertex", i));
            }
            vertices.push(Point(v));
        }
        loops.push(Loop::new(vertices).map_err(|e| format!("loop {}: {}", i, e))?);
    }

    Polygon::from_loops(loops).map_err(|e| e.to_string())
}

fn take_u8(buf: &mut &[u8], what: &str) -> std::result::Result<u8, String> {
    if buf.remaining() < 1 {
        return Err(format!("truncated {}", what));
    }
    Ok(buf.get_u8())
}

fn take_u32(buf: &mut &[u8], what: &str) -> std::result::Result<u32, String> {
    if buf.remaining() < 4 {
        return Err(format!("truncated {}", what));
    }
    Ok(buf.get_u32_le())
}

/// A length-prefixed block, borrowed from the input.
fn take_block<'a>(buf: &mut &'a [u8], what: &str) -> std::result::Result<&'a [u8], String> {
    let len = take_u32(buf, &format!("{} length", what))? as usize;
    let data: &'a [u8] = *buf;
    if data.len() < len {
        return Err(format!(
            "truncated {}: expected {} bytes, {} left",
            what,
            len,
            data.len()
        ));
    }
    let (block, rest) = data.split_at(len);
    *buf = rest;
    Ok(block)
}
