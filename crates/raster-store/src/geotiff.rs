//! GeoTIFF codec for single-band f32 rasters.
//!
//! Reads any integer or float sample format and widens to f32. The
//! GDAL no-data sentinel, if declared, is substituted by NaN during
//! decode so the rest of the workspace never sees it. Writes are
//! deflate-compressed and carry the georeferencing tags
//! (ModelPixelScale, ModelTiepoint, GeoKeyDirectory, GDAL_NODATA).

use std::fs::File;
use std::io::{BufReader, Seek, Write};
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, compression::Deflate, TiffEncoder};
use tiff::tags::Tag;
use tracing::debug;

use dekad_common::{AnalyticsError, AnalyticsResult, CrsCode};

use crate::types::{GeoRaster, GeoTransform};

// GeoKey IDs used in the GeoKeyDirectory tag.
const GT_MODEL_TYPE_KEY: u32 = 1024;
const GEOGRAPHIC_TYPE_KEY: u32 = 2048;
const PROJECTED_CS_TYPE_KEY: u32 = 3072;

const MODEL_TYPE_PROJECTED: u32 = 1;
const MODEL_TYPE_GEOGRAPHIC: u32 = 2;

/// Decode a GeoTIFF file into a [`GeoRaster`].
///
/// Any decode failure on an existing file is a `CorruptArtifact`; the
/// caller is responsible for mapping a missing file to `NotFound` before
/// calling here.
pub fn read(path: &Path) -> AnalyticsResult<GeoRaster> {
    let file = File::open(path)?;
    let mut decoder =
        Decoder::new(BufReader::new(file)).map_err(|e| corrupt(path, e.to_string()))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(|e| corrupt(path, e.to_string()))?;
    let (width, height) = (width as usize, height as usize);

    let transform = read_transform(&mut decoder).unwrap_or_else(|| {
        debug!(path = %path.display(), "no georeferencing tags, using unit transform");
        GeoTransform::default()
    });
    let crs = read_crs(&mut decoder);
    let nodata = read_nodata(&mut decoder);

    let mut data = match decoder
        .read_image()
        .map_err(|e| corrupt(path, e.to_string()))?
    {
        DecodingResult::U8(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect::<Vec<f32>>(),
    };

    if data.len() != width * height {
        return Err(corrupt(
            path,
            format!(
                "sample count {} does not match {}x{}",
                data.len(),
                width,
                height
            ),
        ));
    }

    // Substitute the sentinel by NaN at the boundary.
    if let Some(sentinel) = nodata {
        if !sentinel.is_nan() {
            for v in &mut data {
                if *v == sentinel {
                    *v = f32::NAN;
                }
            }
        }
    }

    Ok(GeoRaster::new(data, width, height, transform, crs, nodata))
}

/// Encode a raster as a deflate-compressed GeoTIFF into `writer`.
///
/// NaN samples are written back as the raster's declared sentinel when
/// one is set; otherwise they are written as NaN with a `nan` no-data
/// declaration.
pub fn write_to<W: Write + Seek>(writer: W, raster: &GeoRaster) -> AnalyticsResult<()> {
    let mut encoder = TiffEncoder::new(writer).map_err(encode_err)?;

    let mut image = encoder
        .new_image_with_compression::<colortype::Gray32Float, _>(
            raster.width as u32,
            raster.height as u32,
            Deflate::default(),
        )
        .map_err(encode_err)?;

    let t = &raster.transform;
    let pixel_scale = [t.pixel_width, -t.pixel_height, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, t.origin_x, t.origin_y, 0.0];
    let geo_keys = geo_key_directory(raster.crs);

    image
        .encoder()
        .write_tag(Tag::ModelPixelScaleTag, &pixel_scale[..])
        .map_err(encode_err)?;
    image
        .encoder()
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .map_err(encode_err)?;
    image
        .encoder()
        .write_tag(Tag::GeoKeyDirectoryTag, &geo_keys[..])
        .map_err(encode_err)?;

    let sentinel = raster.nodata.unwrap_or(f32::NAN);
    let nodata_text = if sentinel.is_nan() {
        "nan".to_string()
    } else {
        format!("{}", sentinel)
    };
    image
        .encoder()
        .write_tag(Tag::GdalNodata, nodata_text.as_str())
        .map_err(encode_err)?;

    let buffer: Vec<f32> = if sentinel.is_nan() {
        raster.data.clone()
    } else {
        raster
            .data
            .iter()
            .map(|&v| if v.is_nan() { sentinel } else { v })
            .collect()
    };

    image.write_data(&buffer).map_err(encode_err)?;
    Ok(())
}

fn read_transform<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder
        .find_tag(Tag::ModelPixelScaleTag)
        .ok()
        .flatten()?
        .into_f64_vec()
        .ok()?;
    let tiepoint = decoder
        .find_tag(Tag::ModelTiepointTag)
        .ok()
        .flatten()?
        .into_f64_vec()
        .ok()?;
    if scale.len() < 2 || tiepoint.len() < 5 {
        return None;
    }
    Some(GeoTransform::new(
        tiepoint[3],
        tiepoint[4],
        scale[0],
        -scale[1],
    ))
}

fn read_crs<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> CrsCode {
    let Some(directory) = decoder
        .find_tag(Tag::GeoKeyDirectoryTag)
        .ok()
        .flatten()
        .and_then(|v| v.into_u32_vec().ok())
    else {
        return CrsCode::Epsg4326;
    };

    // Entries of four shorts each, after the four-short header.
    let Some(entries) = directory.get(4..) else {
        return CrsCode::Epsg4326;
    };
    for entry in entries.chunks_exact(4) {
        let (key, value) = (entry[0], entry[3]);
        match key {
            GEOGRAPHIC_TYPE_KEY if value == 4326 => return CrsCode::Epsg4326,
            PROJECTED_CS_TYPE_KEY if value == 3857 => return CrsCode::Epsg3857,
            _ => {}
        }
    }
    CrsCode::Epsg4326
}

fn read_nodata<R: std::io::Read + Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
    let text = decoder
        .find_tag(Tag::GdalNodata)
        .ok()
        .flatten()?
        .into_string()
        .ok()?;
    text.trim().trim_end_matches('\0').parse::<f32>().ok()
}

fn geo_key_directory(crs: CrsCode) -> [u16; 12] {
    let (model_type, cs_key, epsg) = match crs {
        CrsCode::Epsg4326 => (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE_KEY, 4326u32),
        CrsCode::Epsg3857 => (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE_KEY, 3857u32),
    };
    [
        // header: version 1.1, revision 0, 2 keys
        1, 1, 0, 2,
        GT_MODEL_TYPE_KEY as u16, 0, 1, model_type as u16,
        cs_key as u16, 0, 1, epsg as u16,
    ]
}

fn corrupt(path: &Path, message: String) -> AnalyticsError {
    AnalyticsError::corrupt(path.display().to_string(), message)
}

fn encode_err(err: tiff::TiffError) -> AnalyticsError {
    AnalyticsError::Storage(format!("GeoTIFF encode failed: {}", err))
}
