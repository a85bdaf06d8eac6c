use std::borrow::Cow;

use anyhow::{Result, ensure};

/// RGBA rows laid out the way `Queue::write_texture` wants them.
pub struct TextureUpload<'a> {
    data: Cow<'a, [u8]>,
    bytes_per_row: u32,
}

impl<'a> TextureUpload<'a> {
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }
}

/// Pad each row to `COPY_BYTES_PER_ROW_ALIGNMENT`, borrowing the input when
/// it already fits.
pub fn prepare_rgba_upload<'a>(
    width: u32,
    height: u32,
    data: &'a [u8],
) -> Result<TextureUpload<'a>> {
    ensure!(width > 0 && height > 0, "texture has no dimensions");
    let row_bytes = 4usize * width as usize;
    let expected = row_bytes * height as usize;
    ensure!(
        data.len() >= expected,
        "texture buffer ({}) smaller than {}x{} RGBA ({})",
        data.len(),
        width,
        height,
        expected
    );

    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    if row_bytes % alignment == 0 {
        return Ok(TextureUpload {
            data: Cow::Borrowed(&data[..expected]),
            bytes_per_row: row_bytes as u32,
        });
    }

    let padded_row_bytes = row_bytes.div_ceil(alignment) * alignment;
    let mut buffer = vec![0u8; padded_row_bytes * height as usize];
    for (src, dst) in data[..expected]
        .chunks_exact(row_bytes)
        .zip(buffer.chunks_exact_mut(padded_row_bytes))
    {
        dst[..row_bytes].copy_from_slice(src);
    }

    Ok(TextureUpload {
        data: Cow::Owned(buffer),
        bytes_per_row: padded_row_bytes as u32,
    })
}

#[cfg(test)]
mod upload_tests {
    use super::*;

    #[test]
    fn aligned_rows_are_borrowed() {
        let data = vec![7u8; 64 * 4 * 2];
        let upload = prepare_rgba_upload(64, 2, &data).expect("upload");
        assert!(matches!(upload.data, Cow::Borrowed(_)));
        assert_eq!(upload.bytes_per_row(), 256);
        assert_eq!(upload.pixels().len(), data.len());
    }

    #[test]
    fn narrow_rows_are_padded() {
        let data: Vec<u8> = (0..3 * 4 * 2).map(|value| value as u8).collect();
        let upload = prepare_rgba_upload(3, 2, &data).expect("upload");
        assert_eq!(upload.bytes_per_row(), 256);
        assert_eq!(upload.pixels().len(), 512);
        assert_eq!(&upload.pixels()[..12], &data[..12]);
        assert!(upload.pixels()[12..256].iter().all(|byte| *byte == 0));
        assert_eq!(&upload.pixels()[256..268], &data[12..24]);
    }

    #[test]
    fn short_buffers_are_rejected() {
        assert!(prepare_rgba_upload(4, 4, &[0u8; 10]).is_err());
        assert!(prepare_rgba_upload(0, 4, &[]).is_err());
    }
}
