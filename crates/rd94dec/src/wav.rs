//! Minimal RIFF/WAVE reader
//!
//! Reads just enough of the container to find the sample format
//! and the start of the sample data. Chunks are located by
//! scanning the byte stream for their tags, so unknown chunks
//! ahead of `data` are skipped. This works with files streamed
//! through a pipe, where the data length is often bogus.

use std::io::Read;

use anyhow::{bail, Context};
use byteorder::{LittleEndian, ReadBytesExt};

/// Sample format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

/// WAV file reader
///
/// Once the header has been read, the reader is positioned at the
/// first sample.
#[derive(Debug)]
pub struct WavReader<R> {
    inner: R,
    format: WavFormat,
}

impl<R> WavReader<R>
where
    R: Read,
{
    /// Read the header
    ///
    /// Fails if the input is not a RIFF/WAVE file, if the `fmt `
    /// or `data` chunks cannot be found, or if the sample format
    /// is not 8- or 16-bit PCM.
    pub fn new(mut inner: R) -> Result<Self, anyhow::Error> {
        let mut tag = [0u8; 4];
        inner
            .read_exact(&mut tag)
            .context("input too short for a WAV header")?;
        if &tag != b"RIFF" {
            bail!("input is not a RIFF file");
        }
        let _riff_len = inner.read_u32::<LittleEndian>()?;
        inner.read_exact(&mut tag)?;
        if &tag != b"WAVE" {
            bail!("input is not a WAVE file");
        }

        scan_for_tag(&mut inner, b"fmt ")?;
        let _chunk_len = inner.read_u32::<LittleEndian>()?;
        let _format_tag = inner.read_u16::<LittleEndian>()?;
        let channels = inner.read_u16::<LittleEndian>()?;
        let sample_rate = inner.read_u32::<LittleEndian>()?;
        let _byte_rate = inner.read_u32::<LittleEndian>()?;
        let _block_align = inner.read_u16::<LittleEndian>()?;
        let bits_per_sample = inner.read_u16::<LittleEndian>()?;

        scan_for_tag(&mut inner, b"data")?;
        let _data_len = inner.read_u32::<LittleEndian>()?;

        if bits_per_sample != 8 && bits_per_sample != 16 {
            bail!(
                "unsupported sample width: {} bits (must be 8 or 16)",
                bits_per_sample
            );
        }
        if channels == 0 {
            bail!("WAV file has no channels");
        }
        if sample_rate == 0 {
            bail!("WAV file has no sampling rate");
        }

        Ok(Self {
            inner,
            format: WavFormat {
                channels,
                sample_rate,
                bits_per_sample,
            },
        })
    }

    /// Sample format
    pub fn format(&self) -> &WavFormat {
        &self.format
    }

    /// Iterate over the samples of the first channel
    ///
    /// 8-bit samples are re-centered on zero. The iterator ends at
    /// the end of the input or at the first incomplete sample
    /// frame.
    pub fn samples(self) -> Samples<R> {
        Samples {
            inner: self.inner,
            format: self.format,
        }
    }
}

/// First-channel sample iterator
#[derive(Debug)]
pub struct Samples<R> {
    inner: R,
    format: WavFormat,
}

impl<R> Samples<R>
where
    R: Read,
{
    #[inline]
    fn read_sample(&mut self) -> Option<i32> {
        match self.format.bits_per_sample {
            8 => Some(self.inner.read_u8().ok()? as i32 - 128),
            _ => Some(self.inner.read_i16::<LittleEndian>().ok()? as i32),
        }
    }
}

impl<R> Iterator for Samples<R>
where
    R: Read,
{
    type Item = i32;

    fn next(&mut self) -> Option<Self::Item> {
        let out = self.read_sample()?;
        for _ch in 1..self.format.channels {
            self.read_sample()?;
        }
        Some(out)
    }
}

// Consume the input up to and including `tag`
fn scan_for_tag<R: Read>(inner: &mut R, tag: &[u8; 4]) -> Result<(), anyhow::Error> {
    let mut window = [0u8; 4];
    let mut count = 0usize;
    loop {
        let byte = inner.read_u8().with_context(|| {
            format!(
                "no \"{}\" chunk in WAV file",
                String::from_utf8_lossy(tag).trim_end()
            )
        })?;
        window.rotate_left(1);
        window[3] = byte;
        count += 1;
        if count >= 4 && &window == tag {
            return Ok(());
        }
    }
}

/// Build an in-memory WAV file
#[cfg(test)]
pub fn make_wav(channels: u16, sample_rate: u32, bits_per_sample: u16, data: &[u8]) -> Vec<u8> {
    use byteorder::WriteBytesExt;
    use std::io::Write;

    let block_align = channels * bits_per_sample / 8;
    let mut out = Vec::new();
    out.write_all(b"RIFF").unwrap();
    out.write_u32::<LittleEndian>(4 + 24 + 16 + 8 + data.len() as u32)
        .unwrap();
    out.write_all(b"WAVEfmt ").unwrap();
    out.write_u32::<LittleEndian>(16).unwrap();
    out.write_u16::<LittleEndian>(1).unwrap();
    out.write_u16::<LittleEndian>(channels).unwrap();
    out.write_u32::<LittleEndian>(sample_rate).unwrap();
    out.write_u32::<LittleEndian>(sample_rate * block_align as u32)
        .unwrap();
    out.write_u16::<LittleEndian>(block_align).unwrap();
    out.write_u16::<LittleEndian>(bits_per_sample).unwrap();

    // an extra chunk which must be skipped
    out.write_all(b"LIST").unwrap();
    out.write_u32::<LittleEndian>(4).unwrap();
    out.write_all(b"INFO").unwrap();

    out.write_all(b"data").unwrap();
    out.write_u32::<LittleEndian>(data.len() as u32).unwrap();
    out.write_all(data).unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_16bit_stereo() {
        // left: 1, -2, 300; right: junk
        let data: Vec<u8> = [1i16, 99, -2, 99, 300, 99]
            .iter()
            .flat_map(|s| s.to_le_bytes())
            .collect();
        let wav = make_wav(2, 48000, 16, &data);

        let rdr = WavReader::new(wav.as_slice()).expect("valid wav");
        assert_eq!(
            &WavFormat {
                channels: 2,
                sample_rate: 48000,
                bits_per_sample: 16
            },
            rdr.format()
        );
        let samples: Vec<i32> = rdr.samples().collect();
        assert_eq!(vec![1, -2, 300], samples);
    }

    #[test]
    fn test_read_8bit_mono() {
        let wav = make_wav(1, 22050, 8, &[128, 0, 255, 130]);
        let rdr = WavReader::new(wav.as_slice()).expect("valid wav");
        assert_eq!(22050, rdr.format().sample_rate);
        let samples: Vec<i32> = rdr.samples().collect();
        assert_eq!(vec![0, -128, 127, 2], samples);
    }

    #[test]
    fn test_incomplete_sample_frame() {
        // the last sample frame is missing its right channel
        let wav = make_wav(2, 8000, 8, &[10, 20, 30]);
        let rdr = WavReader::new(wav.as_slice()).expect("valid wav");
        assert_eq!(1, rdr.samples().count());
    }

    #[test]
    fn test_reject() {
        assert!(WavReader::new(&b"RIF"[..]).is_err());
        assert!(WavReader::new(&b"RIFX\0\0\0\0WAVE"[..]).is_err());
        assert!(WavReader::new(&b"RIFF\0\0\0\0AVI fmt "[..]).is_err());

        let wav = make_wav(1, 48000, 24, &[0, 0, 0]);
        let err = WavReader::new(wav.as_slice()).expect_err("24-bit");
        assert!(err.to_string().contains("24 bits"));

        // header without a data chunk
        let wav = make_wav(1, 48000, 16, &[]);
        let truncated = &wav[0..wav.len() - 8];
        assert!(WavReader::new(truncated).is_err());
    }
}
