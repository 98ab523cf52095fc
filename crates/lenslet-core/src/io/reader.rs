use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use crate::error::{LensletError, Result};

use super::yuv::{YuvPlanarExtent, YuvPlanarFrame, PLANES};

/// Memory-mapped planar YUV reader.
pub struct YuvReader {
    mmap: Mmap,
    extent: YuvPlanarExtent,
    next_frame: usize,
}

impl YuvReader {
    pub fn open(path: &Path, extent: YuvPlanarExtent) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };

        if mmap.len() < extent.total_byte_size() {
            return Err(LensletError::InvalidParam(format!(
                "file {} too small for a single {}-byte frame",
                path.display(),
                extent.total_byte_size()
            )));
        }

        Ok(Self {
            mmap,
            extent,
            next_frame: 0,
        })
    }

    pub fn extent(&self) -> &YuvPlanarExtent {
        &self.extent
    }

    pub fn frame_count(&self) -> usize {
        self.mmap.len() / self.extent.total_byte_size()
    }

    /// Advance past `n` frames without decoding them.
    pub fn skip(&mut self, n: usize) {
        self.next_frame += n;
    }

    /// Fill the frame's planes from the next frame in the file.
    pub fn read_into(&mut self, frame: &mut YuvPlanarFrame) -> Result<()> {
        if *frame.extent() != self.extent {
            return Err(LensletError::InvalidParam(
                "destination frame extent does not match the reader".into(),
            ));
        }

        let frame_size = self.extent.total_byte_size();
        let start = self.next_frame * frame_size;
        if start + frame_size > self.mmap.len() {
            return Err(LensletError::FileSys(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("frame {} past end of input", self.next_frame),
            )));
        }

        let mut cursor = start;
        for plane in PLANES {
            let len = self.extent.plane_byte_size(plane);
            frame
                .plane_bytes_mut(plane)
                .copy_from_slice(&self.mmap[cursor..cursor + len]);
            cursor += len;
        }

        self.next_frame += 1;
        Ok(())
    }
}
