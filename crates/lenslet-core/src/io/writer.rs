use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

use super::yuv::{YuvPlanarFrame, PLANES};

/// Buffered planar YUV writer. Frames are appended back to back.
pub struct YuvWriter {
    writer: BufWriter<File>,
}

impl YuvWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn write(&mut self, frame: &YuvPlanarFrame) -> Result<()> {
        for plane in PLANES {
            self.writer.write_all(frame.plane_bytes(plane))?;
        }
        Ok(())
    }

    pub fn finalize(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
