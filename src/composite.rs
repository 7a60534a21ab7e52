// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns three frozen count grids into a 16-bit RGBA picture, and
//! hands that picture to whatever is going to store it.
//!
//! Each channel is stretched independently: its smallest count becomes
//! 0 and its largest becomes 65535.  A channel whose counts are all the
//! same (including a channel nothing landed in) has nothing to stretch
//! and comes out black.

use image::png::PNGEncoder;
use image::ColorType;
use itertools::{Itertools, MinMaxResult};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::aggregate::CountGrid;
use crate::errors::NebulaError;
use crate::orbits::Channel;
use crate::planes::Dimensions;

/// Full scale for a 16-bit sample; also the alpha of every pixel.
pub const FULL_SCALE: u16 = 65535;

/// The smallest and largest count in one channel's grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelRange {
    /// Smallest count.
    pub min: u64,
    /// Largest count.
    pub max: u64,
}

impl ChannelRange {
    /// Scans every cell of the grid.
    pub fn scan(grid: &CountGrid) -> ChannelRange {
        match grid.cells().iter().cloned().minmax() {
            MinMaxResult::NoElements => ChannelRange { min: 0, max: 0 },
            MinMaxResult::OneElement(v) => ChannelRange { min: v, max: v },
            MinMaxResult::MinMax(min, max) => ChannelRange { min, max },
        }
    }

    /// Stretches a count onto `0..=65535`.  A flat range maps
    /// everything to zero.
    pub fn normalize(&self, count: u64) -> u16 {
        if self.max <= self.min {
            return 0;
        }
        let span = (self.max - self.min) as f64;
        let offset = count.saturating_sub(self.min) as f64;
        let scaled = f64::from(FULL_SCALE) * offset / span;
        scaled.round().min(f64::from(FULL_SCALE)) as u16
    }
}

/// A finished picture: `width * height` RGBA pixels of 16-bit samples,
/// row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    dimensions: Dimensions,
    samples: Vec<u16>,
}

impl Image {
    /// Pixels per row.
    pub fn width(&self) -> usize {
        self.dimensions.width()
    }

    /// Rows.
    pub fn height(&self) -> usize {
        self.dimensions.height()
    }

    /// The `[r, g, b, a]` sample of one pixel.
    pub fn get(&self, x: usize, y: usize) -> [u16; 4] {
        let offset = (y * self.width() + x) * 4;
        let mut pixel = [0; 4];
        pixel.copy_from_slice(&self.samples[offset..offset + 4]);
        pixel
    }

    /// Every sample, row-major, four per pixel.
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// The samples as big-endian bytes, which is what PNG wants.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            bytes.extend_from_slice(&sample.to_be_bytes());
        }
        bytes
    }
}

/// The per-channel ranges of a set of grids, and the means of painting
/// with them.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Compositor {
    ranges: [ChannelRange; 3],
}

impl Compositor {
    /// Finds the range of each channel.
    pub fn scan(red: &CountGrid, green: &CountGrid, blue: &CountGrid) -> Compositor {
        Compositor {
            ranges: [
                ChannelRange::scan(red),
                ChannelRange::scan(green),
                ChannelRange::scan(blue),
            ],
        }
    }

    /// The range found for one channel.
    pub fn range(&self, channel: Channel) -> ChannelRange {
        self.ranges[channel.index()]
    }

    /// Normalizes and packs the three grids into a picture.  The grids
    /// should be the ones this compositor scanned; grids of different
    /// sizes are refused.
    pub fn paint(
        &self,
        red: &CountGrid,
        green: &CountGrid,
        blue: &CountGrid,
    ) -> Result<Image, NebulaError> {
        let dimensions = red.dimensions();
        for other in [green, blue].iter() {
            if other.dimensions() != dimensions {
                return Err(NebulaError::SizeMismatch {
                    expected: dimensions.len(),
                    found: other.dimensions().len(),
                });
            }
        }

        let mut samples = Vec::with_capacity(dimensions.len() * 4);
        let cells = red.cells().iter().zip(green.cells()).zip(blue.cells());
        for ((&r, &g), &b) in cells {
            samples.push(self.ranges[0].normalize(r));
            samples.push(self.ranges[1].normalize(g));
            samples.push(self.ranges[2].normalize(b));
            samples.push(FULL_SCALE);
        }

        Ok(Image {
            dimensions,
            samples,
        })
    }
}

/// Scans and paints in one step.
pub fn compose(red: &CountGrid, green: &CountGrid, blue: &CountGrid) -> Result<Image, NebulaError> {
    Compositor::scan(red, green, blue).paint(red, green, blue)
}

/// Somewhere a finished picture can be sent.
pub trait ImageSink {
    /// Takes the picture; storing it is the sink's business.
    fn accept(&mut self, image: &Image) -> Result<(), NebulaError>;
}

/// Writes a 16-bit RGBA PNG.
#[derive(Clone, Debug)]
pub struct PngSink {
    path: PathBuf,
}

impl PngSink {
    /// The file is created, or truncated, when the image arrives.
    pub fn new<P: AsRef<Path>>(path: P) -> PngSink {
        PngSink {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Where the picture goes.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSink for PngSink {
    fn accept(&mut self, image: &Image) -> Result<(), NebulaError> {
        let output = BufWriter::new(File::create(&self.path)?);
        let encoder = PNGEncoder::new(output);
        encoder.encode(
            &image.to_be_bytes(),
            image.width() as u32,
            image.height() as u32,
            ColorType::RGBA(16),
        )?;
        Ok(())
    }
}
