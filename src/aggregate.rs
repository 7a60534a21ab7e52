// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The single consumer at the end of the event stream.  Every worker
//! sends its points here; only the aggregator ever touches the count
//! grids, so they need no locking.

use crossbeam::channel::Receiver;
use log::debug;

use crate::errors::NebulaError;
use crate::orbits::{Channel, ChannelPoint};
use crate::planes::{Dimensions, Pixel, PlaneMapper};

/// Per-pixel hit counts for one channel, stored row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountGrid {
    dimensions: Dimensions,
    cells: Vec<u64>,
}

impl CountGrid {
    /// An all-zero grid.
    pub fn new(dimensions: Dimensions) -> CountGrid {
        CountGrid {
            dimensions,
            cells: vec![0; dimensions.len()],
        }
    }

    /// Builds a grid from known counts, row-major.  Refuses a `cells`
    /// that does not hold exactly `width * height` values.
    pub fn from_cells(dimensions: Dimensions, cells: Vec<u64>) -> Result<CountGrid, NebulaError> {
        if cells.len() != dimensions.len() {
            return Err(NebulaError::SizeMismatch {
                expected: dimensions.len(),
                found: cells.len(),
            });
        }
        Ok(CountGrid { dimensions, cells })
    }

    /// Size of the grid.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Adds one hit.  The pixel must lie inside the grid, which is what
    /// `PlaneMapper::to_pixel` guarantees.
    pub fn increment(&mut self, pixel: Pixel) {
        let offset = self.offset(pixel);
        self.cells[offset] += 1;
    }

    /// Hits recorded at a pixel.
    pub fn get(&self, pixel: Pixel) -> u64 {
        self.cells[self.offset(pixel)]
    }

    /// Every count, row-major.
    pub fn cells(&self) -> &[u64] {
        &self.cells
    }

    /// Sum of every count.
    pub fn total(&self) -> u64 {
        self.cells.iter().sum()
    }

    fn offset(&self, pixel: Pixel) -> usize {
        pixel.1 * self.dimensions.width() + pixel.0
    }
}

/// The three grids of a render, one per channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Histograms {
    grids: [CountGrid; 3],
}

impl Histograms {
    /// Three empty grids.
    pub fn new(dimensions: Dimensions) -> Histograms {
        Histograms {
            grids: [
                CountGrid::new(dimensions),
                CountGrid::new(dimensions),
                CountGrid::new(dimensions),
            ],
        }
    }

    /// The grid for one channel.
    pub fn grid(&self, channel: Channel) -> &CountGrid {
        &self.grids[channel.index()]
    }

    /// Red counts.
    pub fn red(&self) -> &CountGrid {
        self.grid(Channel::Red)
    }

    /// Green counts.
    pub fn green(&self) -> &CountGrid {
        self.grid(Channel::Green)
    }

    /// Blue counts.
    pub fn blue(&self) -> &CountGrid {
        self.grid(Channel::Blue)
    }

    fn grid_mut(&mut self, channel: Channel) -> &mut CountGrid {
        &mut self.grids[channel.index()]
    }
}

/// What travels from the samplers to the aggregator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Message {
    /// One point of a qualifying orbit.
    Point(ChannelPoint),
    /// The sending worker has used up its share of candidates.  Every
    /// worker sends exactly one, as its last message.
    Done,
}

/// Owns the count grids for the duration of the sampling phase.
pub struct Aggregator<'a> {
    mapper: &'a PlaneMapper,
    histograms: Histograms,
    workers: usize,
    finished: usize,
}

impl<'a> Aggregator<'a> {
    /// An aggregator that will wait for `workers` completion signals.
    pub fn new(mapper: &'a PlaneMapper, workers: usize) -> Aggregator<'a> {
        Aggregator {
            mapper,
            histograms: Histograms::new(mapper.dimensions),
            workers,
            finished: 0,
        }
    }

    /// Handles one message and reports whether more are expected.
    /// Points that land outside the image are dropped without comment.
    pub fn consume(&mut self, message: Message) -> bool {
        match message {
            Message::Point(ChannelPoint { point, channel }) => {
                if let Ok(pixel) = self.mapper.to_pixel(&point) {
                    self.histograms.grid_mut(channel).increment(pixel);
                }
            }
            Message::Done => {
                self.finished += 1;
                debug!("{} of {} workers finished", self.finished, self.workers);
            }
        }
        !self.is_finished()
    }

    /// True once every worker has reported completion.
    pub fn is_finished(&self) -> bool {
        self.finished >= self.workers
    }

    /// Completion signals received so far.
    pub fn finished(&self) -> usize {
        self.finished
    }

    /// Drains the stream until every worker has reported completion,
    /// then hands back the frozen grids.  If every sender goes away
    /// before that, some worker died without finishing.
    pub fn run(mut self, events: &Receiver<Message>) -> Result<Histograms, NebulaError> {
        while !self.is_finished() {
            match events.recv() {
                Ok(message) => {
                    self.consume(message);
                }
                Err(_) => {
                    return Err(NebulaError::WorkersLost {
                        expected: self.workers,
                        finished: self.finished,
                    });
                }
            }
        }
        Ok(self.histograms)
    }

    /// Gives up the grids as they stand.
    pub fn into_histograms(self) -> Histograms {
        self.histograms
    }
}
