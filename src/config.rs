// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The parameters of a single render.  Built once, before any work
//! starts, and only ever read afterward.

use crate::errors::NebulaError;
use crate::orbits::Channel;
use crate::planes::{Dimensions, PlaneMapper, PlaneWindow};

/// Capacity of the event stream between the samplers and the
/// aggregator, unless overridden.
pub const DEFAULT_QUEUE_DEPTH: usize = 4096;

/// The maximum number of iterations an orbit may take to escape and
/// still be drawn, one limit per color channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelLimits {
    red: usize,
    green: usize,
    blue: usize,
}

impl ChannelLimits {
    /// Every limit must be at least one.
    pub fn new(red: usize, green: usize, blue: usize) -> Result<ChannelLimits, NebulaError> {
        let named = [
            (red, Channel::Red),
            (green, Channel::Green),
            (blue, Channel::Blue),
        ];
        for &(limit, channel) in named.iter() {
            if limit == 0 {
                return Err(NebulaError::InvalidLimit { channel });
            }
        }
        Ok(ChannelLimits { red, green, blue })
    }

    /// The limit named for the red channel.
    pub fn red(&self) -> usize {
        self.red
    }

    /// The limit named for the green channel.
    pub fn green(&self) -> usize {
        self.green
    }

    /// The limit named for the blue channel.
    pub fn blue(&self) -> usize {
        self.blue
    }

    /// Orbits are iterated once, up to the largest of the three limits,
    /// and then tested against each channel.
    pub fn budget(&self) -> usize {
        self.red().max(self.green()).max(self.blue())
    }
}

/// Which limit gates which channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelMapping {
    /// The green limit gates the blue channel and the blue limit gates
    /// the green channel.  This is what the classic renderer did, and
    /// what its published images look like.
    Reference,
    /// Each limit gates the channel it is named for.
    Direct,
}

impl Default for ChannelMapping {
    fn default() -> Self {
        ChannelMapping::Reference
    }
}

impl ChannelMapping {
    /// The iteration limit that decides whether an orbit is drawn into
    /// `channel`.
    pub fn limit_for(self, channel: Channel, limits: &ChannelLimits) -> usize {
        match (self, channel) {
            (_, Channel::Red) => limits.red(),
            (ChannelMapping::Reference, Channel::Green) => limits.blue(),
            (ChannelMapping::Reference, Channel::Blue) => limits.green(),
            (ChannelMapping::Direct, Channel::Green) => limits.green(),
            (ChannelMapping::Direct, Channel::Blue) => limits.blue(),
        }
    }

    /// An orbit that escaped at `depth` is drawn into `channel` when it
    /// escaped strictly before that channel's limit.
    pub fn qualifies(self, depth: usize, channel: Channel, limits: &ChannelLimits) -> bool {
        depth < self.limit_for(channel, limits)
    }
}

/// Everything a render needs to know, fixed before it starts.
#[derive(Copy, Clone, Debug)]
pub struct RenderConfig {
    dimensions: Dimensions,
    window: PlaneWindow,
    limits: ChannelLimits,
    points: u64,
    workers: usize,
    mapping: ChannelMapping,
    seed: Option<u64>,
    queue_depth: usize,
}

impl Default for RenderConfig {
    /// A 512x512 view of the whole set, red 250, green 100, blue 500,
    /// two and a half million points, one worker per CPU.
    fn default() -> Self {
        RenderConfig {
            dimensions: Dimensions::default(),
            window: PlaneWindow::default(),
            limits: ChannelLimits {
                red: 250,
                green: 100,
                blue: 500,
            },
            points: 2_560_000,
            workers: num_cpus::get().max(1),
            mapping: ChannelMapping::Reference,
            seed: None,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

impl RenderConfig {
    /// Takes the already-validated geometry and limits; everything else
    /// starts at its default.
    pub fn new(dimensions: Dimensions, window: PlaneWindow, limits: ChannelLimits) -> RenderConfig {
        RenderConfig {
            dimensions,
            window,
            limits,
            ..RenderConfig::default()
        }
    }

    /// Total number of candidate points to try across all workers.
    pub fn with_points(self, points: u64) -> Self {
        RenderConfig { points, ..self }
    }

    /// Number of sampling workers.  Zero is refused.
    pub fn with_workers(self, workers: usize) -> Result<Self, NebulaError> {
        if workers == 0 {
            return Err(NebulaError::NoWorkers);
        }
        Ok(RenderConfig { workers, ..self })
    }

    /// Which limit gates which channel.
    pub fn with_mapping(self, mapping: ChannelMapping) -> Self {
        RenderConfig { mapping, ..self }
    }

    /// Seeds every worker's generator, making the render reproducible
    /// for a fixed worker count.
    pub fn with_seed(self, seed: Option<u64>) -> Self {
        RenderConfig { seed, ..self }
    }

    /// Capacity of the event stream.  Zero makes every hand-off
    /// synchronous.
    pub fn with_queue_depth(self, queue_depth: usize) -> Self {
        RenderConfig {
            queue_depth,
            ..self
        }
    }

    /// Image size.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// The region of the complex plane being sampled and drawn.
    pub fn window(&self) -> PlaneWindow {
        self.window
    }

    /// Per-channel iteration limits.
    pub fn limits(&self) -> ChannelLimits {
        self.limits
    }

    /// Total point budget.
    pub fn points(&self) -> u64 {
        self.points
    }

    /// Number of sampling workers.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Limit-to-channel policy.
    pub fn mapping(&self) -> ChannelMapping {
        self.mapping
    }

    /// Base seed, if the render is meant to be reproducible.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Capacity of the event stream.
    pub fn queue_depth(&self) -> usize {
        self.queue_depth
    }

    /// Each worker's share of the budget.  The remainder of the
    /// division is never sampled.
    pub fn points_per_worker(&self) -> u64 {
        self.points / (self.workers as u64)
    }

    /// The mapper every component shares.
    pub fn mapper(&self) -> PlaneMapper {
        PlaneMapper::new(self.dimensions, self.window)
    }
}
