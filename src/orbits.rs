// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Orbit sampling.
//!
//! A sampler draws a candidate `c` from the window, iterates
//! `z = z * z + c` from zero, and if the orbit escapes, hands back
//! every point the orbit visited, once for every color channel whose
//! iteration limit the escape beat.  Orbits that never escape are
//! thrown away; that is what makes this a Buddhabrot and not a
//! Mandelbrot.

use num::Complex;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use std::fmt;

use crate::config::{ChannelLimits, ChannelMapping, RenderConfig};
use crate::errors::NebulaError;
use crate::planes::{PlaneMapper, PlaneWindow};

/// One of the three color channels of the final image.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Red
    Red,
    /// Green
    Green,
    /// Blue
    Blue,
}

impl Channel {
    /// All three, in RGB order.
    pub const ALL: [Channel; 3] = [Channel::Red, Channel::Green, Channel::Blue];

    /// Position of the channel in an RGB(A) sample.
    pub fn index(self) -> usize {
        match self {
            Channel::Red => 0,
            Channel::Green => 1,
            Channel::Blue => 2,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Channel::Red => "red",
            Channel::Green => "green",
            Channel::Blue => "blue",
        };
        write!(f, "{}", name)
    }
}

/// A single visited point of an escaping orbit, tagged with the
/// histogram it belongs in.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChannelPoint {
    /// Where the orbit was.
    pub point: Complex<f64>,
    /// Which histogram to count it in.
    pub channel: Channel,
}

/// Anything that can hand out candidate values of `c`.
pub trait CandidateSource {
    /// The next candidate.
    fn next_candidate(&mut self) -> Complex<f64>;
}

/// Candidates drawn uniformly from the window, real and imaginary
/// parts independently.
pub struct UniformCandidates<R: Rng> {
    re: Uniform<f64>,
    im: Uniform<f64>,
    rng: R,
}

impl<R: Rng> UniformCandidates<R> {
    /// Samples the half-open rectangle `[xmin, xmax) x [ymin, ymax)`.
    pub fn new(window: &PlaneWindow, rng: R) -> Self {
        UniformCandidates {
            re: Uniform::new(window.xmin(), window.xmax()),
            im: Uniform::new(window.ymin(), window.ymax()),
            rng,
        }
    }
}

impl<R: Rng> CandidateSource for UniformCandidates<R> {
    fn next_candidate(&mut self) -> Complex<f64> {
        let re = self.re.sample(&mut self.rng);
        let im = self.im.sample(&mut self.rng);
        Complex::new(re, im)
    }
}

/// Hands out a fixed list of candidates, over and over.  Stands in for
/// randomness when the outcome has to be known in advance.
#[derive(Clone, Debug)]
pub struct FixedCandidates {
    points: Vec<Complex<f64>>,
    next: usize,
}

impl FixedCandidates {
    /// Refuses an empty list, which would have nothing to hand out.
    pub fn new(points: Vec<Complex<f64>>) -> Result<Self, NebulaError> {
        if points.is_empty() {
            return Err(NebulaError::NoCandidates);
        }
        Ok(FixedCandidates { points, next: 0 })
    }
}

impl CandidateSource for FixedCandidates {
    fn next_candidate(&mut self) -> Complex<f64> {
        let point = self.points[self.next];
        self.next = (self.next + 1) % self.points.len();
        point
    }
}

/// The points one candidate's orbit passed through, and how long it
/// took to escape.
#[derive(Clone, Debug, Default)]
pub struct Trajectory {
    points: Vec<Complex<f64>>,
    depth: usize,
    escaped: bool,
}

impl Trajectory {
    /// Traces the orbit of `c` for at most `budget` iterations.  If it
    /// escapes inside the budget, keep following it until it leaves the
    /// window so the drawn curve isn't cut off at an arbitrary
    /// iteration.
    pub fn trace(c: Complex<f64>, budget: usize, mapper: &PlaneMapper) -> Trajectory {
        let mut trajectory = Trajectory::default();
        trajectory.retrace(c, budget, mapper);
        trajectory
    }

    /// As `trace`, reusing this trajectory's storage.
    pub fn retrace(&mut self, c: Complex<f64>, budget: usize, mapper: &PlaneMapper) {
        self.points.clear();
        self.escaped = false;

        let mut z = Complex::new(0.0, 0.0);
        let mut depth = 0;
        while depth < budget {
            z = z * z + c;
            self.points.push(z);
            if z.norm_sqr() > 4.0 {
                self.escaped = true;
                while mapper.in_window(&z) {
                    z = z * z + c;
                    self.points.push(z);
                }
                break;
            }
            depth += 1;
        }
        self.depth = depth;
    }

    /// Iterations completed before the escaping one, or the budget if
    /// the orbit never escaped.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the orbit left the radius-two disk within the budget.
    pub fn escaped(&self) -> bool {
        self.escaped
    }

    /// Every point the orbit visited, in order.
    pub fn points(&self) -> &[Complex<f64>] {
        &self.points
    }

    /// The channels this orbit should be drawn into.  An orbit that
    /// never escaped is drawn nowhere.
    pub fn channels(&self, limits: &ChannelLimits, mapping: ChannelMapping) -> Vec<Channel> {
        if !self.escaped {
            return vec![];
        }
        Channel::ALL
            .iter()
            .cloned()
            .filter(|&channel| mapping.qualifies(self.depth, channel, limits))
            .collect()
    }
}

/// Tries a fixed number of candidates and yields every point of every
/// qualifying orbit, tagged by channel.  Runs exactly once: when the
/// iterator returns `None` the sampler's share of the work is done.
pub struct OrbitSampler<'a, S: CandidateSource> {
    mapper: &'a PlaneMapper,
    limits: ChannelLimits,
    mapping: ChannelMapping,
    source: S,
    remaining: u64,
    trajectory: Trajectory,
    channels: Vec<Channel>,
    channel_cursor: usize,
    point_cursor: usize,
}

impl<'a, S: CandidateSource> OrbitSampler<'a, S> {
    /// A sampler that will try `candidates` values of `c` taken from
    /// `source`.
    pub fn new(config: &RenderConfig, mapper: &'a PlaneMapper, source: S, candidates: u64) -> Self {
        OrbitSampler {
            mapper,
            limits: config.limits(),
            mapping: config.mapping(),
            source,
            remaining: candidates,
            trajectory: Trajectory::default(),
            channels: vec![],
            channel_cursor: 0,
            point_cursor: 0,
        }
    }

    /// Candidates not yet tried.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl<'a, S: CandidateSource> Iterator for OrbitSampler<'a, S> {
    type Item = ChannelPoint;

    fn next(&mut self) -> Option<ChannelPoint> {
        loop {
            if let Some(&channel) = self.channels.get(self.channel_cursor) {
                if let Some(&point) = self.trajectory.points().get(self.point_cursor) {
                    self.point_cursor += 1;
                    return Some(ChannelPoint { point, channel });
                }
                self.channel_cursor += 1;
                self.point_cursor = 0;
                continue;
            }

            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;

            let c = self.source.next_candidate();
            self.trajectory.retrace(c, self.limits.budget(), self.mapper);
            self.channels = self.trajectory.channels(&self.limits, self.mapping);
            self.channel_cursor = 0;
            self.point_cursor = 0;
        }
    }
}
