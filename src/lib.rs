#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Nebulabrot renderer
//!
//! The Buddhabrot (and the Nebulabrot) are variants of the Mandelbrot
//! set that explore what the escaping points do on their way out.
//! The Mandelbrot takes a point on the complex plane and repeatedly
//! squares it and adds the original back, measuring how quickly that
//! number goes to infinity.
//!
//! Each iteration creates a new complex number that itself may be
//! used as a coordinate on the complex plane.  By mapping that
//! coordinate to the nearest integral pixel and incrementing that
//! pixel by one, we can plot the "orbit" of every point that escapes.
//! Plot enough randomly chosen orbits and a figure appears; that
//! figure is called a Buddhabrot.
//!
//! The Nebulabrot keeps three such histograms, one per color channel,
//! each admitting only orbits that escaped within its own iteration
//! limit.  Short orbits light up one channel, long ones another, and
//! the composite is a false-color image.
//!
//! The pieces, leaves first:
//!
//! * `planes` maps between the complex plane and pixels.
//! * `orbits` samples candidates and traces their orbits.
//! * `aggregate` counts orbit points into per-channel grids.
//! * `composite` normalizes the grids into an image and stores it.
//! * `nebula` runs a pool of samplers into one aggregator.

pub mod aggregate;
pub mod composite;
pub mod config;
pub mod errors;
pub mod nebula;
pub mod orbits;
pub mod planes;

pub use aggregate::{Aggregator, CountGrid, Histograms, Message};
pub use composite::{compose, ChannelRange, Compositor, Image, ImageSink, PngSink};
pub use config::{ChannelLimits, ChannelMapping, RenderConfig};
pub use errors::NebulaError;
pub use nebula::NebulaRenderer;
pub use orbits::{
    CandidateSource, Channel, ChannelPoint, FixedCandidates, OrbitSampler, Trajectory,
    UniformCandidates,
};
pub use planes::{Dimensions, OutOfBounds, Pixel, PlaneMapper, PlaneWindow};
