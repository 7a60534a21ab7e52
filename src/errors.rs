// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The errors a render can fail with.  Points that fall outside the
//! image are not errors; see `planes::OutOfBounds`.

use failure::Fail;
use std::io;

use crate::orbits::Channel;

/// Everything that can stop a render from producing an image.
#[derive(Debug, Fail)]
pub enum NebulaError {
    /// The window on the complex plane is empty, inverted, or not finite.
    #[fail(
        display = "plane window [{}, {}] x [{}, {}] must be finite and non-empty",
        xmin, xmax, ymin, ymax
    )]
    InvalidWindow {
        /// Left edge
        xmin: f64,
        /// Right edge
        xmax: f64,
        /// Bottom edge
        ymin: f64,
        /// Top edge
        ymax: f64,
    },

    /// The image has no pixels.
    #[fail(display = "image dimensions must be positive: {}x{}", width, height)]
    InvalidDimensions {
        /// Requested width
        width: usize,
        /// Requested height
        height: usize,
    },

    /// A channel was given an iteration limit of zero.
    #[fail(display = "the {} channel needs a positive iteration limit", channel)]
    InvalidLimit {
        /// The offending channel
        channel: Channel,
    },

    /// A render was asked to run with no workers.
    #[fail(display = "at least one worker is required")]
    NoWorkers,

    /// The event stream closed before every worker reported completion.
    #[fail(
        display = "event stream closed after {} of {} workers finished",
        finished, expected
    )]
    WorkersLost {
        /// Completion signals the aggregator was waiting for
        expected: usize,
        /// Completion signals it actually received
        finished: usize,
    },

    /// A list of values did not match the size it was meant to fill.
    #[fail(display = "expected {} values, found {}", expected, found)]
    SizeMismatch {
        /// How many were needed
        expected: usize,
        /// How many were given
        found: usize,
    },

    /// A fixed candidate source was given nothing to hand out.
    #[fail(display = "a fixed candidate source needs at least one point")]
    NoCandidates,

    /// A sampling thread panicked.
    #[fail(display = "a sampling worker panicked")]
    WorkerPanicked,

    /// The image sink could not write the picture.
    #[fail(display = "could not write image: {}", _0)]
    Image(#[cause] io::Error),
}

impl From<io::Error> for NebulaError {
    fn from(err: io::Error) -> Self {
        NebulaError::Image(err)
    }
}
