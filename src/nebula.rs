// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Nebulabrot renderer
//!
//! A pool of workers each sample their own share of the point budget
//! and stream what they find down one bounded channel.  A single
//! aggregator at the other end counts the points into three grids.
//! When every worker has said it is done, the grids are frozen and
//! composited into a picture.

use crossbeam::channel;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::aggregate::{Aggregator, Histograms, Message};
use crate::composite::{Compositor, Image, ImageSink};
use crate::config::RenderConfig;
use crate::errors::NebulaError;
use crate::orbits::{CandidateSource, Channel, OrbitSampler, UniformCandidates};
use crate::planes::PlaneMapper;

/// Takes a configuration and renders a three-channel Buddhabrot from
/// it.  Once built, the renderer does not change.
pub struct NebulaRenderer {
    config: RenderConfig,
    mapper: PlaneMapper,
}

impl NebulaRenderer {
    /// All the validation has already happened in building `config`.
    pub fn new(config: RenderConfig) -> Self {
        NebulaRenderer {
            mapper: config.mapper(),
            config,
        }
    }

    /// The configuration this renderer was built with.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Runs the sampling phase with uniformly random candidates.  Worker
    /// `i` is seeded with `seed + i` when the configuration carries a
    /// seed, and from system entropy otherwise.
    pub fn histograms(&self) -> Result<Histograms, NebulaError> {
        let window = self.config().window();
        let seed = self.config().seed();
        self.histograms_with(|worker| {
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker as u64)),
                None => StdRng::from_entropy(),
            };
            UniformCandidates::new(&window, rng)
        })
    }

    /// Runs the sampling phase, asking `source_for` for each worker's
    /// candidate source.
    pub fn histograms_with<S, F>(&self, source_for: F) -> Result<Histograms, NebulaError>
    where
        S: CandidateSource + Send,
        F: Fn(usize) -> S,
    {
        let workers = self.config.workers();
        let share = self.config.points_per_worker();
        info!(
            "sampling {} points on {} workers ({} each)",
            share * (workers as u64),
            workers,
            share
        );

        let (events, inbox) = channel::bounded(self.config.queue_depth());
        let config = &self.config;
        let mapper = &self.mapper;

        let result = crossbeam::scope(|spawner| {
            for worker in 0..workers {
                let events = events.clone();
                let source = source_for(worker);
                spawner.spawn(move |_| {
                    let sampler = OrbitSampler::new(config, mapper, source, share);
                    for point in sampler {
                        // Only fails if the aggregator is gone, and then
                        // nobody is listening for the rest either.
                        if events.send(Message::Point(point)).is_err() {
                            return;
                        }
                    }
                    debug!("worker {} exhausted its {} candidates", worker, share);
                    let _ = events.send(Message::Done);
                });
            }
            // The aggregator must see the stream close if every worker dies.
            drop(events);
            Aggregator::new(mapper, workers).run(&inbox)
        });

        match result {
            Ok(histograms) => histograms,
            Err(_) => Err(NebulaError::WorkerPanicked),
        }
    }

    /// Samples, then composites.
    pub fn render(&self) -> Result<Image, NebulaError> {
        let histograms = self.histograms()?;
        self.composite(&histograms)
    }

    /// Samples, composites, and hands the picture to `sink`.
    pub fn render_to<K: ImageSink>(&self, sink: &mut K) -> Result<(), NebulaError> {
        let image = self.render()?;
        sink.accept(&image)
    }

    /// Composites frozen histograms, logging what each channel saw.
    pub fn composite(&self, histograms: &Histograms) -> Result<Image, NebulaError> {
        let compositor = Compositor::scan(histograms.red(), histograms.green(), histograms.blue());
        for &channel in Channel::ALL.iter() {
            let range = compositor.range(channel);
            info!(
                "{}: {} hits, per-pixel range {}..={}",
                channel,
                histograms.grid(channel).total(),
                range.min,
                range.max
            );
        }
        compositor.paint(histograms.red(), histograms.green(), histograms.blue())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CountGrid;
    use crate::config::{ChannelLimits, ChannelMapping};
    use crate::orbits::FixedCandidates;
    use crate::planes::{Dimensions, Pixel, PlaneWindow};
    use num::Complex;

    // c = 0.5 + 0.5i visits 0.5+0.5i, 0.5+1i, -0.25+1.5i, -1.6875-0.25i
    // and escapes on the fifth iteration, so its depth is 4.  Only the
    // first two points fall inside [-1, 1] x [-1, 1]: pixels (3, 1) and
    // (3, 0) of a 4x4 image.
    fn one_orbit(limits: ChannelLimits, mapping: ChannelMapping) -> Histograms {
        let config = RenderConfig::new(
            Dimensions::new(4, 4).unwrap(),
            PlaneWindow::new(-1.0, 1.0, -1.0, 1.0).unwrap(),
            limits,
        )
        .with_points(1)
        .with_workers(1)
        .unwrap()
        .with_mapping(mapping);
        NebulaRenderer::new(config)
            .histograms_with(|_| one_point())
            .unwrap()
    }

    fn one_point() -> FixedCandidates {
        FixedCandidates::new(vec![Complex::new(0.5, 0.5)]).unwrap()
    }

    fn only(cells: &[Pixel]) -> CountGrid {
        let dimensions = Dimensions::new(4, 4).unwrap();
        let mut grid = CountGrid::new(dimensions);
        for &pixel in cells {
            grid.increment(pixel);
        }
        grid
    }

    #[test]
    fn one_known_orbit_lands_in_exactly_one_grid() {
        let limits = ChannelLimits::new(5, 3, 4).unwrap();
        let histograms = one_orbit(limits, ChannelMapping::Reference);
        assert_eq!(histograms.red(), &only(&[Pixel(3, 1), Pixel(3, 0)]));
        assert_eq!(histograms.green(), &only(&[]));
        assert_eq!(histograms.blue(), &only(&[]));
    }

    #[test]
    fn mapping_policy_decides_green_or_blue() {
        let limits = ChannelLimits::new(1, 3, 5).unwrap();
        let crossed = one_orbit(limits, ChannelMapping::Reference);
        assert_eq!(crossed.green(), &only(&[Pixel(3, 1), Pixel(3, 0)]));
        assert_eq!(crossed.blue(), &only(&[]));

        let direct = one_orbit(limits, ChannelMapping::Direct);
        assert_eq!(direct.green(), &only(&[]));
        assert_eq!(direct.blue(), &only(&[Pixel(3, 1), Pixel(3, 0)]));
        assert_eq!(direct.red(), &only(&[]));
    }

    #[test]
    fn every_worker_counts_its_share() {
        let config = RenderConfig::new(
            Dimensions::new(4, 4).unwrap(),
            PlaneWindow::new(-1.0, 1.0, -1.0, 1.0).unwrap(),
            ChannelLimits::new(5, 5, 5).unwrap(),
        )
        .with_points(13)
        .with_workers(4)
        .unwrap()
        .with_queue_depth(0);
        let histograms = NebulaRenderer::new(config)
            .histograms_with(|_| one_point())
            .unwrap();
        // 13 / 4 = 3 candidates per worker, 12 in all.
        assert_eq!(histograms.red().get(Pixel(3, 1)), 12);
        assert_eq!(histograms.red().get(Pixel(3, 0)), 12);
        assert_eq!(histograms.red().total(), 24);
    }

    #[test]
    fn seeded_renders_are_reproducible() {
        let config = RenderConfig::new(
            Dimensions::new(48, 32).unwrap(),
            PlaneWindow::default(),
            ChannelLimits::new(50, 20, 100).unwrap(),
        )
        .with_points(3000)
        .with_workers(3)
        .unwrap()
        .with_seed(Some(42));
        let first = NebulaRenderer::new(config).histograms().unwrap();
        let second = NebulaRenderer::new(config).histograms().unwrap();
        assert_eq!(first, second);
        assert!(first.red().total() > 0);
    }

    #[test]
    fn render_produces_an_opaque_image_of_the_right_size() {
        let config = RenderConfig::new(
            Dimensions::new(20, 10).unwrap(),
            PlaneWindow::default(),
            ChannelLimits::new(30, 10, 60).unwrap(),
        )
        .with_points(500)
        .with_workers(2)
        .unwrap()
        .with_seed(Some(7));

        struct Keep(Option<Image>);
        impl ImageSink for Keep {
            fn accept(&mut self, image: &Image) -> Result<(), NebulaError> {
                self.0 = Some(image.clone());
                Ok(())
            }
        }

        let renderer = NebulaRenderer::new(config);
        assert_eq!(renderer.config().dimensions(), config.dimensions());
        let mut sink = Keep(None);
        renderer.render_to(&mut sink).unwrap();
        let image = sink.0.unwrap();
        assert_eq!((image.width(), image.height()), (20, 10));
        assert_eq!(image.samples().len(), 20 * 10 * 4);
        assert!(image.samples().chunks(4).all(|pixel| pixel[3] == 65535));
    }

    // Panics on its first draw when `broken`, as a worker thread would if
    // its source hit a bug.
    struct Flaky {
        broken: bool,
        fallback: FixedCandidates,
    }

    impl CandidateSource for Flaky {
        fn next_candidate(&mut self) -> Complex<f64> {
            if self.broken {
                panic!("candidate source failed");
            }
            self.fallback.next_candidate()
        }
    }

    #[test]
    fn a_panicking_worker_fails_the_render_instead_of_hanging() {
        let config = RenderConfig::new(
            Dimensions::new(4, 4).unwrap(),
            PlaneWindow::new(-1.0, 1.0, -1.0, 1.0).unwrap(),
            ChannelLimits::new(5, 5, 5).unwrap(),
        )
        .with_points(30)
        .with_workers(3)
        .unwrap()
        .with_queue_depth(0);
        let renderer = NebulaRenderer::new(config);
        let result = renderer.histograms_with(|worker| Flaky {
            broken: worker == 1,
            fallback: one_point(),
        });
        match result {
            Err(NebulaError::WorkerPanicked) => (),
            other => panic!("unexpected {:?}", other),
        }
    }
}
