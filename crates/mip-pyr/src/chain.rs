use log::{debug, trace, warn};
use mip_core::{Bitmap, BitmapSource, BitmapView, Error};

use crate::config::{MipConfig, OddEdge};
use crate::downsample::{downsample2x2_box, next_level_size};

/// Number of levels in a full chain for a `width x height` source, the
/// source level included: `floor(log2(max(width, height))) + 1`.
///
/// Returns 0 when both dimensions are 0.
pub fn count_mip_levels(width: usize, height: usize) -> usize {
    let largest = width.max(height);
    if largest == 0 {
        return 0;
    }
    largest.ilog2() as usize + 1
}

/// Owned mipmap chain.
///
/// Level 0 is the largest level present; each next level is the 2x2 box
/// downsample of the previous one. Every level owns its own pixel buffer and
/// levels are immutable once the chain is built. Releasing the chain goes
/// through [`MipChain::free`] (or a plain drop), which consumes it.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct MipChain {
    levels: Vec<Bitmap>,
}

impl MipChain {
    /// Builds the full chain. Level 0 is a copy of `source`, the last level
    /// is 1x1.
    pub fn generate<'a>(source: impl Into<BitmapSource<'a>>) -> Result<Self, Error> {
        Self::generate_with_config(source, &MipConfig::default())
    }

    pub fn generate_with_config<'a>(
        source: impl Into<BitmapSource<'a>>,
        config: &MipConfig,
    ) -> Result<Self, Error> {
        build(source.into(), config, true)
    }

    /// Builds the chain without a copy of the source, starting at the first
    /// downsampled level. A 1x1 source yields an empty chain.
    pub fn generate_no_base<'a>(source: impl Into<BitmapSource<'a>>) -> Result<Self, Error> {
        Self::generate_no_base_with_config(source, &MipConfig::default())
    }

    pub fn generate_no_base_with_config<'a>(
        source: impl Into<BitmapSource<'a>>,
        config: &MipConfig,
    ) -> Result<Self, Error> {
        build(source.into(), config, false)
    }

    /// Releases every level buffer together with the chain itself.
    pub fn free(self) {
        trace!("releasing {} mip levels", self.levels.len());
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, i: usize) -> Option<&Bitmap> {
        self.levels.get(i)
    }

    pub fn levels(&self) -> &[Bitmap] {
        &self.levels
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bitmap> {
        self.levels.iter()
    }

    /// Sum of all level buffer sizes in bytes.
    pub fn total_bytes(&self) -> usize {
        self.levels.iter().map(|l| l.pixels().len()).sum()
    }

    pub fn into_levels(self) -> Vec<Bitmap> {
        self.levels
    }
}

impl<'c> IntoIterator for &'c MipChain {
    type Item = &'c Bitmap;
    type IntoIter = std::slice::Iter<'c, Bitmap>;

    fn into_iter(self) -> Self::IntoIter {
        self.levels.iter()
    }
}

/// Produces the single level below `source`.
pub fn generate_level<'a>(source: impl Into<BitmapSource<'a>>) -> Result<Bitmap, Error> {
    generate_level_with_config(source, &MipConfig::default())
}

pub fn generate_level_with_config<'a>(
    source: impl Into<BitmapSource<'a>>,
    config: &MipConfig,
) -> Result<Bitmap, Error> {
    let view = source.into().validate()?;
    let mut budget = Budget::new(config.memory_limit);
    next_level(&view, config.odd_edge, &mut budget)
}

struct Budget {
    limit: Option<usize>,
    used: usize,
}

impl Budget {
    fn new(limit: Option<usize>) -> Self {
        Self { limit, used: 0 }
    }

    fn reserve(&mut self, bytes: usize) -> Result<(), Error> {
        let used = self
            .used
            .checked_add(bytes)
            .ok_or(Error::OutOfMemory { requested: bytes })?;
        if let Some(limit) = self.limit
            && used > limit
        {
            warn!("mip chain memory limit of {limit} bytes exceeded ({used} bytes needed)");
            return Err(Error::OutOfMemory { requested: bytes });
        }
        self.used = used;
        Ok(())
    }
}

fn build(
    source: BitmapSource<'_>,
    config: &MipConfig,
    include_base: bool,
) -> Result<MipChain, Error> {
    let view = source.validate()?;
    let count = count_mip_levels(view.width(), view.height());
    let len = if include_base { count } else { count - 1 };
    debug!(
        "generating {len} mip levels from {}x{} source ({} bytes per pixel, {:?} odd edges)",
        view.width(),
        view.height(),
        view.bytes_per_pixel(),
        config.odd_edge,
    );

    let mut budget = Budget::new(config.memory_limit);
    let mut levels = Vec::new();
    levels
        .try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory {
            requested: len * size_of::<Bitmap>(),
        })?;

    // Any early return drops `levels`, releasing every level built so far.
    if include_base {
        budget.reserve(view.pixels().len())?;
        levels.push(Bitmap::try_copy_of(&view)?);
    }
    for _ in 1..count {
        let next = {
            let prev = levels.last().map_or(view, Bitmap::as_view);
            next_level(&prev, config.odd_edge, &mut budget)?
        };
        levels.push(next);
    }

    Ok(MipChain { levels })
}

fn next_level(
    prev: &BitmapView<'_>,
    odd_edge: OddEdge,
    budget: &mut Budget,
) -> Result<Bitmap, Error> {
    budget.reserve(next_level_size(
        prev.width(),
        prev.height(),
        prev.bytes_per_pixel(),
    ))?;
    let level = downsample2x2_box(prev, odd_edge)?;
    trace!("built mip level {}x{}", level.width(), level.height());
    Ok(level)
}

#[cfg(test)]
mod tests {
    use mip_core::{Bitmap, BitmapSource, Error};

    use crate::chain::{MipChain, count_mip_levels, generate_level, generate_level_with_config};
    use crate::config::{MipConfig, OddEdge};

    fn ramp(width: usize, height: usize, bpp: usize) -> Bitmap {
        let data = (0..width * height * bpp).map(|i| (i % 251) as u8).collect();
        Bitmap::from_vec(width, height, bpp, data).expect("valid bitmap")
    }

    #[test]
    fn level_count_matches_log2_of_largest_axis() {
        assert_eq!(count_mip_levels(1, 1), 1);
        assert_eq!(count_mip_levels(2, 1), 2);
        assert_eq!(count_mip_levels(3, 1), 2);
        assert_eq!(count_mip_levels(4, 4), 3);
        assert_eq!(count_mip_levels(451, 244), 9);
        assert_eq!(count_mip_levels(1, 1024), 11);
        assert_eq!(count_mip_levels(0, 0), 0);
    }

    #[test]
    fn chain_451x244_halves_each_axis_down_to_1x1() {
        let src = ramp(451, 244, 3);
        let chain = MipChain::generate(&src).expect("chain");

        assert_eq!(chain.len(), 9);
        let dims: Vec<(usize, usize)> = chain.iter().map(|l| (l.width(), l.height())).collect();
        assert_eq!(
            dims,
            vec![
                (451, 244),
                (225, 122),
                (112, 61),
                (56, 30),
                (28, 15),
                (14, 7),
                (7, 3),
                (3, 1),
                (1, 1)
            ]
        );
        assert!(chain.iter().all(|l| l.bytes_per_pixel() == 3));
        chain.free();
    }

    #[test]
    fn level_zero_is_a_copy_of_the_source() {
        let src = ramp(6, 5, 2);
        let chain = MipChain::generate(&src).expect("chain");
        let base = chain.level(0).expect("level 0");

        assert_eq!(base, &src);
        assert_ne!(base.pixels().as_ptr(), src.pixels().as_ptr());
    }

    #[test]
    fn one_by_one_source_yields_single_level() {
        let src = Bitmap::from_vec(1, 1, 4, vec![9u8, 8, 7, 6]).expect("valid bitmap");
        let chain = MipChain::generate(&src).expect("chain");
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.levels()[0].pixels(), &[9, 8, 7, 6]);

        let no_base = MipChain::generate_no_base(&src).expect("chain");
        assert!(no_base.is_empty());
        no_base.free();
    }

    #[test]
    fn ramp_4x4_end_to_end() {
        let src = Bitmap::from_vec(4, 4, 1, (0u8..16).map(|v| v * 16).collect())
            .expect("valid bitmap");
        let chain = MipChain::generate(&src).expect("chain");

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.levels()[1].pixels(), &[40, 72, 168, 200]);
        assert_eq!(chain.levels()[2].pixels(), &[120]);
    }

    #[test]
    fn odd_single_row_respects_edge_policy() {
        let data = [10u8, 20, 30];
        let src = BitmapSource::new(3, 1, 1, &data);

        let dropped = MipChain::generate(src).expect("chain");
        assert_eq!(dropped.len(), 2);
        assert_eq!(dropped.levels()[1].pixels(), &[15]);

        let cfg = MipConfig {
            odd_edge: OddEdge::Fold,
            ..MipConfig::default()
        };
        let folded = MipChain::generate_with_config(src, &cfg).expect("chain");
        assert_eq!(folded.levels()[1].pixels(), &[20]);
    }

    #[test]
    fn no_base_chain_skips_the_copy() {
        let src = ramp(8, 2, 1);
        let full = MipChain::generate(&src).expect("chain");
        let no_base = MipChain::generate_no_base(&src).expect("chain");

        assert_eq!(no_base.len(), full.len() - 1);
        assert_eq!(no_base.levels(), &full.levels()[1..]);
    }

    #[test]
    fn single_level_step_matches_chain_level_one() {
        let src = ramp(9, 7, 3);
        let chain = MipChain::generate(&src).expect("chain");
        let level = generate_level(&src).expect("level");
        assert_eq!(&level, chain.level(1).expect("level 1"));
    }

    #[test]
    fn invalid_sources_are_rejected() {
        let zero = BitmapSource {
            width: 0,
            height: 3,
            bytes_per_pixel: 1,
            pixels: Some(&[][..]),
        };
        assert!(matches!(
            MipChain::generate(zero),
            Err(Error::InvalidDimensions { .. })
        ));

        let null = BitmapSource {
            width: 3,
            height: 3,
            bytes_per_pixel: 1,
            pixels: None,
        };
        assert_eq!(MipChain::generate(null), Err(Error::NullBuffer));

        let short = [0u8; 8];
        assert_eq!(
            MipChain::generate(BitmapSource::new(3, 3, 1, &short)),
            Err(Error::SizeMismatch {
                expected: 9,
                actual: 8
            })
        );
    }

    #[test]
    fn memory_limit_rejects_chain_without_partial_result() {
        let src = ramp(16, 16, 1);
        let full = MipChain::generate(&src).expect("chain");
        assert_eq!(full.total_bytes(), 256 + 64 + 16 + 4 + 1);

        let cfg = MipConfig {
            memory_limit: Some(256 + 64 + 16),
            ..MipConfig::default()
        };
        assert_eq!(
            MipChain::generate_with_config(&src, &cfg),
            Err(Error::OutOfMemory { requested: 4 })
        );

        let exact = MipConfig {
            memory_limit: Some(full.total_bytes()),
            ..MipConfig::default()
        };
        let chain = MipChain::generate_with_config(&src, &exact).expect("fits exactly");
        assert_eq!(chain, full);

        let tiny = MipConfig {
            memory_limit: Some(10),
            ..MipConfig::default()
        };
        assert_eq!(
            generate_level_with_config(&src, &tiny),
            Err(Error::OutOfMemory { requested: 64 })
        );
    }
}
