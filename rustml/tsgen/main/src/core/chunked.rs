//! Chunk-aware window generator.
//!
//! Rows of a time-indexed frame are grouped into runs sampled exactly one
//! step apart. Every run gets its own [`WindowGenerator`], so no window ever
//! spans a gap, and the per-run generators are exposed as one sequence.

use crate::api::error::{TsgenError, TsgenResult};
use crate::api::source::BatchSource;
use crate::api::types::{Batch, TimeFrame, TimeseriesChunk};
use crate::core::chunks::find_consecutive_chunks;
use crate::core::padding::pad_x_and_y;
use crate::core::window::WindowGenerator;
use chrono::TimeDelta;

/// A chunk's generator together with where it came from.
#[derive(Debug, Clone)]
pub struct GeneratorContainer {
    generator: WindowGenerator,
    chunk: TimeseriesChunk,
    length: usize,
}

impl GeneratorContainer {
    pub fn generator(&self) -> &WindowGenerator {
        &self.generator
    }

    pub fn chunk(&self) -> &TimeseriesChunk {
        &self.chunk
    }

    /// Number of batches this chunk contributes.
    pub fn length(&self) -> usize {
        self.length
    }
}

/// Shared settings for [`ChunkedTimeseriesGenerator::new`].
#[derive(Debug, Clone, Copy)]
pub struct ChunkedSettings {
    pub length: usize,
    pub batch_size: usize,
    pub shuffle: bool,
    pub step: TimeDelta,
    pub lookahead: i64,
}

#[derive(Debug, Clone)]
pub struct ChunkedTimeseriesGenerator {
    step: TimeDelta,
    lookahead: i64,
    consecutive_chunks: Vec<TimeseriesChunk>,
    failed_chunks: Vec<TimeseriesChunk>,
    containers: Vec<GeneratorContainer>,
}

impl ChunkedTimeseriesGenerator {
    pub fn new(
        data: &TimeFrame,
        targets: &TimeFrame,
        settings: ChunkedSettings,
    ) -> TsgenResult<Self> {
        if data.len() != targets.len() {
            return Err(TsgenError::LengthMismatch {
                data: data.len(),
                targets: targets.len(),
            });
        }
        if data.index() != targets.index() {
            return Err(TsgenError::IndexMismatch);
        }
        if settings.lookahead < 0 {
            return Err(TsgenError::InvalidConfig(format!(
                "Value of `lookahead` can not be negative, is {}",
                settings.lookahead
            )));
        }
        data.validate_index()?;

        let consecutive_chunks = find_consecutive_chunks(data.index(), settings.step);
        log::debug!(
            "ChunkedTimeseriesGenerator with consecutive_chunks={:?}",
            consecutive_chunks
        );

        let mut generator = Self {
            step: settings.step,
            lookahead: settings.lookahead,
            consecutive_chunks,
            failed_chunks: Vec::new(),
            containers: Vec::new(),
        };
        generator.containers = generator.create_generator_containers(data, targets, &settings)?;
        log::debug!(
            "ChunkedTimeseriesGenerator with {} generator containers, {} failed chunks",
            generator.containers.len(),
            generator.failed_chunks.len()
        );

        if generator.containers.is_empty() {
            return Err(TsgenError::InsufficientData {
                message: format!(
                    "Seems like the time series are too small or in random order for window length {}",
                    settings.length
                ),
                failed_chunks: generator.failed_chunks,
            });
        }
        Ok(generator)
    }

    /// One generator per chunk; chunks too short for a single window are
    /// recorded in `failed_chunks` and skipped.
    fn create_generator_containers(
        &mut self,
        data: &TimeFrame,
        targets: &TimeFrame,
        settings: &ChunkedSettings,
    ) -> TsgenResult<Vec<GeneratorContainer>> {
        let mut containers = Vec::with_capacity(self.consecutive_chunks.len());
        for chunk in &self.consecutive_chunks {
            let rows = data.positions_between(chunk.start, chunk.end);
            let (gen_data, gen_target) = pad_x_and_y(
                data.values().slice(ndarray::s![rows.clone(), ..]).to_owned(),
                targets.values().slice(ndarray::s![rows, ..]).to_owned(),
                self.lookahead,
            )?;

            match WindowGenerator::new(
                gen_data,
                gen_target,
                settings.length,
                settings.batch_size,
                settings.shuffle,
            ) {
                Ok(generator) => {
                    let length = generator.len();
                    containers.push(GeneratorContainer {
                        generator,
                        chunk: *chunk,
                        length,
                    });
                }
                Err(TsgenError::WindowTooLong { length, rows }) => {
                    log::warn!(
                        "Skipping chunk {}: window length {} needs more than {} rows",
                        chunk,
                        length,
                        rows
                    );
                    self.failed_chunks.push(*chunk);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(containers)
    }

    /// Keep only the containers at the given positions, in the given order.
    ///
    /// `None` leaves the generator untouched.
    pub fn filter_chunks(&mut self, indexes: Option<&[usize]>) -> TsgenResult<()> {
        let Some(indexes) = indexes else {
            return Ok(());
        };
        let len = self.containers.len();
        if let Some(&index) = indexes.iter().find(|&&i| i >= len) {
            return Err(TsgenError::IndexOutOfRange { index, len });
        }
        self.containers = indexes.iter().map(|&i| self.containers[i].clone()).collect();
        Ok(())
    }

    pub fn step(&self) -> TimeDelta {
        self.step
    }

    pub fn lookahead(&self) -> i64 {
        self.lookahead
    }

    pub fn consecutive_chunks(&self) -> &[TimeseriesChunk] {
        &self.consecutive_chunks
    }

    pub fn failed_chunks(&self) -> &[TimeseriesChunk] {
        &self.failed_chunks
    }

    pub fn containers(&self) -> &[GeneratorContainer] {
        &self.containers
    }

    /// Container position and local batch index for a global index.
    pub fn locate(&self, index: usize) -> TsgenResult<(usize, usize)> {
        let mut offset = 0;
        for (position, container) in self.containers.iter().enumerate() {
            if index < offset + container.length {
                return Ok((position, index - offset));
            }
            offset += container.length;
        }
        Err(TsgenError::IndexOutOfRange { index, len: offset })
    }
}

impl BatchSource for ChunkedTimeseriesGenerator {
    fn len(&self) -> usize {
        self.containers.iter().map(|c| c.length).sum()
    }

    fn get(&self, index: usize) -> TsgenResult<Batch> {
        let (position, local) = self.locate(index)?;
        self.containers[position].generator.get(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use ndarray::Array2;

    fn ts(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + TimeDelta::minutes(minutes)
    }

    /// Frame with one row per listed minute; the value is the minute offset.
    fn frame(minutes: &[i64]) -> TimeFrame {
        let values = Array2::from_shape_fn((minutes.len(), 2), |(i, j)| {
            minutes[i] as f32 + j as f32 * 0.5
        });
        TimeFrame::new(minutes.iter().map(|&m| ts(m)).collect(), values).unwrap()
    }

    fn settings(length: usize, batch_size: usize, lookahead: i64) -> ChunkedSettings {
        ChunkedSettings {
            length,
            batch_size,
            shuffle: false,
            step: TimeDelta::minutes(10),
            lookahead,
        }
    }

    fn gapped_minutes() -> Vec<i64> {
        // chunk of 10 rows, gap, chunk of 3 rows, gap, chunk of 8 rows
        let mut minutes: Vec<i64> = (0..10).map(|i| i * 10).collect();
        minutes.extend((0..3).map(|i| 500 + i * 10));
        minutes.extend((0..8).map(|i| 1000 + i * 10));
        minutes
    }

    #[test]
    fn test_single_chunk() {
        let minutes: Vec<i64> = (0..100).map(|i| i * 10).collect();
        let f = frame(&minutes);
        let gen = ChunkedTimeseriesGenerator::new(&f, &f, settings(20, 10, 1)).unwrap();
        assert_eq!(gen.consecutive_chunks().len(), 1);
        assert_eq!(gen.consecutive_chunks()[0].size, 100);
        assert_eq!(gen.len(), 8);
        assert!(gen.failed_chunks().is_empty());
    }

    #[test]
    fn test_short_chunk_fails_locally() {
        let f = frame(&gapped_minutes());
        let gen = ChunkedTimeseriesGenerator::new(&f, &f, settings(4, 2, 1)).unwrap();

        assert_eq!(gen.consecutive_chunks().len(), 3);
        assert_eq!(gen.failed_chunks(), &[gen.consecutive_chunks()[1]]);
        assert_eq!(gen.containers().len(), 2);
        // 10 rows -> 6 windows -> 3 batches; 8 rows -> 4 windows -> 2 batches
        assert_eq!(gen.containers()[0].length(), 3);
        assert_eq!(gen.containers()[1].length(), 2);
        assert_eq!(gen.len(), 5);
    }

    #[test]
    fn test_windows_never_cross_gaps() {
        let f = frame(&gapped_minutes());
        let gen = ChunkedTimeseriesGenerator::new(&f, &f, settings(4, 1, 1)).unwrap();
        for i in 0..gen.len() {
            let batch = gen.get(i).unwrap();
            let window: Vec<f32> = (0..4).map(|r| batch.x[[0, r, 0]]).collect();
            for pair in window.windows(2) {
                assert_eq!(pair[1] - pair[0], 10.0, "window {i} spans a gap: {window:?}");
            }
            assert_eq!(batch.y[[0, 0]] - window[3], 10.0);
        }
    }

    #[test]
    fn test_global_index_translation() {
        let f = frame(&gapped_minutes());
        let gen = ChunkedTimeseriesGenerator::new(&f, &f, settings(4, 2, 1)).unwrap();

        assert_eq!(gen.locate(0).unwrap(), (0, 0));
        assert_eq!(gen.locate(2).unwrap(), (0, 2));
        assert_eq!(gen.locate(3).unwrap(), (1, 0));
        assert_eq!(gen.locate(4).unwrap(), (1, 1));
        // First batch of the second container starts at minute 1000
        assert_eq!(gen.get(3).unwrap().x[[0, 0, 0]], 1000.0);

        let err = gen.get(gen.len()).unwrap_err();
        assert!(matches!(err, TsgenError::IndexOutOfRange { index: 5, len: 5 }));
    }

    #[test]
    fn test_all_chunks_too_short() {
        let f = frame(&[0, 10, 100, 110, 200]);
        let err = ChunkedTimeseriesGenerator::new(&f, &f, settings(5, 1, 1)).unwrap_err();
        match err {
            TsgenError::InsufficientData { failed_chunks, .. } => assert_eq!(failed_chunks.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lookahead_zero_pads_each_chunk() {
        let f = frame(&gapped_minutes());
        // Padding lets the 3-row chunk hold one 3-row window
        let gen = ChunkedTimeseriesGenerator::new(&f, &f, settings(3, 1, 0)).unwrap();
        assert!(gen.failed_chunks().is_empty());
        // 10 -> 8, 3 -> 1, 8 -> 6 windows
        assert_eq!(gen.len(), 15);
        for i in 0..gen.len() {
            let batch = gen.get(i).unwrap();
            assert_eq!(batch.x[[0, 2, 0]], batch.y[[0, 0]]);
        }
    }

    #[test]
    fn test_filter_chunks() {
        let f = frame(&gapped_minutes());
        let mut gen = ChunkedTimeseriesGenerator::new(&f, &f, settings(4, 2, 1)).unwrap();

        gen.filter_chunks(None).unwrap();
        assert_eq!(gen.len(), 5);

        gen.filter_chunks(Some(&[1])).unwrap();
        assert_eq!(gen.containers().len(), 1);
        assert_eq!(gen.len(), 2);
        assert_eq!(gen.get(0).unwrap().x[[0, 0, 0]], 1000.0);

        assert!(gen.filter_chunks(Some(&[3])).is_err());
    }

    #[test]
    fn test_rejects_mismatched_inputs() {
        let data = frame(&[0, 10, 20, 30]);
        let shorter = frame(&[0, 10, 20]);
        let shifted = frame(&[10, 20, 30, 40]);
        assert!(matches!(
            ChunkedTimeseriesGenerator::new(&data, &shorter, settings(2, 1, 1)),
            Err(TsgenError::LengthMismatch { .. })
        ));
        assert!(matches!(
            ChunkedTimeseriesGenerator::new(&data, &shifted, settings(2, 1, 1)),
            Err(TsgenError::IndexMismatch)
        ));
    }

    #[test]
    fn test_rejects_unsorted_index() {
        let f = frame(&[0, 10, 5, 20]);
        let err = ChunkedTimeseriesGenerator::new(&f, &f, settings(1, 1, 1)).unwrap_err();
        assert!(matches!(err, TsgenError::UnsortedIndex { position: 2 }));
    }

    #[test]
    fn test_rejects_duplicate_timestamps() {
        let f = frame(&[0, 10, 10, 20]);
        let err = ChunkedTimeseriesGenerator::new(&f, &f, settings(1, 1, 1)).unwrap_err();
        assert!(matches!(err, TsgenError::UnsortedIndex { position: 2 }));
    }

    #[test]
    fn test_rejects_negative_lookahead() {
        let f = frame(&[0, 10, 20, 30]);
        let err = ChunkedTimeseriesGenerator::new(&f, &f, settings(2, 1, -1)).unwrap_err();
        assert!(matches!(err, TsgenError::InvalidConfig(_)));
    }
}
