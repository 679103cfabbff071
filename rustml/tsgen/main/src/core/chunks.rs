use crate::api::types::TimeseriesChunk;
use chrono::{DateTime, TimeDelta, Utc};

/// Split a time index into maximal runs of rows spaced exactly `step` apart.
///
/// Any other spacing between two neighbours closes the running chunk and
/// starts a new one at the later timestamp. Gaps are data, so this never
/// fails: an empty index gives no chunks.
pub fn find_consecutive_chunks(index: &[DateTime<Utc>], step: TimeDelta) -> Vec<TimeseriesChunk> {
    let mut chunks = Vec::new();
    let Some((&first, rest)) = index.split_first() else {
        return chunks;
    };

    let mut start = first;
    let mut previous = first;
    let mut size = 1;
    for &ts in rest {
        if ts - previous == step {
            size += 1;
        } else {
            chunks.push(TimeseriesChunk {
                start,
                end: previous,
                size,
            });
            start = ts;
            size = 1;
        }
        previous = ts;
    }
    chunks.push(TimeseriesChunk {
        start,
        end: previous,
        size,
    });

    chunks
}
