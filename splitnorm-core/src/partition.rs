use crate::error::{NormError, Result};
use std::ops::Range;

/// One worker's contiguous share of the vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub offset: usize,
    pub len: usize,
}

impl Segment {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }
}

/// Static split of `[0, len)` into `threads` contiguous segments.
///
/// # Logic
/// `range = len / threads`, `rest = len % threads`. Segment 0 absorbs the
/// whole remainder (`range + rest` elements, offset 0); segment `i > 0` has
/// `range` elements at offset `i * range + rest`.
///
/// The split depends only on `(len, threads)`, so the reduction and scaling
/// phases always see identical boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    len: usize,
    segments: Vec<Segment>,
}

impl Partition {
    /// # Errors
    /// `ZeroThreads`, `EmptyVector`, or `TooManyThreads` when `threads > len`
    /// (segments past the first would be empty).
    pub fn new(len: usize, threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(NormError::ZeroThreads);
        }
        if len == 0 {
            return Err(NormError::EmptyVector);
        }
        if threads > len {
            return Err(NormError::TooManyThreads { threads, len });
        }

        let range = len / threads;
        let rest = len % threads;

        let segments = (0..threads)
            .map(|i| {
                if i == 0 {
                    Segment { index: 0, offset: 0, len: range + rest }
                } else {
                    Segment { index: i, offset: i * range + rest, len: range }
                }
            })
            .collect();

        Ok(Self { len, segments })
    }

    pub fn threads(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    fn check_len(&self, actual: usize) -> Result<()> {
        if actual != self.len {
            return Err(NormError::LengthMismatch { expected: self.len, actual });
        }
        Ok(())
    }

    /// Read-only segment views, one per segment in index order.
    pub fn split<'a>(&self, data: &'a [f32]) -> Result<Vec<&'a [f32]>> {
        self.check_len(data.len())?;
        Ok(self.segments.iter().map(|s| &data[s.range()]).collect())
    }

    /// Exclusive segment views, one per segment in index order.
    ///
    /// Built by successive `split_at_mut`, so disjointness is checked by the
    /// borrow checker rather than by offset arithmetic in the workers.
    pub fn split_mut<'a>(&self, data: &'a mut [f32]) -> Result<Vec<&'a mut [f32]>> {
        self.check_len(data.len())?;
        let mut views = Vec::with_capacity(self.segments.len());
        let mut rest = data;
        for seg in &self.segments {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(seg.len);
            views.push(head);
            rest = tail;
        }
        debug_assert!(rest.is_empty());
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remainder_goes_to_first_segment() {
        let p = Partition::new(5, 2).unwrap();
        assert_eq!(
            p.segments(),
            &[
                Segment { index: 0, offset: 0, len: 3 },
                Segment { index: 1, offset: 3, len: 2 },
            ]
        );
    }

    #[test]
    fn test_even_split() {
        let p = Partition::new(12, 4).unwrap();
        let lens: Vec<usize> = p.segments().iter().map(|s| s.len).collect();
        assert_eq!(lens, vec![3, 3, 3, 3]);
        assert_eq!(p.segments()[3].offset, 9);
    }

    #[test]
    fn test_partition_covers_every_index_exactly_once() {
        for len in 1..=64 {
            for threads in 1..=len {
                let p = Partition::new(len, threads).unwrap();
                let mut owner = vec![None; len];
                for seg in p.segments() {
                    for i in seg.range() {
                        assert!(owner[i].is_none(), "index {} owned twice (len={}, threads={})", i, len, threads);
                        owner[i] = Some(seg.index);
                    }
                }
                assert!(owner.iter().all(|o| o.is_some()), "gap for len={}, threads={}", len, threads);

                let range = len / threads;
                for seg in &p.segments()[1..] {
                    assert_eq!(seg.len, range);
                }
                assert_eq!(p.segments()[0].len, range + len % threads);
            }
        }
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert!(matches!(Partition::new(10, 0), Err(NormError::ZeroThreads)));
        assert!(matches!(Partition::new(0, 1), Err(NormError::EmptyVector)));
        assert!(matches!(
            Partition::new(3, 4),
            Err(NormError::TooManyThreads { threads: 4, len: 3 })
        ));
    }

    #[test]
    fn test_split_mut_views_are_disjoint_segments() {
        let p = Partition::new(7, 3).unwrap();
        let mut data: Vec<f32> = (0..7).map(|i| i as f32).collect();
        {
            let views = p.split_mut(&mut data).unwrap();
            let lens: Vec<usize> = views.iter().map(|v| v.len()).collect();
            assert_eq!(lens, vec![3, 2, 2]);
            for (i, view) in views.into_iter().enumerate() {
                for x in view.iter_mut() {
                    *x += 100.0 * i as f32;
                }
            }
        }
        assert_eq!(data, vec![0.0, 1.0, 2.0, 103.0, 104.0, 205.0, 206.0]);
    }

    #[test]
    fn test_split_rejects_wrong_length() {
        let p = Partition::new(4, 2).unwrap();
        assert!(matches!(
            p.split(&[1.0, 2.0, 3.0]),
            Err(NormError::LengthMismatch { expected: 4, actual: 3 })
        ));
    }
}
