/// Fixed capacity ring overwriting its oldest slot.
#[derive(Copy, Clone, Debug)]
pub struct RingBuffer<T, const N: usize> {
    buffer: [T; N],
    cursor: usize,
}

impl<T: Copy + Default, const N: usize> Default for RingBuffer<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Default, const N: usize> RingBuffer<T, N> {
    pub fn new() -> Self {
        Self { buffer: [T::default(); N], cursor: 0 }
    }

    pub fn push(&mut self, value: T) {
        if N == 0 {
            return;
        }
        self.buffer[self.cursor] = value;
        self.cursor = (self.cursor + 1) % N;
    }

    /// Resets every slot to default
    pub fn clear(&mut self) {
        self.buffer = [T::default(); N];
        self.cursor = 0;
    }
}

impl<const N: usize> RingBuffer<f32, N> {
    /// Mean over the whole capacity, slots not written yet count as zero.
    pub fn mean(&self) -> f32 {
        if N == 0 {
            return 0.0;
        }
        self.buffer.iter().sum::<f32>() / N as f32
    }
}

mod test {
    #[test]
    fn test_overwrites_oldest() {
        use super::RingBuffer;

        let mut ring = RingBuffer::<f32, 3>::new();
        ring.push(3.0);
        ring.push(6.0);
        assert_eq!(ring.mean(), 3.0);
        ring.push(9.0);
        assert_eq!(ring.mean(), 6.0);
        ring.push(0.0);
        assert_eq!(ring.mean(), 5.0);
        ring.clear();
        assert_eq!(ring.mean(), 0.0);
        ring.push(3.0);
        assert_eq!(ring.mean(), 1.0);
    }

    #[test]
    fn test_mean_over_capacity() {
        use super::RingBuffer;

        let mut ring = RingBuffer::<f32, 4>::new();
        assert_eq!(ring.mean(), 0.0);
        ring.push(4.0);
        assert_eq!(ring.mean(), 1.0);
        ring.push(4.0);
        assert_eq!(ring.mean(), 2.0);
        for _ in 0..4 {
            ring.push(2.0);
        }
        assert_eq!(ring.mean(), 2.0);
    }

    #[test]
    fn test_zero_capacity() {
        use super::RingBuffer;

        let mut ring = RingBuffer::<f32, 0>::new();
        ring.push(1.0);
        assert_eq!(ring.mean(), 0.0);
    }
}
