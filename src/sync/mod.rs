use core::cell::UnsafeCell;
use core::hint::spin_loop;
use core::ptr;
use core::sync::atomic::{fence, AtomicUsize, Ordering};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WriteConflict;

/// Single writer, lock free readers. Odd version means write in progress.
pub struct ReadSpinLock<T> {
    version: AtomicUsize,
    data: UnsafeCell<T>,
}

impl<T: Default> Default for ReadSpinLock<T> {
    fn default() -> Self {
        Self { version: AtomicUsize::new(0), data: UnsafeCell::new(T::default()) }
    }
}

impl<T: Copy> ReadSpinLock<T> {
    pub fn write(&self, data: T) -> Result<(), WriteConflict> {
        let version = self.version.load(Ordering::Relaxed);
        if version & 1 > 0 {
            return Err(WriteConflict);
        }
        let next = version.wrapping_add(1);
        let (acquire, relaxed) = (Ordering::Acquire, Ordering::Relaxed);
        if self.version.compare_exchange(version, next, acquire, relaxed).is_err() {
            return Err(WriteConflict);
        }
        unsafe { ptr::write_volatile(self.data.get(), data) };
        self.version.store(next.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    pub fn read(&self) -> T {
        loop {
            let version = self.version.load(Ordering::Acquire);
            if version & 1 > 0 {
                spin_loop();
                continue;
            }
            let data = unsafe { ptr::read_volatile(self.data.get()) };
            fence(Ordering::Acquire);
            if version == self.version.load(Ordering::Relaxed) {
                return data;
            }
        }
    }
}

unsafe impl<T: Send> Sync for ReadSpinLock<T> {}
unsafe impl<T: Send> Send for ReadSpinLock<T> {}

mod test {
    #[test]
    fn test_read_spin_lock() {
        use super::ReadSpinLock;

        let lock = ReadSpinLock::<(f32, u32)>::default();
        assert_eq!(lock.read(), (0.0, 0));
        lock.write((1.5, 2)).unwrap();
        assert_eq!(lock.read(), (1.5, 2));
    }

    #[test]
    fn test_concurrent_reader() {
        use std::sync::Arc;
        use std::thread;

        use super::ReadSpinLock;

        let lock = Arc::new(ReadSpinLock::<(u32, u32)>::default());
        let writer = lock.clone();
        let handle = thread::spawn(move || {
            for i in 0..10000u32 {
                writer.write((i, i)).unwrap();
            }
        });
        for _ in 0..10000 {
            let (a, b) = lock.read();
            assert_eq!(a, b);
        }
        handle.join().unwrap();
        assert_eq!(lock.read(), (9999, 9999));
    }
}
