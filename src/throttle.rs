use std::thread;
use std::time::Duration;

pub trait Pause {
    fn pause(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&mut self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// The first `wait` is free; every later one pauses for `delay`.
pub struct Throttle<P: Pause = ThreadPause> {
    delay: Duration,
    pause: P,
    primed: bool,
}

impl Throttle<ThreadPause> {
    pub fn new(delay: Duration) -> Self {
        Self::with_pause(delay, ThreadPause)
    }
}

impl<P: Pause> Throttle<P> {
    pub fn with_pause(delay: Duration, pause: P) -> Self {
        Self {
            delay,
            pause,
            primed: false,
        }
    }

    pub fn wait(&mut self) {
        if self.primed && !self.delay.is_zero() {
            self.pause.pause(self.delay);
        }
        self.primed = true;
    }

    pub fn into_inner(self) -> P {
        self.pause
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<Duration>);

    impl Pause for Recorder {
        fn pause(&mut self, duration: Duration) {
            self.0.push(duration);
        }
    }

    #[test]
    fn first_wait_is_free() {
        let mut throttle = Throttle::with_pause(Duration::from_millis(150), Recorder::default());
        throttle.wait();
        throttle.wait();
        throttle.wait();
        let pauses = throttle.into_inner().0;
        assert_eq!(pauses, vec![Duration::from_millis(150); 2]);
    }

    #[test]
    fn zero_delay_never_pauses() {
        let mut throttle = Throttle::with_pause(Duration::ZERO, Recorder::default());
        throttle.wait();
        throttle.wait();
        assert!(throttle.into_inner().0.is_empty());
    }
}
