use rppal::gpio::{Gpio, InputPin, Level};
use std::time::{Duration, Instant};
use tracing::info;

const DEBOUNCE: Duration = Duration::from_millis(50);
const LONG_PRESS: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    Rising,
    Falling,
}

/// Debounce and long-press tracking for one active-high button.
#[derive(Debug, Clone)]
pub struct ButtonState {
    current: Level,
    last_stable: Level,
    last_change: Instant,
    press_start: Option<Instant>,
}

impl ButtonState {
    pub fn new(now: Instant) -> Self {
        ButtonState {
            current: Level::Low,
            last_stable: Level::Low,
            last_change: now,
            press_start: None,
        }
    }

    /// Feed one raw level; returns an edge once the level has held for the
    /// debounce time.
    pub fn update(&mut self, level: Level, now: Instant) -> Option<Edge> {
        if level != self.current {
            self.current = level;
            self.last_change = now;
            return None;
        }

        if now.duration_since(self.last_change) >= DEBOUNCE && self.current != self.last_stable {
            self.last_stable = self.current;
            return if self.current == Level::High {
                self.press_start = Some(now);
                Some(Edge::Rising)
            } else {
                self.press_start = None;
                Some(Edge::Falling)
            };
        }

        None
    }

    pub fn is_pressed(&self) -> bool {
        self.last_stable == Level::High
    }

    pub fn is_long_press(&self, now: Instant) -> bool {
        match self.press_start {
            Some(start) if self.is_pressed() => now.duration_since(start) >= LONG_PRESS,
            _ => false,
        }
    }
}

/// Push-button on a GPIO pin with pull-down.
pub struct Button {
    pin: InputPin,
    state: ButtonState,
}

impl Button {
    pub fn new(pin_number: u8) -> Result<Self, rppal::gpio::Error> {
        let pin = Gpio::new()?.get(pin_number)?.into_input_pulldown();
        info!("GPIO {} initialized", pin_number);
        Ok(Button { pin, state: ButtonState::new(Instant::now()) })
    }

    pub fn poll(&mut self) -> Option<Edge> {
        self.state.update(self.pin.read(), Instant::now())
    }

    /// Poll for up to `window` and report whether the button was held long
    /// enough to count as a long press.
    pub fn held_for_long_press(&mut self, window: Duration, poll_every: Duration) -> bool {
        let start = Instant::now();
        while start.elapsed() < window {
            self.poll();
            if self.state.is_long_press(Instant::now()) {
                return true;
            }
            if !self.state.is_pressed() && start.elapsed() > DEBOUNCE * 2 {
                return false;
            }
            std::thread::sleep(poll_every);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn bounce_shorter_than_debounce_is_ignored() {
        let t0 = Instant::now();
        let mut button = ButtonState::new(t0);

        assert_eq!(button.update(Level::High, t0 + ms(1)), None);
        assert_eq!(button.update(Level::Low, t0 + ms(10)), None);
        assert_eq!(button.update(Level::Low, t0 + ms(100)), None);
        assert!(!button.is_pressed());
    }

    #[test]
    fn stable_press_and_release_emit_edges() {
        let t0 = Instant::now();
        let mut button = ButtonState::new(t0);

        assert_eq!(button.update(Level::High, t0), None);
        assert_eq!(button.update(Level::High, t0 + ms(20)), None);
        assert_eq!(button.update(Level::High, t0 + ms(60)), Some(Edge::Rising));
        assert!(button.is_pressed());
        // no repeat while held
        assert_eq!(button.update(Level::High, t0 + ms(80)), None);

        assert_eq!(button.update(Level::Low, t0 + ms(200)), None);
        assert_eq!(button.update(Level::Low, t0 + ms(260)), Some(Edge::Falling));
        assert!(!button.is_pressed());
    }

    #[test]
    fn long_press_after_one_second() {
        let t0 = Instant::now();
        let mut button = ButtonState::new(t0);
        button.update(Level::High, t0);
        button.update(Level::High, t0 + ms(50));

        assert!(!button.is_long_press(t0 + ms(500)));
        assert!(button.is_long_press(t0 + ms(1050)));

        button.update(Level::Low, t0 + ms(1100));
        button.update(Level::Low, t0 + ms(1200));
        assert!(!button.is_long_press(t0 + ms(3000)));
    }
}
