//! Motion sensor input.
//!
//! The controller only asks one question of the hardware: is something moving
//! in front of the feeder right now? [`PinMotionSensor`] answers it from any
//! `embedded-hal` digital input, translating the electrical level through the
//! configured [`SignalPolarity`]. On a Raspberry Pi the pin comes from `rppal`
//! (feature `rpi`); everywhere else tests supply their own pins.

use anyhow::{Result, anyhow};
use embedded_hal::digital::InputPin;

use crate::config::SignalPolarity;

/// Presence query used by the controller.
#[cfg_attr(test, mockall::automock)]
pub trait MotionSensor {
    /// True while motion is present.
    fn motion_present(&mut self) -> Result<bool>;
}

/// Motion sensor on a single digital input.
pub struct PinMotionSensor<P> {
    pin: P,
    polarity: SignalPolarity,
}

impl<P: InputPin> PinMotionSensor<P> {
    pub fn new(pin: P, polarity: SignalPolarity) -> Self {
        Self { pin, polarity }
    }

    pub fn polarity(&self) -> SignalPolarity {
        self.polarity
    }
}

impl<P: InputPin> MotionSensor for PinMotionSensor<P> {
    fn motion_present(&mut self) -> Result<bool> {
        let reading = match self.polarity {
            SignalPolarity::ActiveLow => self.pin.is_low(),
            SignalPolarity::ActiveHigh => self.pin.is_high(),
        };
        reading.map_err(|e| anyhow!("Failed to read motion sensor: {e:?}"))
    }
}

/// Open a BCM pin through the kernel GPIO character device.
///
/// Active-low sensors get the internal pull-up so an unconnected line reads
/// "no motion" instead of floating.
#[cfg(feature = "rpi")]
pub fn open_gpio_sensor(
    pin: u8,
    polarity: SignalPolarity,
) -> Result<PinMotionSensor<rppal::gpio::InputPin>> {
    use anyhow::Context;

    let gpio = rppal::gpio::Gpio::new().context("Failed to access GPIO")?;
    let pin = gpio
        .get(pin)
        .with_context(|| format!("Failed to claim GPIO pin {pin}"))?;
    let input = match polarity {
        SignalPolarity::ActiveLow => pin.into_input_pullup(),
        SignalPolarity::ActiveHigh => pin.into_input(),
    };
    Ok(PinMotionSensor::new(input, polarity))
}
