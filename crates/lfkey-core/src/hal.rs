//! Collaborator boundary toward the analog RF front-end.
//!
//! The engine never touches hardware registers; everything it needs from
//! the platform goes through [`RfFrontend`]. The platform in turn wires its
//! edge-detection interrupt to [`Reader::feed`](crate::Reader::feed) and
//! its emulation timer to [`Emulator::on_timer`](crate::Emulator::on_timer).

/// Platform services the engine depends on.
///
/// `delay_us` busy-waits; it is only called from the writer path, which
/// owns the RF hardware exclusively while it runs. `stop` must always
/// leave the antenna and timers idle, whatever state preceded it.
pub trait RfFrontend {
    /// Configure the receive carrier and comparator duty cycle.
    fn configure(&mut self, frequency_hz: u32, duty_cycle: f32);

    /// Begin delivering edge events to the registered callback.
    fn start_receive(&mut self);

    /// Begin driving the antenna from the emulation timer.
    fn start_transmit(&mut self);

    /// Stop receive or transmit and leave the hardware idle.
    fn stop(&mut self);

    /// Gate the transmit carrier on or off (T55xx write gaps).
    fn set_field(&mut self, on: bool);

    /// Busy-wait for `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Suppress preemption around a timing-critical stretch.
    fn interrupts_disable(&mut self);

    /// Re-enable preemption.
    fn interrupts_enable(&mut self);
}

/// Front-end that performs no hardware actions.
///
/// Used when replaying recorded edge streams offline, where there is no
/// antenna to configure and no interrupt source to gate.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFrontend;

impl RfFrontend for NullFrontend {
    fn configure(&mut self, _frequency_hz: u32, _duty_cycle: f32) {}
    fn start_receive(&mut self) {}
    fn start_transmit(&mut self) {}
    fn stop(&mut self) {}
    fn set_field(&mut self, _on: bool) {}
    fn delay_us(&mut self, _us: u32) {}
    fn interrupts_disable(&mut self) {}
    fn interrupts_enable(&mut self) {}
}
