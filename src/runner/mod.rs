//! Session driver
//!
//! Replays a program over and over until the configured runtime is used up,
//! stepping away for an idle break whenever the idle period has elapsed.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::RunConfig;
use crate::input::InputDevice;
use crate::stealth::Humanizer;
use crate::vm::{Program, RunStats, Vm, VmError};

/// What a finished session did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Program passes attempted, including ones cut short by a missed target
    pub passes: usize,
    /// Idle breaks taken
    pub idles: usize,
    /// Color targets that were not on screen
    pub targets_missed: usize,
    /// Totals across all completed passes
    pub stats: RunStats,
}

/// Runs a program for a whole session
pub struct Runner<'a, D: InputDevice + ?Sized, R: Rng = StdRng> {
    device: &'a mut D,
    humanizer: &'a mut Humanizer<R>,
    config: &'a RunConfig,
}

impl<'a, D: InputDevice + ?Sized, R: Rng> Runner<'a, D, R> {
    /// Create a runner
    pub fn new(device: &'a mut D, humanizer: &'a mut Humanizer<R>, config: &'a RunConfig) -> Self {
        Self {
            device,
            humanizer,
            config,
        }
    }

    /// Run passes until the runtime is spent
    pub fn run(&mut self, program: &Program) -> Result<RunSummary, VmError> {
        let mut summary = RunSummary::default();
        if program.is_empty() {
            log::warn!("script has no instructions, nothing to run");
            return Ok(summary);
        }

        let start_delay = self.config.start_delay();
        if !start_delay.is_zero() {
            log::info!("starting in {:.1}s", start_delay.as_secs_f64());
            self.device.wait(start_delay)?;
        }

        let runtime = self.config.runtime();
        let idle_period = self.config.idle_period();
        let started = self.device.now();
        let mut last_idle = started;

        while self.device.now().duration_since(started) < runtime {
            summary.passes += 1;
            log::info!("pass {} starting", summary.passes);
            let pass_started = self.device.now();

            let mut vm = Vm::new(&mut *self.device, &mut *self.humanizer, self.config.motion);
            match vm.run(program) {
                Ok(stats) => {
                    summary.stats.steps += stats.steps;
                    summary.stats.jumps += stats.jumps;
                }
                Err(e) if e.is_target_not_found() && self.config.skip_missing_targets => {
                    log::warn!("{}, skipping to next pass", e);
                    summary.targets_missed += 1;
                }
                Err(e) => return Err(e),
            }

            // A pass that takes no time would never use up the runtime
            if self.device.now() == pass_started {
                log::warn!("pass {} took no time on the device clock, stopping", summary.passes);
                break;
            }

            if self.device.now().duration_since(last_idle) > idle_period {
                let [min_minutes, max_minutes] = self.config.idle_minutes;
                let idle = self.humanizer.idle_duration(min_minutes, max_minutes);
                log::info!("idling for {}", format_duration(idle));

                self.device.wait(idle)?;
                summary.idles += 1;
                last_idle = self.device.now();
            }
        }

        log::info!(
            "session over after {} passes, {} idles, {} missed targets",
            summary.passes,
            summary.idles,
            summary.targets_missed
        );
        Ok(summary)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}m{:02}s", secs / 60, secs % 60)
}
