//! The per-tick simulation loop.
//!
//! Each tick, in fixed order: advance the sim clock, apply circadian
//! assignments, apply sleep/exercise/fasting tonics, process schedule events
//! crossed since the last tick, absorb active meals, run N RK4 substeps with
//! the homeostatic clamp after each, then emit a snapshot when the output
//! interval has elapsed. The order never varies, which together with
//! declaration-order summation makes runs bit-reproducible.

use std::cell::Cell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use homeostasis::Homeostat;
use ndarray::Array1;
use pathway::{CompiledPathway, Pathway};
use schedule::{circadian, EventKind, ExerciseIntensity, Schedule};
use tracing::debug;

use crate::config::SimulationConfig;
use crate::derivative::{derivative, fluxes};
use crate::state::{Snapshot, Trajectory};
use crate::Result;

const MINUTES_PER_DAY: f64 = 1440.0;
const MEAL_ABSORPTION_MINUTES: f64 = 90.0;
/// Blood glucose raised per gram of absorbed carbohydrate (mM/g).
const GLUCOSE_MM_PER_G: f64 = 0.05;
/// Circulating fatty acids per gram of absorbed fat (mM/g).
const FAT_MM_PER_G: f64 = 0.02;
/// Free methionine bump per gram of absorbed protein (mM/g).
const MET_MM_PER_G: f64 = 0.005;
/// Minutes without food before the fasted-state tonics engage.
const FASTING_THRESHOLD_MIN: f64 = 180.0;

/// Injectable clock so live mode is testable with deterministic timing.
pub trait TimeSource {
    /// Monotonic seconds since an arbitrary origin.
    fn now_seconds(&self) -> f64;
}

/// Real wall clock for live mode.
pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for WallClock {
    fn now_seconds(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Scripted clock for tests.
pub struct FixedClock {
    now: Cell<f64>,
}

impl FixedClock {
    pub fn new() -> Self {
        Self { now: Cell::new(0.0) }
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Default for FixedClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for FixedClock {
    fn now_seconds(&self) -> f64 {
        self.now.get()
    }
}

#[derive(Debug, Clone)]
struct ActiveMeal {
    start_abs_min: f64,
    remaining_glucose_g: f64,
    remaining_protein_g: f64,
    remaining_fat_g: f64,
}

#[derive(Debug, Clone, Copy)]
struct ExerciseWindow {
    end_abs_min: f64,
    intensity: ExerciseIntensity,
}

#[derive(Debug, Clone, Copy)]
struct StressorWindow {
    end_abs_min: f64,
    intensity: f64,
}

/// Indices for species only the overlay writes (the clamp handles the rest).
#[derive(Debug, Clone, Default)]
struct OverlayIndices {
    melatonin: Option<usize>,
    adenosine: Option<usize>,
    amp: Option<usize>,
    ampk: Option<usize>,
    mtor: Option<usize>,
    gsh: Option<usize>,
}

impl OverlayIndices {
    fn resolve(compiled: &CompiledPathway) -> Self {
        Self {
            melatonin: compiled.metabolite_index("melatonin"),
            adenosine: compiled.metabolite_index("adenosine"),
            amp: compiled.metabolite_index("amp"),
            ampk: compiled.metabolite_index("ampk"),
            mtor: compiled.metabolite_index("mtor"),
            gsh: compiled.metabolite_index("gsh"),
        }
    }
}

/// One simulation instance. See the module docs for the tick sequence.
pub struct SimulationDriver {
    compiled: CompiledPathway,
    homeostat: Homeostat,
    schedule: Schedule,
    config: SimulationConfig,
    /// Per-enzyme activity from supplements; circadian modulation stacks on
    /// top of this each tick.
    base_activity: Vec<f64>,
    nampt_enzyme: Option<usize>,
    ix: OverlayIndices,

    y: Array1<f64>,
    time_s: f64,
    sim_minute_abs: f64,
    last_output_s: f64,
    minutes_since_meal: f64,
    active_meals: Vec<ActiveMeal>,
    active_exercise: Option<ExerciseWindow>,
    active_stressor: Option<StressorWindow>,

    cortisol_baseline: f64,
    melatonin_baseline: f64,
    adenosine_baseline: f64,

    running: Arc<AtomicBool>,
    last_wall_s: Option<f64>,
    trajectory: Trajectory,
}

impl SimulationDriver {
    pub fn new(pathway: &Pathway, schedule: Schedule, config: SimulationConfig) -> Result<Self> {
        let compiled = CompiledPathway::compile(pathway)?;
        let mut homeostat = Homeostat::new(&compiled);
        let ix = OverlayIndices::resolve(&compiled);
        let y = Array1::from_vec(compiled.initial_concentrations().to_vec());

        let read = |idx: Option<usize>, fallback: f64| idx.map_or(fallback, |i| y[i]);
        let cortisol_baseline = read(homeostat.idx.cortisol, 0.5);
        let melatonin_baseline = read(ix.melatonin, 0.05);
        let adenosine_baseline = read(ix.adenosine, 0.2);
        homeostat.insulin_baseline = read(homeostat.idx.insulin, 1.0);

        let nampt_enzyme = compiled.enzyme_index("nampt");
        let base_activity = vec![1.0; compiled.num_enzymes()];
        let start_minute = config.start_minute;

        let mut driver = Self {
            compiled,
            homeostat,
            schedule,
            config,
            base_activity,
            nampt_enzyme,
            ix,
            y,
            time_s: 0.0,
            sim_minute_abs: start_minute,
            last_output_s: 0.0,
            minutes_since_meal: 0.0,
            active_meals: Vec::new(),
            active_exercise: None,
            active_stressor: None,
            cortisol_baseline,
            melatonin_baseline,
            adenosine_baseline,
            running: Arc::new(AtomicBool::new(true)),
            last_wall_s: None,
            trajectory: Trajectory::new(),
        };
        driver.emit_snapshot();
        Ok(driver)
    }

    /// Fold supplement-derived enzyme multipliers into rate evaluation.
    pub fn apply_enzyme_multipliers(&mut self, multipliers: &HashMap<String, f64>) {
        for (id, multiplier) in multipliers {
            if let Some(i) = self.compiled.enzyme_index(id) {
                self.base_activity[i] *= multiplier;
            }
        }
    }

    pub fn homeostat_mut(&mut self) -> &mut Homeostat {
        &mut self.homeostat
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    /// Current minutes-of-day on the sim clock.
    pub fn sim_minute(&self) -> f64 {
        self.sim_minute_abs.rem_euclid(MINUTES_PER_DAY)
    }

    pub fn concentration(&self, id: &str) -> Option<f64> {
        self.compiled.metabolite_index(id).map(|i| self.y[i])
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn into_trajectory(self) -> Trajectory {
        self.trajectory
    }

    pub fn metabolite_ids(&self) -> &[String] {
        self.compiled.metabolite_ids()
    }

    /// Cooperative cancellation: clear the flag and the next tick boundary
    /// returns.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Batch run for the configured duration.
    pub fn run(&mut self) {
        self.run_for(self.config.duration);
    }

    /// Batch run: the sim-minute clock advances `minutes_per_sim_second`
    /// for every second of step time.
    pub fn run_for(&mut self, duration_s: f64) {
        let tick_s = self.config.tick_seconds();
        let end = self.time_s + duration_s;
        while self.time_s < end - 1e-9 {
            if !self.running.load(Ordering::Relaxed) {
                debug!(t = self.time_s, "run cancelled at tick boundary");
                break;
            }
            let next_minute =
                self.sim_minute_abs + tick_s * self.config.minutes_per_sim_second;
            self.tick_to(next_minute);
        }
        if self.time_s - self.last_output_s > 1e-9 {
            self.emit_snapshot();
            self.last_output_s = self.time_s;
        }
    }

    /// Live mode: map measured wall-clock delta to sim minutes through the
    /// configured scale (e.g. 24 sim minutes per real second runs a day in
    /// one real minute).
    pub fn tick_live(&mut self, clock: &dyn TimeSource, minutes_per_real_second: f64) {
        let now = clock.now_seconds();
        let delta = self
            .last_wall_s
            .map_or(0.0, |last| (now - last).max(0.0));
        self.last_wall_s = Some(now);
        self.tick_to(self.sim_minute_abs + delta * minutes_per_real_second);
    }

    /// Manual mode: jump the day clock to an externally chosen minute
    /// (always forward; earlier minutes land on the next day).
    pub fn set_sim_minute(&mut self, minute_of_day: f64) {
        let day_start = self.sim_minute_abs - self.sim_minute_abs.rem_euclid(MINUTES_PER_DAY);
        let mut target = day_start + minute_of_day.rem_euclid(MINUTES_PER_DAY);
        if target < self.sim_minute_abs {
            target += MINUTES_PER_DAY;
        }
        self.tick_to(target);
    }

    fn effective_activity(&self, hour: f64) -> Vec<f64> {
        let mut activity = self.base_activity.clone();
        if let Some(i) = self.nampt_enzyme {
            activity[i] *= circadian::nampt_multiplier(hour);
        }
        activity
    }

    fn tick_to(&mut self, new_abs_minute: f64) {
        let prev_abs = self.sim_minute_abs;
        let delta_min = (new_abs_minute - prev_abs).max(0.0);
        self.sim_minute_abs = new_abs_minute;
        self.minutes_since_meal += delta_min;

        let minute_of_day = self.sim_minute();
        let hour = minute_of_day / 60.0;
        let asleep = self.schedule.is_asleep(minute_of_day as u32);

        self.apply_circadian(hour, minute_of_day, asleep);
        self.apply_tonics(asleep);
        self.process_events(prev_abs);
        self.absorb_meals(delta_min);
        self.integrate_tick(hour);

        if self.time_s - self.last_output_s >= self.config.output_interval - 1e-9 {
            self.emit_snapshot();
            self.last_output_s = self.time_s;
        }
    }

    /// Circadian levels are assigned from baselines each tick, never
    /// accumulated.
    fn apply_circadian(&mut self, hour: f64, minute_of_day: f64, asleep: bool) {
        if let Some(ci) = self.homeostat.idx.cortisol {
            let stress = match self.active_stressor {
                Some(w) if self.sim_minute_abs < w.end_abs_min => 1.0 + w.intensity,
                _ => 1.0,
            };
            self.y[ci] = self.cortisol_baseline * circadian::cortisol_multiplier(hour) * stress;
        }
        if let Some(mi) = self.ix.melatonin {
            self.y[mi] = if asleep {
                0.5
            } else {
                self.melatonin_baseline * circadian::melatonin_multiplier(hour)
            };
        }
        if let Some(ai) = self.ix.adenosine {
            let hours_awake = self.schedule.hours_since_wake(minute_of_day as u32);
            self.y[ai] = self.adenosine_baseline * circadian::sleep_pressure(hours_awake);
        }
    }

    fn apply_tonics(&mut self, asleep: bool) {
        let bump_capped = |y: &mut Array1<f64>, idx: Option<usize>, amount: f64, cap: f64| {
            if let Some(i) = idx {
                if y[i] < cap {
                    y[i] = (y[i] + amount).min(cap);
                }
            }
        };

        if asleep {
            // Overnight salvage and repair.
            bump_capped(&mut self.y, self.homeostat.idx.atp, 0.01, 6.0);
            bump_capped(&mut self.y, self.ix.gsh, 0.005, 6.0);
            bump_capped(&mut self.y, self.homeostat.idx.nad, 0.002, 1.0);
        }

        if let Some(window) = self.active_exercise {
            if self.sim_minute_abs >= window.end_abs_min {
                self.active_exercise = None;
            } else {
                let atp_drain = match window.intensity {
                    ExerciseIntensity::Low | ExerciseIntensity::Medium => 0.08,
                    ExerciseIntensity::High => 0.15,
                };
                if let Some(i) = self.homeostat.idx.atp {
                    self.y[i] = (self.y[i] - atp_drain).max(0.0);
                }
                if let Some(i) = self.ix.amp {
                    self.y[i] += 0.02;
                }
                if let Some(i) = self.homeostat.idx.glucose_blood {
                    self.y[i] = (self.y[i] - 0.03).max(0.0);
                }
                if let Some(i) = self.ix.ampk {
                    self.y[i] += 0.01;
                }
            }
        }

        if let Some(window) = self.active_stressor {
            if self.sim_minute_abs >= window.end_abs_min {
                self.active_stressor = None;
            }
        }

        if self.minutes_since_meal > FASTING_THRESHOLD_MIN && !asleep {
            // Fasted state: lipolysis up, AMPK up, mTOR down.
            if let Some(i) = self.homeostat.idx.fatty_acids_blood {
                self.y[i] += 0.005;
            }
            if let Some(i) = self.ix.ampk {
                self.y[i] += 0.002;
            }
            if let Some(i) = self.ix.mtor {
                self.y[i] = (self.y[i] - 0.002).max(0.1);
            }
        }
    }

    fn process_events(&mut self, prev_abs: f64) {
        let cur_abs = self.sim_minute_abs;
        let day_start = prev_abs - prev_abs.rem_euclid(MINUTES_PER_DAY);

        let crossed: Vec<(f64, EventKind)> = self
            .schedule
            .events
            .iter()
            .filter_map(|event| {
                let mut occurrence = day_start + f64::from(event.minute);
                if occurrence <= prev_abs {
                    occurrence += MINUTES_PER_DAY;
                }
                (occurrence <= cur_abs).then(|| (occurrence, event.kind.clone()))
            })
            .collect();

        for (occurrence, kind) in crossed {
            match kind {
                EventKind::Meal(meal) => {
                    debug!(minute = occurrence, "meal starts absorbing");
                    self.active_meals.push(ActiveMeal {
                        start_abs_min: occurrence,
                        remaining_glucose_g: meal.glucose_load,
                        remaining_protein_g: meal.protein_load,
                        remaining_fat_g: meal.fat_load,
                    });
                    self.minutes_since_meal = (cur_abs - occurrence).max(0.0);
                    if let Some(i) = self.homeostat.idx.insulin {
                        // Cephalic insulin response on top of baseline.
                        self.y[i] += 8.0;
                    }
                }
                EventKind::Exercise(exercise) => {
                    self.active_exercise = Some(ExerciseWindow {
                        end_abs_min: occurrence + exercise.duration_minutes,
                        intensity: exercise.intensity,
                    });
                }
                EventKind::Stressor(stressor) => {
                    self.active_stressor = Some(StressorWindow {
                        end_abs_min: occurrence + stressor.duration_minutes,
                        intensity: stressor.intensity,
                    });
                }
                EventKind::Supplement => {
                    // Supplements act at initialization through the config.
                    debug!(minute = occurrence, "supplement event noted");
                }
            }
        }
    }

    /// Gradual meal absorption: each meal releases the fixed fraction
    /// `delta_min / duration` of its remaining load per tick.
    fn absorb_meals(&mut self, delta_min: f64) {
        if delta_min <= 0.0 {
            return;
        }
        let cur_abs = self.sim_minute_abs;
        let fraction = (delta_min / MEAL_ABSORPTION_MINUTES).min(1.0);

        for meal in &mut self.active_meals {
            let glucose_g = meal.remaining_glucose_g * fraction;
            let protein_g = meal.remaining_protein_g * fraction;
            let fat_g = meal.remaining_fat_g * fraction;
            meal.remaining_glucose_g -= glucose_g;
            meal.remaining_protein_g -= protein_g;
            meal.remaining_fat_g -= fat_g;

            if let Some(i) = self.homeostat.idx.glucose_blood {
                self.y[i] += glucose_g * GLUCOSE_MM_PER_G;
            }
            if let Some(i) = self.homeostat.idx.insulin {
                self.y[i] += glucose_g * 0.15;
            }
            if let Some(i) = self.homeostat.idx.fatty_acids_blood {
                self.y[i] += fat_g * FAT_MM_PER_G;
            }
            if let Some(i) = self.homeostat.idx.amino_pool {
                self.y[i] += protein_g;
            }
            if let Some(i) = self.homeostat.idx.met {
                self.y[i] += protein_g * MET_MM_PER_G;
            }
        }

        self.active_meals
            .retain(|meal| cur_abs < meal.start_abs_min + MEAL_ABSORPTION_MINUTES);
    }

    fn integrate_tick(&mut self, hour: f64) {
        let activity = self.effective_activity(hour);
        let compiled = &self.compiled;
        let f = |y: &Array1<f64>, _t: f64| derivative(compiled, &activity, y);

        let dt = self.config.time_step;
        for _ in 0..self.config.substeps_per_tick {
            self.y = integrator::step(&self.y, self.time_s, dt, &f);
            self.time_s += dt;
            self.homeostat.apply(&mut self.y, dt);
        }
    }

    fn emit_snapshot(&mut self) {
        let flux_values = self.config.record_fluxes.then(|| {
            let activity = self.effective_activity(self.sim_minute() / 60.0);
            fluxes(&self.compiled, &activity, &self.y)
        });
        self.trajectory.push(Snapshot::from_state(
            &self.compiled,
            self.time_s,
            &self.y,
            flux_values,
        ));
    }
}
