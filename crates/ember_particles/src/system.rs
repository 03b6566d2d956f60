//! # Particle System
//!
//! One emitter: fixed-capacity storage, emission control, lifecycle state
//! and the per-frame update.
//!
//! ## Frame
//!
//! ```text
//! update(dt)
//!   ├─ emit      counter += rate * dt, spawn while counter >= 1
//!   ├─ age       ttl -= dt, swap-retire the dead, integrate the rest
//!   ├─ publish   begin_frame, release tail indices, draw, end_frame
//!   └─ finish    DRAINING with no particles -> FINISHED
//! ```
//!
//! Particles spawned during a frame are aged in that same frame, and a
//! particle swapped into a vacated slot is re-examined before the index
//! advances, so no particle ever gets a free frame.
//!
//! ## States
//!
//! ```text
//! INACTIVE --start--> ACTIVE --stop / duration--> DRAINING --empty--> FINISHED
//! ```

use ember_shared::{Color4F, Transform2D, Vec2};

use crate::blend::{BlendFunc, BlendMode, TextureHandle};
use crate::config::{
    EmitterConfig, EmitterMode, GravityModeConfig, PositionType, RadiusModeConfig, DEFAULT_CAPACITY,
    MAX_CAPACITY,
};
use crate::error::{ParticleError, ParticleResult};
use crate::particle::{Motion, Particle};
use crate::renderer::{FrameInfo, ParticleRenderer, RenderedParticle};
use crate::rng::VarianceRng;
use crate::storage::ParticleBuffer;

/// Relative slack for time and credit comparisons. Frame steps such as
/// 1/60 s are not exact in binary, so a window of `n` steps can sum to a
/// hair under its nominal length.
const STEP_TOLERANCE: f64 = 1e-6;

/// True once `elapsed` has covered `duration`, within [`STEP_TOLERANCE`].
fn reached(elapsed: f64, duration: f32) -> bool {
    let duration = f64::from(duration);
    elapsed >= duration - duration * STEP_TOLERANCE
}

/// Emitter lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EmitterState {
    /// Not started, or reset while not emitting
    #[default]
    Inactive,
    /// Emitting and aging
    Active,
    /// Emission stopped, live particles still aging
    Draining,
    /// Emission stopped and every particle retired
    Finished,
}

/// Result of a single spawn attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// A particle was written to `index`
    Spawned {
        /// Slot of the new particle
        index: usize,
    },
    /// Storage is full; nothing was spawned
    Full,
}

/// Per-frame summary returned by [`ParticleSystem::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Particles spawned this frame
    pub spawned: usize,
    /// Particles retired this frame
    pub retired: usize,
    /// Live particles after the frame
    pub live_count: usize,
    /// One-shot: the emitter finished with auto-remove set and its owner
    /// should drop it
    pub remove_requested: bool,
}

/// A single particle emitter.
///
/// # Thread Safety
///
/// Not thread-safe. Step it from one thread; move it between frames if
/// needed.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    /// Template for new particles
    config: EmitterConfig,
    /// Dense live storage
    particles: ParticleBuffer,
    /// Variance source
    rng: VarianceRng,
    /// Emitter placement, pushed by the owner
    transform: Transform2D,
    /// Lifecycle state
    state: EmitterState,
    /// Seconds since start
    elapsed: f64,
    /// Fractional particles owed
    emit_counter: f64,
    /// Storage generation
    generation: u32,
    /// Blend state handed to the renderer
    blend_mode: BlendMode,
    /// Publish colours with RGB multiplied by alpha
    opacity_modify_rgb: bool,
    /// Blend mode set explicitly, not derived
    blend_pinned: bool,
    /// The finished notification has been handed out
    finish_signalled: bool,
}

impl ParticleSystem {
    /// Creates an inactive emitter with default template and the given
    /// capacity.
    ///
    /// # Errors
    ///
    /// [`ParticleError::CapacityTooLarge`] above [`MAX_CAPACITY`], or
    /// [`ParticleError::Allocation`] if storage cannot be reserved.
    pub fn new(capacity: usize, rng: VarianceRng) -> ParticleResult<Self> {
        let particles = Self::allocate(capacity)?;
        let config = EmitterConfig {
            capacity: Some(capacity as i64),
            ..EmitterConfig::default()
        };
        let (blend_mode, opacity_modify_rgb) = BlendMode::derive(config.blend_additive, config.texture);

        tracing::debug!(capacity, "particle system created");

        Ok(Self {
            config,
            particles,
            rng,
            transform: Transform2D::IDENTITY,
            state: EmitterState::Inactive,
            elapsed: 0.0,
            emit_counter: 0.0,
            generation: 0,
            blend_mode,
            opacity_modify_rgb,
            blend_pinned: false,
            finish_signalled: false,
        })
    }

    /// Creates an inactive emitter seeded from `seed`.
    ///
    /// # Errors
    ///
    /// As [`ParticleSystem::new`].
    pub fn with_seed(capacity: usize, seed: u64) -> ParticleResult<Self> {
        Self::new(capacity, VarianceRng::seed_from_u64(seed))
    }

    /// Creates an inactive emitter from a full template.
    ///
    /// A template without a capacity gets [`DEFAULT_CAPACITY`].
    ///
    /// # Errors
    ///
    /// Any template error, or an allocation failure.
    pub fn from_config(config: EmitterConfig, rng: VarianceRng) -> ParticleResult<Self> {
        config.validate()?;
        let capacity = match config.capacity {
            Some(capacity) => EmitterConfig::checked_capacity(capacity)?,
            None => DEFAULT_CAPACITY,
        };
        let mut system = Self::new(capacity, rng)?;
        system.apply_config(config)?;
        Ok(system)
    }

    fn allocate(capacity: usize) -> ParticleResult<ParticleBuffer> {
        if capacity > MAX_CAPACITY {
            tracing::warn!(capacity, max = MAX_CAPACITY, "rejected particle capacity");
            return Err(ParticleError::CapacityTooLarge {
                requested: capacity as u64,
                max: MAX_CAPACITY,
            });
        }
        ParticleBuffer::with_capacity(capacity).map_err(|e| {
            tracing::error!(capacity, error = %e, "particle storage allocation failed");
            e
        })
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Replaces the whole template atomically.
    ///
    /// Storage is reallocated (and every particle discarded) only if the
    /// template names a capacity different from the current one.
    ///
    /// # Errors
    ///
    /// Any template or allocation error; the emitter is then unchanged.
    pub fn apply_config(&mut self, mut config: EmitterConfig) -> ParticleResult<()> {
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "rejected emitter config");
            return Err(e);
        }

        let resized = match config.capacity {
            Some(capacity) => {
                let capacity = EmitterConfig::checked_capacity(capacity)?;
                if capacity == self.capacity() {
                    None
                } else {
                    Some(Self::allocate(capacity)?)
                }
            }
            None => None,
        };

        config.capacity = Some(self.capacity() as i64);
        self.config = config;
        self.blend_pinned = false;
        self.refresh_blend();

        if let Some(buffer) = resized {
            self.install(buffer);
        }
        Ok(())
    }

    /// Validates `change` against a scratch copy of the template and commits
    /// it only if the result is valid.
    fn update_config(&mut self, change: impl FnOnce(&mut EmitterConfig)) -> ParticleResult<()> {
        let mut config = self.config.clone();
        change(&mut config);
        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "rejected emitter parameter");
            return Err(e);
        }
        self.config = config;
        Ok(())
    }

    /// Sets particles per second.
    ///
    /// # Errors
    ///
    /// Negative or non-finite rates.
    pub fn set_emission_rate(&mut self, rate: f32) -> ParticleResult<()> {
        self.update_config(|c| c.emission_rate = rate)
    }

    /// Sets the emission window; `None` emits forever.
    ///
    /// # Errors
    ///
    /// Negative or non-finite durations.
    pub fn set_duration(&mut self, duration: Option<f32>) -> ParticleResult<()> {
        self.update_config(|c| c.duration = duration)
    }

    /// Sets particle life and its variance.
    ///
    /// # Errors
    ///
    /// `life <= 0`, or a variance that could draw a non-positive life.
    pub fn set_life(&mut self, life: f32, life_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.life = life;
            c.life_var = life_var;
        })
    }

    /// Sets the spawn angle (degrees) and its variance.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_angle(&mut self, angle: f32, angle_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.angle = angle;
            c.angle_var = angle_var;
        })
    }

    /// Sets the local spawn origin.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_source_position(&mut self, position: Vec2) -> ParticleResult<()> {
        self.update_config(|c| c.source_position = position)
    }

    /// Sets per-axis spawn jitter.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_pos_var(&mut self, pos_var: Vec2) -> ParticleResult<()> {
        self.update_config(|c| c.pos_var = pos_var)
    }

    /// Sets the start size and its variance.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_start_size(&mut self, size: f32, size_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.start_size = size;
            c.start_size_var = size_var;
        })
    }

    /// Sets the end size and its variance; `None` keeps the start size.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_end_size(&mut self, size: Option<f32>, size_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.end_size = size;
            c.end_size_var = size_var;
        })
    }

    /// Sets the start colour and its per-channel variance.
    ///
    /// # Errors
    ///
    /// Non-finite channels.
    pub fn set_start_color(&mut self, color: Color4F, color_var: Color4F) -> ParticleResult<()> {
        self.update_config(|c| {
            c.start_color = color;
            c.start_color_var = color_var;
        })
    }

    /// Sets the end colour and its per-channel variance.
    ///
    /// # Errors
    ///
    /// Non-finite channels.
    pub fn set_end_color(&mut self, color: Color4F, color_var: Color4F) -> ParticleResult<()> {
        self.update_config(|c| {
            c.end_color = color;
            c.end_color_var = color_var;
        })
    }

    /// Sets the start spin (degrees) and its variance.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_start_spin(&mut self, spin: f32, spin_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.start_spin = spin;
            c.start_spin_var = spin_var;
        })
    }

    /// Sets the end spin (degrees) and its variance.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_end_spin(&mut self, spin: f32, spin_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.end_spin = spin;
            c.end_spin_var = spin_var;
        })
    }

    /// Switches the motion model for particles spawned from now on.
    /// Live particles keep the model they were spawned under.
    pub fn set_emitter_mode(&mut self, mode: EmitterMode) {
        self.config.mode = mode;
    }

    /// Replaces all gravity-mode parameters.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_gravity_mode(&mut self, gravity: GravityModeConfig) -> ParticleResult<()> {
        self.update_config(|c| c.gravity = gravity)
    }

    /// Sets the gravity vector.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_gravity(&mut self, gravity: Vec2) -> ParticleResult<()> {
        self.update_config(|c| c.gravity.gravity = gravity)
    }

    /// Sets gravity-mode initial speed and its variance.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_speed(&mut self, speed: f32, speed_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.gravity.speed = speed;
            c.gravity.speed_var = speed_var;
        })
    }

    /// Sets gravity-mode radial acceleration and its variance.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_radial_accel(&mut self, accel: f32, accel_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.gravity.radial_accel = accel;
            c.gravity.radial_accel_var = accel_var;
        })
    }

    /// Sets gravity-mode tangential acceleration and its variance.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_tangential_accel(&mut self, accel: f32, accel_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.gravity.tangential_accel = accel;
            c.gravity.tangential_accel_var = accel_var;
        })
    }

    /// Makes new gravity-mode particles face their direction of travel.
    pub fn set_rotation_is_dir(&mut self, enabled: bool) {
        self.config.gravity.rotation_is_dir = enabled;
    }

    /// Replaces all radius-mode parameters.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_radius_mode(&mut self, radius: RadiusModeConfig) -> ParticleResult<()> {
        self.update_config(|c| c.radius = radius)
    }

    /// Sets radius-mode start radius and its variance.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_start_radius(&mut self, radius: f32, radius_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.radius.start_radius = radius;
            c.radius.start_radius_var = radius_var;
        })
    }

    /// Sets radius-mode end radius and its variance; `None` keeps the start
    /// radius.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_end_radius(&mut self, radius: Option<f32>, radius_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.radius.end_radius = radius;
            c.radius.end_radius_var = radius_var;
        })
    }

    /// Sets radius-mode angular velocity (degrees per second, signed) and
    /// its variance.
    ///
    /// # Errors
    ///
    /// Non-finite values.
    pub fn set_rotate_per_second(&mut self, degrees: f32, degrees_var: f32) -> ParticleResult<()> {
        self.update_config(|c| {
            c.radius.rotate_per_second = degrees;
            c.radius.rotate_per_second_var = degrees_var;
        })
    }

    /// Sets how live particles follow the emitter transform.
    pub fn set_position_type(&mut self, position_type: PositionType) {
        self.config.position_type = position_type;
    }

    /// Toggles additive blending and re-derives the blend state.
    pub fn set_blend_additive(&mut self, additive: bool) {
        self.config.blend_additive = additive;
        self.blend_pinned = false;
        self.refresh_blend();
    }

    /// Pins the blend mode until the next additive toggle or config apply.
    pub fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend_mode = mode;
        self.opacity_modify_rgb = mode == BlendMode::Premultiplied;
        self.blend_pinned = true;
    }

    /// Sets the texture forwarded to the renderer.
    pub fn set_texture(&mut self, texture: Option<TextureHandle>) {
        self.config.texture = texture;
        self.refresh_blend();
    }

    /// Overrides whether published colours are pre-multiplied.
    pub fn set_opacity_modify_rgb(&mut self, enabled: bool) {
        self.opacity_modify_rgb = enabled;
    }

    /// Requests removal from the owner once the emitter finishes.
    pub fn set_auto_remove_on_finish(&mut self, enabled: bool) {
        self.config.auto_remove_on_finish = enabled;
    }

    /// Pushes the emitter's world placement for this frame.
    pub fn set_transform(&mut self, transform: Transform2D) {
        self.transform = transform;
    }

    /// Moves the emitter, keeping rotation and scale.
    pub fn set_position(&mut self, position: Vec2) {
        self.transform.position = position;
    }

    fn refresh_blend(&mut self) {
        if self.blend_pinned {
            return;
        }
        let (mode, opacity_modify_rgb) = BlendMode::derive(self.config.blend_additive, self.config.texture);
        self.blend_mode = mode;
        self.opacity_modify_rgb = opacity_modify_rgb;
    }

    // =========================================================================
    // Capacity
    // =========================================================================

    /// Reallocates storage for `capacity` particles.
    ///
    /// Every live particle is discarded and the storage generation bumped,
    /// which invalidates renderer-side index tables.
    ///
    /// # Errors
    ///
    /// [`ParticleError::CapacityTooLarge`] or [`ParticleError::Allocation`];
    /// the emitter then keeps its previous storage and particles.
    pub fn set_capacity(&mut self, capacity: usize) -> ParticleResult<()> {
        let buffer = Self::allocate(capacity)?;
        self.install(buffer);
        Ok(())
    }

    fn install(&mut self, buffer: ParticleBuffer) {
        let previous = self.particles.capacity();
        self.particles = buffer;
        self.generation = self.generation.wrapping_add(1);
        self.config.capacity = Some(self.particles.capacity() as i64);
        tracing::info!(
            previous,
            capacity = self.particles.capacity(),
            generation = self.generation,
            "particle storage reallocated"
        );
        self.reset_system();
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Starts emitting from time zero.
    pub fn start_system(&mut self) {
        self.state = EmitterState::Active;
        self.elapsed = 0.0;
        self.emit_counter = 0.0;
        self.finish_signalled = false;
        tracing::debug!(live = self.particles.len(), "emitter started");
    }

    /// Stops emission; live particles keep aging.
    pub fn stop_system(&mut self) {
        if self.state == EmitterState::Active {
            self.state = EmitterState::Draining;
            self.emit_counter = 0.0;
            tracing::debug!(live = self.particles.len(), "emitter stopped");
        }
    }

    /// Kills every particle and rewinds time.
    ///
    /// An active emitter stays active; any other state becomes inactive.
    pub fn reset_system(&mut self) {
        self.particles.clear();
        self.elapsed = 0.0;
        self.emit_counter = 0.0;
        self.finish_signalled = false;
        if self.state != EmitterState::Active {
            self.state = EmitterState::Inactive;
        }
        tracing::debug!(state = ?self.state, "emitter reset");
    }

    // =========================================================================
    // Spawning
    // =========================================================================

    /// Spawns one particle from the template, whatever the lifecycle state.
    ///
    /// # Errors
    ///
    /// [`ParticleError::InvalidTemplate`] if the drawn life is not positive.
    pub fn add_particle(&mut self) -> ParticleResult<SpawnOutcome> {
        if self.particles.is_full() {
            return Ok(SpawnOutcome::Full);
        }
        let particle = self.init_particle()?;
        Ok(match self.particles.push(particle) {
            Some(index) => SpawnOutcome::Spawned { index },
            None => SpawnOutcome::Full,
        })
    }

    /// Draws one particle from the template.
    ///
    /// Draw order is fixed: life, position, colours, size, spin, angle, then
    /// the mode-specific values. Changing it changes every seeded run.
    fn init_particle(&mut self) -> ParticleResult<Particle> {
        let c = &self.config;
        let rng = &mut self.rng;

        let life = rng.vary(c.life, c.life_var);
        if !life.is_finite() || life <= 0.0 {
            return Err(ParticleError::invalid("life", life, "drawn life must be positive"));
        }
        let inv_life = 1.0 / life;

        let mut pos = rng.vary_vec2(c.source_position, c.pos_var);

        let start_color = rng.vary_color(c.start_color, c.start_color_var).clamped();
        let end_color = rng.vary_color(c.end_color, c.end_color_var).clamped();

        let start_size = rng.vary(c.start_size, c.start_size_var).max(0.0);
        let end_size = match c.end_size {
            Some(end) => rng.vary(end, c.end_size_var).max(0.0),
            None => start_size,
        };

        let start_spin = rng.vary(c.start_spin, c.start_spin_var);
        let end_spin = rng.vary(c.end_spin, c.end_spin_var);
        let mut rotation = start_spin;

        let angle = rng.vary(c.angle, c.angle_var).to_radians();

        let motion = match c.mode {
            EmitterMode::Gravity => {
                let g = &c.gravity;
                let dir = Vec2::from_angle(angle) * rng.vary(g.speed, g.speed_var);
                let radial_accel = rng.vary(g.radial_accel, g.radial_accel_var);
                let tangential_accel = rng.vary(g.tangential_accel, g.tangential_accel_var);
                if g.rotation_is_dir {
                    rotation = -dir.angle().to_degrees();
                }
                Motion::Gravity {
                    dir,
                    radial_accel,
                    tangential_accel,
                }
            }
            EmitterMode::Radius => {
                let r = &c.radius;
                let start_radius = rng.vary(r.start_radius, r.start_radius_var);
                let end_radius = match r.end_radius {
                    Some(end) => rng.vary(end, r.end_radius_var),
                    None => start_radius,
                };
                let degrees_per_second = rng.vary(r.rotate_per_second, r.rotate_per_second_var);
                pos = c.source_position + Vec2::from_angle(angle) * start_radius;
                Motion::Radius {
                    angle,
                    degrees_per_second,
                    radius: start_radius,
                    start_radius,
                    delta_radius: (end_radius - start_radius) * inv_life,
                }
            }
        };

        Ok(Particle {
            pos,
            start_pos: self.transform.position,
            color: start_color,
            delta_color: (end_color - start_color) * inv_life,
            size: start_size,
            delta_size: (end_size - start_size) * inv_life,
            rotation,
            delta_rotation: (end_spin - start_spin) * inv_life,
            time_to_live: life,
            life,
            renderer_index: self.particles.len() as u32,
            motion,
        })
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Runs one frame: emit, age, publish, and advance the lifecycle.
    ///
    /// # Errors
    ///
    /// [`ParticleError::InvalidTimeStep`] for a negative or non-finite `dt`
    /// (nothing is touched), or a template error from spawning.
    pub fn update<R: ParticleRenderer + ?Sized>(&mut self, dt: f32, renderer: &mut R) -> ParticleResult<FrameReport> {
        if !dt.is_finite() || dt < 0.0 {
            tracing::warn!(dt, "rejected time step");
            return Err(ParticleError::InvalidTimeStep(dt));
        }

        let spawned = self.emit(dt)?;
        let live_before = self.particles.len();
        let retired = self.age(dt);
        self.publish(live_before, renderer);
        let remove_requested = self.advance_lifecycle();

        let report = FrameReport {
            spawned,
            retired,
            live_count: self.particles.len(),
            remove_requested,
        };
        tracing::trace!(
            spawned = report.spawned,
            retired = report.retired,
            live = report.live_count,
            "particle frame"
        );
        Ok(report)
    }

    /// Republishes every live particle without emitting or aging.
    pub fn update_with_no_time<R: ParticleRenderer + ?Sized>(&self, renderer: &mut R) {
        self.publish(self.particles.len(), renderer);
    }

    fn emit(&mut self, dt: f32) -> ParticleResult<usize> {
        if self.state != EmitterState::Active {
            return Ok(0);
        }

        // Credit does not build up while there is no room to spend it.
        if !self.particles.is_full() {
            self.emit_counter += f64::from(self.config.emission_rate) * f64::from(dt);
        }

        let mut spawned = 0;
        while self.emit_counter >= 1.0 - STEP_TOLERANCE && !self.particles.is_full() && self.within_duration() {
            if let SpawnOutcome::Spawned { .. } = self.add_particle()? {
                spawned += 1;
            }
            self.emit_counter -= 1.0;
        }

        self.elapsed += f64::from(dt);
        if let Some(duration) = self.config.duration {
            if reached(self.elapsed, duration) {
                self.state = EmitterState::Draining;
                self.emit_counter = 0.0;
                tracing::debug!(elapsed = self.elapsed, live = self.particles.len(), "emission window closed");
            }
        }
        Ok(spawned)
    }

    fn within_duration(&self) -> bool {
        match self.config.duration {
            Some(duration) => !reached(self.elapsed, duration),
            None => true,
        }
    }

    /// Ages every live particle, retiring the dead by swap-to-end.
    fn age(&mut self, dt: f32) -> usize {
        let gravity = self.config.gravity.gravity;
        let reference = self.config.source_position;
        let mut retired = 0;

        let mut i = 0;
        while i < self.particles.len() {
            let Some(p) = self.particles.get_mut(i) else {
                break;
            };
            p.time_to_live -= dt;
            if p.time_to_live <= 0.0 {
                if self.particles.swap_retire(i).is_some() {
                    retired += 1;
                }
                // Slot i now holds the former last particle; age it too.
                continue;
            }
            p.integrate(dt, gravity, reference);
            i += 1;
        }
        retired
    }

    /// Hands the live prefix to the renderer.
    ///
    /// Renderer indices are slot indices, so the ones freed this frame are
    /// exactly `[live, live_before)`.
    fn publish<R: ParticleRenderer + ?Sized>(&self, live_before: usize, renderer: &mut R) {
        let live = self.particles.len();
        renderer.begin_frame(&self.frame_info());
        for index in live..live_before {
            renderer.release_index(index as u32);
        }
        for p in self.particles.as_slice() {
            renderer.draw_particle(&self.resolve(p));
        }
        renderer.end_frame();
    }

    fn resolve(&self, p: &Particle) -> RenderedParticle {
        let position = match self.config.position_type {
            PositionType::Free => p.start_pos + p.pos,
            PositionType::Relative => self.transform.position + p.pos,
            PositionType::Grouped => self.transform.transform_point(p.pos),
        };
        let color = if self.opacity_modify_rgb {
            p.color.premultiplied()
        } else {
            p.color
        };
        RenderedParticle {
            position,
            color,
            size: p.size,
            rotation: p.rotation,
            renderer_index: p.renderer_index,
        }
    }

    /// Moves a drained emitter to FINISHED and hands out the one-shot
    /// removal request.
    fn advance_lifecycle(&mut self) -> bool {
        if self.state == EmitterState::Draining && self.particles.is_empty() {
            self.state = EmitterState::Finished;
            tracing::debug!(elapsed = self.elapsed, "emitter finished");
        }
        if self.state == EmitterState::Finished && self.config.auto_remove_on_finish && !self.finish_signalled {
            self.finish_signalled = true;
            return true;
        }
        false
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The current template.
    #[must_use]
    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Live particles, `[0, particle_count)`.
    #[must_use]
    pub fn particles(&self) -> &[Particle] {
        self.particles.as_slice()
    }

    /// Live particle count.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// Storage capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.particles.capacity()
    }

    /// True when `particle_count() >= capacity()`.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.particles.is_full()
    }

    /// Seconds since the emitter was started or reset.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> EmitterState {
        self.state
    }

    /// True while emitting.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == EmitterState::Active
    }

    /// Emitter placement.
    #[must_use]
    pub fn transform(&self) -> Transform2D {
        self.transform
    }

    /// Storage generation, bumped on every reallocation.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Current blend mode.
    #[must_use]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    /// Current blend factors.
    #[must_use]
    pub fn blend_func(&self) -> BlendFunc {
        self.blend_mode.blend_func()
    }

    /// Whether published colours are pre-multiplied.
    #[must_use]
    pub fn opacity_modify_rgb(&self) -> bool {
        self.opacity_modify_rgb
    }

    /// Header the renderer receives for the current storage.
    #[must_use]
    pub fn frame_info(&self) -> FrameInfo {
        FrameInfo {
            particle_count: self.particles.len(),
            capacity: self.particles.capacity(),
            generation: self.generation,
            blend_func: self.blend_func(),
            opacity_modify_rgb: self.opacity_modify_rgb,
            texture: self.config.texture,
        }
    }
}
