//! # Effect Manager
//!
//! Hands out pooled particle engines for one-shot effects and takes them
//! back once every layer has finished.
//!
//! ## Lifecycle
//!
//! ```text
//! create_*() ── pool hit? ──yes──> reset + place + start ──> live
//!                  │ no
//!                  └──> build layers (fresh RNG streams)
//!
//! update() ── every layer requested removal ──> back to its pool
//! ```
//!
//! Pools only grow up to each kind's live limit, so memory stays bounded
//! even under a steady stream of explosions.

use ember_particles::{ParticleRenderer, ParticleSystem, VarianceRng};
use ember_shared::Vec2;

use crate::error::{EffectError, EffectResult};
use crate::presets::EffectKind;

/// Handle to a live effect. Never reused within one manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EffectId(u64);

impl EffectId {
    /// Raw id value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// One effect instance: its emitter layers and which of them are done.
#[derive(Debug)]
struct Effect {
    kind: EffectKind,
    id: EffectId,
    layers: Vec<ParticleSystem>,
    done: Vec<bool>,
}

impl Effect {
    fn launch(&mut self, id: EffectId, position: Vec2) {
        self.id = id;
        for layer in &mut self.layers {
            layer.reset_system();
            layer.set_position(position);
            layer.start_system();
        }
        self.done.fill(false);
    }

    fn is_done(&self) -> bool {
        self.done.iter().all(|&d| d)
    }

    fn particle_count(&self) -> usize {
        self.layers.iter().map(ParticleSystem::particle_count).sum()
    }
}

/// Pooled effect layer.
///
/// # Thread Safety
///
/// Not thread-safe. Owned by the scene that renders the effects.
#[derive(Debug)]
pub struct EffectManager {
    /// Source of per-engine seeds
    seeder: VarianceRng,
    /// Finished effects, per kind
    pools: [Vec<Effect>; 2],
    /// Running effects
    live: Vec<Effect>,
    /// Next effect id
    next_id: u64,
}

impl EffectManager {
    /// Creates an empty manager. Every engine it builds is seeded from
    /// `seed`, so identical call sequences replay identically.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seeder: VarianceRng::seed_from_u64(seed),
            pools: [Vec::new(), Vec::new()],
            live: Vec::new(),
            next_id: 1,
        }
    }

    /// Starts a small explosion at `position`.
    ///
    /// # Errors
    ///
    /// [`EffectError::LiveLimitReached`], or a particle engine error while
    /// building a new instance.
    pub fn create_explosion(&mut self, position: Vec2) -> EffectResult<EffectId> {
        self.spawn(EffectKind::SmallExplosion, position)
    }

    /// Starts a big explosion at `position`.
    ///
    /// # Errors
    ///
    /// As [`EffectManager::create_explosion`].
    pub fn create_big_explosion(&mut self, position: Vec2) -> EffectResult<EffectId> {
        self.spawn(EffectKind::BigExplosion, position)
    }

    /// Starts an effect of `kind` at `position`, reusing a pooled instance
    /// when one is available.
    ///
    /// # Errors
    ///
    /// As [`EffectManager::create_explosion`].
    pub fn spawn(&mut self, kind: EffectKind, position: Vec2) -> EffectResult<EffectId> {
        let limit = kind.live_limit();
        if self.live_count(kind) >= limit {
            tracing::warn!(%kind, limit, "effect live limit reached");
            return Err(EffectError::LiveLimitReached { kind, limit });
        }

        let mut effect = match self.pools[kind.index()].pop() {
            Some(effect) => effect,
            None => self.build(kind)?,
        };

        let id = EffectId(self.next_id);
        self.next_id += 1;
        effect.launch(id, position);
        tracing::debug!(%kind, id = id.raw(), x = position.x, y = position.y, "effect started");

        self.live.push(effect);
        Ok(id)
    }

    fn build(&mut self, kind: EffectKind) -> EffectResult<Effect> {
        let layers = kind
            .layers()
            .into_iter()
            .map(|config| ParticleSystem::from_config(config, VarianceRng::seed_from_u64(self.seeder.next_seed())))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(%kind, layers = layers.len(), "effect instance built");

        Ok(Effect {
            kind,
            id: EffectId(0),
            done: vec![false; layers.len()],
            layers,
        })
    }

    /// Steps every live effect and recycles the finished ones.
    ///
    /// The renderer receives one frame per emitter layer.
    ///
    /// # Returns
    ///
    /// Number of effects returned to their pools.
    ///
    /// # Errors
    ///
    /// The first particle engine error (e.g. a bad `dt`).
    pub fn update<R: ParticleRenderer + ?Sized>(&mut self, dt: f32, renderer: &mut R) -> EffectResult<usize> {
        for effect in &mut self.live {
            for (layer, done) in effect.layers.iter_mut().zip(effect.done.iter_mut()) {
                let report = layer.update(dt, renderer)?;
                if report.remove_requested {
                    *done = true;
                }
            }
        }

        let mut recycled = 0;
        let mut i = 0;
        while i < self.live.len() {
            if self.live[i].is_done() {
                let effect = self.live.swap_remove(i);
                tracing::debug!(kind = %effect.kind, id = effect.id.raw(), "effect recycled");
                self.pools[effect.kind.index()].push(effect);
                recycled += 1;
            } else {
                i += 1;
            }
        }
        Ok(recycled)
    }

    /// Stops every live effect immediately and returns it to its pool.
    pub fn clear(&mut self) {
        for mut effect in self.live.drain(..) {
            for layer in &mut effect.layers {
                layer.stop_system();
                layer.reset_system();
            }
            self.pools[effect.kind.index()].push(effect);
        }
    }

    /// True while the effect is running.
    #[must_use]
    pub fn is_live(&self, id: EffectId) -> bool {
        self.live.iter().any(|e| e.id == id)
    }

    /// Number of running effects.
    #[must_use]
    pub fn live_effects(&self) -> usize {
        self.live.len()
    }

    /// Number of running effects of `kind`.
    #[must_use]
    pub fn live_count(&self, kind: EffectKind) -> usize {
        self.live.iter().filter(|e| e.kind == kind).count()
    }

    /// Number of idle pooled instances of `kind`.
    #[must_use]
    pub fn pool_len(&self, kind: EffectKind) -> usize {
        self.pools[kind.index()].len()
    }

    /// Live particles across every running effect.
    #[must_use]
    pub fn particle_count(&self) -> usize {
        self.live.iter().map(Effect::particle_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_particles::NullRenderer;

    const DT: f32 = 1.0 / 60.0;

    fn run_until_idle(manager: &mut EffectManager) -> usize {
        let mut frames = 0;
        while manager.live_effects() > 0 {
            manager.update(DT, &mut NullRenderer).unwrap();
            frames += 1;
            assert!(frames < 1_000, "effects never finished");
        }
        frames
    }

    #[test]
    fn test_explosion_finishes_and_is_pooled() {
        let mut manager = EffectManager::new(1);
        let id = manager.create_explosion(Vec2::new(10.0, 20.0)).unwrap();
        assert!(manager.is_live(id));
        assert_eq!(manager.pool_len(EffectKind::SmallExplosion), 0);

        manager.update(DT, &mut NullRenderer).unwrap();
        assert!(manager.particle_count() > 0);

        run_until_idle(&mut manager);
        assert!(!manager.is_live(id));
        assert_eq!(manager.pool_len(EffectKind::SmallExplosion), 1);
    }

    #[test]
    fn test_pooled_instance_is_reused() {
        let mut manager = EffectManager::new(2);
        manager.create_big_explosion(Vec2::ZERO).unwrap();
        run_until_idle(&mut manager);
        assert_eq!(manager.pool_len(EffectKind::BigExplosion), 1);

        let id = manager.create_big_explosion(Vec2::ZERO).unwrap();
        assert_eq!(manager.pool_len(EffectKind::BigExplosion), 0);
        assert_eq!(id.raw(), 2);
    }

    #[test]
    fn test_live_limit() {
        let mut manager = EffectManager::new(3);
        for _ in 0..EffectKind::BigExplosion.live_limit() {
            manager.create_big_explosion(Vec2::ZERO).unwrap();
        }
        assert_eq!(
            manager.create_big_explosion(Vec2::ZERO),
            Err(EffectError::LiveLimitReached {
                kind: EffectKind::BigExplosion,
                limit: 8,
            })
        );
        // Other kinds are unaffected
        assert!(manager.create_explosion(Vec2::ZERO).is_ok());
    }

    #[test]
    fn test_clear_returns_everything_to_pools() {
        let mut manager = EffectManager::new(4);
        manager.create_explosion(Vec2::ZERO).unwrap();
        manager.create_big_explosion(Vec2::ZERO).unwrap();
        manager.update(DT, &mut NullRenderer).unwrap();

        manager.clear();
        assert_eq!(manager.live_effects(), 0);
        assert_eq!(manager.particle_count(), 0);
        assert_eq!(manager.pool_len(EffectKind::SmallExplosion), 1);
        assert_eq!(manager.pool_len(EffectKind::BigExplosion), 1);
    }

    #[test]
    fn test_bad_time_step_is_reported() {
        let mut manager = EffectManager::new(5);
        manager.create_explosion(Vec2::ZERO).unwrap();
        assert!(matches!(
            manager.update(-1.0, &mut NullRenderer),
            Err(EffectError::Particle(_))
        ));
    }
}
