#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural wave synthesis for unbounded wave numbers.
//!
//! Once the authored roster runs out, waves come from here. The generator is
//! a pure function of the wave number: nothing is accumulated between calls,
//! so no generator state ever needs to be persisted. All pseudo-randomness
//! (cadence jitter, enemy-mix tie-breaks) flows from a per-wave stream seeded
//! via SHA-256 from the generator seed and the wave number, which keeps
//! repeated calls bit-identical.

use std::num::NonZeroU32;
use std::time::Duration;

use rampart_core::{
    DifficultyMultipliers, EnemyKind, EnemySpawnConfig, SpawnPattern, WaveConfig, WaveFlavor,
    WaveNumber,
};
use sha2::{Digest, Sha256};

/// Ordered spawn-pattern rotation; advances one slot every three waves and
/// clamps at the final entry.
const PATTERN_ROTATION: [SpawnPattern; 10] = [
    SpawnPattern::SinglePoint,
    SpawnPattern::RoundRobin,
    SpawnPattern::Distributed,
    SpawnPattern::Random,
    SpawnPattern::EdgeFocused,
    SpawnPattern::PincerMovement,
    SpawnPattern::BurstSpawn,
    SpawnPattern::CornerFocused,
    SpawnPattern::AdaptiveSpawn,
    SpawnPattern::ChaosMode,
];

/// Number of waves each rotation slot covers.
const PATTERN_ROTATION_STRIDE: u32 = 3;

/// Aggregated tuning knobs controlling every adjustable aspect of the
/// procedural difficulty curves.
#[derive(Clone, Debug)]
pub struct GeneratorTuning {
    /// Coefficient of the logarithmic health curve; raising it makes every
    /// wave past the first sturdier.
    pub health_rate: f32,
    /// Coefficient of the logarithmic damage curve; kept below
    /// `health_rate` so damage creeps slower than durability.
    pub damage_rate: f32,
    /// Wave at which multiplier growth is halved.
    pub first_plateau_wave: u32,
    /// Wave at which multiplier growth is quartered.
    pub second_plateau_wave: u32,
    /// Growth retained past the first plateau.
    pub first_plateau_factor: f32,
    /// Growth retained past the second plateau.
    pub second_plateau_factor: f32,
    /// Enemy count floor applied at wave one.
    pub base_count: u32,
    /// Coefficient of the logarithmic enemy-count curve.
    pub count_scaling: f32,
    /// Hard ceiling on the pre-flavor enemy count.
    pub max_count: u32,
    /// Count multiplier applied on swarm waves; above one.
    pub swarm_factor: f32,
    /// Count multiplier applied on elite waves; below one.
    pub elite_factor: f32,
    /// Stat-excess multiplier applied on swarm waves; below one.
    pub swarm_strength_factor: f32,
    /// Stat-excess multiplier applied on elite waves; above one.
    pub elite_strength_factor: f32,
    /// Stat-excess multiplier applied on boss waves; above one.
    pub boss_strength_factor: f32,
    /// Every multiple of this interval is a boss wave.
    pub boss_interval: u32,
    /// Earliest wave eligible for the speed-wave behaviour.
    pub speed_wave_floor: u32,
    /// Linear reward coefficient per wave number.
    pub reward_base: u32,
    /// Coefficient of the logarithmic reward bonus.
    pub reward_bonus_rate: f32,
    /// Delay between wave start and the first spawn, in milliseconds.
    pub start_delay_ms: u32,
}

impl Default for GeneratorTuning {
    fn default() -> Self {
        Self {
            health_rate: 1.8,
            damage_rate: 0.9,
            first_plateau_wave: 50,
            second_plateau_wave: 100,
            first_plateau_factor: 0.5,
            second_plateau_factor: 0.25,
            base_count: 6,
            count_scaling: 12.0,
            max_count: 60,
            swarm_factor: 1.6,
            elite_factor: 0.55,
            swarm_strength_factor: 0.6,
            elite_strength_factor: 1.4,
            boss_strength_factor: 1.6,
            boss_interval: 10,
            speed_wave_floor: 10,
            reward_base: 10,
            reward_bonus_rate: 25.0,
            start_delay_ms: 2_000,
        }
    }
}

/// Wave synthesized by the generator, ready for the scheduler and the
/// entity factory.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedWave {
    /// Complete wave description for the scheduler.
    pub config: WaveConfig,
    /// Special-wave category; renders the UI-facing description.
    pub flavor: WaveFlavor,
    /// Stat multipliers for enemies constructed during this wave.
    pub multipliers: DifficultyMultipliers,
    /// Currency awarded for clearing the wave.
    pub reward: u32,
}

/// Pure `wave number -> wave` synthesizer with logarithmic difficulty curves.
#[derive(Clone, Debug)]
pub struct WaveGenerator {
    seed: u64,
    tuning: GeneratorTuning,
}

impl WaveGenerator {
    /// Creates a generator with default tuning and the provided seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, GeneratorTuning::default())
    }

    /// Creates a generator with an explicit tuning surface.
    #[must_use]
    pub fn with_tuning(seed: u64, tuning: GeneratorTuning) -> Self {
        Self { seed, tuning }
    }

    /// Tuning knobs the generator was constructed with.
    #[must_use]
    pub const fn tuning(&self) -> &GeneratorTuning {
        &self.tuning
    }

    /// Synthesizes the complete wave for the provided number.
    #[must_use]
    pub fn generate(&self, wave: WaveNumber) -> GeneratedWave {
        let flavor = self.flavor(wave);
        let mut rng = self.wave_rng(wave);

        let total = self.flavored_count(wave, flavor);
        let mix = self.mix_table(wave, flavor);
        let counts = allocate_counts(&mix, total, &mut rng);

        let enemies = counts
            .into_iter()
            .map(|(kind, count)| {
                let (min_ms, max_ms) = kind.cadence_range_ms();
                let delay_ms = sample_uniform_inclusive(&mut rng, min_ms, max_ms);
                EnemySpawnConfig::new(kind, count, Duration::from_millis(u64::from(delay_ms)))
            })
            .collect();

        GeneratedWave {
            config: WaveConfig {
                wave_number: wave,
                enemies,
                start_delay: Duration::from_millis(u64::from(self.tuning.start_delay_ms)),
                spawn_pattern: Some(self.spawn_pattern(wave)),
            },
            flavor,
            multipliers: self.flavored_multipliers(wave, flavor),
            reward: self.reward(wave),
        }
    }

    /// Health multiplier for the provided wave.
    ///
    /// Grows as `1 + rate * log10(n)`, with the growth of the excess over 1.0
    /// halved past the first plateau wave and quartered past the second. The
    /// dampener is piecewise-continuous, so the multiplier never decreases
    /// even though its growth rate drops at both knees.
    #[must_use]
    pub fn health_multiplier(&self, wave: WaveNumber) -> f32 {
        1.0 + self.dampened_excess(wave, self.tuning.health_rate)
    }

    /// Damage multiplier for the provided wave; same shape as health with a
    /// smaller rate.
    #[must_use]
    pub fn damage_multiplier(&self, wave: WaveNumber) -> f32 {
        1.0 + self.dampened_excess(wave, self.tuning.damage_rate)
    }

    /// Pre-flavor enemy count for the provided wave.
    #[must_use]
    pub fn enemy_count(&self, wave: WaveNumber) -> u32 {
        let n = wave.get() as f32;
        let scaled = self.tuning.count_scaling * (n + 1.0).log10();
        let count = self.tuning.base_count + scaled.round() as u32;
        count.min(self.tuning.max_count)
    }

    /// Special-wave category for the provided wave.
    #[must_use]
    pub fn flavor(&self, wave: WaveNumber) -> WaveFlavor {
        let n = wave.get();
        if self.tuning.boss_interval > 0 && n % self.tuning.boss_interval == 0 {
            return WaveFlavor::Boss;
        }
        match n % 10 {
            5 => WaveFlavor::Swarm,
            7 => WaveFlavor::Elite,
            3 if n > self.tuning.speed_wave_floor => WaveFlavor::Speed,
            _ => WaveFlavor::Standard,
        }
    }

    /// Currency reward for clearing the provided wave; doubled on milestone
    /// waves (multiples of ten).
    #[must_use]
    pub fn reward(&self, wave: WaveNumber) -> u32 {
        let n = wave.get();
        let bonus = self.tuning.reward_bonus_rate * ((n as f32) + 1.0).log10();
        let base = self.tuning.reward_base.saturating_mul(n);
        let reward = base.saturating_add(bonus.round() as u32);
        if n % 10 == 0 {
            reward.saturating_mul(2)
        } else {
            reward
        }
    }

    /// Spawn pattern for the provided wave, advancing through the fixed
    /// rotation every three waves and clamping at the final entry.
    #[must_use]
    pub fn spawn_pattern(&self, wave: WaveNumber) -> SpawnPattern {
        let slot = ((wave.get() - 1) / PATTERN_ROTATION_STRIDE) as usize;
        PATTERN_ROTATION[slot.min(PATTERN_ROTATION.len() - 1)]
    }

    fn dampened_excess(&self, wave: WaveNumber, rate: f32) -> f32 {
        let raw = |n: u32| rate * (n as f32).log10();
        let n = wave.get();
        let first = self.tuning.first_plateau_wave;
        let second = self.tuning.second_plateau_wave;

        if n <= first {
            raw(n)
        } else if n <= second {
            raw(first) + self.tuning.first_plateau_factor * (raw(n) - raw(first))
        } else {
            raw(first)
                + self.tuning.first_plateau_factor * (raw(second) - raw(first))
                + self.tuning.second_plateau_factor * (raw(n) - raw(second))
        }
    }

    fn flavored_count(&self, wave: WaveNumber, flavor: WaveFlavor) -> u32 {
        let count = self.enemy_count(wave);
        let factor = match flavor {
            WaveFlavor::Swarm => self.tuning.swarm_factor,
            WaveFlavor::Elite => self.tuning.elite_factor,
            _ => return count,
        };
        (((count as f32) * factor).round() as u32).max(1)
    }

    fn flavored_multipliers(&self, wave: WaveNumber, flavor: WaveFlavor) -> DifficultyMultipliers {
        let strength = match flavor {
            WaveFlavor::Boss => self.tuning.boss_strength_factor,
            WaveFlavor::Swarm => self.tuning.swarm_strength_factor,
            WaveFlavor::Elite => self.tuning.elite_strength_factor,
            WaveFlavor::Standard | WaveFlavor::Speed => 1.0,
        };
        DifficultyMultipliers {
            health: 1.0 + self.dampened_excess(wave, self.tuning.health_rate) * strength,
            damage: 1.0 + self.dampened_excess(wave, self.tuning.damage_rate) * strength,
        }
    }

    fn mix_table(&self, wave: WaveNumber, flavor: WaveFlavor) -> Vec<(EnemyKind, f32)> {
        match flavor {
            WaveFlavor::Boss => vec![
                (EnemyKind::Grunt, 0.2),
                (EnemyKind::Scout, 0.1),
                (EnemyKind::Brute, 0.5),
                (EnemyKind::Colossus, 0.2),
            ],
            WaveFlavor::Speed => vec![(EnemyKind::Scout, 1.0)],
            WaveFlavor::Swarm => vec![(EnemyKind::Grunt, 0.7), (EnemyKind::Scout, 0.3)],
            WaveFlavor::Standard | WaveFlavor::Elite => match wave.get() {
                n if n < 5 => vec![(EnemyKind::Grunt, 1.0)],
                n if n < 10 => vec![(EnemyKind::Grunt, 0.8), (EnemyKind::Scout, 0.2)],
                n if n < 20 => vec![
                    (EnemyKind::Grunt, 0.6),
                    (EnemyKind::Scout, 0.25),
                    (EnemyKind::Brute, 0.15),
                ],
                n if n < 30 => vec![
                    (EnemyKind::Grunt, 0.45),
                    (EnemyKind::Scout, 0.3),
                    (EnemyKind::Brute, 0.25),
                ],
                _ => vec![
                    (EnemyKind::Grunt, 0.35),
                    (EnemyKind::Scout, 0.3),
                    (EnemyKind::Brute, 0.3),
                    (EnemyKind::Colossus, 0.05),
                ],
            },
        }
    }

    fn wave_rng(&self, wave: WaveNumber) -> SplitMix64 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(wave.get().to_le_bytes());
        let digest = hasher.finalize();
        let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
        SplitMix64::new(u64::from_le_bytes(bytes))
    }
}

/// Distributes `total` across the mix fractions so integer counts sum exactly
/// to the total. Every kind except the last is rounded to nearest; the last
/// kind absorbs the rounding remainder. When absorption would drive the last
/// kind negative, the deficit is taken from the largest earlier allocation,
/// with ties broken by the wave's random stream.
fn allocate_counts(
    mix: &[(EnemyKind, f32)],
    total: u32,
    rng: &mut SplitMix64,
) -> Vec<(EnemyKind, NonZeroU32)> {
    if mix.is_empty() || total == 0 {
        return Vec::new();
    }

    let mut counts: Vec<i64> = Vec::with_capacity(mix.len());
    let mut allocated: i64 = 0;
    for (index, (_, fraction)) in mix.iter().enumerate() {
        if index + 1 == mix.len() {
            counts.push(i64::from(total) - allocated);
        } else {
            let count = (f64::from(*fraction) * f64::from(total)).round() as i64;
            counts.push(count);
            allocated += count;
        }
    }

    // Rounding can overdraw the budget; repay it from the largest allocation.
    while counts.last().is_some_and(|last| *last < 0) {
        let deficit_index = counts.len() - 1;
        let largest = counts[..deficit_index]
            .iter()
            .copied()
            .max()
            .unwrap_or_default();
        let candidates: Vec<usize> = counts[..deficit_index]
            .iter()
            .enumerate()
            .filter(|(_, count)| **count == largest)
            .map(|(index, _)| index)
            .collect();
        if candidates.is_empty() || largest == 0 {
            counts[deficit_index] = 0;
            break;
        }
        let chosen = candidates[(rng.next_u64() % candidates.len() as u64) as usize];
        counts[chosen] -= 1;
        counts[deficit_index] += 1;
    }

    mix.iter()
        .zip(counts)
        .filter_map(|((kind, _), count)| {
            let count = u32::try_from(count).ok()?;
            NonZeroU32::new(count).map(|count| (*kind, count))
        })
        .collect()
}

fn sample_uniform_inclusive(rng: &mut SplitMix64, min: u32, max: u32) -> u32 {
    if min >= max {
        return min;
    }
    let range = u64::from(max - min) + 1;
    min + (rng.next_u64() % range) as u32
}

#[derive(Debug)]
struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(n: u32) -> WaveNumber {
        WaveNumber::new(n).expect("non-zero wave number")
    }

    fn generator() -> WaveGenerator {
        WaveGenerator::new(0x5eed_cafe_f00d_0001)
    }

    fn heavy_fraction(generated: &GeneratedWave) -> f64 {
        let mut total = 0u64;
        let mut heavy = 0u64;
        for enemy in &generated.config.enemies {
            total += u64::from(enemy.count.get());
            if enemy.kind.is_heavy() {
                heavy += u64::from(enemy.count.get());
            }
        }
        assert!(total > 0, "generated wave must contain enemies");
        heavy as f64 / total as f64
    }

    #[test]
    fn generation_is_deterministic_for_equal_seeds() {
        let first = generator().generate(wave(42));
        let second = generator().generate(wave(42));
        assert_eq!(first, second);
    }

    #[test]
    fn first_wave_multipliers_are_neutral() {
        let generator = generator();
        assert!((generator.health_multiplier(wave(1)) - 1.0).abs() < f32::EPSILON);
        assert!((generator.damage_multiplier(wave(1)) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn health_multiplier_is_non_decreasing() {
        let generator = generator();
        let mut previous = generator.health_multiplier(wave(1));
        for n in 2..=130 {
            let current = generator.health_multiplier(wave(n));
            assert!(
                current >= previous,
                "multiplier regressed at wave {n}: {previous} -> {current}"
            );
            previous = current;
        }
    }

    #[test]
    fn multiplier_growth_drops_at_both_plateaus() {
        let generator = generator();
        let slope = |n: u32| {
            generator.health_multiplier(wave(n + 1)) - generator.health_multiplier(wave(n))
        };

        assert!(slope(50) < slope(49) * 0.6, "first plateau missing");
        assert!(slope(100) < slope(99) * 0.6, "second plateau missing");
    }

    #[test]
    fn damage_rate_stays_below_health_rate() {
        let generator = generator();
        for n in [2, 10, 40, 90, 120] {
            assert!(
                generator.damage_multiplier(wave(n)) < generator.health_multiplier(wave(n)),
                "damage outgrew health at wave {n}"
            );
        }
    }

    #[test]
    fn milestone_waves_lean_heavier_than_their_predecessors() {
        let generator = generator();
        for n in [10, 20, 30] {
            let milestone = heavy_fraction(&generator.generate(wave(n)));
            let predecessor = heavy_fraction(&generator.generate(wave(n - 1)));
            assert!(
                milestone > predecessor,
                "wave {n} heavy fraction {milestone} not above {predecessor}"
            );
        }
    }

    #[test]
    fn allocated_counts_sum_exactly_to_the_total() {
        let generator = generator();
        for n in [1, 4, 9, 13, 15, 17, 20, 33, 57, 101] {
            let generated = generator.generate(wave(n));
            let flavor = generator.flavor(wave(n));
            let expected = generator.flavored_count(wave(n), flavor);
            let total: u32 = generated
                .config
                .enemies
                .iter()
                .map(|enemy| enemy.count.get())
                .sum();
            assert_eq!(total, expected, "count mismatch at wave {n}");
        }
    }

    #[test]
    fn swarm_waves_field_more_but_weaker_enemies() {
        let generator = generator();
        let swarm = generator.generate(wave(15));
        let standard = generator.generate(wave(14));

        assert_eq!(swarm.flavor, WaveFlavor::Swarm);
        let swarm_total: u32 = swarm.config.enemies.iter().map(|e| e.count.get()).sum();
        let standard_total: u32 = standard.config.enemies.iter().map(|e| e.count.get()).sum();
        assert!(swarm_total > standard_total);
        assert!(swarm.multipliers.health < standard.multipliers.health);
    }

    #[test]
    fn elite_waves_field_fewer_but_stronger_enemies() {
        let generator = generator();
        let elite = generator.generate(wave(17));
        let standard = generator.generate(wave(16));

        assert_eq!(elite.flavor, WaveFlavor::Elite);
        let elite_total: u32 = elite.config.enemies.iter().map(|e| e.count.get()).sum();
        let standard_total: u32 = standard.config.enemies.iter().map(|e| e.count.get()).sum();
        assert!(elite_total < standard_total);
        assert!(elite.multipliers.health > standard.multipliers.health);
    }

    #[test]
    fn speed_waves_apply_only_past_the_floor() {
        let generator = generator();
        assert_eq!(generator.flavor(wave(3)), WaveFlavor::Standard);

        let speed = generator.generate(wave(13));
        assert_eq!(speed.flavor, WaveFlavor::Speed);
        for enemy in &speed.config.enemies {
            assert_eq!(enemy.kind, EnemyKind::Scout);
        }
    }

    #[test]
    fn milestone_rewards_are_doubled() {
        let generator = generator();
        let tuning = generator.tuning();
        let base = tuning.reward_base * 10;
        let bonus = (tuning.reward_bonus_rate * 11.0_f32.log10()).round() as u32;
        assert_eq!(generator.reward(wave(10)), (base + bonus) * 2);

        let base = tuning.reward_base * 11;
        let bonus = (tuning.reward_bonus_rate * 12.0_f32.log10()).round() as u32;
        assert_eq!(generator.reward(wave(11)), base + bonus);
    }

    #[test]
    fn spawn_pattern_rotation_advances_and_clamps() {
        let generator = generator();
        assert_eq!(generator.spawn_pattern(wave(1)), SpawnPattern::SinglePoint);
        assert_eq!(generator.spawn_pattern(wave(3)), SpawnPattern::SinglePoint);
        assert_eq!(generator.spawn_pattern(wave(4)), SpawnPattern::RoundRobin);
        assert_eq!(generator.spawn_pattern(wave(7)), SpawnPattern::Distributed);
        assert_eq!(generator.spawn_pattern(wave(1_000)), SpawnPattern::ChaosMode);
    }

    #[test]
    fn boss_waves_land_on_interval_multiples() {
        let generator = generator();
        assert_eq!(generator.flavor(wave(10)), WaveFlavor::Boss);
        assert_eq!(generator.flavor(wave(20)), WaveFlavor::Boss);
        assert_eq!(generator.flavor(wave(11)), WaveFlavor::Standard);
        assert_eq!(generator.generate(wave(10)).flavor, WaveFlavor::Boss);
    }

    #[test]
    fn allocation_remainder_lands_on_the_last_kind() {
        let mut rng = SplitMix64::new(7);
        let mix = [
            (EnemyKind::Grunt, 0.5),
            (EnemyKind::Scout, 0.3),
            (EnemyKind::Brute, 0.2),
        ];
        let counts = allocate_counts(&mix, 7, &mut rng);
        let total: u32 = counts.iter().map(|(_, count)| count.get()).sum();
        assert_eq!(total, 7);
    }
}
