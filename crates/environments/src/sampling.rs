use crate::definition::{Environment, EnvironmentDefinition, EnvironmentKind};
use crate::error::{EnvironmentError, Result};
use envrec_catalog::FormatCatalog;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// What random environments are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomSource {
    /// Format tags observed across the identified test images.
    #[default]
    ObservedFormats,
    /// Applications of the format catalog, resolved like reference environments.
    CatalogApplications,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub random_count: usize,
    pub sample_size: usize,
    pub source: RandomSource,
    pub seed: Option<u64>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            random_count: 16,
            sample_size: 107,
            source: RandomSource::default(),
            seed: None,
        }
    }
}

/// Draws random environments numbered after the reference environments.
pub struct RandomEnvironmentSampler {
    rng: StdRng,
    count: usize,
    sample_size: usize,
    first_id: usize,
}

impl RandomEnvironmentSampler {
    /// `reference_count` reference environments precede the sampled ones.
    pub fn new(config: &SamplingConfig, reference_count: usize) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            rng,
            count: config.random_count,
            sample_size: config.sample_size,
            first_id: reference_count + 1,
        }
    }

    fn draw<'p>(&mut self, population: &'p [String]) -> Result<Vec<&'p String>> {
        if self.sample_size > population.len() {
            return Err(EnvironmentError::SampleTooLarge {
                requested: self.sample_size,
                available: population.len(),
            });
        }
        Ok(population
            .choose_multiple(&mut self.rng, self.sample_size)
            .collect())
    }

    /// `count` environments of `sample_size` distinct formats each.
    pub fn sample_formats(&mut self, population: &[String]) -> Result<Vec<Environment>> {
        log::info!(
            "Sampling {} random environments of {} formats from {} observed formats",
            self.count,
            self.sample_size,
            population.len()
        );
        (0..self.count)
            .map(|offset| {
                let id = self.first_id + offset;
                let formats = self.draw(population)?.into_iter().cloned().collect();
                Ok(Environment {
                    id,
                    name: EnvironmentKind::Random.name(id),
                    formats,
                })
            })
            .collect()
    }

    /// `count` definitions of `sample_size` distinct catalog applications each.
    pub fn sample_definitions(
        &mut self,
        catalog: &FormatCatalog,
    ) -> Result<Vec<EnvironmentDefinition>> {
        let population: Vec<String> = catalog.application_tags().map(str::to_string).collect();
        log::info!(
            "Sampling {} random environments of {} applications from {} catalog entries",
            self.count,
            self.sample_size,
            population.len()
        );
        (0..self.count)
            .map(|offset| {
                let name = EnvironmentKind::Random.name(self.first_id + offset);
                let apps = self.draw(&population)?.into_iter().cloned();
                Ok(EnvironmentDefinition::new(name, apps))
            })
            .collect()
    }

    pub fn first_id(&self) -> usize {
        self.first_id
    }
}
