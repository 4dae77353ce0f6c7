//! Session configuration.
//!
//! [`SessionSettings`] is the serializable form loaded from JSON.
//! [`CombinatorialTestConfig`] is what the manager runs on: generator and
//! algorithm objects plus the reporter, built from settings or assembled by
//! hand.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use coverweave_explore::conflict::ConflictDetectionConfig;
use coverweave_explore::{Ipog, IpogNeg, TestInputGroupGenerator};
use coverweave_model::ReportLevel;

use crate::characterization::{CharacterizationKind, FaultCharacterizationAlgorithmFactory};
use crate::error::ManagerError;
use crate::report::GenerationReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    Ipog,
    IpogNeg,
}

impl GeneratorKind {
    pub fn generator(self) -> Arc<dyn TestInputGroupGenerator> {
        match self {
            GeneratorKind::Ipog => Arc::new(Ipog),
            GeneratorKind::IpogNeg => Arc::new(IpogNeg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub generators: Vec<GeneratorKind>,
    pub fault_characterization: Option<CharacterizationKind>,
    pub conflict_detection: ConflictDetectionConfig,
    /// Threshold for execution reporters.
    pub report_level: ReportLevel,
    /// Worker threads of the session runner.
    pub threads: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            generators: vec![GeneratorKind::Ipog, GeneratorKind::IpogNeg],
            fault_characterization: None,
            conflict_detection: ConflictDetectionConfig::default(),
            report_level: ReportLevel::Info,
            threads: 4,
        }
    }
}

impl SessionSettings {
    pub fn from_json(json: &str) -> Result<Self, ManagerError> {
        let settings: SessionSettings = serde_json::from_str(json)?;
        settings.conflict_detection.validate()?;
        Ok(settings)
    }

    pub fn to_config(&self) -> CombinatorialTestConfig {
        let mut config = CombinatorialTestConfig::new().conflict_detection(self.conflict_detection);
        for kind in &self.generators {
            config = config.generator_arc(kind.generator());
        }
        if let Some(kind) = self.fault_characterization {
            config = config.characterization(kind);
        }
        config
    }
}

#[derive(Clone, Default)]
pub struct CombinatorialTestConfig {
    pub generators: Vec<Arc<dyn TestInputGroupGenerator>>,
    pub characterization: Option<Arc<dyn FaultCharacterizationAlgorithmFactory>>,
    pub conflict_detection: ConflictDetectionConfig,
    pub reporter: Option<Arc<dyn GenerationReporter>>,
}

impl CombinatorialTestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generator(self, generator: impl TestInputGroupGenerator + 'static) -> Self {
        self.generator_arc(Arc::new(generator))
    }

    pub fn generator_arc(mut self, generator: Arc<dyn TestInputGroupGenerator>) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn characterization(
        mut self,
        factory: impl FaultCharacterizationAlgorithmFactory + 'static,
    ) -> Self {
        self.characterization = Some(Arc::new(factory));
        self
    }

    pub fn conflict_detection(mut self, config: ConflictDetectionConfig) -> Self {
        self.conflict_detection = config;
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn GenerationReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }
}

impl fmt::Debug for CombinatorialTestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let generators: Vec<&str> = self.generators.iter().map(|g| g.name()).collect();
        f.debug_struct("CombinatorialTestConfig")
            .field("generators", &generators)
            .field("characterization", &self.characterization.is_some())
            .field("conflict_detection", &self.conflict_detection)
            .field("reporter", &self.reporter.is_some())
            .finish()
    }
}
