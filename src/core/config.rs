#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::agents::AgentKind;
use crate::error::ConfigError;
use crate::generator::MIN_GENERATED_SIDE;
use crate::geometry::MazeSize;

/// Everything needed to set up one simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    pub width: u32,
    pub height: u32,

    /// Generator seed. The same seed always produces the same maze.
    pub seed: u64,

    /// Interior walls removed after carving; adds loops to an otherwise
    /// perfect maze.
    pub extra_openings: u32,

    pub agent: AgentKind,

    /// Flood-fill agents plan over explored cells only once the center has
    /// been found.
    pub speed_run: bool,

    /// Step ceiling for one controller run (turns and moves alike).
    pub max_steps: u64,
}

impl Default for SimConfig {
    /// A classic 16x16 maze solved by flood fill, capped at 10 000 steps.
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            seed: 1,
            extra_openings: 0,
            agent: AgentKind::Floodfill,
            speed_run: false,
            max_steps: Self::DEFAULT_MAX_STEPS,
        }
    }
}

impl SimConfig {
    pub const DEFAULT_MAX_STEPS: u64 = 10_000;

    /// Upper bound for the step ceiling.
    pub const MAX_STEPS_LIMIT: u64 = 10_000_000;

    /// Validate the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = MazeSize::new(self.width, self.height)?;
        if size.width() < MIN_GENERATED_SIDE || size.height() < MIN_GENERATED_SIDE {
            return Err(ConfigError::Invalid("generated mazes need both sides >= 4"));
        }
        if self.max_steps == 0 {
            return Err(ConfigError::Invalid("max_steps must be > 0"));
        }
        if self.max_steps > Self::MAX_STEPS_LIMIT {
            return Err(ConfigError::Invalid("max_steps too large"));
        }
        let interior_edges = (self.width - 1) * self.height + (self.height - 1) * self.width;
        if self.extra_openings > interior_edges {
            return Err(ConfigError::Invalid(
                "extra_openings exceeds the number of interior walls",
            ));
        }
        Ok(())
    }

    pub fn size(&self) -> Result<MazeSize, ConfigError> {
        Ok(MazeSize::new(self.width, self.height)?)
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_extra_openings(mut self, openings: u32) -> Self {
        self.extra_openings = openings;
        self
    }

    pub fn with_agent(mut self, agent: AgentKind) -> Self {
        self.agent = agent;
        self
    }

    pub fn with_speed_run(mut self, enabled: bool) -> Self {
        self.speed_run = enabled;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Parse and validate a JSON config. Missing fields take their defaults.
    #[cfg(feature = "serde")]
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MazeError;

    #[test]
    fn default_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.size().unwrap(), MazeSize::CLASSIC);
        assert_eq!(config.max_steps, 10_000);
    }

    #[test]
    fn builders_compose() {
        let config = SimConfig::default()
            .with_size(8, 6)
            .with_seed(42)
            .with_extra_openings(3)
            .with_agent(AgentKind::Tremaux)
            .with_speed_run(true)
            .with_max_steps(500);
        assert!(config.validate().is_ok());
        assert_eq!((config.width, config.height), (8, 6));
        assert_eq!(config.agent, AgentKind::Tremaux);
        assert!(config.speed_run);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            SimConfig::default().with_size(1, 16).validate(),
            Err(ConfigError::Geometry(MazeError::IllegalDimensions { .. }))
        ));
        assert!(matches!(
            SimConfig::default().with_size(3, 3).validate(),
            Err(ConfigError::Invalid(_))
        ));
        assert!(SimConfig::default().with_max_steps(0).validate().is_err());
        assert!(SimConfig::default()
            .with_size(4, 4)
            .with_extra_openings(25)
            .validate()
            .is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config =
            SimConfig::from_json_str(r#"{"agent": "modified-floodfill", "seed": 9}"#).unwrap();
        assert_eq!(config.agent, AgentKind::ModifiedFloodfill);
        assert_eq!(config.seed, 9);
        assert_eq!(config.width, 16);

        let round = SimConfig::from_json_str(&config.to_json_string().unwrap()).unwrap();
        assert_eq!(round, config);

        assert!(matches!(
            SimConfig::from_json_str(r#"{"agent": "astar"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SimConfig::from_json_str(r#"{"width": 70}"#),
            Err(ConfigError::Geometry(_))
        ));
    }
}
