use outrider_game::config::AiConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct SimConfig {
    pub sim: SimSection,
    pub room: RoomSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default, rename = "spawn")]
    pub spawns: Vec<SpawnEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SimSection {
    /// Fixed step in milliseconds. Default: 50.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Ticks to run before exiting. 0 = until Ctrl+C.
    #[serde(default)]
    pub ticks: u64,
    #[serde(default)]
    pub seed: u64,
}

fn default_tick_ms() -> u64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct RoomSection {
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// One string per row, `#` for a wall and `.` for floor.
    pub layout: Vec<String>,
    /// Where the player stands, in world units.
    pub player: [f32; 2],
}

fn default_cell_size() -> f32 {
    50.0
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct SpawnEntry {
    pub archetype: String,
    pub x: f32,
    pub y: f32,
}

impl SimConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let toml_str = r######"
            [sim]
            seed = 7

            [room]
            layout = ["#####", "#...#", "#####"]
            player = [75.0, 75.0]

            [logging]
            level = "debug"
        "######;
        let config: SimConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sim.seed, 7);
        assert_eq!(config.sim.tick_ms, 50); // default
        assert_eq!(config.sim.ticks, 0);
        assert_eq!(config.room.cell_size, 50.0);
        assert_eq!(config.room.layout.len(), 3);
        assert_eq!(config.logging.level, "debug");
        // ai section defaults when absent
        assert_eq!(config.ai, AiConfig::default());
        assert!(config.spawns.is_empty());
    }

    #[test]
    fn parse_config_with_ai_and_spawns() {
        let toml_str = r##"
            [sim]
            tick_ms = 16
            ticks = 600

            [room]
            cell_size = 32.0
            layout = ["...", "..."]
            player = [10.0, 10.0]

            [logging]
            level = "info"

            [ai]
            aggro_distance = 250.0
            teleport_chance = 0.25

            [[spawn]]
            archetype = "necromancer"
            x = 40.0
            y = 20.0

            [[spawn]]
            archetype = "ranged"
            x = 80.0
            y = 20.0
        "##;
        let config: SimConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.sim.tick_ms, 16);
        assert_eq!(config.ai.aggro_distance, 250.0);
        assert_eq!(config.ai.teleport_chance, 0.25);
        // unspecified ai fields keep their defaults
        assert_eq!(config.ai.melee_distance, 75.0);
        assert_eq!(config.spawns.len(), 2);
        assert_eq!(config.spawns[0].archetype, "necromancer");
        assert_eq!(config.spawns[1].x, 80.0);
    }
}
