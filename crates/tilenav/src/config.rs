use thiserror::Error;

/// Specifies a configuration to use when building a navmesh. Usually built using [`NavmeshConfigBuilder`].
///
/// Units are world units (wu). A tile spans `grid_size` world units, see [`TileMap::grid_size`](crate::TileMap::grid_size).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NavmeshConfig {
    /// The clearance kept between the walkable area and obstacles. `[Limit: 0 <= value < grid_size / 2] [Units: wu]`
    ///
    /// Walls and doors are grown into rectangles of this half-width along their perpendicular,
    /// fixtures are grown by this amount on all sides. The grown shapes are removed from the floor.
    ///
    /// This is usually set to the radius of the agent, so that a path through the navmesh
    /// can be followed by the agent's center without clipping into walls.
    ///
    /// A value of zero keeps the walkable area flush with the obstacles. Doors only get
    /// their own navigation nodes for positive values.
    pub obstacle_extents: f32,
}

impl Default for NavmeshConfig {
    fn default() -> Self {
        NavmeshConfigBuilder::default().build()
    }
}

impl NavmeshConfig {
    /// Checks the configuration against the tile size of the map it is used for.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroGridSize`] if `grid_size` is zero.
    /// - [`ConfigError::NegativeExtents`] if the extents are negative or not a number.
    /// - [`ConfigError::ExtentsTooLarge`] if the extents would close off a one tile wide corridor.
    pub fn validate(&self, grid_size: u32) -> Result<(), ConfigError> {
        if grid_size == 0 {
            return Err(ConfigError::ZeroGridSize);
        }
        let extents = self.obstacle_extents;
        if extents.is_nan() || extents < 0.0 {
            return Err(ConfigError::NegativeExtents { extents });
        }
        if extents >= grid_size as f32 * 0.5 {
            return Err(ConfigError::ExtentsTooLarge { extents, grid_size });
        }
        Ok(())
    }
}

/// Errors that can occur when validating a [`NavmeshConfig`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The tile map has a grid size of zero.
    #[error("Grid size must be positive")]
    ZeroGridSize,
    /// The obstacle extents are negative.
    #[error("Obstacle extents must not be negative, got {extents}")]
    NegativeExtents {
        /// The offending extents.
        extents: f32,
    },
    /// The obstacle extents are at least half a tile.
    #[error("Obstacle extents {extents} must be less than half the grid size {grid_size}")]
    ExtentsTooLarge {
        /// The offending extents.
        extents: f32,
        /// The grid size of the tile map.
        grid_size: u32,
    },
}

/// A builder for [`NavmeshConfig`]. Derives the obstacle clearance from the dimensions of the agent.
/// The default values are chosen to be reasonable for an agent of a quarter of a world unit radius.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct NavmeshConfigBuilder {
    /// The radius of the agent. `[Limit: >= 0] [Units: wu]`
    pub agent_radius: f32,
    /// Multiplier applied to the agent radius. `[Limit: >= 0]`
    ///
    /// Values above 1 leave some breathing room between agents and walls,
    /// which reads better for agents with animated, wider silhouettes.
    pub clearance_scale: f32,
}

impl Default for NavmeshConfigBuilder {
    fn default() -> Self {
        Self {
            agent_radius: 0.25,
            clearance_scale: 1.0,
        }
    }
}

impl NavmeshConfigBuilder {
    /// Builds a [`NavmeshConfig`] from the current configuration.
    pub fn build(self) -> NavmeshConfig {
        NavmeshConfig {
            obstacle_extents: self.agent_radius * self.clearance_scale,
        }
    }
}
