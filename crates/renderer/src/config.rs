//! Configuration for animation rendering.

use serde::Serialize;

/// Frame geometry and timing for rendered animations.
#[derive(Debug, Clone, Serialize)]
pub struct RenderConfig {
    /// Frame width in pixels (10 in at 100 dpi).
    pub frame_width: u32,

    /// Frame height in pixels (8 in at 100 dpi).
    pub frame_height: u32,

    /// Delay between frames in milliseconds.
    pub frame_delay_ms: u32,

    /// GIF quantizer speed, 1 (best) to 30 (fastest).
    pub gif_speed: i32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_width: 1000,
            frame_height: 800,
            frame_delay_ms: 500,
            gif_speed: 10,
        }
    }
}

impl RenderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("FRAME_WIDTH") {
            if let Ok(width) = val.parse() {
                config.frame_width = width;
            }
        }

        if let Ok(val) = std::env::var("FRAME_HEIGHT") {
            if let Ok(height) = val.parse() {
                config.frame_height = height;
            }
        }

        if let Ok(val) = std::env::var("FRAME_DELAY_MS") {
            if let Ok(delay) = val.parse() {
                config.frame_delay_ms = delay;
            }
        }

        if let Ok(val) = std::env::var("GIF_SPEED") {
            if let Ok(speed) = val.parse() {
                config.gif_speed = speed;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.frame_width < 100 || self.frame_height < 80 {
            return Err("frame must be at least 100x80 pixels".to_string());
        }

        if self.frame_width > 65535 || self.frame_height > 65535 {
            return Err("GIF frames are limited to 65535 pixels per side".to_string());
        }

        if self.frame_delay_ms == 0 {
            return Err("frame_delay_ms must be > 0".to_string());
        }

        if !(1..=30).contains(&self.gif_speed) {
            return Err("gif_speed must be 1-30".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!((config.frame_width, config.frame_height), (1000, 800));
    }

    #[test]
    fn test_validate_rejects_zero_delay() {
        let config = RenderConfig {
            frame_delay_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_tiny_frames() {
        let config = RenderConfig {
            frame_width: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
