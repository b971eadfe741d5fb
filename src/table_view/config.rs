use egui::Color32;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TableViewConfig {
    /// Row height will not be lower that this value.
    pub minimum_row_height: f32,
    /// Row height will be determined based on its contents.
    /// There might be some speed and memory penalty for doing this.
    pub use_heterogeneous_row_heights: bool,
    /// Background of frozen columns.
    pub frozen_background: Color32,
    /// Frozen columns lose their place and background when the screen is narrower than this.
    pub unfreeze_below_width: f32,
    /// Edit / delete buttons in front of each row.
    pub show_tool_column: bool,
}

impl Default for TableViewConfig {
    fn default() -> Self {
        TableViewConfig {
            minimum_row_height: 24.0,
            use_heterogeneous_row_heights: true,
            frozen_background: Color32::from_rgb(0x36, 0x37, 0x49),
            unfreeze_below_width: 768.0,
            show_tool_column: true,
        }
    }
}

impl super::TableView {
    pub fn config_mut(&mut self) -> &mut TableViewConfig {
        &mut self.config
    }

    pub fn with_config(mut self, config: TableViewConfig) -> Self {
        self.config = config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: TableViewConfig =
            serde_json::from_str(r#"{"minimum_row_height": 30.0}"#).unwrap();
        assert_eq!(config.minimum_row_height, 30.0);
        assert_eq!(config.frozen_background, Color32::from_rgb(0x36, 0x37, 0x49));
        assert!(config.show_tool_column);
    }
}
