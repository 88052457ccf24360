use tracing::debug;

use crate::directive::parse_directive;
use crate::error::Result;
use crate::expand::{ExpandedArt, expand};
use crate::palette::Palette;
use crate::ui::{self, OutputBlock};

/// Everything the banner needs, settled once per run: the palette after the
/// template's directive had its say, and the art expanded with it.
#[derive(Debug, Clone)]
pub struct RenderContext {
    palette: Palette,
    art: ExpandedArt,
}

impl RenderContext {
    pub fn new(raw_template: &str, configured: Palette, force_config_palette: bool) -> Result<Self> {
        let parsed = parse_directive(raw_template)?;
        if let Some(colors) = &parsed.directive {
            debug!(?colors, force_config_palette, "template carries a color directive");
        }
        let palette = configured.with_directive(parsed.directive.as_deref(), force_config_palette);
        let art = expand(parsed.body, &palette);
        Ok(Self { palette, art })
    }

    #[cfg(test)]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[cfg(test)]
    pub fn art(&self) -> &ExpandedArt {
        &self.art
    }

    /// `C0`..`C6` for the fetch script, so facts can use the art's colors.
    pub fn color_env(&self) -> Vec<(String, String)> {
        self.palette.color_map()
    }

    pub fn compose(&self, output: &OutputBlock) -> String {
        ui::compose(&self.art, output)
    }
}
